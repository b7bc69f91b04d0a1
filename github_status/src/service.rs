use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::GitHubOptions;
use crate::errors::{Result, StatusError};
use crate::repo_url::{is_path_segment, resolve_slug};
use crate::templater::{Destination, Notification};

/// GitHub rejects status descriptions longer than this many characters.
pub const MAX_DESCRIPTION_LEN: usize = 140;

/// Body of a commit status.
/// https://docs.github.com/en/rest/commits/statuses#create-a-commit-status
#[derive(serde::Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RepoStatus {
    pub state: String,
    pub description: String,
    pub context: String,
    pub target_url: String,
}

#[async_trait]
pub trait StatusClient: Send + Sync {
    async fn create_status(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
        status: &RepoStatus,
    ) -> Result<()>;
}

#[async_trait]
impl StatusClient for octocrab::Octocrab {
    async fn create_status(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
        status: &RepoStatus,
    ) -> Result<()> {
        // Raw route instead of the typed builder so that `state` is sent unchanged.
        let _: serde_json::Value = self
            .post(format!("/repos/{owner}/{repo}/statuses/{sha}"), Some(status))
            .await?;
        Ok(())
    }
}

/// Build the API client from the configured credentials. A personal access token
/// takes precedence over the GitHub App credentials.
pub fn new_client(opts: &GitHubOptions) -> Result<octocrab::Octocrab> {
    let client = match (&opts.token, opts.app_id, opts.installation_id) {
        (Some(token), _, _) => util::get_octocrab(Some(token.clone()), opts.enterprise_url())?,
        (None, Some(app_id), Some(installation_id)) => {
            let key = jsonwebtoken::EncodingKey::from_rsa_pem(opts.private_key.as_bytes())?;
            util::get_octocrab_app(app_id, installation_id, key, opts.enterprise_url())?
        }
        _ => util::get_octocrab(None, opts.enterprise_url())?,
    };
    Ok(client)
}

/// Cut the message to at most `n` characters, marking a cut with a trailing `...`.
pub fn trunc(message: &str, n: usize) -> String {
    if message.chars().count() > n {
        let mut cut = message.chars().take(n.saturating_sub(3)).collect::<String>();
        cut.push_str("...");
        return cut;
    }
    message.to_string()
}

pub struct GitHubService<C> {
    client: C,
    timeout: Option<Duration>,
}

impl<C: StatusClient> GitHubService<C> {
    pub fn new(client: C, timeout: Option<Duration>) -> Self {
        Self { client, timeout }
    }

    #[cfg(test)]
    fn client(&self) -> &C {
        &self.client
    }

    /// Post the notification's status payload as a commit status on its revision.
    pub async fn send(&self, notification: &Notification, _destination: &Destination) -> Result<()> {
        let github = notification
            .github
            .as_ref()
            .ok_or(StatusError::MissingPayload)?;
        let slug = resolve_slug(&github.repo_url)?;
        if !is_path_segment(&github.revision) {
            return Err(StatusError::InvalidRevision(github.revision.clone()));
        }
        let status = RepoStatus {
            state: github.state.clone(),
            description: trunc(&notification.message, MAX_DESCRIPTION_LEN),
            context: github.label.clone(),
            target_url: github.target_url.clone(),
        };
        debug!(
            repo = %slug.str(),
            revision = %github.revision,
            state = %status.state,
            "create commit status"
        );
        let call = self
            .client
            .create_status(&slug.owner, &slug.repo, &github.revision, &status);
        match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, call)
                .await
                .map_err(|_| StatusError::Timeout(timeout))??,
            None => call.await?,
        }
        info!(repo = %slug.str(), revision = %github.revision, "commit status created");
        Ok(())
    }
}
