use crate::errors::Result;
use crate::templater::GitHubNotification;

/// Credentials and endpoint for the GitHub API.
#[derive(serde::Deserialize, Debug, Default, Clone)]
pub struct GitHubOptions {
    #[serde(rename = "appID", default)]
    pub app_id: Option<u64>,
    #[serde(rename = "installationID", default)]
    pub installation_id: Option<u64>,
    #[serde(rename = "privateKey", default)]
    pub private_key: String,
    #[serde(rename = "enterpriseBaseURL", default)]
    pub enterprise_base_url: String,
    /// Personal access token, used instead of the app credentials when set.
    #[serde(default)]
    pub token: Option<String>,
    /// Upper bound for a single status call. Unbounded when unset.
    #[serde(rename = "timeoutSecs", default)]
    pub timeout_secs: Option<u64>,
}

impl GitHubOptions {
    pub fn enterprise_url(&self) -> Option<&str> {
        if self.enterprise_base_url.is_empty() {
            None
        } else {
            Some(&self.enterprise_base_url)
        }
    }

    pub fn timeout(&self) -> Option<std::time::Duration> {
        self.timeout_secs.map(std::time::Duration::from_secs)
    }
}

#[derive(serde::Deserialize, Debug)]
pub struct Config {
    /// Name of the notification definition, used to name the compiled templates.
    pub name: String,
    #[serde(default)]
    pub github: GitHubOptions,
    pub template: GitHubNotification,
}

impl Config {
    pub fn from_reader(reader: impl std::io::Read) -> Result<Self> {
        Ok(serde_yaml::from_reader(reader)?)
    }
}
