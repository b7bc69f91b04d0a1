#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Slug {
    pub owner: String,
    pub repo: String,
}

impl Slug {
    pub fn str(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

impl std::str::FromStr for Slug {
    type Err = &'static str;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Format: a/b
        let err = "Wrong format, expected owner/repo.";
        let mut it_slug = s.split('/');
        let res = Self {
            owner: it_slug.next().ok_or(err)?.to_string(),
            repo: it_slug.next().ok_or(err)?.to_string(),
        };
        if res.owner.is_empty() || res.repo.is_empty() {
            return Err(err);
        }
        if it_slug.next().is_none() {
            return Ok(res);
        }
        Err(err)
    }
}

pub const GITHUB_API_URL: &str = "https://api.github.com";

/// Normalize a GitHub Enterprise base URL so that it points at the REST API root,
/// i.e. `https://ghe.example.com` becomes `https://ghe.example.com/api/v3/`.
pub fn enterprise_base_url(base_url: &str) -> String {
    let mut url = base_url.to_string();
    if !url.ends_with('/') {
        url.push('/');
    }
    let host = url
        .split_once("://")
        .map_or(url.as_str(), |(_, rest)| rest)
        .split('/')
        .next()
        .unwrap_or_default();
    if !url.ends_with("/api/v3/") && !host.starts_with("api.") && !host.contains(".api.") {
        url.push_str("api/v3/");
    }
    url
}

#[cfg(feature = "github")]
pub fn get_octocrab(
    token: Option<String>,
    enterprise_url: Option<&str>,
) -> octocrab::Result<octocrab::Octocrab> {
    let build = octocrab::Octocrab::builder();
    let build = match token {
        Some(tok) => build.personal_token(tok),
        None => build,
    };
    match enterprise_url {
        Some(url) => build.base_uri(enterprise_base_url(url))?,
        None => build,
    }
    .build()
}

/// Build a client authenticated as the given installation of a GitHub App.
#[cfg(feature = "github")]
pub fn get_octocrab_app(
    app_id: u64,
    installation_id: u64,
    key: jsonwebtoken::EncodingKey,
    enterprise_url: Option<&str>,
) -> octocrab::Result<octocrab::Octocrab> {
    let build = octocrab::Octocrab::builder().app(octocrab::models::AppId(app_id), key);
    let app = match enterprise_url {
        Some(url) => build.base_uri(enterprise_base_url(url))?,
        None => build,
    }
    .build()?;
    app.installation(octocrab::models::InstallationId(installation_id))
}
