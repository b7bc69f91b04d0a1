use async_trait::async_trait;
use clap::Parser;
use github_status::{
    full_name_by_repo_url, new_client, Config, Destination, FuncMap, GitHubService, Notification,
    RepoStatus, Result, StatusClient, Templater, Vars,
};
use minijinja::Value;

#[derive(clap::Parser)]
#[command(about = "Render a commit status from templates and post it to GitHub.", long_about = None)]
struct Args {
    /// The access token for GitHub. Overrides the credentials in the config file.
    #[arg(long)]
    github_access_token: Option<String>,
    /// The path to the yaml config file.
    #[arg(long)]
    config_file: String,
    /// The path to the json file with the template variables.
    #[arg(long)]
    vars_file: String,
    /// The message used as the status description.
    #[arg(long, default_value = "")]
    message: String,
    /// Print the status instead of calling the GitHub API.
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

struct DryRun;

#[async_trait]
impl StatusClient for DryRun {
    async fn create_status(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
        status: &RepoStatus,
    ) -> Result<()> {
        println!("... {owner}/{repo}@{sha} create_status({status:?})");
        Ok(())
    }
}

fn funcs() -> FuncMap {
    let mut funcs = FuncMap::new();
    funcs.insert(
        "repo_full_name",
        Value::from_function(|url: String| {
            full_name_by_repo_url(&url).map_err(|e| {
                minijinja::Error::new(minijinja::ErrorKind::InvalidOperation, e.to_string())
            })
        }),
    );
    funcs
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut config = Config::from_reader(std::fs::File::open(&args.config_file)?)?;
    if let Some(token) = args.github_access_token {
        config.github.token = Some(token);
    }
    let vars: Vars = serde_json::from_reader(std::fs::File::open(&args.vars_file)?)?;

    let templater = Templater::compile(&config.name, &funcs(), &config.template)?;
    let mut notification = Notification {
        message: args.message,
        github: None,
    };
    templater.execute(&mut notification, &vars)?;

    let destination = Destination {
        service: "github".to_string(),
        recipient: String::new(),
    };
    if args.dry_run {
        return GitHubService::new(DryRun, None)
            .send(&notification, &destination)
            .await;
    }
    let client = new_client(&config.github)?;
    GitHubService::new(client, config.github.timeout())
        .send(&notification, &destination)
        .await
}
