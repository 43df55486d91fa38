use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use hubauth_auth::{
    AuthClient, GrantBearer, TokenExchanger,
    property::{self, VARIABLE_NAMESPACE},
    selector,
};
use hubauth_config::{ConfigProvider, LayeredConfig, PropertyMap, VariableWatcher};
use std::{path::PathBuf, sync::Arc};
use tracing_subscriber::EnvFilter;
use url::Url;

const DEFAULT_CALLBACK: &str = "http://localhost:8018/oauth2/callback";

#[derive(Parser, Debug)]
#[command(name = "hubauth", about = "HubSpot API-key / OAuth2 request authentication")]
struct Cli {
    #[command(flatten)]
    settings: Settings,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct Settings {
    /// YAML file with process-wide variables (`Hubspot.Auth.*`).
    #[arg(long, value_name = "FILE", global = true)]
    vars: Option<PathBuf>,
    /// YAML file with per-client overrides (`Auth.*`).
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,
    /// Per-client override, applied after `--config` (repeatable).
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_val, global = true)]
    overrides: Vec<(String, String)>,
    /// Redirect URI registered with the OAuth app.
    #[arg(long, value_name = "URL", default_value = DEFAULT_CALLBACK, global = true)]
    callback: Url,
}

#[derive(Args, Debug)]
struct GrantArgs {
    /// Authorization code returned to the callback.
    #[arg(long, conflicts_with = "refresh_token")]
    code: Option<String>,
    /// Previously issued refresh token.
    #[arg(long)]
    refresh_token: Option<String>,
}

impl GrantArgs {
    fn bearer(&self) -> GrantBearer {
        let mut bearer = GrantBearer::new();
        if let Some(code) = &self.code {
            bearer = bearer.with_code(code);
        }
        if let Some(token) = &self.refresh_token {
            bearer = bearer.with_refresh_token(token);
        }
        bearer
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show which authentication strategy the configuration selects.
    Mode,
    /// Print the consent page URL.
    AuthorizeUrl,
    /// Exchange an authorization code or refresh token and print the token.
    Token {
        #[command(flatten)]
        grant: GrantArgs,
    },
    /// Send an authenticated GET request and print the response.
    Get {
        /// Request URL.
        url: Url,
        #[command(flatten)]
        grant: GrantArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Arc::new(load_config(&cli.settings)?);

    match cli.command {
        Commands::Mode => {
            println!("{}", selector::select(&config).mode());
            Ok(())
        }
        Commands::AuthorizeUrl => cmd_authorize_url(&config, cli.settings.callback),
        Commands::Token { grant } => cmd_token(config, cli.settings.callback, &grant).await,
        Commands::Get { url, grant } => cmd_get(config, cli.settings.callback, url, &grant).await,
    }
}

fn cmd_authorize_url(config: &LayeredConfig, callback: Url) -> Result<()> {
    let uri = hubauth_auth::authorize::authorization_uri(config, &callback)
        .context("cannot build authorization url")?;
    println!("{uri}");
    Ok(())
}

async fn cmd_token(config: Arc<LayeredConfig>, callback: Url, grant: &GrantArgs) -> Result<()> {
    let exchanger = TokenExchanger::new(config, callback, rquest::Client::new());
    let token = grant
        .bearer()
        .exchange(&exchanger)
        .await
        .map_err(report)
        .context("token exchange failed")?;
    println!("{}", serde_json::to_string_pretty(&token)?);
    Ok(())
}

async fn cmd_get(
    config: Arc<LayeredConfig>,
    callback: Url,
    url: Url,
    grant: &GrantArgs,
) -> Result<()> {
    let client = AuthClient::builder()
        .shared_config(config)
        .callback(callback)
        .bearer_handler(grant.bearer())
        .build()?;

    let resp = client.get(url).await.map_err(report).context("request failed")?;
    let status = resp.status();
    let body = resp.text().await?;
    eprintln!("{status}");
    println!("{body}");
    if status.is_success() {
        Ok(())
    } else {
        anyhow::bail!("server answered {status}")
    }
}

fn load_config(settings: &Settings) -> Result<LayeredConfig> {
    let variables: Arc<dyn ConfigProvider> = match &settings.vars {
        Some(path) => Arc::new(
            VariableWatcher::new(path.clone())
                .map_err(|e| anyhow::anyhow!("variables error: {e}"))?,
        ),
        None => Arc::new(
            PropertyMap::load_variables(None)
                .map_err(|e| anyhow::anyhow!("variables error: {e}"))?,
        ),
    };

    let mut client = match &settings.config {
        Some(path) => {
            PropertyMap::from_file(path).map_err(|e| anyhow::anyhow!("config error: {e}"))?
        }
        None => PropertyMap::new(),
    };
    for (key, value) in &settings.overrides {
        client.insert(key, value.clone());
    }

    tracing::debug!(
        overrides = client.len(),
        vars_file = settings.vars.is_some(),
        namespace = VARIABLE_NAMESPACE,
        "configuration loaded"
    );
    Ok(property::layered(client, variables))
}

/// Prints the consent URL before handing the error to anyhow.
fn report(err: hubauth_types::AuthError) -> hubauth_types::AuthError {
    if let Some(uri) = err.redirect_uri() {
        eprintln!("User consent required. Open the following URL to grant access:");
        eprintln!("{uri}");
    }
    err
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))
}
