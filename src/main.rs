use std::path::PathBuf;

use clap::{Parser, Subcommand};
use portal_client::app::Portal;
use portal_client::config::{ConfigError, PortalConfig};
use portal_client::net::client::{ApiError, RequestOptions};
use portal_client::net::transport::{Method, TransportError};
use portal_client::state::session::SessionError;
use portal_client::state::upload::UploadFile;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("http client setup failed: {0}")]
    Transport(#[from] TransportError),
    #[error("{0}")]
    Rejected(String),
    #[error("not logged in; run `portal login` first")]
    NotLoggedIn,
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("could not read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "portal", about = "Quoting portal session and upload client")]
struct Cli {
    /// Overrides `PORTAL_API_BASE`.
    #[arg(long)]
    api_base: Option<String>,

    /// Overrides `PORTAL_ORIGIN`.
    #[arg(long)]
    origin: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Exchange email and password for a stored token.
    Login {
        #[arg(long, env = "PORTAL_EMAIL")]
        email: String,
        #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account. Does not log in.
    Signup {
        #[arg(long, env = "PORTAL_EMAIL")]
        email: String,
        #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Show the identity behind the stored token.
    Whoami,
    /// Forget the stored token.
    Logout,
    /// Upload a model file.
    Upload { path: PathBuf },
    /// Run the route guard and print where a navigation lands.
    Open { route: String },
    /// Send an authenticated GET and print the reply body.
    Get { path: String },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = PortalConfig::from_env()?;
    if let Some(api_base) = cli.api_base {
        config.api_base = api_base;
    }
    if let Some(origin) = cli.origin {
        config.origin = origin.trim_end_matches('/').to_owned();
    }
    let portal = Portal::from_config(&config)?;

    match cli.command {
        Command::Login { email, password } => run_login(&portal, &email, &password).await,
        Command::Signup { email, password } => run_signup(&portal, &email, &password).await,
        Command::Whoami => run_whoami(&portal).await,
        Command::Logout => {
            portal.session.logout();
            println!("logged out");
            Ok(())
        }
        Command::Upload { path } => run_upload(&portal, path).await,
        Command::Open { route } => run_open(&portal, &route).await,
        Command::Get { path } => run_get(&portal, &path).await,
    }
}

async fn run_login(portal: &Portal, email: &str, password: &str) -> Result<(), CliError> {
    if !portal.session.login(email, password).await {
        return Err(rejected(portal.session.error(), "Login failed"));
    }
    match portal.session.identity() {
        Some(identity) => print_json(&serde_json::to_value(identity)?),
        None => Err(CliError::NotLoggedIn),
    }
}

async fn run_signup(portal: &Portal, email: &str, password: &str) -> Result<(), CliError> {
    if !portal.session.signup(email, password).await {
        return Err(rejected(portal.session.error(), "Signup failed"));
    }
    println!("account created; run `portal login` to sign in");
    Ok(())
}

async fn run_whoami(portal: &Portal) -> Result<(), CliError> {
    match portal.session.fetch_identity().await? {
        Some(identity) => print_json(&serde_json::to_value(identity)?),
        None => Err(CliError::NotLoggedIn),
    }
}

async fn run_upload(portal: &Portal, path: PathBuf) -> Result<(), CliError> {
    let file = UploadFile::from_path(&path).map_err(|source| CliError::ReadFile { path, source })?;
    if !portal.uploads.upload_file(file).await {
        return Err(rejected(portal.uploads.last_error(), "Upload failed"));
    }
    match portal.uploads.current_file() {
        Some(descriptor) => print_json(&serde_json::to_value(descriptor)?),
        None => Ok(()),
    }
}

async fn run_open(portal: &Portal, route: &str) -> Result<(), CliError> {
    let resolved = portal.guard.resolve(route).await;
    print_json(&serde_json::json!({
        "path": resolved.path,
        "view": resolved.view,
        "redirects": resolved.redirects,
    }))
}

async fn run_get(portal: &Portal, path: &str) -> Result<(), CliError> {
    let options = RequestOptions::with_credential(portal.session.credential());
    let response = portal.client.raw(Method::GET, path, None, &options).await?;
    if !response.is_success() {
        eprintln!("HTTP {}", response.status);
    }
    match serde_json::from_slice::<Value>(&response.body) {
        Ok(json) => print_json(&json),
        Err(_) => {
            println!("{}", response.text());
            Ok(())
        }
    }
}

fn rejected(message: Option<String>, fallback: &str) -> CliError {
    CliError::Rejected(message.unwrap_or_else(|| fallback.to_owned()))
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
