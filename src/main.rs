mod auth;
mod config;
mod converters;
mod error;
mod llm_client;
mod logging;
mod model_map;
mod models;
mod request_id;
mod router;
mod token_store;

use anyhow::Context;
use clap::Parser;
use config::Config;
use notify::{EventKind, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use token_store::{CodexAuthFile, TokenProvider};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "responses-bridge")]
#[command(about = "Serves the Anthropic Messages API on top of the Codex Responses backend")]
struct Args {
    #[arg(short, long, default_value = "0.0.0.0")]
    ip: String,

    #[arg(short, long, env = "PROXY_PORT", default_value = "8082")]
    port: u16,

    /// Path to config file; defaults apply when it does not exist
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Key clients must send as x-api-key or bearer token
    #[arg(short, long, env = "PROXY_TOKEN")]
    token: Option<String>,

    /// trace, debug, info, warn, error
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[arg(long)]
    log_file: Option<PathBuf>,

    /// socks and http proxy, example: socks5://192.168.0.2:10080
    #[arg(long)]
    proxy: Option<String>,

    #[arg(long, env = "CHATGPT_API_URL")]
    upstream_url: Option<String>,

    #[arg(long, env = "CODEX_BIG_MODEL")]
    big_model: Option<String>,

    #[arg(long, env = "CODEX_SMALL_MODEL")]
    small_model: Option<String>,

    #[arg(long, env = "CODEX_THINKING_MODEL")]
    thinking_model: Option<String>,

    /// Codex CLI credentials, default ~/.codex/auth.json
    #[arg(long, env = "CODEX_AUTH_FILE")]
    auth_file: Option<PathBuf>,
}

impl Args {
    /// Flags and environment win over the config file.
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(url) = &self.upstream_url {
            config.upstream_url = url.clone();
        }
        if let Some(model) = &self.big_model {
            config.models.big_model = model.clone();
        }
        if let Some(model) = &self.small_model {
            config.models.small_model = model.clone();
        }
        if let Some(model) = &self.thinking_model {
            config.models.thinking_model = model.clone();
        }
        if let Some(path) = &self.auth_file {
            config.auth.path = Some(path.clone());
        }
    }
}

/// Reloads credentials when `codex login` rewrites the file. The parent
/// directory is watched because the file may be replaced rather than edited.
async fn watch_auth_file(tokens: Arc<CodexAuthFile>) -> anyhow::Result<()> {
    let path = tokens.path().to_path_buf();
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
        .to_path_buf();
    let (tx, mut rx) = mpsc::channel(100);

    let mut watcher = notify::recommended_watcher(move |res| {
        if let Ok(event) = res {
            if let Err(e) = tx.blocking_send(event) {
                eprintln!("Failed to send event: {}", e);
            }
        }
    })?;
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;

    while let Some(event) = rx.recv().await {
        let touches_file = event
            .paths
            .iter()
            .any(|p| p.file_name() == path.file_name());
        if !touches_file || !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
            continue;
        }
        match tokens.reload() {
            Ok(()) => info!(
                "Credentials reloaded from {} (expired: {})",
                path.display(),
                tokens.is_expired()
            ),
            Err(e) => error!("Failed to reload credentials: {}", e),
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init_logging(logging::parse_level(&args.log_level), args.log_file.as_deref());

    let mut config = Config::load(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    args.apply_overrides(&mut config);

    let mut client_builder = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .read_timeout(Duration::from_secs(config.request_timeout_secs));
    if let Some(proxy) = &args.proxy {
        client_builder = client_builder.proxy(reqwest::Proxy::all(proxy)?);
    }
    let http_client = client_builder.build()?;

    let auth_path = config.auth.auth_file()?;
    let tokens = Arc::new(
        CodexAuthFile::load(&auth_path, config.auth.clone(), http_client.clone())
            .with_context(|| format!("run `codex login` first ({})", auth_path.display()))?,
    );
    info!(
        "Credentials loaded from {} (expired: {})",
        auth_path.display(),
        tokens.is_expired()
    );

    let tokens_for_watcher = tokens.clone();
    tokio::spawn(async move {
        if let Err(e) = watch_auth_file(tokens_for_watcher).await {
            warn!("Credential file watcher error: {}", e);
        }
    });

    let llm_client = Arc::new(llm_client::CodexClient::new(
        http_client,
        config.upstream_url.clone(),
    ));
    info!("Upstream: {}", llm_client.upstream_url());
    info!(
        "Model map: opus → {}, sonnet → {}, haiku → {}",
        config.models.thinking_model, config.models.big_model, config.models.small_model
    );

    let app_state = auth::AppState {
        config: Arc::new(config),
        tokens,
        llm_client,
        token: args.token,
    };
    let app = router::build_router(app_state);

    let bind_address = format!("{}:{}", args.ip, args.port);
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Server started on http://{}", bind_address);

    axum::serve(listener, app).await?;
    Ok(())
}
