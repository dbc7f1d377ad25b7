use anyhow::{Context, Result};
use axum::{ServiceExt, extract::Request};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use routing_filter::config::{Config, LoggingConfig};
use routing_filter::utils::RustI18nProvider;
use routing_filter::utils::i18n::DEFAULT_LOCALE;
use routing_filter::{AppState, build_app};

#[derive(Debug, Parser)]
#[command(name = "routing-filter", about = "Serve the shop demo behind the language segment filter")]
struct Args {
    /// Path to config.toml (defaults to conf/config.toml or config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Override server.host
    #[arg(long)]
    host: Option<String>,

    /// Override server.port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when absent)
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let _guard = init_logging(&config.logging)?;

    let default_locale = config.language.default_locale.clone().unwrap_or_else(|| DEFAULT_LOCALE.to_string());
    rust_i18n::set_locale(&default_locale);
    let provider = Arc::new(RustI18nProvider::with_default_locale(default_locale));

    let state = AppState::new(&config.language, provider).context("Failed to set up routes")?;
    tracing::info!(
        "Language filter: languages={:?}, default={}, include_default={}, matching={:?}",
        state.language_filter.languages().codes(),
        state.language_filter.default_language(),
        config.language.include_default_language,
        config.language.matching
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on http://{}", addr);

    let app = build_app(state);
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .await
        .context("Server error")?;

    Ok(())
}

/// Console logging, plus a daily-rolling file when `logging.file` is set
fn init_logging(logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let Some(file) = &logging.file else {
        tracing_subscriber::registry().with(filter).with(fmt::layer()).init();
        return Ok(None);
    };

    let path = Path::new(file);
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let file_name = path.file_name().context("logging.file has no file name")?;
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create log dir {}", dir.display()))?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, file_name));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .init();

    Ok(Some(guard))
}
