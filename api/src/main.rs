use api::app;
use std::net::SocketAddr;
use tracing_appender::rolling;
use util::{config::AppConfig, state::AppState};

#[tokio::main]
async fn main() {
    // Configuration is loaded once; missing secrets stop the process here.
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let _log_guard = init_logging(&config);

    let db = match db::connect(&config.database_path).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!(error = %e, path = %config.database_path, "database connection failed");
            eprintln!("Failed to connect to database: {e}");
            std::process::exit(1);
        }
    };

    let addr_str = format!("{}:{}", config.host, config.port);
    let addr: SocketAddr = match addr_str.parse() {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!("Invalid address {addr_str}: {e}");
            std::process::exit(1);
        }
    };

    println!(
        "Starting {} ({}) on http://{}",
        config.project_name, config.env, addr
    );
    if config.attendance.require_qr || config.attendance.enforce_close {
        tracing::info!(
            require_qr = config.attendance.require_qr,
            enforce_close = config.attendance.enforce_close,
            "attendance policy"
        );
    }

    let app_state = AppState::new(db, config);
    let router = app(app_state);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        tracing::error!(error = %e, "server crashed");
        std::process::exit(1);
    }
}

fn init_logging(config: &AppConfig) -> tracing_appender::non_blocking::WorkerGuard {
    use std::fs;
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    fs::create_dir_all("logs").ok();

    let file_appender = rolling::daily("logs", &config.log_file);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true);

    // Production stdout is usually collected by a log shipper; keep it plain.
    let stdout_layer = config.log_to_stdout.then(|| {
        fmt::layer()
            .with_writer(std::io::stdout)
            .with_ansi(!config.is_production())
            .with_target(true)
            .with_thread_ids(true)
    });

    let env_filter = EnvFilter::try_new(&config.log_level)
        .unwrap_or_else(|_| EnvFilter::new("api=info,services=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    guard
}
