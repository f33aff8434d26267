mod bundle_cmd;
mod render_cmd;
mod status_cmd;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use approvetap_browser::SessionController;
use approvetap_config::{
    config_dir, config_file_path, load_and_prepare, ApproveTapConfig, CollectorConfig,
};
use approvetap_gateway::{start_server, GatewayState};
use approvetap_logging::init_logger;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "approvetap")]
#[command(about = "approvetap: capture application approvals from the management console")]
#[command(version)]
struct Cli {
    /// Config file (default: $APPROVETAP_CONFIG_DIR/config.yaml or ~/.approvetap/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the collector and the session control API
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Run one browser session in the foreground until Ctrl-C
    Start,
    /// Ask a running collector whether a session is active
    Status,
    /// Pack `wasm-bindgen --target no-modules` output into the inject script
    Bundle {
        /// Directory holding approvetap_interceptor.js and approvetap_interceptor_bg.wasm
        pkg: PathBuf,
        /// Output file (default: browser.injectScript)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Print the clipboard report for a saved message or event
    Render {
        /// JSON file holding an outbound message or a bare approval event
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Render { file } = &cli.command {
        return render_cmd::run(file);
    }

    let path = cli
        .config
        .clone()
        .unwrap_or_else(|| config_file_path(&config_dir()));
    let config = load_and_prepare(&path).await?;
    let logs = config.log_settings();
    init_logger(&logs.dir, &logs.level)?;

    match cli.command {
        Commands::Serve { port } => run_server(config, port).await?,
        Commands::Start => run_session(config).await?,
        Commands::Status => status_cmd::run(&config.collector_settings()).await?,
        Commands::Bundle { pkg, out } => {
            let out = out.unwrap_or_else(|| config.browser_settings().inject_script);
            bundle_cmd::run(&pkg, &out).await?
        }
        Commands::Render { .. } => {}
    }

    Ok(())
}

fn session_controller(config: &ApproveTapConfig) -> Arc<SessionController> {
    Arc::new(SessionController::chrome(
        config.browser_settings(),
        config.interceptor_settings(),
    ))
}

/// `--port` wins over the file and the environment. A derived hook URL
/// follows it.
fn with_port(mut config: ApproveTapConfig, port: Option<u16>) -> ApproveTapConfig {
    if let Some(port) = port {
        config
            .collector
            .get_or_insert_with(CollectorConfig::default)
            .port = Some(port);
    }
    config
}

async fn run_server(config: ApproveTapConfig, port: Option<u16>) -> Result<()> {
    let config = with_port(config, port);
    let collector = config.collector_settings();
    let addr = collector.socket_addr()?;
    info!(%addr, hook = %collector.hook_path, "Starting approvetap collector");

    let state = GatewayState::new(session_controller(&config));
    start_server(addr, &collector.hook_path, state).await
}

async fn run_session(config: ApproveTapConfig) -> Result<()> {
    let sessions = session_controller(&config);
    let outcome = sessions.start().await?;
    info!(?outcome, portal = %config.browser_settings().portal_url, "Session running; press Ctrl-C to stop");
    println!("Started browser session.");

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            sessions.stop().await;
            println!("Stopped browser session.");
        }
        _ = sessions.wait_ended() => {
            warn!("Browser session ended on its own");
            sessions.stop().await;
            println!("Browser session ended.");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approvetap_config::InterceptorConfig;

    #[test]
    fn port_flag_moves_derived_hook_url() {
        let config = with_port(ApproveTapConfig::default(), Some(6200));
        assert_eq!(config.collector_settings().port, 6200);
        assert_eq!(config.interceptor_settings().hook_url, "http://localhost:6200/hook");
    }

    #[test]
    fn port_flag_keeps_explicit_hook_url() {
        let config = ApproveTapConfig {
            interceptor: Some(InterceptorConfig {
                hook_url: Some("https://tap.example.test/hook".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let config = with_port(config, Some(6200));
        assert_eq!(config.interceptor_settings().hook_url, "https://tap.example.test/hook");
    }
}
