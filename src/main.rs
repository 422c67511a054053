use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use zestofy::config::{InferenceArgs, Settings, WebSettings};
use zestofy::constants;
use zestofy::{chat, web_server, GeminiClient, TurnProcessor};

// Define the command-line interface structure using clap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Start the chat web server.
    Start {
        #[arg(long, default_value_t = constants::DEFAULT_PORT, help = "Port for the web server.")]
        port: u16,
        #[arg(long, default_value = constants::DEFAULT_HOST, help = "Address to listen on.")]
        host: String,
        #[arg(long, value_name = "DIR", help = "Load templates from DIR and reload them on change.")]
        templates: Option<PathBuf>,
        #[arg(long, value_name = "DIR", default_value = constants::DEFAULT_STATIC_DIR, help = "Directory served under /static.")]
        static_dir: PathBuf,
        #[command(flatten)]
        inference: InferenceArgs,
    },
    /// Chat with the marketing bot in the terminal.
    Chat {
        #[command(flatten)]
        inference: InferenceArgs,
    },
}

// Configuration problems surface here, before any request is made.
fn build_processor(args: InferenceArgs) -> Result<(Arc<TurnProcessor>, Settings)> {
    let settings = Settings::try_from(args).context("Invalid configuration")?;
    let client = GeminiClient::new(&settings).context("Failed to build the model client")?;
    info!(model = client.model(), temperature = settings.temperature, "Model client ready");
    let processor = Arc::new(TurnProcessor::new(Arc::new(client), &settings));
    Ok((processor, settings))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (GOOGLE_API_KEY and friends)
    dotenvy::dotenv().ok();

    // Reads log level from RUST_LOG environment variable (e.g., RUST_LOG=info,zestofy=debug)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Start { port, host, templates, static_dir, inference } => {
            let (processor, settings) = build_processor(inference)?;
            let web = WebSettings { host, port, template_dir: templates, static_dir };
            info!("Starting Zestofy on {}:{}...", web.host, web.port);

            let mut web_server_handle = tokio::spawn(async move {
                if let Err(e) = web_server::start_web_server(web, processor, settings.stream_delay).await {
                    error!("Web server failed: {:?}", e);
                }
            });

            let ctrl_c = tokio::signal::ctrl_c();
            tokio::pin!(ctrl_c);

            tokio::select! {
                _ = &mut ctrl_c => {
                    info!("Ctrl-C received, initiating shutdown...");
                }
                res = &mut web_server_handle => {
                    match res {
                        Ok(_) => info!("Web server task completed unexpectedly."),
                        Err(e) if e.is_panic() => error!("Web server task panicked: {:?}", e),
                        Err(e) => error!("Web server task failed: {:?}", e),
                    }
                }
            }

            if !web_server_handle.is_finished() {
                info!("Aborting web server task...");
                web_server_handle.abort();
            }
            info!("Shutdown complete.");
        }
        Commands::Chat { inference } => {
            let (processor, settings) = build_processor(inference)?;
            chat::run_terminal_chat(processor, settings.stream_delay)
                .await
                .context("Chat session failed")?;
        }
    }

    Ok(())
}
