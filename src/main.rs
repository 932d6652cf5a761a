use clap::Parser;
use miette::{IntoDiagnostic, Result};
use pix_checkout::application::controller::{SessionController, UserIntent};
use pix_checkout::config::{CheckoutConfig, DEFAULT_GATEWAY_URL};
use pix_checkout::domain::order::PayerIdentity;
use pix_checkout::domain::ports::GatewayRef;
use pix_checkout::infrastructure::http_gateway::HttpPixGateway;
use pix_checkout::infrastructure::scripted::ScriptedGateway;
use pix_checkout::interfaces::json::order_reader::read_order;
use pix_checkout::interfaces::terminal::command_reader::CommandReader;
use pix_checkout::interfaces::terminal::effect_writer::EffectWriter;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Order summary JSON file ({"orderId", "total", "items"})
    order: PathBuf,

    /// E-mail of the signed-in payer. Without it the checkout sends you to sign in.
    #[arg(long, env = "PIX_PAYER_EMAIL")]
    email: Option<String>,

    /// Base URL of the PIX proxy
    #[arg(long, env = "PIX_GATEWAY_URL", default_value = DEFAULT_GATEWAY_URL)]
    gateway_url: String,

    /// Timeout for each request to the PIX proxy, in seconds
    #[arg(long, env = "PIX_REQUEST_TIMEOUT_SECS", default_value_t = 15)]
    request_timeout_secs: u64,

    /// Delay before moving to order confirmation once paid, in milliseconds
    #[arg(long, env = "PIX_REDIRECT_DELAY_MS", default_value_t = 1200)]
    redirect_delay_ms: u64,

    /// Use a built-in scripted processor instead of the PIX proxy
    #[arg(long)]
    offline: bool,
}

impl Cli {
    fn config(&self) -> CheckoutConfig {
        CheckoutConfig {
            gateway_url: self.gateway_url.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            redirect_delay: Duration::from_millis(self.redirect_delay_ms),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config();

    let order = read_order(File::open(&cli.order).into_diagnostic()?).into_diagnostic()?;
    let payer = cli
        .email
        .clone()
        .map(PayerIdentity::new)
        .transpose()
        .into_diagnostic()?;

    let gateway: GatewayRef = if cli.offline {
        Arc::new(ScriptedGateway::offline())
    } else {
        Arc::new(HttpPixGateway::new(&config.gateway_url, config.request_timeout).into_diagnostic()?)
    };

    // Effects go to stdout as JSON lines
    let (effects_tx, mut effects_rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(async move {
        let mut writer = EffectWriter::new(io::stdout());
        while let Some(effect) = effects_rx.recv().await {
            if let Err(e) = writer.write_effect(&effect) {
                warn!(error = %e, "Could not write effect");
            }
        }
    });

    let mounted = SessionController::mount(payer, Some(order), gateway, effects_tx, &config);
    let controller = match mounted {
        Ok(controller) => controller,
        Err(e) => {
            writer.await.into_diagnostic()?;
            return Err(e).into_diagnostic();
        }
    };

    // Commands come from stdin on a plain thread so a pending read never
    // holds the runtime open; EOF unmounts the session.
    let (intents_tx, intents_rx) = mpsc::channel::<UserIntent>(16);
    std::thread::spawn(move || {
        for command in CommandReader::new(io::stdin().lock()).commands() {
            match command {
                Ok(intent) => {
                    if intents_tx.blocking_send(intent).is_err() {
                        break;
                    }
                }
                Err(e) => warn!(error = %e, "Ignoring command"),
            }
        }
    });

    let outcome = controller.run(intents_rx).await;
    writer.await.into_diagnostic()?;
    let outcome = outcome.into_diagnostic()?;
    info!(?outcome, "Checkout finished");

    Ok(())
}
