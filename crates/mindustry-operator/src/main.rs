//! Mindustry Operator
//!
//! Watches Server resources, provisions their pods and initializes them.

use clap::{Parser, Subcommand};
use kube::CustomResourceExt;
use mindustry_operator::{
    config::{self, OperatorConfig},
    controllers::{Context, PodController, ServerController},
    crds::Server,
    platform::KubePlatform,
    telemetry::{init_tracing, LogFormat},
    Reconciler,
};
use std::{sync::Arc, time::Duration};
use tracing::info;

#[derive(Parser)]
#[command(name = "mindustry-operator")]
#[command(about = "Kubernetes operator for Mindustry game servers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the CRD manifest to stdout
    Crds,
    /// Run the operator
    Run(RunArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// Base URI release tags are appended to
    #[arg(long, env = "MINDUSTRY_RELEASES_URI", default_value = config::DEFAULT_RELEASES_URI)]
    releases_uri: String,

    /// Image used to download the server jar
    #[arg(long, env = "MINDUSTRY_INSTALLER_IMAGE", default_value = config::DEFAULT_INSTALLER_IMAGE)]
    installer_image: String,

    /// Image used to run the server jar
    #[arg(long, env = "MINDUSTRY_SERVER_IMAGE", default_value = config::DEFAULT_SERVER_IMAGE)]
    server_image: String,

    /// How long to wait for a pod attach before giving up (milliseconds)
    #[arg(long, env = "ATTACH_TIMEOUT_MS", default_value_t = 1000)]
    attach_timeout_ms: u64,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

impl RunArgs {
    fn operator_config(&self) -> OperatorConfig {
        OperatorConfig {
            releases_uri: self.releases_uri.clone(),
            installer_image: self.installer_image.clone(),
            server_image: self.server_image.clone(),
            attach_timeout: Duration::from_millis(self.attach_timeout_ms),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let cli = Cli::parse();

    match cli.command {
        Commands::Crds => {
            println!("---");
            println!("{}", serde_yaml::to_string(&Server::crd())?);
            Ok(())
        }
        Commands::Run(args) => run_operator(args).await,
    }
}

async fn run_operator(args: RunArgs) -> anyhow::Result<()> {
    init_tracing(args.log_format);
    info!("Starting mindustry-operator");

    let config = args.operator_config();
    info!(releases_uri = %config.releases_uri, "Loaded configuration");

    let client = kube::Client::try_default().await?;
    info!("Connected to Kubernetes");

    let platform = Arc::new(KubePlatform::new(client.clone()));
    let ctx = Arc::new(Context::new(Reconciler::new(platform, config)));

    tokio::select! {
        _ = ServerController::run(client.clone(), ctx.clone()) => {}
        _ = PodController::run(client.clone(), ctx.clone()) => {}
    }

    Ok(())
}
