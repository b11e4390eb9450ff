//! AirControlX entry point. One binary, four roles: the simulator itself
//! (the default) and the three pipeline processes it spawns.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aircontrolx::{config::Config, services, sim};

#[derive(Parser)]
#[command(name = "acx", about = "AirControlX - automated air traffic control simulation")]
struct Cli {
    /// Emit a handful of canned violation frames and exit.
    #[arg(long)]
    test: bool,

    #[command(subcommand)]
    role: Option<Role>,
}

#[derive(Subcommand)]
enum Role {
    /// Run the simulation (the default).
    Run,
    /// Run the notice generator process.
    AvnGenerator,
    /// Run the airline portal process.
    AirlinePortal,
    /// Run the payment service process.
    PaymentService,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("acx=info".parse()?)
                .add_directive("aircontrolx=info".parse()?)
                .add_directive("acx_core=info".parse()?)
                .add_directive("acx_ipc=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.role.unwrap_or(Role::Run) {
        Role::Run if cli.test => sim::driver::run_test_mode(config).await,
        Role::Run => sim::driver::run(config).await,
        Role::AvnGenerator => services::avn::run(config).await,
        Role::AirlinePortal => services::portal::run(config).await,
        Role::PaymentService => services::payment::run(config).await,
    }
}
