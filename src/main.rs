use anyhow::{Context, Result};
use clap::Parser;
use pv_bess_dispatch::{
    api,
    cli::{self, Cli, Commands, ServeArgs},
    config::Config,
    telemetry,
};
use tracing::{info, warn};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let cfg = Config::load_from(&cli.config)?;
    telemetry::init_tracing(&cfg.logging);

    match cli.command {
        Commands::Solve(args) => {
            let report = cli::run_solve(&args, &cfg)?;
            cli::write_json(&report, args.output.as_deref())
        }
        Commands::Sizing(args) => {
            let report = cli::run_sizing(&args, &cfg)?;
            cli::write_json(&report, args.output.as_deref())
        }
        Commands::Serve(args) => serve(cfg, args),
    }
}

fn serve(mut cfg: Config, args: ServeArgs) -> Result<()> {
    if let Some(host) = args.host {
        cfg.server.host = host;
    }
    if let Some(port) = args.port {
        cfg.server.port = port;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(async move {
        let addr = cfg.server.socket_addr()?;
        if cfg.server.host == "0.0.0.0" {
            warn!("binding to 0.0.0.0, the API is reachable from the network");
        }

        let app = api::router(api::ApiState::new(cfg));
        info!(%addr, "starting pv-bess-dispatch API");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(telemetry::shutdown_signal())
            .await?;

        warn!("shutdown complete");
        Ok::<(), anyhow::Error>(())
    })
}
