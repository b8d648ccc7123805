use bench_stubs::config::{Profile, Settings};
use bench_stubs::output::OutputWriter;
use bench_stubs::server::{StubHandler, StubServer};
use bench_stubs::shutdown;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let profile = match Profile::from_args(std::env::args().skip(1)) {
        Ok(profile) => profile,
        Err(e) => {
            eprintln!("bench-stubs: {}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&profile.log_filter)),
        )
        .init();

    match run(profile).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(profile: Profile) -> anyhow::Result<()> {
    let variant = profile.variant;
    info!("Starting {} stub", variant);

    // resolved before anything binds
    let settings = Settings::from_env()?;
    let output = Arc::new(OutputWriter::for_variant(&settings.output_path, variant).await?);

    let server = StubServer::new(
        variant.listen_addr(),
        StubHandler::new(variant, output.clone()),
    );
    let outcome = server.run(shutdown::wait_for(&profile.signals)).await;

    info!("Flush and close commencing...");
    output.close().await?;

    let signal = outcome?;
    info!("Shut down on {}", signal);
    Ok(())
}
