use clap::Parser;
use pulse_config::ConfigLoader;
use pulse_console::{execute, report, telemetry, Cli, Console, SignalHandler};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", report(&e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = ConfigLoader::new(cli.config.as_ref()).load()?;
    if let Some(api_url) = cli.api_url {
        config.api.base_url = api_url;
        config.validate()?;
    }

    telemetry::init(&config.logging.level);
    tracing::debug!(base_url = %config.api.base_url, "Configuration loaded");

    let console = Console::connect(config)?;

    let (signals, shutdown_rx) = SignalHandler::new();
    tokio::spawn(async move {
        signals.wait_for_system_signal().await;
    });

    let mut stdout = std::io::stdout();
    execute(&console, cli.command, &mut stdout, shutdown_rx).await
}
