use busline_api::cli::{self, Cli, Command};
use busline_api::BookingService;
use busline_store::{app_config::Config, DbClient};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "busline=info,busline_booking=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    tracing::info!(
        hold_timeout_ms = config.booking_rules.seat_hold_timeout_ms,
        max_seats = config.booking_rules.max_seats_per_booking,
        "Loaded booking rules"
    );

    let db = DbClient::new(&config.database).await?;

    match cli.command {
        Command::Migrate => db.migrate().await?,
        command => {
            let service = BookingService::postgres(db.pool.clone(), &config);
            cli::run(command, &service, &mut std::io::stdout().lock()).await?;
        }
    }

    Ok(())
}
