use std::error::Error;

use analysis_gateway::telemetry;
use tracing::Level;
use tracing_subscriber::{filter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // A missing .env is fine; variables may come from the environment.
    dotenvy::dotenv().ok();

    let gateway_level = std::env::var("LOG_LEVEL")
        .ok()
        .and_then(|name| telemetry::parse_level(&name))
        .unwrap_or(Level::INFO);

    // Gateway events go through the library layer; everything else through a
    // plain fmt layer.
    let others = filter::filter_fn(|meta| !meta.target().starts_with(telemetry::TARGET_PREFIX));

    tracing_subscriber::registry()
        .with(telemetry::env_filter_with_level("info", gateway_level))
        .with(telemetry::layer())
        .with(fmt::layer().with_target(true).with_filter(others))
        .try_init()?;

    api::start().await?;

    Ok(())
}
