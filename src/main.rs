mod actor;
mod entity;
mod error;
mod plugins;
mod prelude;
mod pricing;
mod state;
mod sv;

use anyhow::Context;
use tracing_subscriber::{
  EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::{
  plugins::{App, server},
  prelude::*,
  state::{AppState, Config},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "referral=debug,tower_http=debug,sea_orm=warn".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = Config::from_env()?;

  info!("Starting Referral Server v{}", env!("CARGO_PKG_VERSION"));
  if config.admins.is_empty() {
    warn!("No admins configured, admin routes will refuse every caller");
  }

  let app = Arc::new(AppState::new(config).await?);

  App::new().register(server::Plugin).run(app).await?;

  tokio::signal::ctrl_c().await.context("Failed to listen for shutdown")?;
  info!("Shutting down");

  Ok(())
}
