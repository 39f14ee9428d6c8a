use std::env;

use anyhow::Context;

use crate::{entity::UserRole, prelude::*};

#[derive(Debug, Clone)]
pub struct Config {
  pub database_url: String,
  pub port: u16,
  pub admins: HashSet<i64>,
  pub rate_per_second: u64,
  pub rate_burst: u32,
}

fn var_or<T: std::str::FromStr>(name: &str, default: T) -> anyhow::Result<T>
where
  T::Err: std::error::Error + Send + Sync + 'static,
{
  match env::var(name) {
    Ok(raw) => raw.trim().parse().with_context(|| format!("Invalid {name}")),
    Err(_) => Ok(default),
  }
}

fn parse_admins(raw: &str) -> anyhow::Result<HashSet<i64>> {
  raw
    .split(',')
    .filter(|s| !s.trim().is_empty())
    .map(|id| {
      id.trim().parse().with_context(|| format!("Invalid admin id `{id}`"))
    })
    .collect()
}

impl Config {
  pub fn from_env() -> anyhow::Result<Self> {
    Ok(Self {
      database_url: env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:referrals.db?mode=rwc".into()),
      port: var_or("PORT", 3000)?,
      admins: parse_admins(&env::var("ADMIN_IDS").unwrap_or_default())?,
      rate_per_second: var_or("RATE_PER_SECOND", 2)?,
      rate_burst: var_or("RATE_BURST", 100)?,
    })
  }
}

pub struct AppState {
  pub db: DatabaseConnection,
  pub config: Config,
}

impl AppState {
  pub async fn new(config: Config) -> anyhow::Result<Self> {
    let db = Database::connect(&config.database_url)
      .await
      .context("Failed to connect to database")?;

    migration::Migrator::up(&db, None)
      .await
      .context("Failed to run migrations")?;

    Ok(Self { db, config })
  }

  /// Ids in `ADMIN_IDS` are admins whatever role the caller claims.
  pub fn actor(&self, id: i64, claimed: Option<UserRole>) -> Actor {
    if self.config.admins.contains(&id) {
      return Actor::new(id, UserRole::Admin);
    }

    let role = match claimed {
      Some(UserRole::Admin) | None => UserRole::Patient,
      Some(role) => role,
    };
    Actor::new(id, role)
  }
}
