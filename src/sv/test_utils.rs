//! Shared test utilities for database setup

use rust_decimal::dec;

use crate::{
  entity::{DiscountType, UserRole, referral_code},
  prelude::*,
  sv,
};

pub const ADMIN: Actor = Actor { id: 1, role: UserRole::Admin };
pub const AGENT: Actor = Actor { id: 20, role: UserRole::Agent };
pub const PATIENT: Actor = Actor { id: 300, role: UserRole::Patient };

#[cfg(test)]
pub mod test_db {
  use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, DbBackend, Schema,
  };

  use crate::entity::*;

  /// Creates an in-memory SQLite database with all required tables
  pub async fn setup() -> DatabaseConnection {
    connect("sqlite::memory:").await
  }

  /// Same schema on a database file, served by a multi-connection pool
  pub async fn setup_file(path: &std::path::Path) -> DatabaseConnection {
    connect(&format!("sqlite://{}?mode=rwc", path.display())).await
  }

  async fn connect(url: &str) -> DatabaseConnection {
    let db = Database::connect(url).await.unwrap();
    let schema = Schema::new(DbBackend::Sqlite);

    // Create user table
    let stmt = schema.create_table_from_entity(user::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    // Create referral_code table
    let stmt = schema.create_table_from_entity(referral_code::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    // Create payment table
    let stmt = schema.create_table_from_entity(payment::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    db
  }
}

/// Registers [`AGENT`] and returns a fresh database
pub async fn setup_with_agent() -> DatabaseConnection {
  with_agent(test_db::setup().await).await
}

pub async fn with_agent(db: DatabaseConnection) -> DatabaseConnection {
  sv::User::new(&db)
    .create(&ADMIN, AGENT.id, "Agent", UserRole::Agent)
    .await
    .unwrap();
  db
}

/// AGENT15 style code: 15% off, 60% of the discount goes to the agent
pub fn percentage_code(code: &str, max_usage: i32) -> sv::referral::NewCode {
  sv::referral::NewCode {
    code: code.into(),
    discount_type: DiscountType::Percentage,
    discount_value: dec!(15),
    max_usage,
    expiration_date: None,
    commission_rate: dec!(60),
    agent_id: AGENT.id,
  }
}

pub async fn insert_code(
  db: &DatabaseConnection,
  new: sv::referral::NewCode,
) -> referral_code::Model {
  sv::Referral::new(db).create_code(&ADMIN, new).await.unwrap()
}
