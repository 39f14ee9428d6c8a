use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{payment, referral_code};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
  #[sea_orm(string_value = "patient")]
  #[default]
  Patient,
  #[sea_orm(string_value = "doctor")]
  Doctor,
  #[sea_orm(string_value = "agent")]
  Agent,
  #[sea_orm(string_value = "admin")]
  Admin,
}

impl std::str::FromStr for UserRole {
  type Err = ();

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "patient" => Ok(Self::Patient),
      "doctor" => Ok(Self::Doctor),
      "agent" => Ok(Self::Agent),
      "admin" => Ok(Self::Admin),
      _ => Err(()),
    }
  }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
#[serde(rename_all = "camelCase")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: i64,
  pub name: String,
  pub role: UserRole,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "referral_code::Entity")]
  ReferralCodes,
  #[sea_orm(has_many = "payment::Entity")]
  Payments,
}

impl Related<referral_code::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::ReferralCodes.def()
  }
}

impl Related<payment::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Payments.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
