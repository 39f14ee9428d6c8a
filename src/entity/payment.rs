use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{referral_code, user};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum CommissionStatus {
  #[sea_orm(string_value = "pending")]
  #[default]
  Pending,
  #[sea_orm(string_value = "calculated")]
  Calculated,
  #[sea_orm(string_value = "paid")]
  Paid,
  #[sea_orm(string_value = "on_hold")]
  OnHold,
}

impl CommissionStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Pending => "pending",
      Self::Calculated => "calculated",
      Self::Paid => "paid",
      Self::OnHold => "on_hold",
    }
  }

  /// `pending` marks payments without a referral and never moves. `paid` is
  /// terminal; `on_hold` can be released back or settled directly.
  pub fn can_become(self, next: Self) -> bool {
    use CommissionStatus::*;

    matches!(
      (self, next),
      (Calculated, Paid)
        | (Calculated, OnHold)
        | (OnHold, Calculated)
        | (OnHold, Paid)
    )
  }
}

impl std::fmt::Display for CommissionStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
#[serde(rename_all = "camelCase")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  #[sea_orm(unique)]
  pub booking_id: String,
  pub patient_id: i64,
  pub referral_code: Option<String>,
  pub agent_id: Option<i64>,
  pub original_amount: Decimal,
  pub discount: Decimal,
  pub final_amount: Decimal,
  pub savings_percentage: Decimal,
  pub commission_rate: Decimal,
  pub agent_commission: Decimal,
  pub commission_status: CommissionStatus,
  pub created_at: DateTime,
  pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "referral_code::Entity",
    from = "Column::ReferralCode",
    to = "referral_code::Column::Code"
  )]
  ReferralCode,
  #[sea_orm(
    belongs_to = "user::Entity",
    from = "Column::AgentId",
    to = "user::Column::Id"
  )]
  Agent,
}

impl Related<referral_code::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::ReferralCode.def()
  }
}

impl Related<user::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Agent.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
