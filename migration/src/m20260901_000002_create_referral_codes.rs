use sea_orm_migration::prelude::*;

use super::m20260901_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(ReferralCodes::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(ReferralCodes::Code)
              .string()
              .not_null()
              .primary_key(),
          )
          .col(ColumnDef::new(ReferralCodes::DiscountType).string().not_null())
          .col(
            ColumnDef::new(ReferralCodes::DiscountValue)
              .decimal_len(12, 2)
              .not_null(),
          )
          .col(
            ColumnDef::new(ReferralCodes::UsageCount)
              .integer()
              .not_null()
              .default(0),
          )
          .col(ColumnDef::new(ReferralCodes::MaxUsage).integer().not_null())
          .col(ColumnDef::new(ReferralCodes::ExpirationDate).date_time().null())
          .col(
            ColumnDef::new(ReferralCodes::IsActive)
              .boolean()
              .not_null()
              .default(true),
          )
          .col(
            ColumnDef::new(ReferralCodes::CommissionRate)
              .decimal_len(5, 2)
              .not_null(),
          )
          .col(ColumnDef::new(ReferralCodes::AgentId).big_integer().not_null())
          .col(ColumnDef::new(ReferralCodes::CreatedBy).big_integer().not_null())
          .col(ColumnDef::new(ReferralCodes::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_referral_codes_agent")
              .from(ReferralCodes::Table, ReferralCodes::AgentId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Restrict),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_referral_codes_agent")
          .table(ReferralCodes::Table)
          .col(ReferralCodes::AgentId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(ReferralCodes::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum ReferralCodes {
  Table,
  Code,
  DiscountType,
  DiscountValue,
  UsageCount,
  MaxUsage,
  ExpirationDate,
  IsActive,
  CommissionRate,
  AgentId,
  CreatedBy,
  CreatedAt,
}
