use sea_orm_migration::prelude::*;

use super::{
  m20260901_000001_create_users::Users,
  m20260901_000002_create_referral_codes::ReferralCodes,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Payments::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Payments::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(
            ColumnDef::new(Payments::BookingId).string().not_null().unique_key(),
          )
          .col(ColumnDef::new(Payments::PatientId).big_integer().not_null())
          .col(ColumnDef::new(Payments::ReferralCode).string().null())
          .col(ColumnDef::new(Payments::AgentId).big_integer().null())
          .col(
            ColumnDef::new(Payments::OriginalAmount).decimal_len(12, 2).not_null(),
          )
          .col(ColumnDef::new(Payments::Discount).decimal_len(12, 2).not_null())
          .col(
            ColumnDef::new(Payments::FinalAmount).decimal_len(12, 2).not_null(),
          )
          .col(
            ColumnDef::new(Payments::SavingsPercentage)
              .decimal_len(5, 2)
              .not_null(),
          )
          .col(
            ColumnDef::new(Payments::CommissionRate).decimal_len(5, 2).not_null(),
          )
          .col(
            ColumnDef::new(Payments::AgentCommission)
              .decimal_len(12, 2)
              .not_null(),
          )
          .col(
            ColumnDef::new(Payments::CommissionStatus)
              .string()
              .not_null()
              .default("pending"),
          )
          .col(ColumnDef::new(Payments::CreatedAt).date_time().not_null())
          .col(ColumnDef::new(Payments::UpdatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_payments_referral_code")
              .from(Payments::Table, Payments::ReferralCode)
              .to(ReferralCodes::Table, ReferralCodes::Code)
              .on_delete(ForeignKeyAction::Restrict),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_payments_agent")
              .from(Payments::Table, Payments::AgentId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Restrict),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_payments_agent")
          .table(Payments::Table)
          .col(Payments::AgentId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Payments::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
enum Payments {
  Table,
  Id,
  BookingId,
  PatientId,
  ReferralCode,
  AgentId,
  OriginalAmount,
  Discount,
  FinalAmount,
  SavingsPercentage,
  CommissionRate,
  AgentCommission,
  CommissionStatus,
  CreatedAt,
  UpdatedAt,
}
