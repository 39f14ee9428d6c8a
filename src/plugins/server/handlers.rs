use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use super::extract::{ApiJson, Caller};
use crate::{
  entity::{CommissionStatus, UserRole, payment, referral_code, user},
  pricing::{Commission, PricingResult},
  prelude::*,
  state::AppState,
  sv::{self, payment::Checkout, referral::AgentStats, referral::NewCode},
};

/// `{ "success": true, ...body }`
#[derive(Serialize)]
pub struct Success<T> {
  success: bool,
  #[serde(flatten)]
  body: T,
}

fn ok<T: Serialize>(body: T) -> Json<Success<T>> {
  Json(Success { success: true, body })
}

type Reply<T> = Result<Json<Success<T>>>;

#[derive(Serialize)]
pub struct Health {
  status: &'static str,
}

pub async fn health() -> Json<Health> {
  Json(Health { status: "ok" })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateReq {
  code: String,
  order_amount: Decimal,
}

#[derive(Serialize)]
pub struct Priced {
  pricing: PricingResult,
}

pub async fn validate(
  State(app): State<Arc<AppState>>,
  Caller(actor): Caller,
  ApiJson(req): ApiJson<ValidateReq>,
) -> Reply<Priced> {
  let quote = sv::Referral::new(&app.db)
    .validate(&actor, &req.code, req.order_amount)
    .await?;

  Ok(ok(Priced { pricing: quote.pricing }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemReq {
  code: String,
  order_amount: Decimal,
  booking_id: String,
}

#[derive(Serialize)]
pub struct Redeemed {
  pricing: PricingResult,
  commission: Commission,
}

pub async fn redeem(
  State(app): State<Arc<AppState>>,
  Caller(actor): Caller,
  ApiJson(req): ApiJson<RedeemReq>,
) -> Reply<Redeemed> {
  let redemption = sv::Referral::new(&app.db)
    .redeem(&actor, &req.booking_id, &req.code, req.order_amount)
    .await?;

  Ok(ok(Redeemed {
    pricing: redemption.pricing,
    commission: redemption.commission,
  }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReq {
  booking_id: String,
  order_amount: Decimal,
  #[serde(default)]
  code: Option<String>,
}

pub async fn checkout(
  State(app): State<Arc<AppState>>,
  Caller(actor): Caller,
  ApiJson(req): ApiJson<CheckoutReq>,
) -> Reply<Checkout> {
  let checkout = sv::Payment::new(&app.db)
    .checkout(&actor, &req.booking_id, req.order_amount, req.code.as_deref())
    .await?;

  Ok(ok(checkout))
}

pub async fn booking_payment(
  State(app): State<Arc<AppState>>,
  Caller(actor): Caller,
  Path(booking_id): Path<String>,
) -> Reply<PaymentBody> {
  let payment = sv::Payment::new(&app.db)
    .by_booking(&booking_id)
    .await?
    .ok_or(Error::PaymentNotFound)?;

  actor.require_self_or_admin(payment.patient_id)?;
  Ok(ok(PaymentBody { payment }))
}

#[derive(Deserialize)]
pub struct CreateUserReq {
  id: i64,
  name: String,
  role: UserRole,
}

#[derive(Serialize)]
pub struct UserBody {
  user: user::Model,
}

pub async fn create_user(
  State(app): State<Arc<AppState>>,
  Caller(actor): Caller,
  ApiJson(req): ApiJson<CreateUserReq>,
) -> Reply<UserBody> {
  let user = sv::User::new(&app.db)
    .create(&actor, req.id, &req.name, req.role)
    .await?;

  Ok(ok(UserBody { user }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeBody {
  referral_code: referral_code::Model,
}

pub async fn create_code(
  State(app): State<Arc<AppState>>,
  Caller(actor): Caller,
  ApiJson(req): ApiJson<NewCode>,
) -> Reply<CodeBody> {
  let referral_code =
    sv::Referral::new(&app.db).create_code(&actor, req).await?;

  Ok(ok(CodeBody { referral_code }))
}

pub async fn deactivate_code(
  State(app): State<Arc<AppState>>,
  Caller(actor): Caller,
  Path(code): Path<String>,
) -> Reply<CodeBody> {
  let referral_code =
    sv::Referral::new(&app.db).deactivate(&actor, &code).await?;

  Ok(ok(CodeBody { referral_code }))
}

#[derive(Deserialize)]
pub struct CommissionReq {
  status: CommissionStatus,
}

#[derive(Serialize)]
pub struct PaymentBody {
  payment: payment::Model,
}

pub async fn set_commission_status(
  State(app): State<Arc<AppState>>,
  Caller(actor): Caller,
  Path(id): Path<i32>,
  ApiJson(req): ApiJson<CommissionReq>,
) -> Reply<PaymentBody> {
  let payment = sv::Payment::new(&app.db)
    .set_commission_status(&actor, id, req.status)
    .await?;

  Ok(ok(PaymentBody { payment }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodesBody {
  referral_codes: Vec<referral_code::Model>,
}

pub async fn agent_codes(
  State(app): State<Arc<AppState>>,
  Caller(actor): Caller,
  Path(agent_id): Path<i64>,
) -> Reply<CodesBody> {
  let referral_codes =
    sv::Referral::new(&app.db).codes_by_agent(&actor, agent_id).await?;

  Ok(ok(CodesBody { referral_codes }))
}

#[derive(Serialize)]
pub struct StatsBody {
  stats: AgentStats,
}

pub async fn agent_stats(
  State(app): State<Arc<AppState>>,
  Caller(actor): Caller,
  Path(agent_id): Path<i64>,
) -> Reply<StatsBody> {
  let stats = sv::Referral::new(&app.db).agent_stats(&actor, agent_id).await?;

  Ok(ok(StatsBody { stats }))
}
