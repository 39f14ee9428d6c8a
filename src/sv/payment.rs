use sea_orm::ConnectionTrait;
use serde::Serialize;

use crate::{
  entity::{CommissionStatus, payment},
  pricing::{self, Commission, PricingResult},
  prelude::*,
  sv::Referral,
};

pub struct Payment<'a> {
  db: &'a DatabaseConnection,
}

/// Why a submitted code was not applied at checkout
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
  pub code: &'static str,
  pub message: String,
}

impl From<&Error> for Rejection {
  fn from(err: &Error) -> Self {
    Self { code: err.code(), message: err.to_string() }
  }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkout {
  pub payment: payment::Model,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub rejected: Option<Rejection>,
}

pub(crate) fn normalize_booking(booking_id: &str) -> Result<&str> {
  let booking_id = booking_id.trim();
  if booking_id.is_empty() {
    return Err(Error::InvalidArgs("Booking id is required".into()));
  }
  Ok(booking_id)
}

pub fn pricing_of(payment: &payment::Model) -> PricingResult {
  PricingResult {
    original_amount: payment.original_amount,
    discount: payment.discount,
    final_amount: payment.final_amount,
    savings_percentage: payment.savings_percentage,
  }
}

/// `None` for payments made without a referral
pub fn commission_of(payment: &payment::Model) -> Option<Commission> {
  Some(Commission {
    agent_id: payment.agent_id?,
    commission_rate: payment.commission_rate,
    agent_commission: payment.agent_commission,
    commission_status: payment.commission_status,
  })
}

impl<'a> Payment<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub(crate) async fn find_by_booking<C: ConnectionTrait>(
    conn: &C,
    booking_id: &str,
  ) -> Result<Option<payment::Model>> {
    Ok(
      payment::Entity::find()
        .filter(payment::Column::BookingId.eq(booking_id))
        .one(conn)
        .await?,
    )
  }

  pub async fn by_booking(
    &self,
    booking_id: &str,
  ) -> Result<Option<payment::Model>> {
    Self::find_by_booking(self.db, booking_id.trim()).await
  }

  pub async fn by_id(&self, id: i32) -> Result<Option<payment::Model>> {
    Ok(payment::Entity::find_by_id(id).one(self.db).await?)
  }

  /// Pay for a booking, applying `code` when it is still redeemable.
  /// A refused code falls back to the full fee instead of failing the booking.
  pub async fn checkout(
    &self,
    actor: &Actor,
    booking_id: &str,
    amount: Decimal,
    code: Option<&str>,
  ) -> Result<Checkout> {
    let code = code.map(str::trim).filter(|code| !code.is_empty());

    let Some(code) = code else {
      let payment = self.full_price(actor, booking_id, amount).await?;
      return Ok(Checkout { payment, rejected: None });
    };

    // A booking already settled at full price stays that way on retry.
    if let Some(existing) = self.by_booking(booking_id).await?
      && existing.referral_code.is_none()
    {
      let payment = self.full_price(actor, booking_id, amount).await?;
      return Ok(Checkout { payment, rejected: None });
    }

    match Referral::new(self.db).redeem(actor, booking_id, code, amount).await {
      Ok(redemption) => {
        Ok(Checkout { payment: redemption.payment, rejected: None })
      }
      Err(err) if err.is_referral_rejection() => {
        info!("Booking {booking_id} charged full price, {code} refused: {err}");
        let payment = self.full_price(actor, booking_id, amount).await?;
        Ok(Checkout { payment, rejected: Some(Rejection::from(&err)) })
      }
      Err(err) => Err(err),
    }
  }

  /// Record a booking paid at the undiscounted fee
  pub async fn full_price(
    &self,
    actor: &Actor,
    booking_id: &str,
    amount: Decimal,
  ) -> Result<payment::Model> {
    let booking_id = normalize_booking(booking_id)?;
    pricing::validate_amount(amount)?;

    let txn = self.db.begin().await?;

    if let Some(existing) = Self::find_by_booking(&txn, booking_id).await? {
      if existing.referral_code.is_some() || existing.original_amount != amount
      {
        return Err(Error::BookingAlreadyPaid);
      }
      return Ok(existing);
    }

    let pricing = PricingResult::full_price(amount);
    let now = Utc::now().naive_utc();

    let payment = payment::ActiveModel {
      id: NotSet,
      booking_id: Set(booking_id.to_string()),
      patient_id: Set(actor.id),
      referral_code: Set(None),
      agent_id: Set(None),
      original_amount: Set(pricing.original_amount),
      discount: Set(pricing.discount),
      final_amount: Set(pricing.final_amount),
      savings_percentage: Set(pricing.savings_percentage),
      commission_rate: Set(Decimal::ZERO),
      agent_commission: Set(Decimal::ZERO),
      commission_status: Set(CommissionStatus::Pending),
      created_at: Set(now),
      updated_at: Set(now),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    Ok(payment)
  }

  /// Move an agent commission along its settlement lifecycle (admin only)
  pub async fn set_commission_status(
    &self,
    actor: &Actor,
    payment_id: i32,
    status: CommissionStatus,
  ) -> Result<payment::Model> {
    actor.require_admin()?;

    let payment = self.by_id(payment_id).await?.ok_or(Error::PaymentNotFound)?;

    if payment.agent_id.is_none() {
      return Err(Error::InvalidArgs(
        "Payment has no agent commission".into(),
      ));
    }

    let from = payment.commission_status;
    if !from.can_become(status) {
      return Err(Error::InvalidTransition { from, to: status });
    }

    let payment = payment::ActiveModel {
      commission_status: Set(status),
      updated_at: Set(Utc::now().naive_utc()),
      ..payment.into()
    }
    .update(self.db)
    .await?;

    info!(
      "Admin {} moved commission of payment {} from {} to {}",
      actor.id, payment.id, from, status
    );
    Ok(payment)
  }
}

#[cfg(test)]
mod tests {
  use rust_decimal::dec;

  use super::*;
  use crate::sv::test_utils::{
    ADMIN, PATIENT, insert_code, percentage_code, setup_with_agent,
  };

  #[tokio::test]
  async fn test_checkout_with_code() {
    let db = setup_with_agent().await;
    insert_code(&db, percentage_code("AGENT15", 10)).await;

    let checkout = Payment::new(&db)
      .checkout(&PATIENT, "booking-1", dec!(500), Some("AGENT15"))
      .await
      .unwrap();

    assert!(checkout.rejected.is_none());
    assert_eq!(checkout.payment.final_amount, dec!(425));
    assert_eq!(checkout.payment.agent_commission, dec!(45));
  }

  #[tokio::test]
  async fn test_checkout_falls_back_to_full_price() {
    let db = setup_with_agent().await;
    insert_code(&db, percentage_code("ONCE", 1)).await;

    let payments = Payment::new(&db);
    payments
      .checkout(&PATIENT, "booking-1", dec!(500), Some("ONCE"))
      .await
      .unwrap();

    let checkout = payments
      .checkout(&PATIENT, "booking-2", dec!(500), Some("ONCE"))
      .await
      .unwrap();

    let rejected = checkout.rejected.unwrap();
    assert_eq!(rejected.code, "referral_usage_limit_exceeded");
    assert_eq!(checkout.payment.final_amount, dec!(500));
    assert_eq!(checkout.payment.discount, dec!(0));
    assert_eq!(checkout.payment.referral_code, None);
    assert_eq!(checkout.payment.commission_status, CommissionStatus::Pending);
  }

  #[tokio::test]
  async fn test_checkout_retry_after_refused_code() {
    let db = setup_with_agent().await;
    insert_code(&db, percentage_code("ONCE", 1)).await;

    let payments = Payment::new(&db);
    payments
      .checkout(&PATIENT, "b-1", dec!(500), Some("ONCE"))
      .await
      .unwrap();

    let first = payments
      .checkout(&PATIENT, "b-2", dec!(500), Some("ONCE"))
      .await
      .unwrap();
    assert!(first.rejected.is_some());

    let retry = payments
      .checkout(&PATIENT, "b-2", dec!(500), Some("ONCE"))
      .await
      .unwrap();
    assert_eq!(retry.payment.id, first.payment.id);
    assert_eq!(retry.payment.final_amount, dec!(500));
    assert_eq!(retry.payment.referral_code, None);
    assert!(retry.rejected.is_none());

    // a later, now redeemable code cannot discount a settled booking
    insert_code(&db, percentage_code("FRESH", 5)).await;
    let again = payments
      .checkout(&PATIENT, "b-2", dec!(500), Some("FRESH"))
      .await
      .unwrap();
    assert_eq!(again.payment.id, first.payment.id);

    let fresh = Referral::new(&db).by_code("FRESH").await.unwrap().unwrap();
    assert_eq!(fresh.usage_count, 0);
  }

  #[tokio::test]
  async fn test_checkout_retry_with_other_amount() {
    let db = setup_with_agent().await;
    insert_code(&db, percentage_code("AGENT15", 10)).await;

    let payments = Payment::new(&db);
    payments.checkout(&PATIENT, "b-1", dec!(300), None).await.unwrap();
    let result = payments.checkout(&PATIENT, "b-1", dec!(900), None).await;
    assert!(matches!(result, Err(Error::BookingAlreadyPaid)));

    payments
      .checkout(&PATIENT, "b-2", dec!(500), Some("AGENT15"))
      .await
      .unwrap();
    let result =
      payments.checkout(&PATIENT, "b-2", dec!(900), Some("AGENT15")).await;
    assert!(matches!(result, Err(Error::BookingAlreadyPaid)));
  }

  #[tokio::test]
  async fn test_checkout_without_code_is_idempotent() {
    let db = setup_with_agent().await;

    let payments = Payment::new(&db);
    let first =
      payments.checkout(&PATIENT, "booking-1", dec!(300), None).await.unwrap();
    let again = payments
      .checkout(&PATIENT, "booking-1", dec!(300), Some(" "))
      .await
      .unwrap();

    assert_eq!(first.payment.id, again.payment.id);
  }

  #[tokio::test]
  async fn test_checkout_propagates_input_errors() {
    let db = setup_with_agent().await;

    let result = Payment::new(&db)
      .checkout(&PATIENT, "booking-1", dec!(-1), Some("AGENT15"))
      .await;
    assert!(matches!(result, Err(Error::InvalidArgs(_))));

    let result =
      Payment::new(&db).checkout(&PATIENT, "", dec!(100), None).await;
    assert!(matches!(result, Err(Error::InvalidArgs(_))));
  }

  #[tokio::test]
  async fn test_commission_lifecycle() {
    let db = setup_with_agent().await;
    insert_code(&db, percentage_code("AGENT15", 10)).await;

    let payments = Payment::new(&db);
    let id = payments
      .checkout(&PATIENT, "booking-1", dec!(500), Some("AGENT15"))
      .await
      .unwrap()
      .payment
      .id;

    assert!(matches!(
      payments.set_commission_status(&PATIENT, id, CommissionStatus::Paid).await,
      Err(Error::Forbidden)
    ));

    let held = payments
      .set_commission_status(&ADMIN, id, CommissionStatus::OnHold)
      .await
      .unwrap();
    assert_eq!(held.commission_status, CommissionStatus::OnHold);

    let paid = payments
      .set_commission_status(&ADMIN, id, CommissionStatus::Paid)
      .await
      .unwrap();
    assert_eq!(paid.commission_status, CommissionStatus::Paid);

    let result = payments
      .set_commission_status(&ADMIN, id, CommissionStatus::Calculated)
      .await;
    assert!(matches!(
      result,
      Err(Error::InvalidTransition {
        from: CommissionStatus::Paid,
        to: CommissionStatus::Calculated
      })
    ));
  }

  #[tokio::test]
  async fn test_commission_status_needs_agent() {
    let db = setup_with_agent().await;

    let payments = Payment::new(&db);
    let payment =
      payments.full_price(&PATIENT, "booking-1", dec!(300)).await.unwrap();

    let result = payments
      .set_commission_status(&ADMIN, payment.id, CommissionStatus::Calculated)
      .await;
    assert!(matches!(result, Err(Error::InvalidArgs(_))));

    let result =
      payments.set_commission_status(&ADMIN, 999, CommissionStatus::Paid).await;
    assert!(matches!(result, Err(Error::PaymentNotFound)));
  }

  #[test]
  fn test_status_transitions() {
    use CommissionStatus::*;

    assert!(!Pending.can_become(Calculated));
    assert!(Calculated.can_become(OnHold));
    assert!(OnHold.can_become(Calculated));
    assert!(OnHold.can_become(Paid));
    assert!(!Paid.can_become(OnHold));
    assert!(!Pending.can_become(Paid));
    assert!(!Calculated.can_become(Calculated));
  }
}
