//! Referral discount and commission arithmetic.
//!
//! Everything here is pure: callers pass the code record and the current
//! time, and persistence lives in [`crate::sv::Referral`].

use rust_decimal::RoundingStrategy;
use serde::{Deserialize, Serialize};

use crate::{
  entity::{CommissionStatus, DiscountType, referral_code},
  prelude::*,
};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingResult {
  pub original_amount: Decimal,
  pub discount: Decimal,
  pub final_amount: Decimal,
  pub savings_percentage: Decimal,
}

impl PricingResult {
  /// Price with no referral applied.
  pub fn full_price(amount: Decimal) -> Self {
    Self {
      original_amount: amount,
      discount: Decimal::ZERO,
      final_amount: amount,
      savings_percentage: Decimal::ZERO,
    }
  }
}

/// A priced, still unredeemed application of a code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
  pub code: String,
  pub pricing: PricingResult,
  pub agent_id: i64,
  pub commission_rate: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commission {
  pub agent_id: i64,
  pub commission_rate: Decimal,
  pub agent_commission: Decimal,
  pub commission_status: CommissionStatus,
}

fn round_money(value: Decimal) -> Decimal {
  value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `percent`% of `value`. The rate is scaled down first, so any rate in
/// `0..=100` stays within `value`.
fn percent_of(value: Decimal, percent: Decimal) -> Result<Decimal> {
  (percent / HUNDRED)
    .checked_mul(value)
    .ok_or_else(|| Error::InvalidArgs("Amount is out of range".into()))
}

/// Rejects codes that are deactivated, past their expiration or exhausted.
pub fn check(code: &referral_code::Model, now: DateTime) -> Result<()> {
  if !code.is_active {
    return Err(Error::Inactive);
  }

  if let Some(expires) = code.expiration_date
    && now > expires
  {
    return Err(Error::Expired);
  }

  if code.usage_count >= code.max_usage {
    return Err(Error::UsageLimitExceeded);
  }

  Ok(())
}

/// Discount for `amount`, never more than `amount` itself.
pub fn discount(
  ty: DiscountType,
  value: Decimal,
  amount: Decimal,
) -> Result<Decimal> {
  let raw = match ty {
    DiscountType::Percentage => percent_of(amount, value)?,
    DiscountType::Fixed => value.min(amount),
  };

  Ok(round_money(raw).min(amount).max(Decimal::ZERO))
}

pub fn price(
  ty: DiscountType,
  value: Decimal,
  amount: Decimal,
) -> Result<PricingResult> {
  let discount = discount(ty, value, amount)?;
  let final_amount = (amount - discount).max(Decimal::ZERO);

  // discount <= amount, so the ratio is at most one
  let savings_percentage = if amount.is_zero() {
    Decimal::ZERO
  } else {
    (discount / amount * HUNDRED).round_dp(2)
  };

  Ok(PricingResult {
    original_amount: amount,
    discount,
    final_amount,
    savings_percentage,
  })
}

/// Agent earnings are a share of the discount, not of the order.
pub fn commission(discount: Decimal, rate: Decimal) -> Result<Decimal> {
  percent_of(discount, rate).map(round_money)
}

pub fn validate_amount(amount: Decimal) -> Result<()> {
  if amount <= Decimal::ZERO {
    return Err(Error::InvalidArgs("Order amount must be positive".into()));
  }
  Ok(())
}

pub fn quote(
  code: &referral_code::Model,
  amount: Decimal,
  now: DateTime,
) -> Result<Quote> {
  validate_amount(amount)?;
  check(code, now)?;

  Ok(Quote {
    code: code.code.clone(),
    pricing: price(code.discount_type, code.discount_value, amount)?,
    agent_id: code.agent_id,
    commission_rate: code.commission_rate,
  })
}

impl Quote {
  pub fn commission(&self) -> Result<Commission> {
    let agent_commission =
      commission(self.pricing.discount, self.commission_rate)?;

    Ok(Commission {
      agent_id: self.agent_id,
      commission_rate: self.commission_rate,
      agent_commission,
      commission_status: CommissionStatus::Calculated,
    })
  }
}
