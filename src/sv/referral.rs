use sea_orm::{ConnectionTrait, sea_query::{Condition, Expr}};
use serde::{Deserialize, Serialize};

use crate::{
  entity::{CommissionStatus, DiscountType, payment, referral_code},
  pricing::{self, Commission, PricingResult, Quote},
  prelude::*,
  sv,
};

pub struct Referral<'a> {
  db: &'a DatabaseConnection,
}

const MAX_CODE_LEN: usize = 64;

/// Admin payload for a new referral code
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCode {
  pub code: String,
  pub discount_type: DiscountType,
  pub discount_value: Decimal,
  pub max_usage: i32,
  #[serde(default)]
  pub expiration_date: Option<DateTime>,
  pub commission_rate: Decimal,
  pub agent_id: i64,
}

/// Outcome of a successful redemption, backed by the stored payment
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Redemption {
  pub pricing: PricingResult,
  pub commission: Commission,
  pub payment: payment::Model,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentStats {
  pub redemptions: u64,
  pub total_discount: Decimal,
  pub commission_calculated: Decimal,
  pub commission_on_hold: Decimal,
  pub commission_paid: Decimal,
}

fn normalize_code(code: &str) -> Result<&str> {
  let code = code.trim();
  if code.is_empty() {
    return Err(Error::InvalidArgs("Referral code is required".into()));
  }
  Ok(code)
}

fn percent_in_range(value: Decimal) -> bool {
  (Decimal::ZERO..=Decimal::ONE_HUNDRED).contains(&value)
}

impl<'a> Referral<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  async fn find<C: ConnectionTrait>(
    conn: &C,
    code: &str,
  ) -> Result<Option<referral_code::Model>> {
    Ok(referral_code::Entity::find_by_id(code).one(conn).await?)
  }

  /// Exact, case-sensitive lookup
  pub async fn by_code(
    &self,
    code: &str,
  ) -> Result<Option<referral_code::Model>> {
    Self::find(self.db, code).await
  }

  /// Consume one unit of the usage cap in a single conditional update.
  /// Returns `false` when the code was not applicable at `now`.
  pub async fn try_consume<C: ConnectionTrait>(
    conn: &C,
    code: &str,
    now: DateTime,
  ) -> Result<bool> {
    use referral_code::Column;

    let result = referral_code::Entity::update_many()
      .col_expr(Column::UsageCount, Expr::col(Column::UsageCount).add(1))
      .filter(Column::Code.eq(code))
      .filter(Column::IsActive.eq(true))
      .filter(Expr::col(Column::UsageCount).lt(Expr::col(Column::MaxUsage)))
      .filter(
        Condition::any()
          .add(Column::ExpirationDate.is_null())
          .add(Column::ExpirationDate.gte(now)),
      )
      .exec(conn)
      .await?;

    Ok(result.rows_affected == 1)
  }

  /// Price an order with a code without consuming it
  pub async fn validate(
    &self,
    actor: &Actor,
    code: &str,
    amount: Decimal,
  ) -> Result<Quote> {
    let code = normalize_code(code)?;
    pricing::validate_amount(amount)?;

    let record = self.by_code(code).await?.ok_or(Error::NotFound)?;
    let quote = pricing::quote(&record, amount, Utc::now().naive_utc())
      .inspect_err(|err| {
        debug!("Code {code} rejected for actor {}: {err}", actor.id)
      })?;

    debug!(
      "Code {} quoted for actor {}: {} -> {}",
      code, actor.id, amount, quote.pricing.final_amount
    );
    Ok(quote)
  }

  /// Apply a code to a booking.
  ///
  /// The usage increment and the payment carrying the commission are written
  /// in one transaction, so a failed payment insert never leaves a consumed
  /// redemption behind. Retrying the same booking with the same code returns
  /// the stored result without touching the counter.
  pub async fn redeem(
    &self,
    actor: &Actor,
    booking_id: &str,
    code: &str,
    amount: Decimal,
  ) -> Result<Redemption> {
    let booking_id = sv::payment::normalize_booking(booking_id)?;
    let code = normalize_code(code)?;
    pricing::validate_amount(amount)?;

    let txn = self.db.begin().await?;

    if let Some(existing) = sv::Payment::find_by_booking(&txn, booking_id).await?
    {
      if existing.referral_code.as_deref() != Some(code)
        || existing.original_amount != amount
      {
        return Err(Error::BookingAlreadyPaid);
      }
      let commission = sv::payment::commission_of(&existing)
        .ok_or(Error::BookingAlreadyPaid)?;

      debug!("Booking {booking_id} already redeemed {code}, replaying");
      return Ok(Redemption {
        pricing: sv::payment::pricing_of(&existing),
        commission,
        payment: existing,
      });
    }

    let now = Utc::now().naive_utc();
    let record = Self::find(&txn, code).await?.ok_or(Error::NotFound)?;
    let quote = pricing::quote(&record, amount, now).inspect_err(|err| {
      warn!("Redemption of {code} for booking {booking_id} refused: {err}")
    })?;
    let commission = quote.commission()?;

    if !Self::try_consume(&txn, code, now).await? {
      // Lost a race since the read above; report what changed.
      let current = Self::find(&txn, code).await?.ok_or(Error::NotFound)?;
      let err = pricing::check(&current, now)
        .err()
        .unwrap_or(Error::UsageLimitExceeded);

      warn!("Redemption of {code} for booking {booking_id} refused: {err}");
      return Err(err);
    }

    let pricing = quote.pricing;

    let payment = payment::ActiveModel {
      id: NotSet,
      booking_id: Set(booking_id.to_string()),
      patient_id: Set(actor.id),
      referral_code: Set(Some(quote.code.clone())),
      agent_id: Set(Some(commission.agent_id)),
      original_amount: Set(pricing.original_amount),
      discount: Set(pricing.discount),
      final_amount: Set(pricing.final_amount),
      savings_percentage: Set(pricing.savings_percentage),
      commission_rate: Set(commission.commission_rate),
      agent_commission: Set(commission.agent_commission),
      commission_status: Set(commission.commission_status),
      created_at: Set(now),
      updated_at: Set(now),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    info!(
      "Code {} redeemed for booking {} by {}: discount {}, commission {} to agent {}",
      code,
      booking_id,
      actor.id,
      pricing.discount,
      commission.agent_commission,
      commission.agent_id
    );

    Ok(Redemption { pricing, commission, payment })
  }

  /// Create a code for an agent (admin only)
  pub async fn create_code(
    &self,
    actor: &Actor,
    new: NewCode,
  ) -> Result<referral_code::Model> {
    actor.require_admin()?;

    let code = normalize_code(&new.code)?;
    if code.len() > MAX_CODE_LEN || code.chars().any(char::is_whitespace) {
      return Err(Error::InvalidArgs(format!(
        "Referral code must be at most {MAX_CODE_LEN} characters without spaces"
      )));
    }

    match new.discount_type {
      DiscountType::Percentage if !percent_in_range(new.discount_value) => {
        return Err(Error::InvalidArgs(
          "Percentage discount must be between 0 and 100".into(),
        ));
      }
      DiscountType::Fixed if new.discount_value < Decimal::ZERO => {
        return Err(Error::InvalidArgs(
          "Fixed discount cannot be negative".into(),
        ));
      }
      _ => {}
    }

    if !percent_in_range(new.commission_rate) {
      return Err(Error::InvalidArgs(
        "Commission rate must be between 0 and 100".into(),
      ));
    }

    if new.max_usage < 1 {
      return Err(Error::InvalidArgs("Usage limit must be at least 1".into()));
    }

    let now = Utc::now().naive_utc();
    if new.expiration_date.is_some_and(|exp| exp <= now) {
      return Err(Error::InvalidArgs(
        "Expiration date must be in the future".into(),
      ));
    }

    sv::User::new(self.db).agent(new.agent_id).await?;

    if self.by_code(code).await?.is_some() {
      return Err(Error::CodeAlreadyExists);
    }

    let model = referral_code::ActiveModel {
      code: Set(code.to_string()),
      discount_type: Set(new.discount_type),
      discount_value: Set(new.discount_value),
      usage_count: Set(0),
      max_usage: Set(new.max_usage),
      expiration_date: Set(new.expiration_date),
      is_active: Set(true),
      commission_rate: Set(new.commission_rate),
      agent_id: Set(new.agent_id),
      created_by: Set(actor.id),
      created_at: Set(now),
    }
    .insert(self.db)
    .await?;

    info!(
      "Admin {} created code {} for agent {}",
      actor.id, model.code, model.agent_id
    );
    Ok(model)
  }

  /// Switch a code off for good (admin only)
  pub async fn deactivate(
    &self,
    actor: &Actor,
    code: &str,
  ) -> Result<referral_code::Model> {
    actor.require_admin()?;

    let record = self.by_code(code).await?.ok_or(Error::NotFound)?;
    if !record.is_active {
      return Ok(record);
    }

    let record =
      referral_code::ActiveModel { is_active: Set(false), ..record.into() }
        .update(self.db)
        .await?;

    info!("Admin {} deactivated code {}", actor.id, record.code);
    Ok(record)
  }

  pub async fn codes_by_agent(
    &self,
    actor: &Actor,
    agent_id: i64,
  ) -> Result<Vec<referral_code::Model>> {
    actor.require_self_or_admin(agent_id)?;

    Ok(
      referral_code::Entity::find()
        .filter(referral_code::Column::AgentId.eq(agent_id))
        .order_by_desc(referral_code::Column::CreatedAt)
        .all(self.db)
        .await?,
    )
  }

  /// Redemption and earnings totals for an agent
  pub async fn agent_stats(
    &self,
    actor: &Actor,
    agent_id: i64,
  ) -> Result<AgentStats> {
    actor.require_self_or_admin(agent_id)?;

    let payments = payment::Entity::find()
      .filter(payment::Column::AgentId.eq(agent_id))
      .all(self.db)
      .await?;

    let mut stats = AgentStats::default();
    for payment in payments {
      stats.redemptions += 1;
      stats.total_discount += payment.discount;

      match payment.commission_status {
        CommissionStatus::Calculated => {
          stats.commission_calculated += payment.agent_commission
        }
        CommissionStatus::OnHold => {
          stats.commission_on_hold += payment.agent_commission
        }
        CommissionStatus::Paid => {
          stats.commission_paid += payment.agent_commission
        }
        CommissionStatus::Pending => {}
      }
    }

    Ok(stats)
  }
}
