use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::entity::CommissionStatus;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("database error: {0}")]
  Db(#[from] sea_orm::DbErr),

  #[error("Referral code not found")]
  NotFound,
  #[error("Referral code is no longer active")]
  Inactive,
  #[error("Referral code has expired")]
  Expired,
  #[error("Referral code has reached its usage limit")]
  UsageLimitExceeded,

  #[error("Referral code already exists")]
  CodeAlreadyExists,
  #[error("Booking has already been paid")]
  BookingAlreadyPaid,
  #[error("User not found")]
  UserNotFound,
  #[error("Payment not found")]
  PaymentNotFound,
  #[error("Caller identity is missing")]
  Unauthorized,
  #[error("Not allowed")]
  Forbidden,
  #[error("Commission cannot move from {from} to {to}")]
  InvalidTransition { from: CommissionStatus, to: CommissionStatus },

  #[error("{0}")]
  InvalidArgs(String),
}

impl Error {
  /// Stable identifier for API clients.
  pub fn code(&self) -> &'static str {
    match self {
      Error::Db(_) => "internal",
      Error::NotFound => "referral_not_found",
      Error::Inactive => "referral_inactive",
      Error::Expired => "referral_expired",
      Error::UsageLimitExceeded => "referral_usage_limit_exceeded",
      Error::CodeAlreadyExists => "referral_code_exists",
      Error::BookingAlreadyPaid => "booking_already_paid",
      Error::UserNotFound => "user_not_found",
      Error::PaymentNotFound => "payment_not_found",
      Error::Unauthorized => "unauthorized",
      Error::Forbidden => "forbidden",
      Error::InvalidTransition { .. } => "invalid_commission_transition",
      Error::InvalidArgs(_) => "invalid_input",
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Error::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
      Error::NotFound | Error::UserNotFound | Error::PaymentNotFound => {
        StatusCode::NOT_FOUND
      }
      Error::Inactive | Error::Expired => StatusCode::UNPROCESSABLE_ENTITY,
      Error::UsageLimitExceeded
      | Error::CodeAlreadyExists
      | Error::BookingAlreadyPaid
      | Error::InvalidTransition { .. } => StatusCode::CONFLICT,
      Error::Unauthorized => StatusCode::UNAUTHORIZED,
      Error::Forbidden => StatusCode::FORBIDDEN,
      Error::InvalidArgs(_) => StatusCode::BAD_REQUEST,
    }
  }

  /// The code itself was refused; the booking can still go ahead at full price.
  pub fn is_referral_rejection(&self) -> bool {
    matches!(
      self,
      Error::NotFound
        | Error::Inactive
        | Error::Expired
        | Error::UsageLimitExceeded
    )
  }
}

impl From<JsonRejection> for Error {
  fn from(rejection: JsonRejection) -> Self {
    Error::InvalidArgs(rejection.body_text())
  }
}

#[derive(Serialize)]
struct ErrorBody {
  success: bool,
  code: &'static str,
  message: String,
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let message = match &self {
      Error::Db(err) => {
        tracing::error!("Database failure: {err}");
        "Internal server error".to_string()
      }
      other => other.to_string(),
    };

    let body = ErrorBody { success: false, code: self.code(), message };
    (self.status(), Json(body)).into_response()
  }
}
