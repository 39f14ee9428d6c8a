use std::sync::Arc;

use axum::{
  extract::{FromRequest, FromRequestParts},
  http::request::Parts,
};

use crate::{entity::UserRole, prelude::*, state::AppState};

pub const ACTOR_ID: &str = "x-actor-id";
pub const ACTOR_ROLE: &str = "x-actor-role";

/// The identified caller, taken from headers set by the upstream gateway.
pub struct Caller(pub Actor);

impl FromRequestParts<Arc<AppState>> for Caller {
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    app: &Arc<AppState>,
  ) -> Result<Self, Self::Rejection> {
    let header = |name: &'static str| {
      parts.headers.get(name).and_then(|value| value.to_str().ok())
    };

    let id = header(ACTOR_ID)
      .and_then(|id| id.trim().parse::<i64>().ok())
      .ok_or(Error::Unauthorized)?;
    let role = header(ACTOR_ROLE).and_then(|role| role.parse::<UserRole>().ok());

    Ok(Caller(app.actor(id, role)))
  }
}

/// `Json` whose rejections use the API error envelope
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct ApiJson<T>(pub T);
