//! Request extractor for the acting user.
//!
//! Authentication happens in front of this API; the gateway forwards the
//! authenticated user and role as `x-actor-id` and `x-actor-role`.

use axum::{extract::FromRequestParts, http::request::Parts};
use depot_core::access::Actor;

use crate::error::ApiError;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// The [`Actor`] named by the request headers.
pub struct RequestActor(pub Actor);

impl<S: Send + Sync> FromRequestParts<S> for RequestActor {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    let user = header(parts, ACTOR_ID_HEADER).ok_or(ApiError::Unauthenticated)?;
    let role =
      header(parts, ACTOR_ROLE_HEADER).ok_or(ApiError::Unauthenticated)?;
    Ok(Self(Actor::new(user, role)))
  }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
  parts
    .headers
    .get(name)
    .and_then(|v| v.to_str().ok())
    .map(str::trim)
    .filter(|v| !v.is_empty())
}
