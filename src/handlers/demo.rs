//! Demo arithmetic endpoints guarded by HMAC authentication.
//!
//! - `GET /api/demo/sum?a=5&b=3` - operands in the (signed) query string
//! - `POST /api/demo/sum` with `{"a":5,"b":3}` - operands in the (signed) body
//!
//! Both return the sum as a bare JSON integer.

use axum::Json;
use axum::extract::Query;
use bytes::Bytes;
use tracing::instrument;

use crate::error::{AppError, AppResult};
use crate::models::{SumQuery, SumRequest};

/// Add the `a` and `b` query parameters.
#[instrument]
pub async fn sum(Query(params): Query<SumQuery>) -> AppResult<Json<i32>> {
    checked_sum(params.a, params.b).map(Json)
}

/// Add the operands from a JSON body.
///
/// The body is the replay of the bytes the authentication layer already
/// verified, so the handler parses exactly what was signed.
#[instrument(skip(body), fields(body_len = body.len()))]
pub async fn sum_post(body: Bytes) -> AppResult<Json<i32>> {
    let request: SumRequest = serde_json::from_slice(&body)?;
    checked_sum(request.a, request.b).map(Json)
}

fn checked_sum(a: i32, b: i32) -> AppResult<i32> {
    a.checked_add(b)
        .ok_or_else(|| AppError::BadRequest(format!("{a} + {b} overflows a 32-bit integer")))
}
