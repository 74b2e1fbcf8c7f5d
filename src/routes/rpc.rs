//! Message-name dispatch: `POST /rpc/{message}` with the JSON payload as body.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    routing::post,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    dto::orders::{ChangeOrderStatusRequest, CreateOrderRequest, FindOrderRequest, PaidOrderRequest},
    error::{AppError, AppResult},
    models::OrderWithProducts,
    routes::params::OrderPaginationQuery,
    state::AppState,
};

pub const CREATE_ORDER: &str = "create_order";
pub const FIND_ALL_ORDERS: &str = "find_all_orders";
pub const FIND_ONE_ORDER: &str = "find_one_order";
pub const CHANGE_ORDER_STATUS: &str = "change_order_status";
pub const PAYMENT_SUCCEEDED: &str = "payment.succeeded";
pub const CREATE_PAYMENT_SESSION: &str = "create_payment_session";

pub fn router() -> Router<AppState> {
    Router::new().route("/{message}", post(handle_message))
}

#[utoipa::path(
    post,
    path = "/rpc/{message}",
    params(("message" = String, Path, description = "Message name, e.g. create_order")),
    request_body(content = Value, content_type = "application/json", description = "JSON payload for the message"),
    responses(
        (status = 200, description = "Operation result"),
        (status = 400, description = "Malformed payload or creation failure"),
        (status = 404, description = "Unknown message or order not found"),
    ),
    tag = "RPC"
)]
pub async fn handle_message(
    State(state): State<AppState>,
    Path(message): Path<String>,
    body: Bytes,
) -> AppResult<Json<Value>> {
    tracing::debug!(rpc = %message, "rpc message received");
    let payload = parse_payload(&body)?;
    dispatch(&state, &message, payload).await.map(Json)
}

pub async fn dispatch(state: &AppState, message: &str, payload: Value) -> AppResult<Value> {
    let orders = &state.orders;
    match message {
        CREATE_ORDER => {
            let request: CreateOrderRequest = decode(payload)?;
            request.validate()?;
            encode(orders.create(request).await?)
        }
        FIND_ALL_ORDERS => {
            let query: OrderPaginationQuery = if payload.is_null() {
                OrderPaginationQuery::default()
            } else {
                decode(payload)?
            };
            encode(orders.find_all(query).await?)
        }
        FIND_ONE_ORDER => {
            let id = order_id(payload)?;
            encode(orders.find_one(id).await?)
        }
        CHANGE_ORDER_STATUS => {
            let request: ChangeOrderStatusRequest = decode(payload)?;
            encode(orders.change_status(request).await?)
        }
        PAYMENT_SUCCEEDED => {
            let request: PaidOrderRequest = decode(payload)?;
            request.validate()?;
            encode(orders.handle_paid_order(request).await?)
        }
        CREATE_PAYMENT_SESSION => {
            let order: OrderWithProducts = decode(payload)?;
            encode(orders.create_payment_session(&order).await?)
        }
        other => Err(AppError::NotFound(format!("No handler for message {other}"))),
    }
}

/// An empty body is a `null` payload.
fn parse_payload(body: &[u8]) -> AppResult<Value> {
    if body.trim_ascii().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("malformed payload: {e}")))
}

/// Accepts either a bare id string or `{"id": ...}`.
fn order_id(payload: Value) -> AppResult<Uuid> {
    match payload {
        Value::String(raw) => Uuid::parse_str(&raw)
            .map_err(|e| AppError::BadRequest(format!("invalid order id: {e}"))),
        other => decode::<FindOrderRequest>(other).map(|req| req.id),
    }
}

fn decode<T: DeserializeOwned>(payload: Value) -> AppResult<T> {
    serde_json::from_value(payload).map_err(|e| AppError::BadRequest(e.to_string()))
}

fn encode<T: serde::Serialize>(value: T) -> AppResult<Value> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.into()))
}
