use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::orders::{
        ChangeOrderStatusRequest, CheckoutResponse, CreateOrderRequest, OrderList,
        PaidOrderRequest, UpdateStatusBody,
    },
    error::AppResult,
    models::{OrderWithProducts, PaidOrderSummary, PaymentSession},
    response::{ApiResponse, Meta},
    routes::params::OrderPaginationQuery,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/checkout", post(checkout))
        .route("/paid", post(paid_order))
        .route("/{id}", get(get_order))
        .route("/{id}/status", patch(change_order_status))
        .route("/{id}/payment-session", post(create_payment_session))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = ApiResponse<OrderWithProducts>),
        (status = 400, description = "Invalid items or creation failure"),
    ),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderWithProducts>>)> {
    payload.validate()?;
    let order = state.orders.create(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Order created", order, Some(Meta::empty()))),
    ))
}

#[utoipa::path(
    post,
    path = "/api/orders/checkout",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created with payment session", body = ApiResponse<CheckoutResponse>),
        (status = 400, description = "Invalid items or creation failure"),
        (status = 502, description = "Payment gateway failure"),
    ),
    tag = "Orders"
)]
pub async fn checkout(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CheckoutResponse>>)> {
    payload.validate()?;
    let data = state.orders.checkout(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Checkout started", data, Some(Meta::empty()))),
    ))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, starting at 1"),
        ("limit" = Option<i64>, Query, description = "Page size, 1 to 100"),
        ("status" = Option<String>, Query, description = "PENDING, PAID, DELIVERED or CANCELLED"),
        ("sortOrder" = Option<String>, Query, description = "asc or desc by creation time"),
    ),
    responses(
        (status = 200, description = "Orders page", body = ApiResponse<OrderList>),
    ),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderPaginationQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let page = state.orders.find_all(query).await?;
    Ok(Json(ApiResponse::success(
        "Ok",
        OrderList { items: page.data },
        Some(page.meta),
    )))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order with items", body = ApiResponse<OrderWithProducts>),
        (status = 404, description = "Order not found"),
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithProducts>>> {
    let order = state.orders.find_one(id).await?;
    Ok(Json(ApiResponse::success("OK", order, Some(Meta::empty()))))
}

#[utoipa::path(
    patch,
    path = "/api/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = UpdateStatusBody,
    responses(
        (status = 200, description = "Updated order", body = ApiResponse<OrderWithProducts>),
        (status = 400, description = "Status not allowed"),
        (status = 404, description = "Order not found"),
    ),
    tag = "Orders"
)]
pub async fn change_order_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusBody>,
) -> AppResult<Json<ApiResponse<OrderWithProducts>>> {
    let order = state
        .orders
        .change_status(ChangeOrderStatusRequest {
            id,
            status: payload.status,
        })
        .await?;
    Ok(Json(ApiResponse::success("Status updated", order, Some(Meta::empty()))))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/payment-session",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Checkout session", body = ApiResponse<PaymentSession>),
        (status = 404, description = "Order not found"),
        (status = 502, description = "Payment gateway failure"),
    ),
    tag = "Orders"
)]
pub async fn create_payment_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<PaymentSession>>> {
    let session = state.orders.payment_session_for(id).await?;
    Ok(Json(ApiResponse::success("Payment session", session, Some(Meta::empty()))))
}

#[utoipa::path(
    post,
    path = "/api/orders/paid",
    request_body = PaidOrderRequest,
    responses(
        (status = 200, description = "Order settled", body = ApiResponse<PaidOrderSummary>),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order already paid"),
    ),
    tag = "Orders"
)]
pub async fn paid_order(
    State(state): State<AppState>,
    Json(payload): Json<PaidOrderRequest>,
) -> AppResult<Json<ApiResponse<PaidOrderSummary>>> {
    payload.validate()?;
    let summary = state.orders.handle_paid_order(payload).await?;
    Ok(Json(ApiResponse::success("Payment recorded", summary, Some(Meta::empty()))))
}
