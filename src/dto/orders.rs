use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Order, OrderStatus, OrderWithProducts, PaymentSession},
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: i32,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemRequest>,
}

impl CreateOrderRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.items.is_empty() {
            return Err(AppError::BadRequest(
                "items must contain at least 1 element".into(),
            ));
        }
        for item in &self.items {
            if item.product_id <= 0 {
                return Err(AppError::BadRequest(format!(
                    "productId must be a positive number, got {}",
                    item.product_id
                )));
            }
            if item.quantity <= 0 {
                return Err(AppError::BadRequest(format!(
                    "quantity must be a positive number, got {}",
                    item.quantity
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChangeOrderStatusRequest {
    pub id: Uuid,
    pub status: OrderStatus,
}

/// Body of `PATCH /orders/{id}/status`; the id comes from the path.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateStatusBody {
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FindOrderRequest {
    pub id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaidOrderRequest {
    pub order_id: Uuid,
    pub stripe_payment_id: String,
    pub receipt_url: String,
}

impl PaidOrderRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.stripe_payment_id.trim().is_empty() {
            return Err(AppError::BadRequest("stripePaymentId must not be empty".into()));
        }
        if self.receipt_url.trim().is_empty() {
            return Err(AppError::BadRequest("receiptUrl must not be empty".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub order: OrderWithProducts,
    pub payment_session: PaymentSession,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
