//! Persistence for orders, their line items and settlement records.
//!
//! The workflow only sees [`OrderStore`]; `postgres` backs it with sea-orm and
//! `memory` keeps everything in-process.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Order, OrderRecord, OrderStatus, PaidOrderSummary, SortOrder};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryOrderStore;
pub use postgres::SeaOrderStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("order {0} not found")]
    NotFound(Uuid),

    #[error("order {0} is already paid")]
    AlreadyPaid(Uuid),

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("ORM error")]
    Orm(#[from] sea_orm::DbErr),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
    pub product_id: i32,
    pub quantity: i32,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub total_amount: f64,
    pub total_items: i32,
    pub items: Vec<NewOrderItem>,
}

/// Predicate shared by `count_orders` and `list_orders`.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Clone)]
pub struct PageRequest {
    pub offset: u64,
    pub limit: u64,
    pub sort_order: SortOrder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SettleOrder {
    pub order_id: Uuid,
    pub stripe_charge_id: String,
    pub receipt_url: String,
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts the order and all of its items as one unit.
    async fn create_order(&self, order: NewOrder) -> StoreResult<OrderRecord>;

    async fn find_order(&self, id: Uuid) -> StoreResult<Option<OrderRecord>>;

    async fn count_orders(&self, filter: &OrderFilter) -> StoreResult<u64>;

    async fn list_orders(&self, filter: &OrderFilter, page: &PageRequest)
    -> StoreResult<Vec<Order>>;

    /// Writes `status` and the `paid` flag it implies. Items are untouched.
    async fn update_status(&self, id: Uuid, status: OrderStatus) -> StoreResult<Order>;

    /// Marks the order paid and records its payment and receipt in one transaction.
    async fn settle_order(&self, settlement: SettleOrder) -> StoreResult<PaidOrderSummary>;
}
