use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    clients::{PaymentGateway, PaymentSessionItem, PaymentSessionRequest, ProductDirectory},
    dto::orders::{ChangeOrderStatusRequest, CheckoutResponse, CreateOrderRequest, PaidOrderRequest},
    error::{AppError, AppResult},
    models::{
        Order, OrderItemView, OrderRecord, OrderStatus, OrderWithProducts, PaidOrderSummary,
        PaymentSession, Product,
    },
    response::{Meta, Page},
    routes::params::OrderPaginationQuery,
    store::{NewOrder, NewOrderItem, OrderFilter, OrderStore, PageRequest, SettleOrder},
};

pub const CREATE_ORDER_FAILED: &str = "Error creating order.";

/// Order workflow: creation, retrieval, status changes and settlement.
///
/// Holds its store and both collaborators as shared handles, so one instance
/// serves every request.
pub struct OrderService {
    store: Arc<dyn OrderStore>,
    products: Arc<dyn ProductDirectory>,
    payments: Arc<dyn PaymentGateway>,
    currency: String,
}

impl OrderService {
    pub fn new(
        store: Arc<dyn OrderStore>,
        products: Arc<dyn ProductDirectory>,
        payments: Arc<dyn PaymentGateway>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            store,
            products,
            payments,
            currency: currency.into(),
        }
    }

    /// Prices the requested items against the catalog and persists the order.
    ///
    /// Every failure is reported as the same `BadRequest`; the cause is only logged.
    pub async fn create(&self, request: CreateOrderRequest) -> AppResult<OrderWithProducts> {
        match self.try_create(request).await {
            Ok(order) => Ok(order),
            Err(err) => {
                tracing::error!(error = ?err, "Error creating order");
                Err(AppError::BadRequest(CREATE_ORDER_FAILED.into()))
            }
        }
    }

    async fn try_create(&self, request: CreateOrderRequest) -> AppResult<OrderWithProducts> {
        let ids = distinct_product_ids(request.items.iter().map(|item| item.product_id));
        let products = self.products.validate_products(&ids).await?;
        let catalog = index_products(&products);

        let items: Vec<NewOrderItem> = request
            .items
            .iter()
            .map(|item| NewOrderItem {
                product_id: item.product_id,
                quantity: item.quantity,
                // Unknown products are priced at zero rather than failing the order.
                price: catalog.get(&item.product_id).map_or(0.0, |p| p.price),
            })
            .collect();

        let total_items = items
            .iter()
            .try_fold(0i32, |acc, item| acc.checked_add(item.quantity))
            .ok_or_else(|| AppError::BadRequest("total item count is out of range".into()))?;
        let total_amount: f64 = items
            .iter()
            .map(|item| item.price * f64::from(item.quantity))
            .sum();

        let record = self
            .store
            .create_order(NewOrder {
                total_amount,
                total_items,
                items,
            })
            .await?;

        tracing::info!(
            order_id = %record.order.id,
            total_items = record.order.total_items,
            total_amount = record.order.total_amount,
            "order created"
        );

        Ok(with_product_names(record, |product_id| {
            Some(
                catalog
                    .get(&product_id)
                    .map(|p| p.name.clone())
                    .unwrap_or_default(),
            )
        }))
    }

    /// Requests a hosted checkout session for an already created order.
    pub async fn create_payment_session(
        &self,
        order: &OrderWithProducts,
    ) -> AppResult<PaymentSession> {
        let request = PaymentSessionRequest {
            order_id: order.order.id,
            currency: self.currency.clone(),
            items: order
                .order_items
                .iter()
                .map(|item| PaymentSessionItem {
                    name: item.name.clone().unwrap_or_default(),
                    price: item.price,
                    quantity: item.quantity,
                })
                .collect(),
        };

        Ok(self.payments.create_payment_session(request).await?)
    }

    /// Creates the order and immediately opens its payment session.
    pub async fn checkout(&self, request: CreateOrderRequest) -> AppResult<CheckoutResponse> {
        let order = self.create(request).await?;
        let payment_session = self.create_payment_session(&order).await?;
        Ok(CheckoutResponse {
            order,
            payment_session,
        })
    }

    pub async fn payment_session_for(&self, id: Uuid) -> AppResult<PaymentSession> {
        let order = self.find_one(id).await?;
        self.create_payment_session(&order).await
    }

    pub async fn find_all(&self, query: OrderPaginationQuery) -> AppResult<Page<Order>> {
        let (page, limit, offset) = query.normalize();
        let filter = OrderFilter {
            status: query.status,
        };

        let total = self.store.count_orders(&filter).await?;
        let data = self
            .store
            .list_orders(
                &filter,
                &PageRequest {
                    offset: offset as u64,
                    limit: limit as u64,
                    sort_order: query.sort_order.unwrap_or_default(),
                },
            )
            .await?;

        Ok(Page {
            data,
            meta: Meta::new(page, limit, total as i64),
        })
    }

    pub async fn find_one(&self, id: Uuid) -> AppResult<OrderWithProducts> {
        let record = self
            .store
            .find_order(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order with id {id} not found")))?;

        let ids = distinct_product_ids(record.items.iter().map(|item| item.product_id));
        let products = if ids.is_empty() {
            Vec::new()
        } else {
            self.products.validate_products(&ids).await?
        };
        let catalog = index_products(&products);

        Ok(with_product_names(record, |product_id| {
            catalog.get(&product_id).map(|p| p.name.clone())
        }))
    }

    /// Moves the order to `status`. Asking for the current status is a no-op.
    ///
    /// Any target is accepted except `PAID`, which only settlement may set.
    pub async fn change_status(
        &self,
        request: ChangeOrderStatusRequest,
    ) -> AppResult<OrderWithProducts> {
        let ChangeOrderStatusRequest { id, status } = request;

        let mut order = self.find_one(id).await?;
        if order.order.status == status {
            return Ok(order);
        }
        if status == OrderStatus::Paid {
            return Err(AppError::BadRequest(
                "Orders can only become PAID through payment settlement".into(),
            ));
        }

        let updated = self.store.update_status(id, status).await?;
        tracing::info!(order_id = %id, from = %order.order.status, to = %status, "order status changed");
        order.order = updated;
        Ok(order)
    }

    /// Marks the order paid and stores its payment and receipt atomically.
    pub async fn handle_paid_order(&self, request: PaidOrderRequest) -> AppResult<PaidOrderSummary> {
        let summary = self
            .store
            .settle_order(SettleOrder {
                order_id: request.order_id,
                stripe_charge_id: request.stripe_payment_id,
                receipt_url: request.receipt_url,
            })
            .await?;

        tracing::info!(
            order_id = %summary.order_id,
            payment_id = %summary.payment_id,
            receipt_id = %summary.receipt_id,
            "order paid"
        );
        Ok(summary)
    }
}

fn distinct_product_ids(ids: impl Iterator<Item = i32>) -> Vec<i32> {
    let mut ids: Vec<i32> = ids.collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

fn index_products(products: &[Product]) -> HashMap<i32, &Product> {
    products.iter().map(|p| (p.id, p)).collect()
}

fn with_product_names(
    record: OrderRecord,
    name_of: impl Fn(i32) -> Option<String>,
) -> OrderWithProducts {
    let order_items = record
        .items
        .into_iter()
        .map(|item| OrderItemView {
            name: name_of(item.product_id),
            product_id: item.product_id,
            quantity: item.quantity,
            price: item.price,
        })
        .collect();

    OrderWithProducts {
        order: record.order,
        order_items,
    }
}
