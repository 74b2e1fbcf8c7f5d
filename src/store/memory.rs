use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Order, OrderItem, OrderRecord, OrderStatus, PaidOrderSummary, SortOrder};

use super::{
    NewOrder, OrderFilter, OrderStore, PageRequest, SettleOrder, StoreError, StoreResult,
};

#[derive(Debug, Clone)]
pub struct PaymentRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub stripe_charge_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ReceiptRow {
    pub id: Uuid,
    pub order_payment_id: Uuid,
    pub receipt_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    orders: Vec<Order>,
    items: Vec<OrderItem>,
    payments: Vec<PaymentRow>,
    receipts: Vec<ReceiptRow>,
}

/// In-process [`OrderStore`].
///
/// Every write works on a copy of the tables and swaps it in only when the
/// whole operation succeeded, so a failed settlement leaves nothing behind.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    tables: Mutex<Tables>,
    writes: AtomicUsize,
    fail_payment_insert: AtomicBool,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed write operations.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Makes settlements fail after the order row is updated but before the
    /// payment row is inserted.
    pub fn fail_payment_insert(&self, fail: bool) {
        self.fail_payment_insert.store(fail, Ordering::SeqCst);
    }

    pub fn payments_for(&self, order_id: Uuid) -> Vec<PaymentRow> {
        self.lock()
            .payments
            .iter()
            .filter(|p| p.order_id == order_id)
            .cloned()
            .collect()
    }

    pub fn receipts_for(&self, payment_id: Uuid) -> Vec<ReceiptRow> {
        self.lock()
            .receipts
            .iter()
            .filter(|r| r.order_payment_id == payment_id)
            .cloned()
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        // Writes are swapped in whole, so a poisoned lock still guards consistent tables.
        self.tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn commit(&self, guard: &mut MutexGuard<'_, Tables>, staged: Tables) {
        **guard = staged;
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

fn filter_matches(order: &Order, filter: &OrderFilter) -> bool {
    filter.status.is_none_or(|status| order.status == status)
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create_order(&self, new_order: NewOrder) -> StoreResult<OrderRecord> {
        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            total_amount: new_order.total_amount,
            total_items: new_order.total_items,
            status: OrderStatus::Pending,
            paid: false,
            paid_at: None,
            created_at: now,
            updated_at: now,
        };
        let items: Vec<OrderItem> = new_order
            .items
            .into_iter()
            .map(|item| OrderItem {
                id: Uuid::new_v4(),
                order_id: order.id,
                product_id: item.product_id,
                quantity: item.quantity,
                price: item.price,
                created_at: now,
            })
            .collect();

        let mut guard = self.lock();
        let mut staged = guard.clone();
        staged.orders.push(order.clone());
        staged.items.extend(items.iter().cloned());
        self.commit(&mut guard, staged);

        Ok(OrderRecord { order, items })
    }

    async fn find_order(&self, id: Uuid) -> StoreResult<Option<OrderRecord>> {
        let tables = self.lock();
        let order = match tables.orders.iter().find(|o| o.id == id) {
            Some(o) => o.clone(),
            None => return Ok(None),
        };
        let items = tables
            .items
            .iter()
            .filter(|item| item.order_id == id)
            .cloned()
            .collect();
        Ok(Some(OrderRecord { order, items }))
    }

    async fn count_orders(&self, filter: &OrderFilter) -> StoreResult<u64> {
        let tables = self.lock();
        Ok(tables.orders.iter().filter(|o| filter_matches(o, filter)).count() as u64)
    }

    async fn list_orders(
        &self,
        filter: &OrderFilter,
        page: &PageRequest,
    ) -> StoreResult<Vec<Order>> {
        let tables = self.lock();
        // Insertion order doubles as creation order.
        let mut orders: Vec<Order> = tables
            .orders
            .iter()
            .filter(|o| filter_matches(o, filter))
            .cloned()
            .collect();
        if let SortOrder::Desc = page.sort_order {
            orders.reverse();
        }
        Ok(orders
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect())
    }

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> StoreResult<Order> {
        let mut guard = self.lock();
        let mut staged = guard.clone();
        let order = staged
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(StoreError::NotFound(id))?;
        order.status = status;
        order.paid = status == OrderStatus::Paid;
        order.updated_at = Utc::now();
        let updated = order.clone();
        self.commit(&mut guard, staged);
        Ok(updated)
    }

    async fn settle_order(&self, settlement: SettleOrder) -> StoreResult<PaidOrderSummary> {
        let mut guard = self.lock();
        let mut staged = guard.clone();
        let now = Utc::now();
        let already_settled = staged
            .payments
            .iter()
            .any(|p| p.order_id == settlement.order_id);

        let order = staged
            .orders
            .iter_mut()
            .find(|o| o.id == settlement.order_id)
            .ok_or(StoreError::NotFound(settlement.order_id))?;
        if order.paid || already_settled {
            return Err(StoreError::AlreadyPaid(order.id));
        }
        order.status = OrderStatus::Paid;
        order.paid = true;
        order.paid_at = Some(now);
        order.updated_at = now;
        let order_id = order.id;

        if self.fail_payment_insert.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "payment insert rejected".into(),
            ));
        }

        let payment = PaymentRow {
            id: Uuid::new_v4(),
            order_id,
            stripe_charge_id: settlement.stripe_charge_id,
            created_at: now,
        };
        let receipt = ReceiptRow {
            id: Uuid::new_v4(),
            order_payment_id: payment.id,
            receipt_url: settlement.receipt_url,
            created_at: now,
        };
        let summary = PaidOrderSummary {
            order_id,
            payment_id: payment.id,
            receipt_id: receipt.id,
            receipt_url: receipt.receipt_url.clone(),
        };
        staged.payments.push(payment);
        staged.receipts.push(receipt);
        self.commit(&mut guard, staged);

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::NewOrderItem;

    fn new_order() -> NewOrder {
        NewOrder {
            total_amount: 20.0,
            total_items: 2,
            items: vec![NewOrderItem {
                product_id: 7,
                quantity: 2,
                price: 10.0,
            }],
        }
    }

    #[tokio::test]
    async fn failed_settlement_leaves_order_untouched() {
        let store = InMemoryOrderStore::new();
        let record = store.create_order(new_order()).await.unwrap();
        store.fail_payment_insert(true);

        let result = store
            .settle_order(SettleOrder {
                order_id: record.order.id,
                stripe_charge_id: "ch_1".into(),
                receipt_url: "https://receipts.example/1".into(),
            })
            .await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));

        let reloaded = store.find_order(record.order.id).await.unwrap().unwrap();
        assert_eq!(reloaded.order.status, OrderStatus::Pending);
        assert!(!reloaded.order.paid);
        assert!(store.payments_for(record.order.id).is_empty());
        assert_eq!(store.writes(), 1);
    }

    #[tokio::test]
    async fn second_settlement_is_rejected() {
        let store = InMemoryOrderStore::new();
        let record = store.create_order(new_order()).await.unwrap();
        let settle = SettleOrder {
            order_id: record.order.id,
            stripe_charge_id: "ch_1".into(),
            receipt_url: "https://receipts.example/1".into(),
        };

        store.settle_order(settle.clone()).await.unwrap();
        let again = store.settle_order(settle).await;

        assert!(matches!(again, Err(StoreError::AlreadyPaid(id)) if id == record.order.id));
        assert_eq!(store.payments_for(record.order.id).len(), 1);
    }

    #[tokio::test]
    async fn cancelled_paid_order_cannot_be_settled_again() {
        let store = InMemoryOrderStore::new();
        let record = store.create_order(new_order()).await.unwrap();
        let settle = SettleOrder {
            order_id: record.order.id,
            stripe_charge_id: "ch_1".into(),
            receipt_url: "https://receipts.example/1".into(),
        };

        store.settle_order(settle.clone()).await.unwrap();
        store
            .update_status(record.order.id, OrderStatus::Cancelled)
            .await
            .unwrap();
        let again = store.settle_order(settle).await;

        assert!(matches!(again, Err(StoreError::AlreadyPaid(_))));
        assert_eq!(store.payments_for(record.order.id).len(), 1);
        let reloaded = store.find_order(record.order.id).await.unwrap().unwrap();
        assert_eq!(reloaded.order.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn items_keep_request_order() {
        let store = InMemoryOrderStore::new();
        let items = (1..=40)
            .map(|product_id| NewOrderItem {
                product_id,
                quantity: 1,
                price: 1.0,
            })
            .collect();
        let record = store
            .create_order(NewOrder {
                total_amount: 40.0,
                total_items: 40,
                items,
            })
            .await
            .unwrap();

        let reloaded = store.find_order(record.order.id).await.unwrap().unwrap();
        let ids: Vec<i32> = reloaded.items.iter().map(|i| i.product_id).collect();
        assert_eq!(ids, (1..=40).collect::<Vec<_>>());
    }
}
