use async_trait::async_trait;
use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    entity::{
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems, Model as OrderItemModel},
        order_payments::{
            ActiveModel as PaymentActive, Column as PaymentCol, Entity as OrderPayments,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        payment_receipts::ActiveModel as ReceiptActive,
    },
    models::{Order, OrderItem, OrderRecord, OrderStatus, PaidOrderSummary, SortOrder},
};

use super::{
    NewOrder, OrderFilter, OrderStore, PageRequest, SettleOrder, StoreError, StoreResult,
};

/// [`OrderStore`] backed by PostgreSQL through sea-orm.
#[derive(Clone)]
pub struct SeaOrderStore {
    orm: DatabaseConnection,
}

impl SeaOrderStore {
    pub fn new(orm: DatabaseConnection) -> Self {
        Self { orm }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.orm
    }
}

fn filter_condition(filter: &OrderFilter) -> Condition {
    let mut condition = Condition::all();
    if let Some(status) = filter.status {
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }
    condition
}

#[async_trait]
impl OrderStore for SeaOrderStore {
    async fn create_order(&self, new_order: NewOrder) -> StoreResult<OrderRecord> {
        let txn = self.orm.begin().await?;

        let order = OrderActive {
            id: Set(Uuid::new_v4()),
            total_amount: Set(new_order.total_amount),
            total_items: Set(new_order.total_items),
            status: Set(OrderStatus::Pending.as_str().into()),
            paid: Set(false),
            paid_at: Set(None),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(&txn)
        .await?;

        let created_at = Utc::now();
        let items: Vec<OrderItem> = new_order
            .items
            .into_iter()
            .map(|item| OrderItem {
                id: Uuid::new_v4(),
                order_id: order.id,
                product_id: item.product_id,
                quantity: item.quantity,
                price: item.price,
                created_at,
            })
            .collect();

        if !items.is_empty() {
            let rows = items.iter().zip(0..).map(|(item, position)| OrderItemActive {
                id: Set(item.id),
                order_id: Set(item.order_id),
                product_id: Set(item.product_id),
                quantity: Set(item.quantity),
                price: Set(item.price),
                position: Set(position),
                created_at: Set(created_at.into()),
            });
            OrderItems::insert_many(rows)
                .exec_without_returning(&txn)
                .await?;
        }

        txn.commit().await?;

        Ok(OrderRecord {
            order: order_from_entity(order)?,
            items,
        })
    }

    async fn find_order(&self, id: Uuid) -> StoreResult<Option<OrderRecord>> {
        let order = match Orders::find_by_id(id).one(&self.orm).await? {
            Some(o) => o,
            None => return Ok(None),
        };

        let items = OrderItems::find()
            .filter(OrderItemCol::OrderId.eq(order.id))
            .order_by_asc(OrderItemCol::Position)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(order_item_from_entity)
            .collect();

        Ok(Some(OrderRecord {
            order: order_from_entity(order)?,
            items,
        }))
    }

    async fn count_orders(&self, filter: &OrderFilter) -> StoreResult<u64> {
        let total = Orders::find()
            .filter(filter_condition(filter))
            .count(&self.orm)
            .await?;
        Ok(total)
    }

    async fn list_orders(
        &self,
        filter: &OrderFilter,
        page: &PageRequest,
    ) -> StoreResult<Vec<Order>> {
        let mut finder = Orders::find().filter(filter_condition(filter));
        finder = match page.sort_order {
            SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
            SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
        };

        finder
            .limit(page.limit)
            .offset(page.offset)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(order_from_entity)
            .collect()
    }

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> StoreResult<Order> {
        let order = Orders::find_by_id(id)
            .one(&self.orm)
            .await?
            .ok_or(StoreError::NotFound(id))?;

        let mut active: OrderActive = order.into();
        active.status = Set(status.as_str().into());
        active.paid = Set(status == OrderStatus::Paid);
        active.updated_at = Set(Utc::now().into());
        let order = active.update(&self.orm).await?;

        order_from_entity(order)
    }

    async fn settle_order(&self, settlement: SettleOrder) -> StoreResult<PaidOrderSummary> {
        let txn = self.orm.begin().await?;

        let order = Orders::find_by_id(settlement.order_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .ok_or(StoreError::NotFound(settlement.order_id))?;

        let settled = OrderPayments::find()
            .filter(PaymentCol::OrderId.eq(order.id))
            .count(&txn)
            .await?;
        if order.paid || settled > 0 {
            return Err(StoreError::AlreadyPaid(order.id));
        }

        let now = Utc::now();
        let mut active: OrderActive = order.into();
        active.status = Set(OrderStatus::Paid.as_str().into());
        active.paid = Set(true);
        active.paid_at = Set(Some(now.into()));
        active.updated_at = Set(now.into());
        let order = active.update(&txn).await?;

        let payment = PaymentActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            stripe_charge_id: Set(settlement.stripe_charge_id),
            created_at: NotSet,
        }
        .insert(&txn)
        .await
        .map_err(|err| already_paid_on_conflict(err, order.id))?;

        let receipt = ReceiptActive {
            id: Set(Uuid::new_v4()),
            order_payment_id: Set(payment.id),
            receipt_url: Set(settlement.receipt_url),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        Ok(PaidOrderSummary {
            order_id: order.id,
            payment_id: payment.id,
            receipt_id: receipt.id,
            receipt_url: receipt.receipt_url,
        })
    }
}

// A concurrent settlement can still lose the race on the unique payment row.
fn already_paid_on_conflict(err: DbErr, order_id: Uuid) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => StoreError::AlreadyPaid(order_id),
        _ => StoreError::Orm(err),
    }
}

fn order_from_entity(model: OrderModel) -> StoreResult<Order> {
    let status = model
        .status
        .parse::<OrderStatus>()
        .map_err(|e| StoreError::InvalidRecord(e.to_string()))?;
    Ok(Order {
        id: model.id,
        total_amount: model.total_amount,
        total_items: model.total_items,
        status,
        paid: model.paid,
        paid_at: model.paid_at.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        quantity: model.quantity,
        price: model.price,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
