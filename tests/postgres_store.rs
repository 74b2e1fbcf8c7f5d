use orders_service::{
    db::{create_orm_conn, run_migrations},
    models::OrderStatus,
    models::SortOrder,
    store::{
        NewOrder, NewOrderItem, OrderFilter, OrderStore, PageRequest, SeaOrderStore, SettleOrder,
        StoreError,
    },
};
use sea_orm::{ConnectionTrait, Statement};
use uuid::Uuid;

// Store flow against PostgreSQL: create -> list -> change status -> settle -> reject duplicate.
#[tokio::test]
async fn postgres_store_settles_orders_atomically() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run the postgres store test."
            );
            return Ok(());
        }
    };

    let store = setup_store(&database_url).await?;

    let record = store
        .create_order(NewOrder {
            total_amount: 25.0,
            total_items: 3,
            items: vec![
                NewOrderItem {
                    product_id: 1,
                    quantity: 2,
                    price: 10.0,
                },
                NewOrderItem {
                    product_id: 2,
                    quantity: 1,
                    price: 5.0,
                },
            ],
        })
        .await?;
    assert_eq!(record.order.status, OrderStatus::Pending);
    assert_eq!(record.items.len(), 2);

    let loaded = store.find_order(record.order.id).await?.expect("order exists");
    assert_eq!(loaded.order.total_amount, 25.0);
    assert_eq!(loaded.items.iter().map(|i| i.quantity).sum::<i32>(), 3);
    assert!(store.find_order(Uuid::new_v4()).await?.is_none());

    let pending = OrderFilter {
        status: Some(OrderStatus::Pending),
    };
    assert_eq!(store.count_orders(&pending).await?, 1);
    let page = store
        .list_orders(
            &pending,
            &PageRequest {
                offset: 0,
                limit: 10,
                sort_order: SortOrder::Desc,
            },
        )
        .await?;
    assert_eq!(page.len(), 1);

    let cancelled = store
        .update_status(record.order.id, OrderStatus::Cancelled)
        .await?;
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(store.count_orders(&pending).await?, 0);

    let settle = SettleOrder {
        order_id: record.order.id,
        stripe_charge_id: "ch_test".into(),
        receipt_url: "https://pay.example/receipts/ch_test".into(),
    };
    let summary = store.settle_order(settle.clone()).await?;
    assert_eq!(summary.order_id, record.order.id);
    assert_eq!(summary.receipt_url, settle.receipt_url);

    let paid = store.find_order(record.order.id).await?.expect("order exists");
    assert_eq!(paid.order.status, OrderStatus::Paid);
    assert!(paid.order.paid);
    assert!(paid.order.paid_at.is_some());

    let duplicate = store.settle_order(settle.clone()).await;
    assert!(matches!(duplicate, Err(StoreError::AlreadyPaid(id)) if id == record.order.id));

    // Moving a paid order away from PAID must not reopen settlement.
    store
        .update_status(record.order.id, OrderStatus::Cancelled)
        .await?;
    let resettled = store.settle_order(settle).await;
    assert!(matches!(resettled, Err(StoreError::AlreadyPaid(_))));
    let reloaded = store.find_order(record.order.id).await?.expect("order exists");
    assert_eq!(reloaded.order.status, OrderStatus::Cancelled);

    let many = store
        .create_order(NewOrder {
            total_amount: 40.0,
            total_items: 40,
            items: (1..=40)
                .map(|product_id| NewOrderItem {
                    product_id,
                    quantity: 1,
                    price: 1.0,
                })
                .collect(),
        })
        .await?;
    let loaded = store.find_order(many.order.id).await?.expect("order exists");
    let product_ids: Vec<i32> = loaded.items.iter().map(|i| i.product_id).collect();
    assert_eq!(product_ids, (1..=40).collect::<Vec<_>>());

    let missing = store.update_status(Uuid::new_v4(), OrderStatus::Delivered).await;
    assert!(matches!(missing, Err(StoreError::NotFound(_))));

    Ok(())
}

async fn setup_store(database_url: &str) -> anyhow::Result<SeaOrderStore> {
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE payment_receipts, order_payments, order_items, orders CASCADE",
    ))
    .await?;

    Ok(SeaOrderStore::new(orm))
}
