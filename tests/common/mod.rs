#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use orders_service::{
    clients::{ClientError, ClientResult, PaymentGateway, PaymentSessionRequest, ProductDirectory},
    dto::orders::{CreateOrderRequest, OrderItemRequest},
    models::{PaymentSession, Product},
    services::order_service::OrderService,
    store::InMemoryOrderStore,
};

/// Catalog stub answering from a fixed product table and recording each batch it was asked for.
#[derive(Default)]
pub struct StaticCatalog {
    products: HashMap<i32, Product>,
    calls: Mutex<Vec<Vec<i32>>>,
    unavailable: bool,
}

impl StaticCatalog {
    pub fn with(products: &[(i32, &str, f64)]) -> Self {
        Self {
            products: products
                .iter()
                .map(|(id, name, price)| {
                    (
                        *id,
                        Product {
                            id: *id,
                            name: name.to_string(),
                            price: *price,
                        },
                    )
                })
                .collect(),
            ..Default::default()
        }
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Vec<i32>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProductDirectory for StaticCatalog {
    async fn validate_products(&self, ids: &[i32]) -> ClientResult<Vec<Product>> {
        self.calls.lock().unwrap().push(ids.to_vec());
        if self.unavailable {
            return Err(ClientError::Rejected {
                message: "validate_products",
                status: 503,
                body: "catalog offline".into(),
            });
        }
        Ok(ids
            .iter()
            .filter_map(|id| self.products.get(id).cloned())
            .collect())
    }
}

#[derive(Default)]
pub struct RecordingGateway {
    requests: Mutex<Vec<PaymentSessionRequest>>,
    failing: bool,
}

impl RecordingGateway {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    pub fn requests(&self) -> Vec<PaymentSessionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for RecordingGateway {
    async fn create_payment_session(
        &self,
        request: PaymentSessionRequest,
    ) -> ClientResult<PaymentSession> {
        let order_id = request.order_id;
        self.requests.lock().unwrap().push(request);
        if self.failing {
            return Err(ClientError::Rejected {
                message: "create.payment.session",
                status: 500,
                body: "gateway error".into(),
            });
        }
        Ok(PaymentSession {
            cancel_url: "https://shop.example/cancel".into(),
            success_url: "https://shop.example/success".into(),
            url: format!("https://checkout.example/session/{order_id}"),
        })
    }
}

pub struct Harness {
    pub store: Arc<InMemoryOrderStore>,
    pub catalog: Arc<StaticCatalog>,
    pub gateway: Arc<RecordingGateway>,
    pub service: OrderService,
}

impl Harness {
    pub fn new(catalog: StaticCatalog) -> Self {
        Self::with_gateway(catalog, RecordingGateway::default())
    }

    pub fn with_gateway(catalog: StaticCatalog, gateway: RecordingGateway) -> Self {
        let store = Arc::new(InMemoryOrderStore::new());
        let catalog = Arc::new(catalog);
        let gateway = Arc::new(gateway);
        let service = OrderService::new(store.clone(), catalog.clone(), gateway.clone(), "usd");
        Self {
            store,
            catalog,
            gateway,
            service,
        }
    }
}

pub fn default_catalog() -> StaticCatalog {
    StaticCatalog::with(&[(1, "A", 10.0), (2, "B", 5.0)])
}

pub fn order_request(items: &[(i32, i32)]) -> CreateOrderRequest {
    CreateOrderRequest {
        items: items
            .iter()
            .map(|(product_id, quantity)| OrderItemRequest {
                product_id: *product_id,
                quantity: *quantity,
            })
            .collect(),
    }
}
