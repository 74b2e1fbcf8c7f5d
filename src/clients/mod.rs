//! Outbound RPC collaborators: the product catalog and the payment gateway.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{PaymentSession, Product};

pub mod http;

pub use http::{HttpPaymentGateway, HttpProductDirectory, RpcClient};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error calling {message}")]
    Transport {
        message: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{message} rejected with status {status}: {body}")]
    Rejected {
        message: &'static str,
        status: u16,
        body: String,
    },
}

pub type ClientResult<T> = Result<T, ClientError>;

#[async_trait]
pub trait ProductDirectory: Send + Sync {
    /// Resolves all `ids` in a single call. Unknown ids are simply absent from the result.
    async fn validate_products(&self, ids: &[i32]) -> ClientResult<Vec<Product>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSessionItem {
    pub name: String,
    pub price: f64,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSessionRequest {
    pub order_id: Uuid,
    pub currency: String,
    pub items: Vec<PaymentSessionItem>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_payment_session(
        &self,
        request: PaymentSessionRequest,
    ) -> ClientResult<PaymentSession>;
}
