use std::time::Duration;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

use crate::models::{PaymentSession, Product};

use super::{
    ClientError, ClientResult, PaymentGateway, PaymentSessionRequest, ProductDirectory,
};

pub const VALIDATE_PRODUCTS: &str = "validate_products";
pub const CREATE_PAYMENT_SESSION: &str = "create.payment.session";

/// JSON request/response client for a peer exposing `POST {base_url}/rpc/{message}`.
#[derive(Debug, Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    base_url: String,
}

impl RpcClient {
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub async fn send<P, R>(&self, message: &'static str, payload: &P) -> ClientResult<R>
    where
        P: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}/rpc/{}", self.base_url, message);
        tracing::debug!(%url, rpc = message, "sending rpc request");

        let transport = |source: reqwest::Error| ClientError::Transport { message, source };

        let response = self
            .http
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Rejected {
                message,
                status: status.as_u16(),
                body,
            });
        }

        response.json::<R>().await.map_err(transport)
    }
}

#[derive(Debug, Clone)]
pub struct HttpProductDirectory {
    rpc: RpcClient,
}

impl HttpProductDirectory {
    pub fn new(rpc: RpcClient) -> Self {
        Self { rpc }
    }
}

#[async_trait]
impl ProductDirectory for HttpProductDirectory {
    async fn validate_products(&self, ids: &[i32]) -> ClientResult<Vec<Product>> {
        self.rpc.send(VALIDATE_PRODUCTS, ids).await
    }
}

#[derive(Debug, Clone)]
pub struct HttpPaymentGateway {
    rpc: RpcClient,
}

impl HttpPaymentGateway {
    pub fn new(rpc: RpcClient) -> Self {
        Self { rpc }
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_payment_session(
        &self,
        request: PaymentSessionRequest,
    ) -> ClientResult<PaymentSession> {
        self.rpc.send(CREATE_PAYMENT_SESSION, &request).await
    }
}
