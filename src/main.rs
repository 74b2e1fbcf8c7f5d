use axum::http::{HeaderName, Request, Response};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use std::{net::SocketAddr, sync::Arc, time::Duration};

use orders_service::{
    clients::{HttpPaymentGateway, HttpProductDirectory, RpcClient},
    config::{AppConfig, StoreBackend},
    db::{create_orm_conn, run_migrations},
    routes::create_app,
    services::order_service::OrderService,
    state::AppState,
    store::{InMemoryOrderStore, OrderStore, SeaOrderStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,orders_service=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let store: Arc<dyn OrderStore> = match (config.store, config.database_url.as_deref()) {
        (StoreBackend::Postgres, Some(database_url)) => {
            let orm = create_orm_conn(database_url).await?;
            run_migrations(&orm).await?;
            tracing::info!("Connected to the database");
            Arc::new(SeaOrderStore::new(orm))
        }
        (StoreBackend::Postgres, None) => anyhow::bail!("DATABASE_URL is not set"),
        (StoreBackend::Memory, _) => {
            tracing::warn!("using in-memory order store, data is lost on restart");
            Arc::new(InMemoryOrderStore::new())
        }
    };

    let products = HttpProductDirectory::new(RpcClient::new(
        &config.products_service_url,
        config.rpc_timeout,
    )?);
    let payments = HttpPaymentGateway::new(RpcClient::new(
        &config.payments_service_url,
        config.rpc_timeout,
    )?);
    let service = OrderService::new(
        store,
        Arc::new(products),
        Arc::new(payments),
        config.payment_currency.clone(),
    );

    let concurrency_limit_layer = ConcurrencyLimitLayer::new(100);

    let request_id_header = HeaderName::from_static("x-request-id");
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|value| value.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "rpc_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id
            )
        })
        .on_response(|response: &Response<_>, latency: Duration, _span: &tracing::Span| {
            tracing::info!(
                status = %response.status(),
                ms = %latency.as_millis(),
                "request finished"
            );
        });

    let app = create_app(AppState::new(service))
        .layer(trace_layer)
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(RequestBodyLimitLayer::new(1024 * 1024))
        .layer(concurrency_limit_layer);

    let addr = SocketAddr::from((config.host.parse::<std::net::IpAddr>()?, config.port));
    tracing::info!(
        products = %config.products_service_url,
        payments = %config.payments_service_url,
        "Orders service listening on {}",
        addr
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;

    Ok(())
}
