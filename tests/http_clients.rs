use axum::{Json, Router, http::StatusCode, routing::post};
use orders_service::{
    clients::{
        ClientError, HttpPaymentGateway, HttpProductDirectory, PaymentGateway,
        PaymentSessionItem, PaymentSessionRequest, ProductDirectory, RpcClient,
    },
    models::{PaymentSession, Product},
};
use serde_json::{Value, json};
use uuid::Uuid;

async fn spawn_peer(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

async fn validate_products(Json(ids): Json<Vec<i32>>) -> Json<Vec<Product>> {
    let catalog = [(1, "Ferris Mug", 12.5), (2, "Sticker Pack", 3.0)];
    Json(
        catalog
            .iter()
            .filter(|(id, _, _)| ids.contains(id))
            .map(|(id, name, price)| Product {
                id: *id,
                name: name.to_string(),
                price: *price,
            })
            .collect(),
    )
}

async fn create_session(Json(request): Json<Value>) -> Json<Value> {
    Json(json!({
        "cancelUrl": "https://shop.example/cancel",
        "successUrl": "https://shop.example/success",
        "url": format!(
            "https://checkout.example/{}/{}",
            request["orderId"].as_str().unwrap_or_default(),
            request["currency"].as_str().unwrap_or_default()
        ),
    }))
}

#[tokio::test]
async fn product_directory_posts_ids_in_one_batch() {
    let base = spawn_peer(Router::new().route("/rpc/validate_products", post(validate_products))).await;
    let directory = HttpProductDirectory::new(RpcClient::new(base, None).unwrap());

    let products = directory.validate_products(&[1, 2, 7]).await.unwrap();

    assert_eq!(products.len(), 2);
    assert_eq!(products[0].name, "Ferris Mug");
    assert_eq!(products[1].price, 3.0);
}

#[tokio::test]
async fn payment_gateway_sends_camel_case_request() {
    let base = spawn_peer(Router::new().route("/rpc/create.payment.session", post(create_session))).await;
    let gateway = HttpPaymentGateway::new(RpcClient::new(format!("{base}/"), None).unwrap());
    let order_id = Uuid::new_v4();

    let session = gateway
        .create_payment_session(PaymentSessionRequest {
            order_id,
            currency: "usd".into(),
            items: vec![PaymentSessionItem {
                name: "Ferris Mug".into(),
                price: 12.5,
                quantity: 2,
            }],
        })
        .await
        .unwrap();

    assert_eq!(
        session,
        PaymentSession {
            cancel_url: "https://shop.example/cancel".into(),
            success_url: "https://shop.example/success".into(),
            url: format!("https://checkout.example/{order_id}/usd"),
        }
    );
}

#[tokio::test]
async fn non_success_status_is_rejected() {
    let base = spawn_peer(Router::new().route(
        "/rpc/validate_products",
        post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "catalog offline") }),
    ))
    .await;
    let directory = HttpProductDirectory::new(RpcClient::new(base, None).unwrap());

    let err = directory.validate_products(&[1]).await.unwrap_err();

    match err {
        ClientError::Rejected {
            message,
            status,
            body,
        } => {
            assert_eq!(message, "validate_products");
            assert_eq!(status, 503);
            assert_eq!(body, "catalog offline");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_peer_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let directory =
        HttpProductDirectory::new(RpcClient::new(format!("http://{addr}"), None).unwrap());

    let err = directory.validate_products(&[1]).await.unwrap_err();

    assert!(matches!(err, ClientError::Transport { .. }));
}
