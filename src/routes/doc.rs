use utoipa::{OpenApi, openapi::OpenApi as OpenApiSpec};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::orders::{
        ChangeOrderStatusRequest, CheckoutResponse, CreateOrderRequest, OrderItemRequest,
        OrderList, PaidOrderRequest, UpdateStatusBody,
    },
    models::{
        Order, OrderItem, OrderItemView, OrderStatus, OrderWithProducts, PaidOrderSummary,
        PaymentSession, Product,
    },
    response::{ApiResponse, Meta},
    routes::{health, orders, params, rpc},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        orders::create_order,
        orders::checkout,
        orders::list_orders,
        orders::get_order,
        orders::change_order_status,
        orders::create_payment_session,
        orders::paid_order,
        rpc::handle_message
    ),
    components(
        schemas(
            Order,
            OrderItem,
            OrderItemView,
            OrderStatus,
            OrderWithProducts,
            PaidOrderSummary,
            PaymentSession,
            Product,
            OrderItemRequest,
            CreateOrderRequest,
            ChangeOrderStatusRequest,
            UpdateStatusBody,
            PaidOrderRequest,
            CheckoutResponse,
            OrderList,
            params::OrderPaginationQuery,
            params::SortOrder,
            Meta,
            ApiResponse<OrderWithProducts>,
            ApiResponse<OrderList>,
            ApiResponse<PaidOrderSummary>,
            ApiResponse<PaymentSession>,
            ApiResponse<CheckoutResponse>
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Orders", description = "Order endpoints"),
        (name = "RPC", description = "Message-name dispatch used by peer services"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
