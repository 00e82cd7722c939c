//! HTTP 路由装配
//!
//! 中间件顺序 (外 → 内):
//! request-id → trace → 访问日志 → CORS → 压缩 → 超时 → JWT 认证 → 路由

use std::time::Duration;

use axum::{Router, middleware};
use http::{HeaderName, HeaderValue, StatusCode};
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::auth::require_auth;
use crate::core::ServerState;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// UUID v4 request id
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// HTTP 请求日志中间件
async fn log_request(
    request: http::Request<axum::body::Body>,
    next: middleware::Next,
) -> http::Response<axum::body::Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = std::time::Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    tracing::info!(
        target: "http_access",
        "{} {} {} {}ms",
        method,
        uri,
        status,
        started.elapsed().as_millis()
    );

    response
}

/// 合并所有 API 路由 (无状态)
pub fn build_app() -> Router<ServerState> {
    use crate::api;

    Router::<ServerState>::new()
        .merge(api::health::router())
        .merge(api::auth::router())
        .merge(api::users::router())
        .merge(api::settings::router())
        .merge(api::tables::router())
        .merge(api::events::router())
        // Catalogue
        .merge(api::raw_materials::router())
        .merge(api::meals::router())
        .merge(api::menu::router())
        .merge(api::customers::router())
        // Sales
        .merge(api::drafts::router())
        .merge(api::invoices::router())
        .merge(api::sales::router())
        // Back office
        .merge(api::employees::router())
        .merge(api::payroll::router())
        .merge(api::purchases::router())
        .merge(api::expenses::router())
        .merge(api::payments::router())
        .merge(api::reports::router())
}

/// 绑定状态并挂载中间件，得到可直接服务的 Router
pub fn build_router(state: ServerState) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    let timeout = Duration::from_millis(state.config.request_timeout_ms);

    build_app()
        // require_auth 内部跳过公共路由
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), XRequestId))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(request_id))
                .layer(middleware::from_fn(log_request))
                .layer(CorsLayer::permissive())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)),
        )
}
