//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::{config::ServerConfig, error::AppError, handlers, middleware::AppState};

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.server.body_limit_bytes;

    Router::new()
        .route("/", get(handlers::health::service_info))
        .route("/health", get(handlers::health::health_check))
        .route("/execute", post(handlers::execute::execute))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(crate::middleware::request_tracking_middleware))
        .with_state(state)
}

/// 绑定监听地址
pub async fn bind_listener(server: &ServerConfig) -> Result<TcpListener, AppError> {
    let addr = server.addr();
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        tracing::error!(addr = %addr, error = %e, "Failed to bind listener");
        AppError::Io(e)
    })?;
    Ok(listener)
}
