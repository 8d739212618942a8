//! 健康检查处理器
//! 提供 /health 和 / 端点

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{middleware::AppState, models::METHOD};

/// 健康检查响应
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: String,
    pub method: &'static str,
    pub sshpass_available: bool,
    pub platform: String,
    pub timestamp: String,
}

/// 服务描述响应
#[derive(Serialize)]
pub struct ServiceInfoResponse {
    pub service: String,
    pub version: &'static str,
    pub description: &'static str,
    pub endpoints: BTreeMap<&'static str, &'static str>,
    pub method: &'static str,
    pub platform: String,
    pub sshpass_available: bool,
}

/// `2024-01-02T03:04:05.000Z`
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// 健康检查
/// 每次请求都实时探测 sshpass
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let sshpass_available = state.executor.sshpass_available().await;

    Json(HealthResponse {
        status: "ok",
        service: state.config.service.name.clone(),
        method: METHOD,
        sshpass_available,
        platform: state.config.service.platform.clone(),
        timestamp: format_timestamp(Utc::now()),
    })
}

/// 服务描述
pub async fn service_info(State(state): State<Arc<AppState>>) -> Json<ServiceInfoResponse> {
    let sshpass_available = state.executor.sshpass_available().await;

    let endpoints = BTreeMap::from([
        ("/execute", "POST - 执行SSH命令"),
        ("/health", "GET - 健康检查"),
    ]);

    Json(ServiceInfoResponse {
        service: state.config.service.name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        description: "通过 sshpass 以密码认证在远程主机上执行命令的 HTTP 服务",
        endpoints,
        method: METHOD,
        platform: state.config.service.platform.clone(),
        sshpass_available,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_timestamp() {
        let time = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(format_timestamp(time), "2024-01-02T03:04:05.000Z");
    }
}
