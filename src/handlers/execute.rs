//! 命令执行处理器

use axum::{
    body::Bytes,
    extract::State,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::{
    middleware::AppState,
    models::{ExecuteRequest, RequestError},
};

/// POST /execute
///
/// 校验失败和远程命令失败都以 200 + `{success: false, ...}` 返回。
pub async fn execute(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let request = match ExecuteRequest::parse(&body) {
        Ok(request) => request,
        Err(e) => {
            match &e {
                // 解析错误信息可能带有请求体中的值
                RequestError::Malformed(_) => tracing::info!("Rejected malformed execute request"),
                other => tracing::info!(reason = %other, "Rejected execute request"),
            }
            return e.into_response();
        }
    };

    state.executor.execute(&request).await.into_response()
}
