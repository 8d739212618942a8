//! 测试公共模块
//! 提供测试配置、桩执行器和请求辅助函数

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use secrecy::ExposeSecret;
use ssh_proxy::{
    config::{AppConfig, LoggingConfig, ServerConfig, ServiceConfig, SshConfig},
    middleware::AppState,
    models::{ExecutionRequest, ExecutionResult},
    routes,
    ssh::CommandExecutor,
};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// 创建测试配置
pub fn create_test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8000,
            graceful_shutdown_timeout_secs: 5,
            body_limit_bytes: 4096,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        ssh: SshConfig {
            sshpass_program: "sshpass".to_string(),
            ssh_program: "ssh".to_string(),
            command_timeout_secs: 30,
            probe_timeout_secs: 5,
        },
        service: ServiceConfig {
            name: "SSH Proxy Test".to_string(),
            platform: "test".to_string(),
        },
    }
}

/// 桩执行器收到的调用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub command: String,
}

/// 记录调用并返回预设结果的执行器
pub struct StubExecutor {
    result: ExecutionResult,
    available: bool,
    calls: Mutex<Vec<RecordedCall>>,
}

impl StubExecutor {
    pub fn new(result: ExecutionResult) -> Self {
        Self {
            result,
            available: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandExecutor for StubExecutor {
    async fn execute(&self, request: &ExecutionRequest) -> ExecutionResult {
        self.calls.lock().unwrap().push(RecordedCall {
            host: request.host.clone(),
            port: request.port,
            username: request.username.clone(),
            password: request.password.expose_secret().clone(),
            command: request.command.clone(),
        });
        self.result.clone()
    }

    async fn sshpass_available(&self) -> bool {
        self.available
    }
}

/// 使用给定执行器创建路由
pub fn create_test_app(executor: Arc<StubExecutor>) -> Router {
    let state = Arc::new(AppState::new(create_test_config(), executor));
    routes::create_router(state)
}

/// 发送请求并解析 JSON 响应
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);

    (status, json)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}
