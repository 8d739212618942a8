//! 命令执行 API 集成测试

use axum::http::StatusCode;
use serde_json::json;
use ssh_proxy::models::ExecutionResult;
use std::sync::Arc;

mod common;
use common::{create_test_app, post_json, send, RecordedCall, StubExecutor};

fn valid_body() -> serde_json::Value {
    json!({
        "host": "10.0.0.5",
        "port": 22,
        "username": "root",
        "password": "x",
        "command": "echo hi"
    })
}

#[tokio::test]
async fn test_execute_success() {
    let executor = Arc::new(StubExecutor::new(ExecutionResult::success("hi\n".to_string())));
    let app = create_test_app(executor.clone());

    let (status, json) = send(app, post_json("/execute", valid_body().to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!({"success": true, "output": "hi\n", "method": "sshpass", "exit_code": 0})
    );
    assert_eq!(
        executor.calls(),
        vec![RecordedCall {
            host: "10.0.0.5".to_string(),
            port: 22,
            username: "root".to_string(),
            password: "x".to_string(),
            command: "echo hi".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_execute_port_defaults_to_22() {
    let executor = Arc::new(StubExecutor::new(ExecutionResult::success("ok".to_string())));
    let app = create_test_app(executor.clone());

    let body = json!({"host": "h", "username": "u", "password": "p", "command": "ls"});
    let (status, _) = send(app, post_json("/execute", body.to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(executor.calls()[0].port, 22);
}

#[tokio::test]
async fn test_execute_non_zero_exit() {
    let executor = Arc::new(StubExecutor::new(ExecutionResult::failed(
        5,
        "partial\n".to_string(),
        "Permission denied\n".to_string(),
    )));
    let app = create_test_app(executor);

    let (status, json) = send(app, post_json("/execute", valid_body().to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], false);
    assert_eq!(json["exit_code"], 5);
    assert_eq!(json["stdout"], "partial\n");
    assert_eq!(json["error"], "Permission denied\n");
    assert_eq!(json["method"], "sshpass");
}

#[tokio::test]
async fn test_execute_timeout() {
    let executor = Arc::new(StubExecutor::new(ExecutionResult::timed_out(30)));
    let app = create_test_app(executor);

    let (status, json) = send(app, post_json("/execute", valid_body().to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "SSH命令执行超时（30秒）");
    assert!(json.get("exit_code").is_none());
}

#[tokio::test]
async fn test_execute_tool_missing() {
    let executor = Arc::new(StubExecutor::new(ExecutionResult::tool_missing()));
    let app = create_test_app(executor);

    let (status, json) = send(app, post_json("/execute", valid_body().to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("sshpass"));
    assert!(json.get("exit_code").is_none());
}

#[tokio::test]
async fn test_execute_missing_fields_never_launch() {
    for field in ["host", "username", "password", "command"] {
        let executor = Arc::new(StubExecutor::new(ExecutionResult::success(String::new())));
        let app = create_test_app(executor.clone());

        let mut body = valid_body();
        body.as_object_mut().unwrap().remove(field);

        let (status, json) = send(app, post_json("/execute", body.to_string())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json,
            json!({"success": false, "error": format!("缺少必要参数: {}", field)})
        );
        assert!(executor.calls().is_empty(), "executor ran without {}", field);
    }
}

#[tokio::test]
async fn test_execute_empty_string_field_counts_as_missing() {
    let executor = Arc::new(StubExecutor::new(ExecutionResult::success(String::new())));
    let app = create_test_app(executor.clone());

    let mut body = valid_body();
    body["command"] = json!("");

    let (_, json) = send(app, post_json("/execute", body.to_string())).await;

    assert_eq!(json["error"], "缺少必要参数: command");
    assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn test_execute_empty_body() {
    for body in ["", "{}", "null", "[]", "false", "0", "\"\""] {
        let executor = Arc::new(StubExecutor::new(ExecutionResult::success(String::new())));
        let app = create_test_app(executor.clone());

        let (status, json) = send(app, post_json("/execute", body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({"success": false, "error": "请求数据为空"}));
        assert!(executor.calls().is_empty());
    }
}

#[tokio::test]
async fn test_execute_malformed_body() {
    let executor = Arc::new(StubExecutor::new(ExecutionResult::success(String::new())));
    let app = create_test_app(executor.clone());

    let (status, json) = send(app, post_json("/execute", "{\"host\": ")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().starts_with("请求数据格式错误"));
    assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn test_execute_invalid_port() {
    let executor = Arc::new(StubExecutor::new(ExecutionResult::success(String::new())));
    let app = create_test_app(executor.clone());

    let mut body = valid_body();
    body["port"] = json!(70000);

    let (_, json) = send(app, post_json("/execute", body.to_string())).await;

    assert_eq!(json, json!({"success": false, "error": "无效参数: port"}));
    assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn test_execute_body_over_limit_is_rejected() {
    let executor = Arc::new(StubExecutor::new(ExecutionResult::success(String::new())));
    let app = create_test_app(executor.clone());

    let mut body = valid_body();
    body["command"] = json!("x".repeat(8192));

    let (status, _) = send(app, post_json("/execute", body.to_string())).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(executor.calls().is_empty());
}
