//! 执行请求与执行结果模型

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// 执行方式标识，所有执行结果都携带
pub const METHOD: &str = "sshpass";

/// 远程命令成功但没有输出时的占位文本
pub const EMPTY_OUTPUT_PLACEHOLDER: &str = "命令执行成功";

/// 默认 SSH 端口
pub const DEFAULT_SSH_PORT: u16 = 22;

/// `/execute` 请求体（未校验）
#[derive(Debug, Default, Deserialize)]
pub struct ExecuteRequest {
    pub host: Option<String>,
    pub port: Option<PortValue>,
    pub username: Option<String>,
    pub password: Option<Secret<String>>,
    pub command: Option<String>,
}

/// 端口既可以是数字也可以是数字字符串
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PortValue {
    Number(i64),
    Text(String),
}

impl PortValue {
    fn to_port(&self) -> Option<u16> {
        let port = match self {
            PortValue::Number(n) => u16::try_from(*n).ok()?,
            PortValue::Text(s) => s.trim().parse::<u16>().ok()?,
        };
        (port != 0).then_some(port)
    }
}

/// 校验后的执行请求
#[derive(Debug)]
pub struct ExecutionRequest {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: Secret<String>,
    pub command: String,
}

impl ExecutionRequest {
    /// `username@host`
    pub fn destination(&self) -> String {
        format!("{}@{}", self.username, self.host)
    }
}

/// 请求校验错误，以 `{success: false, error}` 形式返回给调用方
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("请求数据为空")]
    EmptyBody,

    #[error("请求数据格式错误: {0}")]
    Malformed(String),

    #[error("缺少必要参数: {0}")]
    MissingField(&'static str),

    #[error("无效参数: {0}")]
    InvalidField(&'static str),
}

impl ExecuteRequest {
    /// 从原始请求体解析并校验
    pub fn parse(body: &[u8]) -> Result<ExecutionRequest, RequestError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(RequestError::EmptyBody);
        }

        let value: serde_json::Value =
            serde_json::from_slice(body).map_err(|e| RequestError::Malformed(e.to_string()))?;

        if is_empty_value(&value) {
            return Err(RequestError::EmptyBody);
        }
        if !value.is_object() {
            return Err(RequestError::Malformed("expected a JSON object".to_string()));
        }

        let request: ExecuteRequest =
            serde_json::from_value(value).map_err(|e| RequestError::Malformed(e.to_string()))?;

        request.validate()
    }

    /// 校验必需字段，顺序为 host, username, password, command
    pub fn validate(self) -> Result<ExecutionRequest, RequestError> {
        let host = required("host", self.host)?;
        let username = required("username", self.username)?;

        let password = match self.password {
            Some(password) if !password.expose_secret().is_empty() => password,
            _ => return Err(RequestError::MissingField("password")),
        };

        let command = required("command", self.command)?;

        let port = match self.port {
            None => DEFAULT_SSH_PORT,
            Some(value) => value.to_port().ok_or(RequestError::InvalidField("port"))?,
        };

        // 以 '-' 开头会被 ssh 当作选项解析
        if host.starts_with('-') {
            return Err(RequestError::InvalidField("host"));
        }
        if username.starts_with('-') {
            return Err(RequestError::InvalidField("username"));
        }

        Ok(ExecutionRequest {
            host,
            port,
            username,
            password,
            command,
        })
    }
}

/// null、false、0、空字符串、空数组与空对象都视为空请求体
fn is_empty_value(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::Bool(b) => !b,
        serde_json::Value::Number(n) => n.as_f64() == Some(0.0),
        serde_json::Value::String(s) => s.is_empty(),
        serde_json::Value::Array(items) => items.is_empty(),
        serde_json::Value::Object(map) => map.is_empty(),
    }
}

fn required(field: &'static str, value: Option<String>) -> Result<String, RequestError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(RequestError::MissingField(field))
}

/// 校验失败的响应体
#[derive(Debug, Serialize)]
pub struct RejectionBody {
    pub success: bool,
    pub error: String,
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        Json(RejectionBody {
            success: false,
            error: self.to_string(),
        })
        .into_response()
    }
}

/// 单次远程命令执行的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    /// 进程退出码为 0
    Success { output: String },
    /// 进程以非零退出码结束
    Failed {
        exit_code: i32,
        error: String,
        stdout: String,
    },
    /// 超过执行时限，进程已被终止
    TimedOut { error: String },
    /// 找不到 sshpass
    ToolMissing { error: String },
    /// 启动或等待进程时的其他异常
    Fault { error: String },
}

impl ExecutionResult {
    pub fn success(stdout: String) -> Self {
        let output = if stdout.is_empty() {
            EMPTY_OUTPUT_PLACEHOLDER.to_string()
        } else {
            stdout
        };
        ExecutionResult::Success { output }
    }

    pub fn failed(exit_code: i32, stdout: String, stderr: String) -> Self {
        let error = if stderr.is_empty() {
            format!("命令执行失败，退出码: {}", exit_code)
        } else {
            stderr
        };
        ExecutionResult::Failed {
            exit_code,
            error,
            stdout,
        }
    }

    pub fn timed_out(timeout_secs: u64) -> Self {
        ExecutionResult::TimedOut {
            error: format!("SSH命令执行超时（{}秒）", timeout_secs),
        }
    }

    pub fn tool_missing() -> Self {
        ExecutionResult::ToolMissing {
            error: "sshpass命令未找到，请确保已安装sshpass".to_string(),
        }
    }

    pub fn fault(cause: impl std::fmt::Display) -> Self {
        ExecutionResult::Fault {
            error: format!("SSH命令执行异常: {}", cause),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Success { .. })
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ExecutionResult::Success { .. } => Some(0),
            ExecutionResult::Failed { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ExecutionResult::Success { .. } => None,
            ExecutionResult::Failed { error, .. }
            | ExecutionResult::TimedOut { error }
            | ExecutionResult::ToolMissing { error }
            | ExecutionResult::Fault { error } => Some(error.as_str()),
        }
    }

    /// 指标与日志使用的结果标签
    pub fn outcome(&self) -> &'static str {
        match self {
            ExecutionResult::Success { .. } => "success",
            ExecutionResult::Failed { .. } => "failed",
            ExecutionResult::TimedOut { .. } => "timeout",
            ExecutionResult::ToolMissing { .. } => "tool_missing",
            ExecutionResult::Fault { .. } => "fault",
        }
    }
}

/// 线上格式
#[derive(Serialize)]
struct ExecutionResultBody<'a> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stdout: Option<&'a str>,
}

impl Serialize for ExecutionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let body = ExecutionResultBody {
            success: self.is_success(),
            output: match self {
                ExecutionResult::Success { output } => Some(output.as_str()),
                _ => None,
            },
            error: self.error(),
            method: METHOD,
            exit_code: self.exit_code(),
            stdout: match self {
                ExecutionResult::Failed { stdout, .. } => Some(stdout.as_str()),
                _ => None,
            },
        };
        body.serialize(serializer)
    }
}

impl IntoResponse for ExecutionResult {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
