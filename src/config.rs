//! 配置系统
//! 从环境变量加载所有配置

use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::time::Duration;

use crate::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址，例如 "0.0.0.0"
    pub host: String,
    /// 监听端口（可被 PORT 环境变量覆盖）
    pub port: u16,
    /// 优雅关闭超时时间（秒）
    pub graceful_shutdown_timeout_secs: u64,
    /// 请求体大小上限（字节）
    pub body_limit_bytes: usize,
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别: trace, debug, info, warn, error
    pub level: String,
    /// 日志格式: json, pretty
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SshConfig {
    /// sshpass 可执行文件
    pub sshpass_program: String,
    /// ssh 可执行文件
    pub ssh_program: String,
    /// 单条命令的超时时间（秒）
    pub command_timeout_secs: u64,
    /// sshpass 可用性探测超时时间（秒）
    pub probe_timeout_secs: u64,
}

impl SshConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// 服务名称（/health 与 / 中返回）
    pub name: String,
    /// 部署平台标识
    pub platform: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub ssh: SshConfig,
    pub service: ServiceConfig,
}

impl AppConfig {
    /// 启动时加载配置，错误统一为 `AppError::Config`
    pub fn load() -> Result<Self, AppError> {
        Ok(Self::from_env()?)
    }

    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Config::builder();

        // 添加默认配置
        settings = settings
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("server.graceful_shutdown_timeout_secs", 10)?
            .set_default("server.body_limit_bytes", 64 * 1024)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("ssh.sshpass_program", "sshpass")?
            .set_default("ssh.ssh_program", "ssh")?
            .set_default("ssh.command_timeout_secs", 30)?
            .set_default("ssh.probe_timeout_secs", 10)?
            .set_default("service.name", "SSH Proxy Service")?
            .set_default("service.platform", "koyeb")?;

        // 从环境变量加载配置（前缀为 SSH_PROXY_）
        settings = settings.add_source(
            Environment::with_prefix("SSH_PROXY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // 托管平台通过 PORT 注入监听端口
        settings = settings.set_override_option("server.port", std::env::var("PORT").ok())?;

        let config: AppConfig = settings.build()?.try_deserialize()?;

        // 验证配置
        config.validate()?;

        Ok(config)
    }

    /// 验证配置合法性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port must not be 0".to_string()));
        }

        // 验证日志级别
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                )))
            }
        }

        // 验证日志格式
        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log format: {}. Must be one of: json, pretty",
                    self.logging.format
                )))
            }
        }

        if self.ssh.sshpass_program.trim().is_empty() || self.ssh.ssh_program.trim().is_empty() {
            return Err(ConfigError::Message(
                "sshpass_program and ssh_program must not be empty".to_string(),
            ));
        }

        if self.ssh.command_timeout_secs < 1 || self.ssh.command_timeout_secs > 3600 {
            return Err(ConfigError::Message(
                "command_timeout_secs must be between 1 and 3600".to_string(),
            ));
        }

        if self.ssh.probe_timeout_secs < 1 || self.ssh.probe_timeout_secs > 60 {
            return Err(ConfigError::Message(
                "probe_timeout_secs must be between 1 and 60".to_string(),
            ));
        }

        Ok(())
    }
}
