//! SSH执行器模块
//! 通过 sshpass + ssh 在远程主机上执行单条命令
//!
//! 以参数数组方式启动进程（不经过本地 shell），密码通过 SSHPASS 环境变量传给
//! `sshpass -e`，不会出现在任何命令行中。

use async_trait::async_trait;
use secrecy::ExposeSecret;
use std::process::{ExitStatus, Output, Stdio};
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::config::SshConfig;
use crate::models::{ExecutionRequest, ExecutionResult};

/// 日志中替代密码的占位符
pub const PASSWORD_PLACEHOLDER: &str = "[PASSWORD]";

/// 命令执行器
///
/// 处理器只依赖此 trait，测试中可替换为桩实现。
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// 执行一次远程命令，所有失败都以 `ExecutionResult` 返回
    async fn execute(&self, request: &ExecutionRequest) -> ExecutionResult;

    /// sshpass 当前是否可用
    async fn sshpass_available(&self) -> bool;
}

/// 基于 sshpass 的执行器
#[derive(Debug, Clone)]
pub struct SshpassExecutor {
    sshpass_program: String,
    ssh_program: String,
    command_timeout: Duration,
    probe_timeout: Duration,
}

impl SshpassExecutor {
    pub fn new(config: &SshConfig) -> Self {
        Self {
            sshpass_program: config.sshpass_program.clone(),
            ssh_program: config.ssh_program.clone(),
            command_timeout: config.command_timeout(),
            probe_timeout: config.probe_timeout(),
        }
    }

    /// 覆盖命令超时
    pub fn with_command_timeout(mut self, command_timeout: Duration) -> Self {
        self.command_timeout = command_timeout;
        self
    }

    fn ssh_args(&self, request: &ExecutionRequest) -> Vec<String> {
        vec![
            "-e".to_string(),
            self.ssh_program.clone(),
            "-o".to_string(),
            "StrictHostKeyChecking=no".to_string(),
            "-p".to_string(),
            request.port.to_string(),
            request.destination(),
            request.command.clone(),
        ]
    }

    fn build_command(&self, request: &ExecutionRequest) -> Command {
        let mut cmd = Command::new(&self.sshpass_program);
        cmd.args(self.ssh_args(request))
            .env("SSHPASS", request.password.expose_secret())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// 用于日志的命令行表示，密码已被替换
    ///
    /// 先对请求中的各部分脱敏，再拼入占位符，占位符本身不参与替换。
    pub fn redacted_command_line(&self, request: &ExecutionRequest) -> String {
        let password = request.password.expose_secret();
        format!(
            "SSHPASS={} {} {} -o StrictHostKeyChecking=no -p {} {} '{}'",
            PASSWORD_PLACEHOLDER,
            self.sshpass_program,
            self.ssh_program,
            request.port,
            redact(&request.destination(), password),
            redact(&request.command, password),
        )
    }
}

#[async_trait]
impl CommandExecutor for SshpassExecutor {
    async fn execute(&self, request: &ExecutionRequest) -> ExecutionResult {
        let start_time = Instant::now();

        info!(
            host = %request.host,
            port = request.port,
            user = %request.username,
            "Executing SSH command"
        );
        debug!(
            command_line = %self.redacted_command_line(request),
            "SSH command line"
        );

        let mut command = self.build_command(request);
        let result = match timeout(self.command_timeout, command.output()).await {
            Ok(Ok(output)) => classify_output(output),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(program = %self.sshpass_program, "sshpass not found");
                ExecutionResult::tool_missing()
            }
            Ok(Err(e)) => {
                error!(host = %request.host, error = %e, "Failed to run SSH command");
                ExecutionResult::fault(e)
            }
            Err(_) => {
                // future 被丢弃时 kill_on_drop 会终止子进程
                warn!(
                    host = %request.host,
                    timeout_secs = self.command_timeout.as_secs(),
                    "SSH command timed out"
                );
                ExecutionResult::timed_out(self.command_timeout.as_secs())
            }
        };

        let duration_secs = start_time.elapsed().as_secs_f64();
        metrics::counter!("ssh_executions_total", "outcome" => result.outcome()).increment(1);

        info!(
            host = %request.host,
            outcome = result.outcome(),
            exit_code = ?result.exit_code(),
            duration_secs = duration_secs,
            "SSH command finished"
        );

        result
    }

    async fn sshpass_available(&self) -> bool {
        let probe = Command::new(&self.sshpass_program)
            .arg("-V")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status();

        match timeout(self.probe_timeout, probe).await {
            Ok(Ok(status)) => status.success(),
            Ok(Err(e)) => {
                debug!(program = %self.sshpass_program, error = %e, "sshpass probe failed");
                false
            }
            Err(_) => {
                debug!(program = %self.sshpass_program, "sshpass probe timed out");
                false
            }
        }
    }
}

/// 将进程输出映射为执行结果
pub fn classify_output(output: Output) -> ExecutionResult {
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    match output.status.code() {
        Some(0) => ExecutionResult::success(stdout),
        Some(code) => ExecutionResult::failed(code, stdout, stderr),
        None => ExecutionResult::failed(signal_exit_code(&output.status), stdout, stderr),
    }
}

/// 被信号终止的进程报告为 -signal
#[cfg(unix)]
fn signal_exit_code(status: &ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status.signal().map_or(-1, |signal| -signal)
}

#[cfg(not(unix))]
fn signal_exit_code(_status: &ExitStatus) -> i32 {
    -1
}

/// 把文本中出现的密码替换为占位符
pub fn redact(text: &str, password: &str) -> String {
    if password.is_empty() {
        return text.to_string();
    }
    text.replace(password, PASSWORD_PLACEHOLDER)
}
