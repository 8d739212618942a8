//! SSH 代理服务主入口

use ssh_proxy::{
    config::AppConfig,
    middleware::AppState,
    routes,
    ssh::{CommandExecutor, SshpassExecutor},
    telemetry,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ===== CLI 参数处理 =====
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "--version" => {
                println!("ssh-proxy {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("未知参数: {}", args[1]);
                print_help();
                std::process::exit(1);
            }
        }
    }

    // 加载 .env 文件（开发环境），生产环境直接设置环境变量
    dotenv::from_filename(".env.local").ok();
    dotenv::dotenv().ok();

    // 1. 加载配置
    let config = AppConfig::load().map_err(|e| {
        eprintln!("{}", e);
        e
    })?;

    // 2. 初始化日志
    telemetry::init_telemetry(&config);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "SSH proxy starting...");

    // 3. 构建执行器并检查 sshpass
    let executor = Arc::new(SshpassExecutor::new(&config.ssh));
    if executor.sshpass_available().await {
        tracing::info!(program = %config.ssh.sshpass_program, "sshpass is available");
    } else {
        tracing::warn!(
            program = %config.ssh.sshpass_program,
            "sshpass is not available, /execute requests will fail until it is installed"
        );
    }

    // 4. 构建应用状态与路由
    let app_state = Arc::new(AppState::new(config.clone(), executor));
    let app = routes::create_router(app_state);

    // 5. 启动服务器
    let listener = routes::bind_listener(&config.server).await?;

    tracing::info!(addr = %config.server.addr(), "Server listening");

    // 6. 优雅关闭
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.graceful_shutdown_timeout_secs))
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// 优雅关闭信号处理
///
/// 收到信号后开始排空连接；超过 `timeout_secs` 仍未结束则强制退出。
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C received, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Terminate signal received, starting graceful shutdown");
        },
    }

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(timeout_secs)).await;
        tracing::warn!("Graceful shutdown timeout reached, forcing exit");
        std::process::exit(1);
    });
}

/// 打印帮助信息
fn print_help() {
    println!("ssh-proxy {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("用法: ssh-proxy [选项]");
    println!();
    println!("选项:");
    println!("  --version     打印版本信息并退出");
    println!("  --help        打印此帮助信息并退出");
    println!();
    println!("环境变量:");
    println!("  PORT                               监听端口（默认 8000）");
    println!("  SSH_PROXY_LOGGING__LEVEL           日志级别（默认 info）");
    println!("  SSH_PROXY_LOGGING__FORMAT          日志格式 json|pretty（默认 json）");
    println!("  SSH_PROXY_SSH__COMMAND_TIMEOUT_SECS 命令超时秒数（默认 30）");
    println!("  SSH_PROXY_SSH__SSHPASS_PROGRAM     sshpass 路径（默认 sshpass）");
}
