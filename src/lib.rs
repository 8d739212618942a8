//! SSH 代理服务库
//! 通过 HTTP 接收连接参数与命令，使用 sshpass 在远程主机上执行

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod ssh;
pub mod telemetry;
