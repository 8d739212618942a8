//! SSH 执行模块

pub mod executor;

pub use executor::{CommandExecutor, SshpassExecutor, PASSWORD_PLACEHOLDER};
