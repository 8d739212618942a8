//! 数据模型模块

pub mod execution;

pub use execution::{
    ExecuteRequest, ExecutionRequest, ExecutionResult, RequestError, EMPTY_OUTPUT_PLACEHOLDER,
    METHOD,
};
