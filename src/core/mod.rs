//! 核心错误类型

pub mod error;

pub use error::AgentError;
