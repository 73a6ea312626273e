//! bridge-common - 请求上下文、实体引用与标识符校验

pub mod types;
pub mod utils;

pub use types::*;
