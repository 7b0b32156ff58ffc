use thiserror::Error;

use crate::cache::StoreError;

/// 查询失败的原因，前两类为客户端输入错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("Invalid IP address")]
    InvalidFormat,
    #[error("Private IP addresses are not supported")]
    PrivateAddress,
    #[error("enrichment store failure: {0}")]
    StoreFailure(String),
}

impl From<StoreError> for LookupError {
    fn from(err: StoreError) -> Self {
        LookupError::StoreFailure(err.to_string())
    }
}
