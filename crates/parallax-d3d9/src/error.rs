use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum D3dError {
    /// `D3DERR_INVALIDCALL`: a required argument was missing or malformed.
    #[error("invalid call: {0}")]
    InvalidCall(&'static str),
    /// `D3DERR_NOTFOUND`: the queried slot holds nothing.
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{kind} slot {index} out of range (limit {limit})")]
    InvalidSlot {
        kind: &'static str,
        index: u32,
        limit: u32,
    },
    #[error("{stage} constant registers {start}..{end} out of range (limit {limit})")]
    InvalidRegisterRange {
        stage: &'static str,
        start: u32,
        end: u32,
        limit: u32,
    },
    /// Rendering cannot continue without the primary swap chain.
    #[error("primary swap chain unavailable: {0}")]
    PrimarySwapChainUnavailable(String),
    /// Failure reported by the underlying device.
    #[error("device error: {0}")]
    Device(String),
}

impl D3dError {
    /// Errors after which the embedding layer must tear the session down.
    pub fn is_fatal(&self) -> bool {
        matches!(self, D3dError::PrimarySwapChainUnavailable(_))
    }
}

pub type D3dResult<T> = Result<T, D3dError>;
