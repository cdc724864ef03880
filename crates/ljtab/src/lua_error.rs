/// Lightweight table error - a single byte, cheap to return through `?`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LuaError {
    /// `nil` or NaN used as a key for a write
    InvalidKey,
    /// The allocator refused a request, or storage could not be reserved.
    /// The table that reported it is unchanged.
    OutOfMemory,
}

pub type LuaResult<T> = Result<T, LuaError>;

impl LuaError {
    /// Only allocation failures are worth retrying after memory is released elsewhere.
    #[inline]
    pub fn is_retryable(self) -> bool {
        matches!(self, LuaError::OutOfMemory)
    }
}

impl std::fmt::Display for LuaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LuaError::InvalidKey => write!(f, "table index is nil or NaN"),
            LuaError::OutOfMemory => write!(f, "not enough memory"),
        }
    }
}

impl std::error::Error for LuaError {}

impl From<std::collections::TryReserveError> for LuaError {
    fn from(_: std::collections::TryReserveError) -> Self {
        LuaError::OutOfMemory
    }
}
