use thiserror::Error;

/// Errors from the windowing, median tracking and normalization code
///
/// All of these indicate a caller (or bookkeeping) bug rather than a transient
/// condition, so there is nothing to retry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Median requested from empty tracker")]
    EmptyState,

    #[error("Value {0} not present in tracker")]
    NotFound(f64),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Shorthand for building an InvalidArgument error from a format string
macro_rules! invalid_arg {
    ($($arg:tt)*) => {
        $crate::error::Error::InvalidArgument(format!($($arg)*))
    };
}

pub(crate) use invalid_arg;
