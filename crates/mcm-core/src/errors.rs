//! Error types for mcm-rs.
//!
//! A single `thiserror`-derived enum covers configuration errors (no
//! devices, empty portfolio, bad settings), per-device failures, and the
//! precondition / postcondition checks of the numerical layers.  The
//! `ensure!`, `ensure_post!` and `fail!` macros build the latter.

use crate::DeviceId;
use thiserror::Error;

/// The top-level error type used throughout mcm-rs.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// General runtime error.
    #[error("{0}")]
    Runtime(String),

    /// Precondition violated.
    #[error("precondition not satisfied: {0}")]
    Precondition(String),

    /// Postcondition violated.
    #[error("postcondition not satisfied: {0}")]
    Postcondition(String),

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid run configuration (environment or command line).
    #[error("config error: {0}")]
    Config(String),

    /// No accelerator device is available on the host.
    #[error("no devices available")]
    NoDevices,

    /// The portfolio holds no options after problem-size scaling.
    #[error("portfolio is empty after scaling")]
    EmptyPortfolio,

    /// A device failed during setup, simulation, or teardown.
    #[error("device {device} failed: {message}")]
    Device {
        /// Ordinal of the failing device.
        device: DeviceId,
        /// What went wrong.
        message: String,
    },
}

impl Error {
    /// Build a [`Error::Device`] for `device`.
    pub fn device(device: DeviceId, message: impl Into<String>) -> Self {
        Error::Device {
            device,
            message: message.into(),
        }
    }

    /// Whether this error aborts the run before any device work starts.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::NoDevices | Error::EmptyPortfolio | Error::Config(_)
        )
    }
}

/// Shorthand `Result` type used throughout mcm-rs.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Return `Err(Error::Precondition(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use mcm_core::{ensure, errors::Error};
/// fn positive(x: f64) -> mcm_core::errors::Result<f64> {
///     ensure!(x > 0.0, "x must be positive, got {x}");
///     Ok(x)
/// }
/// assert!(positive(1.0).is_ok());
/// assert!(positive(-1.0).is_err());
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Precondition(
                format!($($msg)*)
            ));
        }
    };
}

/// Return `Err(Error::Postcondition(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use mcm_core::{ensure_post, errors::Error};
/// fn compute(x: f64) -> mcm_core::errors::Result<f64> {
///     let result = x * 2.0;
///     ensure_post!(result > 0.0, "result must be positive, got {result}");
///     Ok(result)
/// }
/// assert!(compute(1.0).is_ok());
/// assert!(compute(-1.0).is_err());
/// ```
#[macro_export]
macro_rules! ensure_post {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Postcondition(
                format!($($msg)*)
            ));
        }
    };
}

/// Return `Err(Error::Runtime(...))` immediately.
///
/// # Example
/// ```
/// use mcm_core::{fail, errors::Error};
/// fn always_err() -> mcm_core::errors::Result<()> {
///     fail!("something went wrong");
/// }
/// assert!(always_err().is_err());
/// ```
#[macro_export]
macro_rules! fail {
    ($($msg:tt)*) => {
        return Err($crate::errors::Error::Runtime(format!($($msg)*)))
    };
}
