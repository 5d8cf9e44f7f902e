use num_complex::Complex32;

/// Complex baseband sample type used throughout the crate.
pub type Cf32 = Complex32;

/// Common error type for filter and modem construction.
#[derive(thiserror::Error, Debug)]
pub enum DspError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("internal failure: {0}")]
    Internal(String),
}

pub type DspResult<T> = Result<T, DspError>;
