pub mod frame;
pub mod usrp;

pub use frame::SampleFrame;
pub use usrp::{RxPort, TxPort, UsrpConfig, UsrpIo};

/// Errors raised by the sample transport layer.
#[derive(thiserror::Error, Debug)]
pub enum RadioError {
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("malformed frame: {0}")]
    Frame(String),
    #[error("stream closed: {0}")]
    Closed(String),
}

pub type RadioResult<T> = Result<T, RadioError>;
