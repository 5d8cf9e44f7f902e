pub mod qpsk;

pub use qpsk::QpskModem;
