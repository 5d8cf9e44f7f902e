pub mod design;
pub mod halfband;
pub mod interp;
pub mod resamp;

pub use halfband::Halfband;
pub use interp::FirInterpolator;
pub use resamp::ArbResampler;
