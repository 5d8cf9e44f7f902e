pub mod framegen;
pub mod framesync;
pub mod plcp;
pub mod subcarriers;

pub use framegen::OfdmFrameGen;
pub use framesync::{FrameAction, OfdmFrameSync, SyncStats};
pub use subcarriers::{count_types, default_allocation, SubcarrierType};
