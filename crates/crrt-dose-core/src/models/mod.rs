//! Domain models for the CRRT dose calculator.

mod input;
mod report;
mod result;
mod snapshot;
mod warning;

pub use input::*;
pub use report::*;
pub use result::*;
pub use snapshot::*;
pub use warning::*;
