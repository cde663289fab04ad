//! Utility modules for fossdriver

pub mod timing;

pub use timing::{format_duration, Timer};
