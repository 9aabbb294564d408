//! Inbound agent audio handling.

pub mod duration;

pub use duration::DurationAccountant;
