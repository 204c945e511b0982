//! Token exchanger implementations.

#[cfg(feature = "mock")]
pub mod mock;

#[cfg(feature = "sdk")]
pub mod sdk;

pub mod shell;
