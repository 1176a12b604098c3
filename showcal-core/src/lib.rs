pub mod common;
pub mod domain;
pub mod export;

pub use common::error::{DiscoveryError, Result};
