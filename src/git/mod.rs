//! Git operations module
//!
//! Provides functionality for:
//! - Discovering repositories under a folder
//! - Listing local branches
//! - Checking out and creating branches

mod error;
mod locator;
mod repository;

pub use error::*;
pub use locator::*;
pub use repository::*;

#[cfg(test)]
pub(crate) mod test_support;
