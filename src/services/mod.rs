//! Business logic services for assertion construction

pub mod assertion_builder;
pub mod validity;

pub use assertion_builder::{AssertionRequest, LogoutAssertionBuilder};
pub use validity::ValidityWindow;
