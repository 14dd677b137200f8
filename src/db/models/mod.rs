//! Database models split into domain-specific modules.

pub mod catalog;
pub mod common;
pub mod customer;
pub mod offer;
pub mod user;
pub mod vehicle;

pub use catalog::*;
pub use common::*;
pub use customer::*;
pub use offer::*;
pub use user::*;
pub use vehicle::*;
