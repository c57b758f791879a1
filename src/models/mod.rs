//! Data models for the HangSmart application.
//!
//! These models match the frontend interfaces exactly for seamless interoperability.

mod group;
mod recommendation;
mod user;

pub use group::*;
pub use recommendation::*;
pub use user::*;
