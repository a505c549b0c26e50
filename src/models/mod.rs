//! Data models for the Habaru Media backend.
//!
//! These models match the frontend TypeScript interfaces exactly for seamless interoperability.

mod post;
mod subscriber;
mod user;
mod visitor;

pub use post::*;
pub use subscriber::*;
pub use user::*;
pub use visitor::*;
