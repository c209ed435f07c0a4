//! Core data models for the typing platform.

mod achievement;
mod category;
mod challenge;
mod ids;
mod result;
mod user;

pub use achievement::*;
pub use category::*;
pub use challenge::*;
pub use ids::*;
pub use result::*;
pub use user::*;
