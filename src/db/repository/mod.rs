//! Database repositories
//!
//! Repository pattern for store access, separating data access logic
//! from business logic. Each function is a single store round trip.

pub mod favorites;
pub mod songs;
pub mod users;
