//! Application services orchestrating domain logic.

pub mod auth;
pub mod error;
pub mod forms;
pub mod media;
pub mod pagination;
pub mod posts;
pub mod repos;
