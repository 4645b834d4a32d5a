//! Adapters implementing the crate's ports against concrete storage.

pub mod in_memory_repository;
pub mod json_repository;

pub use in_memory_repository::InMemoryRepository;
pub use json_repository::JsonRepository;
