//! Ports: trait boundaries between the training core and its collaborators.

pub mod observer;
pub mod repository;

pub use observer::Observer;
pub use repository::SessionRepository;
