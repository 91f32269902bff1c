//! Projects and their tasks. Every call names the tenant partition it runs in.

pub mod domain;
pub mod repository;
pub mod repo;
pub mod service;

pub use service::ProjectService;
