//! Tenancy: which organization owns which partition and hostname, and how an
//! inbound host maps back to a partition.

pub mod domain;
pub mod errors;
pub mod repository;
pub mod repo;
pub mod registry;
pub mod resolver;
pub mod redirect;

pub use registry::TenantRegistry;
pub use resolver::TenantResolver;
pub use redirect::RedirectResolver;
