//! Service layer: tenancy, credentials and partition-scoped business data.
//! - Separates business logic from data access through repository traits.
//! - Reuses validation, entities and partition DDL from the `models` crate.
//! - Ships SeaORM-backed repositories and an in-memory [`mock::MemoryStore`].

pub mod errors;
pub mod auth;
pub mod tenancy;
pub mod projects;
pub mod mock;
#[cfg(test)]
pub mod test_support;
