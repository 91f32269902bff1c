//! Auth module: three-layer architecture (domain, repository, service).
//!
//! Credentials live in the public partition. A login is carried either by a
//! server-tracked session or by a signed token from [`token::TokenCodec`];
//! [`validator::SessionValidator`] turns either back into an identity.

pub mod domain;
pub mod errors;
pub mod repository;
pub mod service;
pub mod repo;
pub mod token;
pub mod validator;

pub use service::AuthService;
pub use token::TokenCodec;
pub use validator::SessionValidator;
