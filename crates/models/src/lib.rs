pub mod errors;
pub mod db;
pub mod partition;
pub mod tenant;
pub mod domain;
pub mod user;
pub mod user_credentials;
pub mod project;
pub mod task;
