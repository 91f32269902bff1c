pub mod routes;
pub mod startup;
pub mod errors;
pub mod openapi;
pub mod middleware;
pub mod observability;
pub mod session;
pub mod state;

pub use startup::{build_app, run};
pub use state::ServerState;
