//! HTTP API over the repository layer
//!
//! Every route requires Basic auth with the configured credential.
//! Search and listing routes stream a JSON array as results arrive.

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;
pub mod types;

pub use handlers::ApiError;
pub use routes::build_router;
pub use server::ApiServer;
pub use state::AppState;
pub use types::{GroupDto, StatusResponse, UserDto};
