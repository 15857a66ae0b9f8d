pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod repos;
pub mod shutdown;
pub mod store;

pub use api::ApiServer;
pub use config::Config;
pub use logging::{init_logging, LogLevel};
pub use model::{Group, GroupId, User, UserId};
pub use repos::{Groups, MembershipMapper, RepoError, Registry, Users};
pub use shutdown::ShutdownCoordinator;
pub use store::{EntityStream, ErrorKind, MemStore, StoreError};
