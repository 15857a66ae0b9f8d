/*
    Store subsystem - Concurrent in-memory storage engine
*/

pub mod errors;
pub mod mem_store;
pub mod membership;
pub mod stream;
pub mod table;
pub mod traits;

pub use errors::{ErrorKind, StoreError, StoreResult};
pub use mem_store::{MemStore, StoreStats};
pub use membership::MembershipIndex;
pub use stream::{EntityStream, DEFAULT_SEARCH_TIMEOUT, DEFAULT_STREAM_BUFFER};
pub use table::EntityTable;
pub use traits::{GroupStore, MembershipStore, UserStore};
