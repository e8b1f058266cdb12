//! Cache Store: one bare mirror per remote under a shared root.

mod state;
mod store;

pub use state::{MirrorState, RefreshState};
pub use store::{CacheStore, FsInspector, MirrorInspector};

pub(crate) use store::remote_heads;
