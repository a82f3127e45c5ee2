mod normalize;
pub use normalize::{normalize, normalize_author, Normalized};

mod optimistic;
pub use optimistic::optimistic;

mod order;
pub use order::{SortMode, UnknownSortMode};

mod persist;
#[cfg(target_arch = "wasm32")]
pub use persist::LocalStorageSlot;
pub use persist::{FileSlot, MemorySlot, Snapshot, SnapshotSlot, DEFAULT_KEY};

mod session;
pub use session::Session;

mod store;
pub use store::{CommentStore, Notice};

mod time;
pub use time::{time_ago, time_ago_now};

mod tree;
pub use tree::{build_tree, TreeNode};

#[cfg(test)]
mod fixtures;

pub mod api {
    pub use natter_api::*;
}
