//! In-memory session state: captured exchanges and generated asset names

mod entry;
mod names;
mod store;

pub use entry::{HttpResponse, RecordEntry};
pub use names::AssetNameRegistry;
pub use store::RecordStore;

/// Digits appended to an asset-name prefix by `generate_unique`
pub const NAME_SUFFIX_DIGITS: u32 = 6;
