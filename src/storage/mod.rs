//! Session persistence: structured JSON files in per-identity directories

mod format;
mod reader;
mod writer;

pub use format::{SessionDocument, FILE_EXT, FILE_PREFIX, FORMAT_VERSION};
pub use reader::load;
pub use writer::save;
