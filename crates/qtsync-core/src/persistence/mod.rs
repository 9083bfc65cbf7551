//! File-backed persistence for credentials and account mappings.
//!
//! Everything lives as JSON in the data directory:
//! - `config.json`: versioned credential record (source + destination)
//! - `mappings.json`: flat `{sourceId: destinationId}` object

mod file_store;
mod record;

pub use file_store::FileStore;
pub use record::{CURRENT_VERSION, DestinationCredentials, StoredConfig, decode_config, encode_config};
