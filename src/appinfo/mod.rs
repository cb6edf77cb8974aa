// Steam binary VDF (appinfo.vdf) format implementation.
//
// This module decodes the three known on-disk revisions (v27, v28, v29) into
// an owned document of per-application records.
//
// # Modules
//
// - `cursor`:      Bounds-checked little-endian reader with save/restore
// - `header`:      Magic constants, revision dispatch, file header
// - `string_pool`: v29 string table loaded through a detour read
// - `entry`:       Tagged key-value trees and their recursive decoder
// - `record`:      Per-application records and the size-checked reader
// - `decoder`:     Top-level document decoder, options and errors

pub mod cursor;
pub mod decoder;
pub mod entry;
pub mod header;
pub mod record;
pub mod string_pool;

// Re-export key types for convenience.
pub use cursor::{Cursor, Mark};
pub use decoder::{
    DEFAULT_MAX_DEPTH, DecodeError, DecodeOptions, Decoder, Document, decode, decode_with,
};
pub use entry::{EntryTree, EntryTreeDecoder, EntryValue, KeyEncoding};
pub use header::{HASH_LEN, Header, MAGIC_V27, MAGIC_V28, MAGIC_V29, Version};
pub use record::{AppInfoRecord, AppRecordReader};
pub use string_pool::StringPool;
