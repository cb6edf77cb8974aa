//! bvdf: decoder for Steam's binary VDF `appinfo.vdf` container.
//!
//! The crate provides:
//! - A bounds-checked decoder for the v27, v28 and v29 revisions (`appinfo`)
//! - File and stream helpers that materialize the input first (`io`)
//! - An optional CLI that dumps documents as JSON (`cli` feature)
//!
//! # Quick Start
//!
//! ```no_run
//! use bvdf::appinfo;
//!
//! let data = std::fs::read("appinfo.vdf").unwrap();
//! let doc = appinfo::decode(&data).unwrap();
//! for app in &doc {
//!     println!("{} {:?}", app.appid, app.name());
//! }
//! ```

pub mod appinfo;
pub mod io;

#[cfg(feature = "cli")]
pub mod cli;
