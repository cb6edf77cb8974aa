// Fixture builder for appinfo.vdf buffers.
//
// Writes any of the three revisions from a logical description so tests can
// compare decoded output against the input they were built from.

#![allow(dead_code)]

use bvdf::appinfo::entry::{TAG_END, TAG_INT32, TAG_NESTED, TAG_STRING};
use bvdf::appinfo::{EntryTree, EntryValue, HASH_LEN, Version};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Tree(Vec<(String, Value)>),
    Text(String),
    Number(u32),
}

pub fn tree(pairs: &[(&str, Value)]) -> Vec<(String, Value)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

pub fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

/// The `EntryTree` a decoder should produce for `pairs`.
pub fn expected_tree(pairs: &[(String, Value)]) -> EntryTree {
    pairs
        .iter()
        .map(|(k, v)| {
            let value = match v {
                Value::Tree(inner) => EntryValue::Nested(expected_tree(inner)),
                Value::Text(s) => EntryValue::Text(s.clone()),
                Value::Number(n) => EntryValue::Number(*n),
            };
            (k.clone(), value)
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct App {
    pub appid: u32,
    pub info_state: u32,
    pub last_updated: u32,
    pub token: u64,
    pub hash: [u8; HASH_LEN],
    pub change_number: u32,
    pub binary_data_hash: [u8; HASH_LEN],
    pub entries: Vec<(String, Value)>,
    /// Added to the correct `size` field to produce corrupt records.
    pub size_adjust: i64,
}

impl App {
    pub fn new(appid: u32, entries: Vec<(String, Value)>) -> Self {
        Self {
            appid,
            info_state: 2,
            last_updated: 1_600_000_000u32.wrapping_add(appid),
            token: u64::from(appid) << 8,
            hash: [appid as u8; HASH_LEN],
            change_number: appid.wrapping_mul(3),
            binary_data_hash: [!(appid as u8); HASH_LEN],
            entries,
            size_adjust: 0,
        }
    }
}

pub struct Fixture {
    pub version: Version,
    pub universe: u32,
    pub apps: Vec<App>,
    /// Bytes written after the zero appid (before the string table on v29).
    pub trailing: Vec<u8>,
}

impl Fixture {
    pub fn new(version: Version, apps: Vec<App>) -> Self {
        Self {
            version,
            universe: 1,
            apps,
            trailing: Vec::new(),
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let mut pool = Vec::new();
        let mut out = Vec::new();
        out.extend_from_slice(&self.version.magic().to_le_bytes());
        out.extend_from_slice(&self.universe.to_le_bytes());
        let offset_at = out.len();
        if self.version.has_string_pool() {
            out.extend_from_slice(&0i64.to_le_bytes());
        }

        for app in &self.apps {
            let mut body = Vec::new();
            body.extend_from_slice(&app.info_state.to_le_bytes());
            body.extend_from_slice(&app.last_updated.to_le_bytes());
            body.extend_from_slice(&app.token.to_le_bytes());
            body.extend_from_slice(&app.hash);
            body.extend_from_slice(&app.change_number.to_le_bytes());
            if self.version.has_binary_data_hash() {
                body.extend_from_slice(&app.binary_data_hash);
            }
            write_tree(&mut body, &app.entries, self.version, &mut pool);

            let size = (body.len() as i64 + app.size_adjust) as u32;
            out.extend_from_slice(&app.appid.to_le_bytes());
            out.extend_from_slice(&size.to_le_bytes());
            out.extend(body);
        }
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&self.trailing);

        if self.version.has_string_pool() {
            let table_offset = out.len() as i64;
            out[offset_at..offset_at + 8].copy_from_slice(&table_offset.to_le_bytes());
            out.extend_from_slice(&(pool.len() as u32).to_le_bytes());
            for s in &pool {
                out.extend_from_slice(s.as_bytes());
                out.push(0);
            }
        }
        out
    }
}

fn write_key(out: &mut Vec<u8>, key: &str, version: Version, pool: &mut Vec<String>) {
    if version.has_string_pool() {
        let index = match pool.iter().position(|s| s == key) {
            Some(i) => i,
            None => {
                pool.push(key.to_string());
                pool.len() - 1
            }
        };
        out.extend_from_slice(&(index as u32).to_le_bytes());
    } else {
        out.extend_from_slice(key.as_bytes());
        out.push(0);
    }
}

fn write_tree(
    out: &mut Vec<u8>,
    pairs: &[(String, Value)],
    version: Version,
    pool: &mut Vec<String>,
) {
    for (key, value) in pairs {
        match value {
            Value::Tree(inner) => {
                out.push(TAG_NESTED);
                write_key(out, key, version, pool);
                write_tree(out, inner, version, pool);
            }
            Value::Text(s) => {
                out.push(TAG_STRING);
                write_key(out, key, version, pool);
                out.extend_from_slice(s.as_bytes());
                out.push(0);
            }
            Value::Number(n) => {
                out.push(TAG_INT32);
                write_key(out, key, version, pool);
                out.extend_from_slice(&n.to_le_bytes());
            }
        }
    }
    out.push(TAG_END);
}

/// A typical record shape: `common { name, type, gameid }`, `config { installdir }`.
pub fn sample_entries(appid: u32, name: &str) -> Vec<(String, Value)> {
    tree(&[
        (
            "common",
            Value::Tree(tree(&[
                ("name", text(name)),
                ("type", text("Game")),
                ("gameid", Value::Number(appid)),
            ])),
        ),
        ("config", Value::Tree(tree(&[("installdir", text(name))]))),
    ])
}
