use std::collections::BTreeMap;
use std::io;

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_json::ser::{Formatter, Serializer};
use sha2::{Digest, Sha256};

/// A single block in the chain. Carries no payload besides its proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64, // 1-based position in the chain
    pub timestamp: String, // informational only
    pub proof: u64,
    pub previous_hash: String,
}

impl Block {
    /// Build a block stamped with the current local time.
    pub fn new(index: u64, proof: u64, previous_hash: String) -> Self {
        Self {
            index,
            timestamp: now_timestamp(),
            proof,
            previous_hash,
        }
    }

    /// Canonical bytes fed to the block hash.
    ///
    /// A JSON object with keys sorted ascending (`index`, `previous_hash`,
    /// `proof`, `timestamp`), members separated by `", "` and keys by `": "`,
    /// and every character outside printable ASCII written as a `\uXXXX`
    /// escape (UTF-16 surrogate pairs above the BMP).
    /// Changing this layout changes every block hash and breaks validation
    /// of existing chains.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut fields: BTreeMap<&str, Value> = BTreeMap::new();
        fields.insert("index", Value::from(self.index));
        fields.insert("previous_hash", Value::from(self.previous_hash.as_str()));
        fields.insert("proof", Value::from(self.proof));
        fields.insert("timestamp", Value::from(self.timestamp.as_str()));

        let mut out = Vec::with_capacity(128);
        let mut ser = Serializer::with_formatter(&mut out, SpacedFormatter);
        fields
            .serialize(&mut ser)
            .expect("serialize block fields");
        out
    }

    /// Lowercase hex SHA-256 of [`Block::canonical_bytes`].
    pub fn hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Same output as the default compact formatter, plus a space after
/// every `,` and `:`, and ASCII-only string contents.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut units = [0u16; 2];
        for c in fragment.chars() {
            if (' '..='~').contains(&c) {
                writer.write_all(&[c as u8])?;
            } else {
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{unit:04x}")?;
                }
            }
        }
        Ok(())
    }
}

fn now_timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}
