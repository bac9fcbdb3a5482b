//! Save file encodings.
//!
//! Text format: a JSON object mapping keys to string values, optionally
//! obscured (see [`crate::obscure`]).
//!
//! Binary format:
//! ```text
//! [4 bytes: entry count (little-endian i32)]
//! count x {
//!     [7-bit varint: key length in bytes]   [key: UTF-8]
//!     [7-bit varint: value length in bytes] [value: UTF-8]
//! }
//! ```
//! The varint stores 7 bits per byte, low group first, high bit set on every
//! byte except the last.

use std::collections::BTreeMap;

use tracing::warn;

use crate::config::Encoding;
use crate::error::{StoreError, StoreResult};
use crate::obscure;

/// In-memory contents of a store, keyed by entry name.
pub type Entries = BTreeMap<String, String>;

/// Size of the binary entry-count header.
pub const COUNT_SIZE: usize = 4;

/// A string length prefix never needs more than five 7-bit groups.
const MAX_VARINT_BYTES: usize = 5;

const UTF8_BOM: char = '\u{feff}';

impl Encoding {
    /// Serialize all entries. `obscure` only affects [`Encoding::Text`].
    pub fn encode(&self, entries: &Entries, obscure: bool) -> StoreResult<Vec<u8>> {
        match self {
            Encoding::Text => encode_text(entries, obscure),
            Encoding::Binary => encode_binary(entries),
        }
    }

    /// Deserialize a complete save file. `obscure` only affects
    /// [`Encoding::Text`].
    pub fn decode(&self, data: &[u8], obscure: bool) -> StoreResult<Entries> {
        match self {
            Encoding::Text => decode_text(data, obscure),
            Encoding::Binary => decode_binary(data),
        }
    }
}

fn encode_text(entries: &Entries, obscure: bool) -> StoreResult<Vec<u8>> {
    let json = serde_json::to_string(entries)?;
    let text = if obscure { obscure::obscure(&json) } else { json };
    Ok(text.into_bytes())
}

fn decode_text(data: &[u8], obscure: bool) -> StoreResult<Entries> {
    let text = std::str::from_utf8(data)
        .map_err(|e| StoreError::Serialization(format!("save file is not UTF-8: {e}")))?;
    let text = text.trim_start_matches(UTF8_BOM);

    let json = if obscure {
        obscure::reveal(text)?
    } else {
        text.to_string()
    };

    // Null values are written by some tools for unset strings; treat them as
    // absent entries.
    let raw: BTreeMap<String, Option<String>> = serde_json::from_str(&json)?;
    Ok(raw
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect())
}

fn encode_binary(entries: &Entries) -> StoreResult<Vec<u8>> {
    let count = i32::try_from(entries.len()).map_err(|_| {
        StoreError::Serialization(format!("too many entries: {}", entries.len()))
    })?;

    let mut buf = Vec::with_capacity(COUNT_SIZE + entries.len() * 16);
    buf.extend_from_slice(&count.to_le_bytes());
    for (key, value) in entries {
        write_string(&mut buf, key);
        write_string(&mut buf, value);
    }
    Ok(buf)
}

fn decode_binary(data: &[u8]) -> StoreResult<Entries> {
    let mut reader = BinaryReader::new(data);
    let count = reader.read_count()?;

    let mut entries = Entries::new();
    for _ in 0..count {
        let offset = reader.offset();
        let key = reader.read_string()?;
        let value = reader.read_string()?;
        if entries.contains_key(&key) {
            return Err(StoreError::Corrupt {
                offset,
                reason: format!("duplicate key {key:?}"),
            });
        }
        entries.insert(key, value);
    }

    if reader.remaining() > 0 {
        warn!(
            trailing = reader.remaining(),
            entries = count,
            "ignoring trailing bytes after last entry"
        );
    }

    Ok(entries)
}

fn write_string(buf: &mut Vec<u8>, s: &str) {
    encode_varint(buf, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

/// Encode a length as a 7-bit variable-length integer.
pub(crate) fn encode_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value > 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

/// Cursor over a binary save payload.
struct BinaryReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BinaryReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn offset(&self) -> u64 {
        self.pos as u64
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn corrupt(&self, reason: impl Into<String>) -> StoreError {
        StoreError::Corrupt {
            offset: self.offset(),
            reason: reason.into(),
        }
    }

    fn take(&mut self, len: usize) -> StoreResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(self.corrupt(format!(
                "truncated: need {len} bytes, {} available",
                self.remaining()
            )));
        }
        let data = self.data;
        let slice = &data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn read_count(&mut self) -> StoreResult<usize> {
        let bytes = self.take(COUNT_SIZE)?;
        let count = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        usize::try_from(count).map_err(|_| StoreError::Corrupt {
            offset: 0,
            reason: format!("negative entry count {count}"),
        })
    }

    fn read_varint(&mut self) -> StoreResult<u64> {
        let start = self.pos;
        let mut value: u64 = 0;
        for i in 0..MAX_VARINT_BYTES {
            let byte = match self.data.get(self.pos) {
                Some(b) => *b,
                None => return Err(self.corrupt("truncated length prefix")),
            };
            self.pos += 1;
            value |= u64::from(byte & 0x7F) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(StoreError::Corrupt {
            offset: start as u64,
            reason: "length prefix too long".into(),
        })
    }

    fn read_string(&mut self) -> StoreResult<String> {
        let len = self.read_varint()?;
        let len = usize::try_from(len).map_err(|_| self.corrupt("string length overflow"))?;
        let start = self.offset();
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|e| StoreError::Corrupt {
            offset: start,
            reason: format!("invalid UTF-8: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample() -> Entries {
        let mut entries = Entries::new();
        entries.insert("CreatedAt".into(), "2024-05-01T10:00:00Z".into());
        entries.insert("Name".into(), "Zoë".into());
        entries.insert("Score".into(), "42".into());
        entries
    }

    #[test]
    fn text_is_plain_json_when_not_obscured() {
        let bytes = Encoding::Text.encode(&sample(), false).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["Score"], "42");
        assert_eq!(value["Name"], "Zoë");
    }

    #[test]
    fn obscured_text_is_not_json_but_reveals_to_it() {
        let bytes = Encoding::Text.encode(&sample(), true).unwrap();
        assert!(serde_json::from_slice::<serde_json::Value>(&bytes).is_err());

        let json = obscure::reveal(std::str::from_utf8(&bytes).unwrap()).unwrap();
        let parsed: Entries = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, sample());
    }

    #[test]
    fn text_decode_honours_obscure_flag() {
        let plain = Encoding::Text.encode(&sample(), false).unwrap();
        let obscured = Encoding::Text.encode(&sample(), true).unwrap();

        assert_eq!(Encoding::Text.decode(&plain, false).unwrap(), sample());
        assert_eq!(Encoding::Text.decode(&obscured, true).unwrap(), sample());
        assert!(Encoding::Text.decode(&plain, true).is_err());
        assert!(Encoding::Text.decode(&obscured, false).is_err());
    }

    #[test]
    fn text_decode_drops_null_values() {
        let decoded = Encoding::Text
            .decode(br#"{"a":"1","b":null}"#, false)
            .unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded["a"], "1");
    }

    #[test]
    fn text_decode_skips_bom() {
        let mut data = "\u{feff}".as_bytes().to_vec();
        data.extend_from_slice(br#"{"a":"1"}"#);
        assert_eq!(Encoding::Text.decode(&data, false).unwrap()["a"], "1");
    }

    #[test]
    fn text_decode_rejects_non_string_values() {
        let err = Encoding::Text.decode(br#"{"a":1}"#, false).unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }

    #[test]
    fn binary_layout() {
        let mut entries = Entries::new();
        entries.insert("k".into(), "vv".into());
        let bytes = Encoding::Binary.encode(&entries, false).unwrap();
        assert_eq!(bytes, vec![1, 0, 0, 0, 1, b'k', 2, b'v', b'v']);
    }

    #[test]
    fn binary_count_header_matches_entries() {
        let bytes = Encoding::Binary.encode(&sample(), false).unwrap();
        let count = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        assert_eq!(count, 3);
        assert_eq!(Encoding::Binary.decode(&bytes, false).unwrap(), sample());
    }

    #[test]
    fn binary_ignores_obscure_flag() {
        let plain = Encoding::Binary.encode(&sample(), false).unwrap();
        let flagged = Encoding::Binary.encode(&sample(), true).unwrap();
        assert_eq!(plain, flagged);
        assert_eq!(Encoding::Binary.decode(&plain, true).unwrap(), sample());
    }

    #[test]
    fn binary_long_string_uses_multibyte_prefix() {
        let mut entries = Entries::new();
        entries.insert("long".into(), "x".repeat(300));
        let bytes = Encoding::Binary.encode(&entries, false).unwrap();
        // 300 = 0b10_0101100 -> [0xAC, 0x02]
        let value_prefix = COUNT_SIZE + 1 + "long".len();
        assert_eq!(&bytes[value_prefix..value_prefix + 2], &[0xAC, 0x02]);
        assert_eq!(Encoding::Binary.decode(&bytes, false).unwrap(), entries);
    }

    #[test]
    fn binary_empty_map() {
        let bytes = Encoding::Binary.encode(&Entries::new(), false).unwrap();
        assert_eq!(bytes, vec![0, 0, 0, 0]);
        assert!(Encoding::Binary.decode(&bytes, false).unwrap().is_empty());
    }

    #[test]
    fn binary_rejects_short_header() {
        let err = Encoding::Binary.decode(&[1, 0], false).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { offset: 0, .. }));
    }

    #[test]
    fn binary_rejects_negative_count() {
        let err = Encoding::Binary
            .decode(&(-1i32).to_le_bytes(), false)
            .unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn binary_rejects_truncated_pair() {
        let bytes = Encoding::Binary.encode(&sample(), false).unwrap();
        let err = Encoding::Binary
            .decode(&bytes[..bytes.len() - 1], false)
            .unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn binary_rejects_count_larger_than_payload() {
        let mut bytes = Encoding::Binary.encode(&sample(), false).unwrap();
        bytes[0] = 4;
        let err = Encoding::Binary.decode(&bytes, false).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn binary_rejects_duplicate_keys() {
        let bytes = vec![2, 0, 0, 0, 1, b'a', 1, b'1', 1, b'a', 1, b'2'];
        let err = Encoding::Binary.decode(&bytes, false).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { offset: 8, .. }));
    }

    #[test]
    fn binary_rejects_invalid_utf8() {
        let bytes = vec![1, 0, 0, 0, 1, 0xFF, 0];
        let err = Encoding::Binary.decode(&bytes, false).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { offset: 5, .. }));
    }

    #[test]
    fn binary_rejects_overlong_prefix() {
        let bytes = vec![1, 0, 0, 0, 0x80, 0x80, 0x80, 0x80, 0x80, 0x01];
        let err = Encoding::Binary.decode(&bytes, false).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { offset: 4, .. }));
    }

    #[test]
    fn binary_tolerates_trailing_bytes() {
        let mut bytes = Encoding::Binary.encode(&sample(), false).unwrap();
        bytes.extend_from_slice(&[0xDE, 0xAD]);
        assert_eq!(Encoding::Binary.decode(&bytes, false).unwrap(), sample());
    }

    proptest! {
        #[test]
        fn binary_preserves_arbitrary_entries(
            entries in proptest::collection::btree_map(".{0,40}", ".{0,200}", 0..24)
        ) {
            let bytes = Encoding::Binary.encode(&entries, false).unwrap();
            prop_assert_eq!(Encoding::Binary.decode(&bytes, false).unwrap(), entries);
        }
    }
}
