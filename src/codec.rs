//! Persisted account layout
//!
//! The external encoding of a store account is fixed byte-for-byte, so
//! this codec is explicit rather than derive-driven.
//!
//! Layout (all integers little-endian):
//!
//! ```text
//! [0..8]   [u8; 8]  account tag (= b"STOREACC")
//! [8..12]  u32      entry count
//! ---- per entry ----
//!          u32      item length, then item UTF-8 bytes
//!          u32      price length, then price UTF-8 bytes
//!          i64      quantity
//!          i64      entry_timestamp
//! ---- trailer ----
//!          u8       bump
//! ```
//!
//! Decoding validates the tag, every length against the remaining bytes,
//! UTF-8, and rejects trailing garbage. It never panics on malformed
//! input.

use crate::{
    error::{Error, Result},
    types::{Entry, StoreAccount},
};
use bytes::{Buf, BufMut};

/// Discriminator identifying the store account type.
pub const ACCOUNT_TAG: [u8; 8] = *b"STOREACC";

/// Exact encoded size of an account, in bytes.
pub fn encoded_len(account: &StoreAccount) -> usize {
    let mut len = ACCOUNT_TAG.len() + 4 + 1;
    for entry in &account.entries {
        len += 4 + entry.item.len() + 4 + entry.price.len() + 8 + 8;
    }
    len
}

/// Encode an account into its persisted layout.
pub fn encode(account: &StoreAccount) -> Vec<u8> {
    let mut buf = Vec::with_capacity(encoded_len(account));
    buf.put_slice(&ACCOUNT_TAG);
    buf.put_u32_le(account.entries.len() as u32);
    for entry in &account.entries {
        put_string(&mut buf, &entry.item);
        put_string(&mut buf, &entry.price);
        buf.put_i64_le(entry.quantity);
        buf.put_i64_le(entry.entry_timestamp);
    }
    buf.put_u8(account.bump);
    buf
}

/// Decode an account from its persisted layout.
pub fn decode(data: &[u8]) -> Result<StoreAccount> {
    let mut buf = data;

    if buf.remaining() < ACCOUNT_TAG.len() {
        return Err(Error::Codec("truncated account: missing tag".to_string()));
    }
    let mut tag = [0u8; 8];
    buf.copy_to_slice(&mut tag);
    if tag != ACCOUNT_TAG {
        return Err(Error::Codec(format!("unknown account tag {:02x?}", tag)));
    }

    if buf.remaining() < 4 {
        return Err(Error::Codec(
            "truncated account: missing entry count".to_string(),
        ));
    }
    let count = buf.get_u32_le() as usize;

    // Each entry needs at least 24 bytes; bounds the pre-allocation.
    let mut entries = Vec::with_capacity(count.min(buf.remaining() / 24 + 1));
    for index in 0..count {
        let item = get_string(&mut buf, index, "item")?;
        let price = get_string(&mut buf, index, "price")?;
        if buf.remaining() < 16 {
            return Err(Error::Codec(format!(
                "truncated account: entry {} scalars",
                index
            )));
        }
        let quantity = buf.get_i64_le();
        let entry_timestamp = buf.get_i64_le();
        entries.push(Entry {
            item,
            price,
            quantity,
            entry_timestamp,
        });
    }

    if buf.remaining() < 1 {
        return Err(Error::Codec("truncated account: missing bump".to_string()));
    }
    let bump = buf.get_u8();

    if buf.has_remaining() {
        return Err(Error::Codec(format!(
            "{} trailing bytes after account",
            buf.remaining()
        )));
    }

    Ok(StoreAccount { entries, bump })
}

fn put_string(buf: &mut Vec<u8>, s: &str) {
    buf.put_u32_le(s.len() as u32);
    buf.put_slice(s.as_bytes());
}

fn get_string(buf: &mut &[u8], index: usize, field: &str) -> Result<String> {
    if buf.remaining() < 4 {
        return Err(Error::Codec(format!(
            "truncated account: entry {} {} length",
            index, field
        )));
    }
    let len = buf.get_u32_le() as usize;
    if buf.remaining() < len {
        return Err(Error::Codec(format!(
            "truncated account: entry {} {} wants {} bytes, {} remain",
            index,
            field,
            len,
            buf.remaining()
        )));
    }
    let raw = buf.copy_to_bytes(len);
    String::from_utf8(raw.to_vec()).map_err(|_| {
        Error::Codec(format!("entry {} {} is not valid UTF-8", index, field))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_account() -> StoreAccount {
        StoreAccount {
            entries: vec![
                Entry {
                    item: "Laptop".to_string(),
                    price: "2000".to_string(),
                    quantity: 10,
                    entry_timestamp: 1_700_000_000,
                },
                Entry {
                    item: "Tablet".to_string(),
                    price: "1000".to_string(),
                    quantity: -5,
                    entry_timestamp: -1,
                },
            ],
            bump: 253,
        }
    }

    #[test]
    fn test_round_trip() {
        let account = sample_account();
        let decoded = decode(&encode(&account)).unwrap();
        assert_eq!(decoded, account);
    }

    #[test]
    fn test_round_trip_empty() {
        let account = StoreAccount::new(255);
        let decoded = decode(&encode(&account)).unwrap();
        assert_eq!(decoded, account);
    }

    #[test]
    fn test_encoded_len_matches() {
        let account = sample_account();
        assert_eq!(encode(&account).len(), encoded_len(&account));

        let empty = StoreAccount::new(0);
        // tag + count + bump
        assert_eq!(encoded_len(&empty), 8 + 4 + 1);
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let mut raw = encode(&sample_account());
        raw[0] = b'X';
        let err = decode(&raw).unwrap_err();
        assert!(matches!(err, Error::Codec(_)));
    }

    #[test]
    fn test_truncation_rejected() {
        let raw = encode(&sample_account());
        for cut in [0, 4, 11, raw.len() / 2, raw.len() - 1] {
            assert!(
                matches!(decode(&raw[..cut]), Err(Error::Codec(_))),
                "cut at {} accepted",
                cut
            );
        }
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut raw = encode(&sample_account());
        raw.push(0);
        assert!(matches!(decode(&raw), Err(Error::Codec(_))));
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let account = StoreAccount {
            entries: vec![Entry {
                item: "ok".to_string(),
                price: "1".to_string(),
                quantity: 1,
                entry_timestamp: 0,
            }],
            bump: 1,
        };
        let mut raw = encode(&account);
        // First item byte sits right after tag, count and item length.
        raw[16] = 0xff;
        assert!(matches!(decode(&raw), Err(Error::Codec(_))));
    }

    #[test]
    fn test_oversized_length_prefix_rejected() {
        let mut raw = Vec::new();
        raw.put_slice(&ACCOUNT_TAG);
        raw.put_u32_le(1);
        raw.put_u32_le(u32::MAX); // item claims 4 GiB
        assert!(matches!(decode(&raw), Err(Error::Codec(_))));
    }
}
