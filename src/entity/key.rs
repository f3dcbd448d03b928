//! Persistence key derivation.

use heapless::String;

use crate::storage::KEY_LEN;

/// A derived persistence key, at most [`KEY_LEN`] bytes.
pub type Key = String<KEY_LEN>;

/// Derives the store key for an entity name.
///
/// Names of up to [`KEY_LEN`] bytes are used as-is. Longer names keep their
/// last `KEY_LEN - 1` bytes followed by one checksum digit, the sum of all
/// byte values of the full name modulo 10. Two long names with the same tail
/// collide only when their byte sums agree modulo 10.
///
/// The tail never starts inside a multi-byte character, so a long non-ASCII
/// name can yield a key of fewer than [`KEY_LEN`] bytes. Only ASCII names are
/// guaranteed a key of exactly `KEY_LEN` bytes.
pub fn persistence_key(name: &str) -> Key {
    let mut key = Key::new();
    if name.len() <= KEY_LEN {
        let _ = key.push_str(name);
        return key;
    }

    let checksum = name.bytes().map(u32::from).sum::<u32>() % 10;

    let mut start = name.len() - (KEY_LEN - 1);
    while !name.is_char_boundary(start) {
        start += 1;
    }
    let _ = key.push_str(&name[start..]);
    // `checksum` is a single decimal digit.
    let _ = key.push(char::from(b'0' + checksum as u8));
    key
}
