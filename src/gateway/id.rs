//! Client-side wallet identifiers.

use rand::Rng;

/// Length of a generated wallet id.
pub const ID_LEN: usize = 5;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Random lowercase hexadecimal id of [`ID_LEN`] characters.
///
/// Ids are not checked for collisions; inserting a duplicate fails with a
/// unique-constraint error.
pub fn random_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ID_LEN)
        .map(|_| HEX_DIGITS[rng.gen_range(0..HEX_DIGITS.len())] as char)
        .collect()
}
