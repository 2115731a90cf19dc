//! Terminator-and-filler padding for block encryption.
//!
//! Plaintext is extended with a single `0x00` terminator followed by random
//! printable filler until the total length is a multiple of the cipher block
//! size. Unpadding trims at the first `0x00`, so plaintext itself must not
//! contain a NUL byte — canonical value forms never do.

use crate::error::{CodecError, CodecResult};
use rand::{Rng, rngs::OsRng};

/// Byte marking the end of the real plaintext inside a padded block.
pub const TERMINATOR: u8 = 0x00;

/// Filler alphabet: digits, letters, punctuation and whitespace.
/// Never contains the terminator byte.
const FILLER: &[u8] =
    b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ\
!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~ \t\n\r\x0b\x0c";

/// Number of padding bytes (terminator included) appended to a plaintext of
/// `len` bytes. Always in `[2, block_size + 1]`: at least the terminator and
/// one filler byte, at the cost of a full extra block when `len + 2` already
/// sits on a block boundary.
pub fn padding_len(len: usize, block_size: usize) -> usize {
    block_size - ((len + 2) % block_size) + 2
}

/// Pads `plaintext` to a multiple of `block_size` with the terminator and
/// random printable filler.
pub fn pad(plaintext: &[u8], block_size: usize) -> Vec<u8> {
    let pad_len = padding_len(plaintext.len(), block_size);
    let mut padded = Vec::with_capacity(plaintext.len() + pad_len);
    padded.extend_from_slice(plaintext);
    padded.push(TERMINATOR);
    for _ in 1..pad_len {
        padded.push(FILLER[OsRng.gen_range(0..FILLER.len())]);
    }
    padded
}

/// Returns the plaintext bytes before the first terminator.
///
/// Missing terminator means the input was tampered with, truncated, or
/// decrypted with the wrong key; it is reported, never papered over.
pub fn unpad(padded: &[u8]) -> CodecResult<&[u8]> {
    padded
        .iter()
        .position(|&b| b == TERMINATOR)
        .map(|end| &padded[..end])
        .ok_or(CodecError::MissingTerminator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_len_stays_within_bounds() {
        for block_size in [8usize, 16] {
            for len in 0..4 * block_size {
                let pad_len = padding_len(len, block_size);
                assert!(pad_len >= 2, "len {len} block {block_size}");
                assert!(pad_len <= block_size + 1, "len {len} block {block_size}");
                assert_eq!((len + pad_len) % block_size, 0);
            }
        }
    }

    #[test]
    fn five_byte_value_pads_to_one_block() {
        // 16 - ((5 + 2) % 16) + 2 = 11
        assert_eq!(padding_len(5, 16), 11);
        assert_eq!(pad(b"hello", 16).len(), 16);
    }

    #[test]
    fn aligned_value_gains_a_full_block() {
        // 14 + 2 lands on the boundary, so only the minimum 2 bytes
        assert_eq!(padding_len(14, 16), 2);
        // 16 + 2 overshoots into the next block
        assert_eq!(padding_len(16, 16), 16);
        assert_eq!(pad(&[b'x'; 16], 16).len(), 32);
    }

    #[test]
    fn pad_unpad_round_trip() {
        let plaintext = b"round trip me";
        let padded = pad(plaintext, 16);
        assert_eq!(unpad(&padded).unwrap(), plaintext);
    }

    #[test]
    fn empty_plaintext_round_trips() {
        let padded = pad(b"", 8);
        assert_eq!(padded.len(), 8);
        assert_eq!(unpad(&padded).unwrap(), b"");
    }

    #[test]
    fn filler_never_contains_terminator() {
        assert!(!FILLER.contains(&TERMINATOR));
        for _ in 0..32 {
            let padded = pad(b"abc", 16);
            // exactly one terminator region: everything after it is filler
            assert_eq!(padded[3], TERMINATOR);
            assert!(padded[4..].iter().all(|&b| b != TERMINATOR));
        }
    }

    #[test]
    fn unpad_without_terminator_fails() {
        let garbage = vec![0xFFu8; 16];
        assert!(matches!(
            unpad(&garbage),
            Err(CodecError::MissingTerminator)
        ));
    }
}
