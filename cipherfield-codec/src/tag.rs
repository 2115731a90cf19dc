//! Self-describing value tags.
//!
//! A stored value is `"$" CipherName "$" [ModeName "$"] hex(iv? || ct)`.
//! The mode segment is omitted for the default mode, so readers with no
//! external metadata can still resolve the cipher, mode and IV from the
//! value alone. Anything that does not start with a recognized prefix is a
//! legacy plaintext value and passes through untouched.
//!
//! A plaintext value that happens to begin with a valid prefix is
//! indistinguishable from ciphertext; this ambiguity is part of the format.

use crate::cipher::{CipherKind, CipherMode};
use crate::error::{CodecError, CodecResult};

/// Prefix a value written with this cipher and mode carries.
pub fn prefix(kind: CipherKind, mode: CipherMode) -> String {
    if mode == CipherMode::default() {
        format!("${}$", kind.name())
    } else {
        format!("${}${}$", kind.name(), mode.name())
    }
}

/// Whether `value` carries the given prefix (and is therefore treated as
/// already encrypted by writers and as ciphertext by readers).
pub fn is_tagged(value: &str, expected_prefix: &str) -> bool {
    value.starts_with(expected_prefix)
}

/// Wraps ciphertext (and IV, when present) into a stored string.
pub fn encode(
    kind: CipherKind,
    mode: CipherMode,
    iv: Option<&[u8]>,
    ciphertext: &[u8],
) -> String {
    let mut payload = Vec::with_capacity(iv.map_or(0, |iv| iv.len()) + ciphertext.len());
    if let Some(iv) = iv {
        payload.extend_from_slice(iv);
    }
    payload.extend_from_slice(ciphertext);
    format!("{}{}", prefix(kind, mode), hex::encode(payload))
}

/// A stored value parsed back into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedValue {
    pub kind: CipherKind,
    pub mode: CipherMode,
    pub iv: Option<Vec<u8>>,
    pub ciphertext: Vec<u8>,
}

/// Parses a stored string into cipher, mode, IV and ciphertext.
///
/// The IV is split off only when the parsed mode carries one; its length is
/// the cipher block size. The remaining ciphertext must be block-aligned.
pub fn decode(stored: &str) -> CodecResult<DecodedValue> {
    let malformed = || CodecError::MalformedTag(stored.to_string());

    let rest = stored.strip_prefix('$').ok_or_else(malformed)?;
    let (cipher_name, rest) = rest.split_once('$').ok_or_else(malformed)?;
    let kind = CipherKind::parse(cipher_name)
        .ok_or_else(|| CodecError::UnknownCipher(cipher_name.to_string()))?;

    let (mode, payload) = match rest.split_once('$') {
        Some((mode_name, payload)) => {
            let mode = CipherMode::parse(mode_name)
                .ok_or_else(|| CodecError::UnknownMode(mode_name.to_string()))?;
            (mode, payload)
        }
        None => (CipherMode::default(), rest),
    };

    let raw = hex::decode(payload)?;
    let block_size = kind.block_size();
    let iv_len = if mode.requires_iv() { block_size } else { 0 };
    if raw.len() < iv_len || (raw.len() - iv_len) % block_size != 0 {
        return Err(CodecError::PayloadLength {
            len: raw.len(),
            block_size,
        });
    }
    let (iv, ciphertext) = raw.split_at(iv_len);

    Ok(DecodedValue {
        kind,
        mode,
        iv: (iv_len > 0).then(|| iv.to_vec()),
        ciphertext: ciphertext.to_vec(),
    })
}
