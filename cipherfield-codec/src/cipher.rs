//! Cipher resolution and per-call encryption contexts.
//!
//! A [`FieldCipher`] holds immutable configuration only: cipher kind, mode,
//! truncated key and the derived tag prefix. Every encrypt call builds a
//! fresh cipher context and a fresh random IV; every decrypt call builds a
//! fresh context seeded with the IV carried by the stored value. Nothing
//! per-call is retained, so one instance can be shared across threads.

use crate::error::{CodecError, CodecResult};
use crate::{budget, tag};
use aes::{Aes128, Aes192, Aes256};
use blowfish::Blowfish;
use cipher::generic_array::GenericArray;
use cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use rand::{RngCore, rngs::OsRng};
use serde::Deserialize;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Supported block ciphers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherKind {
    Aes,
    Blowfish,
}

impl CipherKind {
    /// Resolves an ASCII cipher name from a value tag or configuration.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "AES" => Some(Self::Aes),
            "Blowfish" => Some(Self::Blowfish),
            _ => None,
        }
    }

    /// Name as it appears inside the stored-value tag.
    pub fn name(self) -> &'static str {
        match self {
            Self::Aes => "AES",
            Self::Blowfish => "Blowfish",
        }
    }

    /// Cipher block size in bytes.
    pub fn block_size(self) -> usize {
        match self {
            Self::Aes => 16,
            Self::Blowfish => 8,
        }
    }

    /// Longest key the cipher accepts; longer keys are truncated to this.
    pub fn max_key_len(self) -> usize {
        match self {
            Self::Aes => 32,
            Self::Blowfish => 56,
        }
    }
}

/// Block chaining modes.
///
/// The default mode carries no IV; it exists for compatibility with values
/// written before chained modes were configurable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CipherMode {
    #[default]
    Ecb,
    Cbc,
}

impl CipherMode {
    /// Resolves an ASCII mode name from a value tag or configuration.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "MODE_ECB" => Some(Self::Ecb),
            "MODE_CBC" => Some(Self::Cbc),
            _ => None,
        }
    }

    /// Name as it appears inside the stored-value tag.
    pub fn name(self) -> &'static str {
        match self {
            Self::Ecb => "MODE_ECB",
            Self::Cbc => "MODE_CBC",
        }
    }

    /// Whether the mode needs an IV alongside the ciphertext.
    pub fn requires_iv(self) -> bool {
        matches!(self, Self::Cbc)
    }
}

/// Cipher configuration as supplied by the surrounding application.
///
/// `mode` is optional; omitted means the default legacy mode. The key is
/// whatever secret the caller provides — anything past the cipher's accepted
/// key length is cut off at construction.
#[derive(Clone, Deserialize)]
pub struct CipherSpec {
    pub cipher: String,
    #[serde(default)]
    pub mode: Option<String>,
    pub key: Vec<u8>,
}

impl CipherSpec {
    pub fn new(cipher: &str, key: &[u8]) -> Self {
        Self {
            cipher: cipher.to_string(),
            mode: None,
            key: key.to_vec(),
        }
    }

    pub fn with_mode(mut self, mode: &str) -> Self {
        self.mode = Some(mode.to_string());
        self
    }
}

impl fmt::Debug for CipherSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherSpec")
            .field("cipher", &self.cipher)
            .field("mode", &self.mode)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Key material retained by a [`FieldCipher`]. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
struct Key(Vec<u8>);

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Key(<redacted>)")
    }
}

/// Resolved cipher configuration for one encrypted column.
///
/// Immutable after construction and safe to share; see the module docs for
/// the per-call context rule.
#[derive(Debug)]
pub struct FieldCipher {
    kind: CipherKind,
    mode: CipherMode,
    key: Key,
    prefix: String,
}

impl FieldCipher {
    /// Resolves a [`CipherSpec`] into a ready-to-use configuration.
    ///
    /// Fails when the cipher or mode name is unknown, or when the truncated
    /// key is not a length the cipher accepts.
    pub fn new(spec: &CipherSpec) -> CodecResult<Self> {
        let kind = CipherKind::parse(&spec.cipher)
            .ok_or_else(|| CodecError::UnknownCipher(spec.cipher.clone()))?;
        let mode = match spec.mode.as_deref() {
            None => CipherMode::default(),
            Some(name) => {
                CipherMode::parse(name).ok_or_else(|| CodecError::UnknownMode(name.to_string()))?
            }
        };
        let mut key = spec.key.clone();
        key.truncate(kind.max_key_len());
        // Validate the key once up front so per-value calls cannot hit a
        // configuration error later.
        BlockContext::new(kind, &key)?;

        Ok(Self {
            kind,
            mode,
            prefix: tag::prefix(kind, mode),
            key: Key(key),
        })
    }

    pub fn kind(&self) -> CipherKind {
        self.kind
    }

    pub fn mode(&self) -> CipherMode {
        self.mode
    }

    /// Block size of the configured cipher, in bytes.
    pub fn block_size(&self) -> usize {
        self.kind.block_size()
    }

    /// IV length in bytes; 0 when the mode carries none.
    pub fn iv_len(&self) -> usize {
        if self.mode.requires_iv() {
            self.block_size()
        } else {
            0
        }
    }

    /// Tag prefix stored values written by this configuration carry.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Column width needed to store any value whose canonical form is at
    /// most `plaintext_max_length` bytes.
    pub fn storage_width(&self, plaintext_max_length: usize) -> usize {
        budget::storage_width(
            plaintext_max_length,
            self.block_size(),
            self.iv_len(),
            self.prefix.len(),
        )
    }

    /// Encrypts a padded buffer, returning the fresh IV (for IV-bearing
    /// modes) and the ciphertext. Input length must be a multiple of the
    /// block size.
    pub fn encrypt(&self, padded: &[u8]) -> CodecResult<(Option<Vec<u8>>, Vec<u8>)> {
        let block_size = self.block_size();
        if padded.is_empty() || padded.len() % block_size != 0 {
            return Err(CodecError::PayloadLength {
                len: padded.len(),
                block_size,
            });
        }
        let context = BlockContext::new(self.kind, &self.key.0)?;
        let mut buf = padded.to_vec();
        match self.mode {
            CipherMode::Ecb => {
                context.encrypt_ecb(&mut buf);
                Ok((None, buf))
            }
            CipherMode::Cbc => {
                let mut iv = vec![0u8; block_size];
                OsRng.fill_bytes(&mut iv);
                context.encrypt_cbc(&iv, &mut buf);
                Ok((Some(iv), buf))
            }
        }
    }

    /// Decrypts ciphertext produced by [`FieldCipher::encrypt`], seeding a
    /// fresh context with the IV extracted from the stored value.
    pub fn decrypt(&self, iv: Option<&[u8]>, ciphertext: &[u8]) -> CodecResult<Vec<u8>> {
        let block_size = self.block_size();
        if ciphertext.len() % block_size != 0 {
            return Err(CodecError::PayloadLength {
                len: ciphertext.len(),
                block_size,
            });
        }
        let context = BlockContext::new(self.kind, &self.key.0)?;
        let mut buf = ciphertext.to_vec();
        match self.mode {
            CipherMode::Ecb => context.decrypt_ecb(&mut buf),
            CipherMode::Cbc => {
                let iv = iv.ok_or(CodecError::InvalidIvLength {
                    expected: block_size,
                    actual: 0,
                })?;
                if iv.len() != block_size {
                    return Err(CodecError::InvalidIvLength {
                        expected: block_size,
                        actual: iv.len(),
                    });
                }
                context.decrypt_cbc(iv, &mut buf);
            }
        }
        Ok(buf)
    }
}

/// Per-call block cipher context. Built fresh for every encrypt/decrypt.
enum BlockContext {
    Aes128(Aes128),
    Aes192(Aes192),
    Aes256(Aes256),
    Blowfish(Box<Blowfish>),
}

impl BlockContext {
    fn new(kind: CipherKind, key: &[u8]) -> CodecResult<Self> {
        let invalid = || CodecError::InvalidKeyLength {
            cipher: kind.name(),
            actual: key.len(),
        };
        match kind {
            CipherKind::Aes => match key.len() {
                16 => Aes128::new_from_slice(key)
                    .map(Self::Aes128)
                    .map_err(|_| invalid()),
                24 => Aes192::new_from_slice(key)
                    .map(Self::Aes192)
                    .map_err(|_| invalid()),
                32 => Aes256::new_from_slice(key)
                    .map(Self::Aes256)
                    .map_err(|_| invalid()),
                _ => Err(invalid()),
            },
            CipherKind::Blowfish => Blowfish::new_from_slice(key)
                .map(|c| Self::Blowfish(Box::new(c)))
                .map_err(|_| invalid()),
        }
    }

    fn encrypt_block(&self, block: &mut [u8]) {
        match self {
            Self::Aes128(c) => c.encrypt_block(GenericArray::from_mut_slice(block)),
            Self::Aes192(c) => c.encrypt_block(GenericArray::from_mut_slice(block)),
            Self::Aes256(c) => c.encrypt_block(GenericArray::from_mut_slice(block)),
            Self::Blowfish(c) => c.encrypt_block(GenericArray::from_mut_slice(block)),
        }
    }

    fn decrypt_block(&self, block: &mut [u8]) {
        match self {
            Self::Aes128(c) => c.decrypt_block(GenericArray::from_mut_slice(block)),
            Self::Aes192(c) => c.decrypt_block(GenericArray::from_mut_slice(block)),
            Self::Aes256(c) => c.decrypt_block(GenericArray::from_mut_slice(block)),
            Self::Blowfish(c) => c.decrypt_block(GenericArray::from_mut_slice(block)),
        }
    }

    fn block_size(&self) -> usize {
        match self {
            Self::Blowfish(_) => 8,
            _ => 16,
        }
    }

    fn encrypt_ecb(&self, buf: &mut [u8]) {
        for block in buf.chunks_exact_mut(self.block_size()) {
            self.encrypt_block(block);
        }
    }

    fn decrypt_ecb(&self, buf: &mut [u8]) {
        for block in buf.chunks_exact_mut(self.block_size()) {
            self.decrypt_block(block);
        }
    }

    fn encrypt_cbc(&self, iv: &[u8], buf: &mut [u8]) {
        let mut prev = iv.to_vec();
        for block in buf.chunks_exact_mut(self.block_size()) {
            xor_in_place(block, &prev);
            self.encrypt_block(block);
            prev.copy_from_slice(block);
        }
    }

    fn decrypt_cbc(&self, iv: &[u8], buf: &mut [u8]) {
        let mut prev = iv.to_vec();
        for block in buf.chunks_exact_mut(self.block_size()) {
            let saved = block.to_vec();
            self.decrypt_block(block);
            xor_in_place(block, &prev);
            prev = saved;
        }
    }
}

fn xor_in_place(block: &mut [u8], other: &[u8]) {
    for (b, o) in block.iter_mut().zip(other) {
        *b ^= o;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aes_spec() -> CipherSpec {
        CipherSpec::new("AES", &[0x42u8; 32])
    }

    #[test]
    fn unknown_cipher_is_rejected() {
        let spec = CipherSpec::new("ROT13", b"0123456789abcdef");
        assert!(matches!(
            FieldCipher::new(&spec),
            Err(CodecError::UnknownCipher(name)) if name == "ROT13"
        ));
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let spec = aes_spec().with_mode("MODE_CTR");
        assert!(matches!(
            FieldCipher::new(&spec),
            Err(CodecError::UnknownMode(name)) if name == "MODE_CTR"
        ));
    }

    #[test]
    fn short_aes_key_is_rejected() {
        let spec = CipherSpec::new("AES", &[0u8; 10]);
        assert!(matches!(
            FieldCipher::new(&spec),
            Err(CodecError::InvalidKeyLength { actual: 10, .. })
        ));
    }

    #[test]
    fn overlong_key_is_truncated() {
        // 48-byte key behaves exactly like its first 32 bytes
        let mut long_key = vec![0x42u8; 32];
        long_key.extend_from_slice(&[0xFFu8; 16]);
        let truncated = FieldCipher::new(&aes_spec()).unwrap();
        let full = FieldCipher::new(&CipherSpec::new("AES", &long_key)).unwrap();

        let padded = [0xA5u8; 16];
        let (_, ct1) = truncated.encrypt(&padded).unwrap();
        let (_, ct2) = full.encrypt(&padded).unwrap();
        assert_eq!(ct1, ct2);
    }

    #[test]
    fn default_mode_round_trip_is_deterministic() {
        let cipher = FieldCipher::new(&aes_spec()).unwrap();
        let padded = [0x5Au8; 32];

        let (iv, ct) = cipher.encrypt(&padded).unwrap();
        assert!(iv.is_none());
        assert_eq!(ct.len(), padded.len());
        // no IV, so the same input encrypts identically
        let (_, ct_again) = cipher.encrypt(&padded).unwrap();
        assert_eq!(ct, ct_again);

        assert_eq!(cipher.decrypt(None, &ct).unwrap(), padded);
    }

    #[test]
    fn cbc_generates_a_fresh_iv_per_call() {
        let cipher = FieldCipher::new(&aes_spec().with_mode("MODE_CBC")).unwrap();
        let padded = [0x5Au8; 32];

        let (iv1, ct1) = cipher.encrypt(&padded).unwrap();
        let (iv2, ct2) = cipher.encrypt(&padded).unwrap();
        assert_ne!(iv1, iv2);
        assert_ne!(ct1, ct2);

        assert_eq!(cipher.decrypt(iv1.as_deref(), &ct1).unwrap(), padded);
        assert_eq!(cipher.decrypt(iv2.as_deref(), &ct2).unwrap(), padded);
    }

    #[test]
    fn cbc_decrypt_requires_the_iv() {
        let cipher = FieldCipher::new(&aes_spec().with_mode("MODE_CBC")).unwrap();
        let (_, ct) = cipher.encrypt(&[0u8; 16]).unwrap();
        assert!(matches!(
            cipher.decrypt(None, &ct),
            Err(CodecError::InvalidIvLength { actual: 0, .. })
        ));
    }

    #[test]
    fn blowfish_round_trips_with_eight_byte_blocks() {
        let spec = CipherSpec::new("Blowfish", b"hunter2hunter2");
        let cipher = FieldCipher::new(&spec).unwrap();
        assert_eq!(cipher.block_size(), 8);

        let padded = [0x33u8; 24];
        let (_, ct) = cipher.encrypt(&padded).unwrap();
        assert_eq!(cipher.decrypt(None, &ct).unwrap(), padded);
    }

    #[test]
    fn unaligned_input_is_rejected() {
        let cipher = FieldCipher::new(&aes_spec()).unwrap();
        assert!(matches!(
            cipher.encrypt(&[0u8; 15]),
            Err(CodecError::PayloadLength { len: 15, .. })
        ));
        assert!(matches!(
            cipher.decrypt(None, &[0u8; 17]),
            Err(CodecError::PayloadLength { len: 17, .. })
        ));
    }

    #[test]
    fn spec_debug_redacts_the_key() {
        let debug = format!("{:?}", aes_spec());
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("66"));
    }
}
