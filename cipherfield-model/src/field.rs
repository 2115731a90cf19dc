//! Typed encrypted fields.
//!
//! An [`EncryptedField`] binds one cipher configuration to one scalar kind
//! and owns the whole value transformation; callers hand it typed values and
//! stored strings, never key material or intermediate bytes. Reads accept
//! both tagged ciphertext and legacy plaintext rows from before encryption
//! was enabled.

use crate::canonical::{self, FieldKind, FieldValue};
use crate::error::FieldResult;
use cipherfield_codec::{CipherSpec, FieldCipher, padding, tag};
use tracing::{debug, trace};

/// Encrypt/decrypt pipeline for a single database column.
pub struct EncryptedField {
    cipher: FieldCipher,
    kind: FieldKind,
}

impl EncryptedField {
    /// Resolves the cipher configuration for a column of the given kind.
    pub fn new(spec: &CipherSpec, kind: FieldKind) -> FieldResult<Self> {
        let cipher = FieldCipher::new(spec)?;
        let field = Self { cipher, kind };
        debug!(
            prefix = field.cipher.prefix(),
            kind = ?field.kind,
            storage_width = ?field.storage_width(),
            "encrypted field configured"
        );
        Ok(field)
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Tag prefix values written by this field carry.
    pub fn prefix(&self) -> &str {
        self.cipher.prefix()
    }

    /// Column width needed to store any value of this field, or `None` for
    /// kinds that live in unbounded text columns.
    pub fn storage_width(&self) -> Option<usize> {
        self.kind
            .max_canonical_len()
            .map(|max| self.cipher.storage_width(max))
    }

    /// Encrypts a typed value into its stored string.
    ///
    /// Text input that already carries this field's prefix is returned
    /// unchanged, so re-writing a stored value never double-encrypts.
    /// Bounded kinds are length-checked before any cipher work.
    pub fn encrypt(&self, value: &FieldValue) -> FieldResult<String> {
        if let FieldValue::Text(text) = value {
            if tag::is_tagged(text, self.cipher.prefix()) {
                trace!("value already tagged, storing unchanged");
                return Ok(text.clone());
            }
        }
        let canonical = canonical::to_canonical(self.kind, value)?;
        let padded = padding::pad(&canonical, self.cipher.block_size());
        let (iv, ciphertext) = self.cipher.encrypt(&padded)?;
        Ok(tag::encode(
            self.cipher.kind(),
            self.cipher.mode(),
            iv.as_deref(),
            &ciphertext,
        ))
    }

    /// Decrypts a stored string back into its typed value.
    ///
    /// Untagged input is a legacy plaintext row and is parsed as the plain
    /// canonical form. An empty stored string is the empty value: the empty
    /// string for text kinds, `None` for the others.
    pub fn decrypt(&self, stored: &str) -> FieldResult<Option<FieldValue>> {
        if !tag::is_tagged(stored, self.cipher.prefix()) {
            return self.legacy_value(stored);
        }
        let decoded = tag::decode(stored)?;
        let padded = self.cipher.decrypt(decoded.iv.as_deref(), &decoded.ciphertext)?;
        let canonical = padding::unpad(&padded)?;
        Ok(Some(canonical::from_canonical(self.kind, canonical)?))
    }

    fn legacy_value(&self, stored: &str) -> FieldResult<Option<FieldValue>> {
        if stored.is_empty()
            && !matches!(self.kind, FieldKind::Char { .. } | FieldKind::Text)
        {
            return Ok(None);
        }
        trace!(len = stored.len(), "untagged stored value, passing through");
        Ok(Some(canonical::from_canonical(self.kind, stored.as_bytes())?))
    }
}
