//! Typed layer over the encrypted value codec.
//!
//! Maps the supported scalar types (bounded and unbounded text, date,
//! datetime, int, long, float) onto canonical byte forms and runs them
//! through the codec pipeline, producing self-describing stored strings
//! that coexist with legacy plaintext rows.

mod canonical;
mod error;
mod field;

pub use canonical::{FieldKind, FieldValue};
pub use cipherfield_codec::{CipherKind, CipherMode, CipherSpec, CodecError};
pub use error::{FieldError, FieldResult};
pub use field::EncryptedField;
