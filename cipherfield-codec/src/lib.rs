//! Value codec for transparently encrypted database columns.
//!
//! Stored values are self-describing strings: an ASCII prefix naming the
//! cipher (and non-default mode), followed by the hex-encoded IV and
//! ciphertext. Untagged values are legacy plaintext and coexist in the same
//! column.
//!
//! # Pipeline
//!
//! On write: canonical bytes → [`padding::pad`] → [`FieldCipher::encrypt`]
//! → [`tag::encode`]. On read: [`tag::decode`] → [`FieldCipher::decrypt`]
//! → [`padding::unpad`]. [`storage_width`] sizes the column a configuration
//! needs for a given plaintext bound.
//!
//! Every operation is a pure function of its inputs plus the system RNG;
//! configuration is immutable and shareable, per-call cipher state is never
//! retained. The scheme is the historical one: block cipher plus terminator
//! padding, no authentication.

mod budget;
mod cipher;
mod error;
pub mod padding;
pub mod tag;

pub use budget::storage_width;
pub use cipher::{CipherKind, CipherMode, CipherSpec, FieldCipher};
pub use error::{CodecError, CodecResult};
pub use tag::is_tagged;
