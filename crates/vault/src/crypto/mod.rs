//! AES-256-CBC field encryption primitives.
//!
//! This module is intentionally free of storage and HTTP dependencies.
//! It provides the encrypt/decrypt operations used by the mapping layer.
//!
//! # Ciphertext format
//!
//! ```text
//! hex(iv[16]) || hex(aes-256-cbc(pkcs7(utf8(plaintext))))
//! ```
//!
//! The format carries no version marker or authentication tag, so it stays
//! byte-compatible with blobs already in the document store.

pub mod cipher;
pub mod key;

pub use cipher::{CipherError, FieldCodec};
pub use key::FieldKey;
