//! Structured logging, with optional OpenTelemetry span export.
//!
//! # Telemetry invariants
//!
//! - **No plaintext of a protected field, no ciphertext blob, and no key
//!   material** may appear in any span attribute or log field. Record ids and
//!   entity names are fine.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`); `RUST_LOG`
//!   takes precedence when set.

pub mod init;

pub use init::init_telemetry;
