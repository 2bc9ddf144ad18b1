//! Crate error type.
//!
//! Decoders never fail; they return `Option`. Errors only come from sizing a
//! virtual terminal.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid terminal size: {columns}x{rows} (both must be > 0)")]
    InvalidSize { columns: u16, rows: u16 },
}
