//! # Frukit Core
//!
//! Encoder and decoder for IPMI FRU (Field Replaceable Unit) Information Storage
//! images: checksummed chassis/board/product information areas, multirecord
//! extensions and the top-level container layout.
//!
//! ## Modules
//!
//! - `constants`: Wire-format constants, the type/length tag byte and limits
//! - `checksum`: The IPMI 8-bit zero checksum
//! - `field`: Field codec (encoding detection, BCD-plus, 6-bit ASCII, text, binary)
//! - `area`: Information area assembly and parsing
//! - `multirecord`: MultiRecord area assembly and parsing
//! - `container`: Top-level FRU container assembly and parsing
//!
//! All operations are pure transforms over in-memory byte buffers; the crate
//! never performs I/O.

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

pub mod area;
pub mod checksum;
pub mod constants;
pub mod container;
pub mod error;
pub mod field;
pub mod multirecord;

// Re-export commonly used types
pub use error::FruError;
pub use field::{EncodingConfig, FieldEncoding, TypedField};

/// Result type alias for FRU operations
pub type Result<T> = core::result::Result<T, FruError>;
