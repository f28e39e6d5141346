//! Hashing primitives for the merkle-tree crate.
//!
//! This crate is the sole place that knows how to turn records and node
//! operands into digests. It exposes a runtime-selectable hash algorithm
//! catalog and a closed set of text encodings records may be expressed in.
#![warn(rust_2018_idioms, unused_lifetimes)]
#![warn(unused_qualifications, missing_docs)]
#![warn(clippy::all, clippy::panic)]
#![forbid(unsafe_code, clippy::expect_used)]

mod encoding;
mod engine;
mod error;

pub use encoding::{TextEncoding, UnknownEncoding};
pub use engine::{HashAlgorithm, HashEngine, UnknownAlgorithm};
pub use error::EncodingError;
