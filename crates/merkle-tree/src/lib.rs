//! An append-only Merkle hash tree with audit and consistency proofs.
//!
//! A [`MerkleTree`] accumulates records one at a time (`update`), exposing
//! a running [`MerkleTree::root_hash`]. It can produce an audit proof that a
//! given record is present (`audit_proof_by_index`/`audit_proof_by_record`)
//! and a consistency proof that an earlier root is a genuine prefix of the
//! current one (`consistency_proof`). Both proof kinds verify through the
//! same flat fold ([`validate_proof`]).

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rust_2018_idioms, unused_lifetimes)]
#![warn(unused_qualifications, missing_docs)]
#![warn(clippy::all, clippy::panic)]
#![forbid(unsafe_code, clippy::expect_used)]

mod error;
mod node;
mod proof;
#[cfg(test)]
mod proptests;
mod tree;
mod verify;

pub use error::TreeError;
pub use merkle_crypto::{HashAlgorithm, TextEncoding, UnknownAlgorithm, UnknownEncoding};
pub use proof::{GenerationStatus, Proof, ProofKind};
pub use tree::{MerkleTree, MerkleTreeBuilder};
pub use verify::{get_validation_receipt, validate_proof, Receipt};
