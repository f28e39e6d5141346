use merkle_crypto::EncodingError;
use thiserror::Error;

/// Errors raised at the public API boundary.
///
/// Navigation absences (`NoChild`/`NoParent`/`NoDescendant`) are not part of
/// this enum: they are normal internal control-flow signals and must never
/// escape to a caller, so they live in [`crate::node::NavError`] instead and
/// are always translated or absorbed before a public function returns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// A leaf was asked to be built from both (or neither) of a raw record
    /// and a pre-computed digest; exactly one must be supplied.
    ///
    /// `MerkleTree` never constructs this variant itself: `update`/
    /// `update_bytes` (record) and `update_digest` (pre-computed digest) are
    /// separate methods rather than one constructor with two optional
    /// fields, so the ambiguity this guards against has no call site left to
    /// trigger it. The variant stays in the taxonomy for parity with the
    /// rest of the error vocabulary and for callers matching exhaustively
    /// against a future record/digest constructor.
    #[error("a leaf must be constructed from exactly one of a record or a digest")]
    LeafConstruction,

    /// A text record could not be encoded under the tree's configured
    /// encoding. The tree is left unchanged.
    #[error(transparent)]
    Undecodable(#[from] EncodingError),

    /// The `hash_type` or `encoding` name given to the builder is not in the
    /// supported catalog.
    #[error("{0}")]
    InvalidConfig(String),

    /// A public entry point received an argument of the wrong kind.
    ///
    /// Like `LeafConstruction`, this has no current call site: an audit
    /// proof can be requested by index, by record, or by raw bytes, and
    /// each of those is its own typed method
    /// (`audit_proof_by_index`/`audit_proof_by_record`/`audit_proof_by_bytes`)
    /// rather than one entry point accepting either kind of argument, so the
    /// wrong-kind-of-argument case cannot arise.
    #[error("invalid argument: {0}")]
    InvalidType(String),
}
