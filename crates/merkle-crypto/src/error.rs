use thiserror::Error;

/// A record could not be expressed as bytes under the configured encoding.
///
/// Raised by [`crate::TextEncoding::encode`]; surfaces to callers of
/// `merkle-tree`'s `update` as the `Undecodable` case of the tree error
/// taxonomy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("record is not representable in the {encoding} encoding")]
pub struct EncodingError {
    pub(crate) encoding: &'static str,
}
