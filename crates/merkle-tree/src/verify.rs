//! The verifier: a flat, single-accumulator fold over a proof's path.

use chrono::{DateTime, Utc};
use merkle_crypto::HashEngine;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::proof::Proof;

/// Folds `proof`'s path against `target`, returning whether it reconstructs
/// `target`. Never raises: an empty path, a negative `proof_index`, or a
/// mismatched fold all simply return `false`.
pub fn validate_proof(target: &[u8], proof: &Proof) -> bool {
    fold_proof(proof).is_some_and(|digest| digest == target)
}

fn fold_proof(proof: &Proof) -> Option<Vec<u8>> {
    if proof.proof_index() < 0 {
        return None;
    }
    let path = proof.proof_path();
    let start = proof.proof_index() as usize;
    if start >= path.len() {
        return None;
    }
    let (seed, rest) = (&path[start], &path[start + 1..]);

    let engine = HashEngine::new(proof.hash_type(), proof.security());
    let mut acc = seed.1.clone();
    for (sign, sibling) in rest {
        acc = if *sign >= 0 {
            engine.branch_digest(&acc, sibling)
        } else {
            engine.branch_digest(sibling, &acc)
        };
    }
    Some(acc)
}

/// A record of one validation call, independent of the proof it validated:
/// its own identity, when it ran, and the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    uuid: Uuid,
    timestamp: DateTime<Utc>,
    validation_moment: String,
    proof_uuid: Uuid,
    proof_provider: Uuid,
    result: bool,
}

impl Receipt {
    /// This receipt's own identifier.
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// When the validation ran.
    pub fn validation_moment(&self) -> &str {
        &self.validation_moment
    }

    /// The identifier of the proof this receipt validates.
    pub fn proof_uuid(&self) -> Uuid {
        self.proof_uuid
    }

    /// The identifier of the tree that generated the validated proof.
    pub fn proof_provider(&self) -> Uuid {
        self.proof_provider
    }

    /// Whether the proof validated successfully.
    pub fn result(&self) -> bool {
        self.result
    }

    /// Serializes this receipt to its canonical JSON form.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&ReceiptDocument::from(self))
    }

    /// Parses a receipt back from its canonical JSON form.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        let document: ReceiptDocument = serde_json::from_str(text)?;
        Ok(document.into_receipt())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ReceiptDocument {
    uuid: Uuid,
    timestamp: i64,
    validation_moment: String,
    proof_uuid: Uuid,
    proof_provider: Uuid,
    result: bool,
}

impl From<&Receipt> for ReceiptDocument {
    fn from(receipt: &Receipt) -> Self {
        ReceiptDocument {
            uuid: receipt.uuid,
            timestamp: receipt.timestamp.timestamp(),
            validation_moment: receipt.validation_moment.clone(),
            proof_uuid: receipt.proof_uuid,
            proof_provider: receipt.proof_provider,
            result: receipt.result,
        }
    }
}

impl ReceiptDocument {
    fn into_receipt(self) -> Receipt {
        Receipt {
            uuid: self.uuid,
            timestamp: DateTime::from_timestamp(self.timestamp, 0).unwrap_or_else(Utc::now),
            validation_moment: self.validation_moment,
            proof_uuid: self.proof_uuid,
            proof_provider: self.proof_provider,
            result: self.result,
        }
    }
}

/// Validates `proof` against `target` and returns a receipt recording the
/// outcome. The receipt is a plain value independent of the proof itself,
/// so it can be serialized, stored, or handed to another party without that
/// party needing to hold the proof too.
pub fn get_validation_receipt(target: &[u8], proof: &Proof) -> Receipt {
    let result = validate_proof(target, proof);
    let timestamp = Utc::now();
    tracing::debug!(proof_uuid = %proof.uuid(), result, "validated proof");
    Receipt {
        uuid: Uuid::new_v4(),
        timestamp,
        validation_moment: timestamp.to_rfc3339(),
        proof_uuid: proof.uuid(),
        proof_provider: proof.provider(),
        result,
    }
}
