//! The proof object: an immutable record of one audit-proof or
//! consistency-proof call, together with its canonical JSON form.

use chrono::{DateTime, Utc};
use merkle_crypto::{HashAlgorithm, HashEngine, TextEncoding};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which generator produced a proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofKind {
    Audit,
    Consistency,
}

impl ProofKind {
    fn as_str(self) -> &'static str {
        match self {
            ProofKind::Audit => "audit",
            ProofKind::Consistency => "consistency",
        }
    }
}

/// Whether a proof request was satisfiable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenerationStatus {
    Success,
    Failed,
}

/// An audit or consistency proof. Fields are set once at generation and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proof {
    uuid: Uuid,
    timestamp: DateTime<Utc>,
    creation_moment: String,
    generation_status: GenerationStatus,
    provider: Uuid,
    kind: ProofKind,
    hash_type: HashAlgorithm,
    encoding: TextEncoding,
    security: bool,
    raw_bytes: bool,
    /// Index into `proof_path` the verifier's fold starts from. `-1` on a
    /// sentinel proof, where `proof_path` is also empty.
    proof_index: i64,
    /// `(sign, digest)` pairs. Element 0 is the seed digest; its sign is
    /// never consulted by the verifier.
    proof_path: Vec<(i8, Vec<u8>)>,
}

impl Proof {
    pub(crate) fn new(
        kind: ProofKind,
        provider: Uuid,
        engine: &HashEngine,
        encoding: TextEncoding,
        raw_bytes: bool,
        proof_path: Vec<(i8, Vec<u8>)>,
    ) -> Self {
        let timestamp = Utc::now();
        Proof {
            uuid: Uuid::new_v4(),
            timestamp,
            creation_moment: timestamp.to_rfc3339(),
            generation_status: GenerationStatus::Success,
            provider,
            kind,
            hash_type: engine.algorithm(),
            encoding,
            security: engine.security(),
            raw_bytes,
            proof_index: 0,
            proof_path,
        }
    }

    pub(crate) fn sentinel(kind: ProofKind, provider: Uuid, engine: &HashEngine, encoding: TextEncoding, raw_bytes: bool) -> Self {
        let timestamp = Utc::now();
        Proof {
            uuid: Uuid::new_v4(),
            timestamp,
            creation_moment: timestamp.to_rfc3339(),
            generation_status: GenerationStatus::Failed,
            provider,
            kind,
            hash_type: engine.algorithm(),
            encoding,
            security: engine.security(),
            raw_bytes,
            proof_index: -1,
            proof_path: Vec::new(),
        }
    }

    /// The proof's own identifier.
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// The identifier of the tree that generated this proof.
    pub fn provider(&self) -> Uuid {
        self.provider
    }

    /// Which generator produced this proof.
    pub fn kind(&self) -> ProofKind {
        self.kind
    }

    /// Whether the generator was able to satisfy the request.
    pub fn generation_status(&self) -> GenerationStatus {
        self.generation_status
    }

    /// `true` for a sentinel proof manufactured for an unsatisfiable
    /// request; such a proof is guaranteed to fail verification.
    pub fn is_sentinel(&self) -> bool {
        self.generation_status == GenerationStatus::Failed
    }

    /// The starting index into [`Proof::proof_path`] for the verifier's
    /// fold; `-1` for a sentinel proof.
    pub fn proof_index(&self) -> i64 {
        self.proof_index
    }

    /// The `(sign, digest)` pairs making up the proof.
    pub fn proof_path(&self) -> &[(i8, Vec<u8>)] {
        &self.proof_path
    }

    /// The hash algorithm under which this proof's digests were computed.
    pub fn hash_type(&self) -> HashAlgorithm {
        self.hash_type
    }

    /// The text encoding in force when this proof was generated.
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Whether domain-separation prefixes were enabled.
    pub fn security(&self) -> bool {
        self.security
    }

    /// Serializes this proof to its canonical `header`/`body` JSON form,
    /// hex-encoding every digest.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&ProofDocument::from(self))
    }

    /// Parses a proof back from its canonical JSON form.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        let document: ProofDocument = serde_json::from_str(text)?;
        document.try_into_proof()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ProofHeader {
    uuid: Uuid,
    timestamp: i64,
    creation_moment: String,
    generation: GenerationStatus,
    /// Duplicates `generation` under its other accepted header key, so
    /// readers looking for either `generation` or `status` find the same
    /// value rather than one of the two going missing.
    status: GenerationStatus,
    provider: Uuid,
    kind: String,
    hash_type: String,
    encoding: String,
    security: bool,
    raw_bytes: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct ProofBody {
    proof_index: i64,
    proof_path: Vec<(i8, String)>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ProofDocument {
    header: ProofHeader,
    body: ProofBody,
}

impl From<&Proof> for ProofDocument {
    fn from(proof: &Proof) -> Self {
        ProofDocument {
            header: ProofHeader {
                uuid: proof.uuid,
                timestamp: proof.timestamp.timestamp(),
                creation_moment: proof.creation_moment.clone(),
                generation: proof.generation_status,
                status: proof.generation_status,
                provider: proof.provider,
                kind: proof.kind.as_str().to_string(),
                hash_type: proof.hash_type.name().to_string(),
                encoding: proof.encoding.name().to_string(),
                security: proof.security,
                raw_bytes: proof.raw_bytes,
            },
            body: ProofBody {
                proof_index: proof.proof_index,
                proof_path: proof
                    .proof_path
                    .iter()
                    .map(|(sign, digest)| (*sign, hex::encode(digest)))
                    .collect(),
            },
        }
    }
}

impl ProofDocument {
    fn try_into_proof(self) -> serde_json::Result<Proof> {
        let kind = match self.header.kind.as_str() {
            "audit" => ProofKind::Audit,
            "consistency" => ProofKind::Consistency,
            other => {
                return Err(serde::de::Error::custom(format!("unknown proof kind '{other}'")));
            }
        };
        let hash_type: HashAlgorithm = self
            .header
            .hash_type
            .parse()
            .map_err(|e: merkle_crypto::UnknownAlgorithm| serde::de::Error::custom(e.to_string()))?;
        let encoding: TextEncoding = self
            .header
            .encoding
            .parse()
            .map_err(|e: merkle_crypto::UnknownEncoding| serde::de::Error::custom(e.to_string()))?;
        let proof_path = self
            .body
            .proof_path
            .into_iter()
            .map(|(sign, hex_digest)| {
                hex::decode(&hex_digest)
                    .map(|digest| (sign, digest))
                    .map_err(|e| serde::de::Error::custom(e.to_string()))
            })
            .collect::<serde_json::Result<Vec<_>>>()?;

        Ok(Proof {
            uuid: self.header.uuid,
            timestamp: DateTime::from_timestamp(self.header.timestamp, 0).unwrap_or_else(Utc::now),
            creation_moment: self.header.creation_moment,
            generation_status: self.header.generation,
            provider: self.header.provider,
            kind,
            hash_type,
            encoding,
            security: self.header.security,
            raw_bytes: self.header.raw_bytes,
            proof_index: self.body.proof_index,
            proof_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> HashEngine {
        HashEngine::new(HashAlgorithm::Sha256, true)
    }

    #[test]
    fn sentinel_proof_has_empty_path_and_negative_index() {
        let proof = Proof::sentinel(ProofKind::Audit, Uuid::new_v4(), &engine(), TextEncoding::Utf8, false);
        assert!(proof.is_sentinel());
        assert_eq!(proof.proof_index(), -1);
        assert!(proof.proof_path().is_empty());
    }

    #[test]
    fn json_round_trips_a_successful_proof() {
        let path = vec![(0i8, vec![1, 2, 3]), (1i8, vec![4, 5, 6])];
        let proof = Proof::new(ProofKind::Consistency, Uuid::new_v4(), &engine(), TextEncoding::Utf8, false, path.clone());
        let json = proof.to_json().unwrap();
        let parsed = Proof::from_json(&json).unwrap();

        assert_eq!(parsed.kind(), ProofKind::Consistency);
        assert_eq!(parsed.proof_index(), 0);
        assert_eq!(parsed.proof_path(), path.as_slice());
        assert_eq!(parsed.provider(), proof.provider());
        assert_eq!(parsed.hash_type(), HashAlgorithm::Sha256);
        assert!(parsed.security());
    }
}
