use std::fmt;
use std::str::FromStr;

use digest::Digest;
use serde::{Deserialize, Serialize};
use sha2::{Sha224, Sha256, Sha384, Sha512};
use sha3::{Sha3_224, Sha3_256, Sha3_384, Sha3_512};

/// Leaf-input domain separation tag (`security` mode only).
const LEAF_TAG: u8 = 0x00;
/// Internal-input domain separation tag (`security` mode only).
const BRANCH_TAG: u8 = 0x01;

/// The closed catalog of digest algorithms a tree may be configured with.
///
/// Dispatch is a runtime `match` rather than a monomorphized generic: a
/// tree's algorithm is chosen at construction time from a string, not known
/// at compile time, mirroring the teacher's own dynamic hash dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum HashAlgorithm {
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Sha3_224,
    Sha3_256,
    Sha3_384,
    Sha3_512,
}

impl HashAlgorithm {
    /// Width in bytes of digests produced by this algorithm.
    pub fn output_size(&self) -> usize {
        match self {
            HashAlgorithm::Sha224 | HashAlgorithm::Sha3_224 => 28,
            HashAlgorithm::Sha256 | HashAlgorithm::Sha3_256 => 32,
            HashAlgorithm::Sha384 | HashAlgorithm::Sha3_384 => 48,
            HashAlgorithm::Sha512 | HashAlgorithm::Sha3_512 => 64,
        }
    }

    /// The canonical string name used in JSON proof forms.
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha224 => "sha224",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
            HashAlgorithm::Sha3_224 => "sha3_224",
            HashAlgorithm::Sha3_256 => "sha3_256",
            HashAlgorithm::Sha3_384 => "sha3_384",
            HashAlgorithm::Sha3_512 => "sha3_512",
        }
    }

    fn raw_digest(&self, parts: &[&[u8]]) -> Vec<u8> {
        macro_rules! finalize {
            ($ty:ty) => {{
                let mut hasher = <$ty>::new();
                for part in parts {
                    hasher.update(part);
                }
                hasher.finalize().to_vec()
            }};
        }

        match self {
            HashAlgorithm::Sha224 => finalize!(Sha224),
            HashAlgorithm::Sha256 => finalize!(Sha256),
            HashAlgorithm::Sha384 => finalize!(Sha384),
            HashAlgorithm::Sha512 => finalize!(Sha512),
            HashAlgorithm::Sha3_224 => finalize!(Sha3_224),
            HashAlgorithm::Sha3_256 => finalize!(Sha3_256),
            HashAlgorithm::Sha3_384 => finalize!(Sha3_384),
            HashAlgorithm::Sha3_512 => finalize!(Sha3_512),
        }
    }
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        HashAlgorithm::Sha256
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A name outside the supported catalog was given at construction time.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported hash algorithm '{0}'")]
pub struct UnknownAlgorithm(pub String);

impl FromStr for HashAlgorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sha224" => Ok(HashAlgorithm::Sha224),
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha384" => Ok(HashAlgorithm::Sha384),
            "sha512" => Ok(HashAlgorithm::Sha512),
            "sha3_224" | "sha3-224" => Ok(HashAlgorithm::Sha3_224),
            "sha3_256" | "sha3-256" => Ok(HashAlgorithm::Sha3_256),
            "sha3_384" | "sha3-384" => Ok(HashAlgorithm::Sha3_384),
            "sha3_512" | "sha3-512" => Ok(HashAlgorithm::Sha3_512),
            other => Err(UnknownAlgorithm(other.to_string())),
        }
    }
}

/// A configured hash engine.
///
/// Bundles an algorithm with whether domain-separation prefixes
/// (`security`) are applied, and exposes the three digest operations the
/// rest of the crate needs: a leaf digest (one input), a branch digest (two
/// inputs), and the empty-tree digest (zero inputs, never prefixed — there
/// is no leaf or branch context to tag).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashEngine {
    algorithm: HashAlgorithm,
    security: bool,
}

impl HashEngine {
    /// Builds an engine for the given algorithm and security mode.
    pub fn new(algorithm: HashAlgorithm, security: bool) -> Self {
        HashEngine { algorithm, security }
    }

    /// The algorithm this engine dispatches to.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Whether domain-separation prefixes are applied.
    pub fn security(&self) -> bool {
        self.security
    }

    /// `H(record)`, tagged `0x00` in security mode.
    pub fn leaf_digest(&self, record: &[u8]) -> Vec<u8> {
        if self.security {
            self.algorithm.raw_digest(&[&[LEAF_TAG], record])
        } else {
            self.algorithm.raw_digest(&[record])
        }
    }

    /// `H(left, right)`, each operand tagged `0x01` in security mode.
    pub fn branch_digest(&self, left: &[u8], right: &[u8]) -> Vec<u8> {
        if self.security {
            self.algorithm
                .raw_digest(&[&[BRANCH_TAG], left, &[BRANCH_TAG], right])
        } else {
            self.algorithm.raw_digest(&[left, right])
        }
    }

    /// `H(empty)`, used as the root digest of a zero-length tree.
    pub fn empty_digest(&self) -> Vec<u8> {
        self.algorithm.raw_digest(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_and_branch_digests_differ_under_security() {
        let secure = HashEngine::new(HashAlgorithm::Sha256, true);
        let insecure = HashEngine::new(HashAlgorithm::Sha256, false);

        assert_ne!(secure.leaf_digest(b"a"), insecure.leaf_digest(b"a"));

        let a = secure.leaf_digest(b"a");
        let b = secure.leaf_digest(b"b");
        assert_ne!(secure.branch_digest(&a, &b), insecure.branch_digest(&a, &b));
    }

    #[test]
    fn matches_worked_scenario_two_leaves() {
        // two-leaf tree "a","b": H(0x01 || H(0x00||"a") || 0x01 || H(0x00||"b"))
        let engine = HashEngine::new(HashAlgorithm::Sha256, true);
        let ha = engine.leaf_digest(b"a");
        let hb = engine.leaf_digest(b"b");
        let root = engine.branch_digest(&ha, &hb);

        let mut hasher = Sha256::new();
        hasher.update([0x01]);
        hasher.update(&ha);
        hasher.update([0x01]);
        hasher.update(&hb);
        let expected = hasher.finalize().to_vec();

        assert_eq!(root, expected);
    }

    #[test]
    fn output_size_matches_algorithm() {
        assert_eq!(HashAlgorithm::Sha256.output_size(), 32);
        assert_eq!(
            HashEngine::new(HashAlgorithm::Sha256, false)
                .empty_digest()
                .len(),
            32
        );
        assert_eq!(HashAlgorithm::Sha3_512.output_size(), 64);
    }
}
