use std::collections::HashMap;

use merkle_crypto::{HashAlgorithm, HashEngine, TextEncoding};
use uuid::Uuid;

use crate::error::TreeError;
use crate::node::{Arena, Handle};
use crate::proof::{Proof, ProofKind};

/// Right-folds a left-to-right sequence of digests: `H(d0, H(d1, H(d2, ...)))`.
/// This is the fold used for both the current root hash and for checking a
/// caller-supplied `subhash` against a recomputed prefix.
fn fold_digests(digests: &[Vec<u8>], engine: &HashEngine) -> Vec<u8> {
    match digests.split_first() {
        None => engine.empty_digest(),
        Some((first, rest)) if rest.is_empty() => first.clone(),
        Some((first, rest)) => engine.branch_digest(first, &fold_digests(rest, engine)),
    }
}

/// Decomposes a prefix length into its principal sub-root blocks, as
/// `(start, height)` pairs in descending-size (left-to-right) order, by the
/// binary expansion of `len`.
fn decompose_prefix(len: u64) -> Vec<(u64, u32)> {
    let mut blocks = Vec::new();
    let mut start = 0u64;
    for height in (0..u64::BITS).rev() {
        let size = 1u64 << height;
        if len & size != 0 {
            blocks.push((start, height));
            start += size;
        }
    }
    blocks
}

#[derive(Debug, Clone)]
struct StackEntry {
    handle: Handle,
    height: u32,
    start: u64,
}

/// Configuration builder for [`MerkleTree`] (the ambient "Configuration"
/// concern: a plain builder struct rather than a config-file reader, since
/// nothing here reads from disk or environment).
#[derive(Debug, Clone)]
pub struct MerkleTreeBuilder {
    hash_type: HashAlgorithm,
    encoding: TextEncoding,
    raw_bytes: bool,
    security: bool,
}

impl Default for MerkleTreeBuilder {
    fn default() -> Self {
        MerkleTreeBuilder {
            hash_type: HashAlgorithm::default(),
            encoding: TextEncoding::default(),
            raw_bytes: false,
            security: false,
        }
    }
}

impl MerkleTreeBuilder {
    /// Starts a builder with the default configuration: sha256, utf-8,
    /// insecure, text records.
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects the hash algorithm by its catalog name. Fails on an
    /// unrecognized name rather than panicking.
    pub fn hash_type(mut self, name: &str) -> Result<Self, TreeError> {
        self.hash_type = name
            .parse()
            .map_err(|e: merkle_crypto::UnknownAlgorithm| TreeError::InvalidConfig(e.to_string()))?;
        Ok(self)
    }

    /// Selects the text encoding by its catalog name.
    pub fn encoding(mut self, name: &str) -> Result<Self, TreeError> {
        self.encoding = name
            .parse()
            .map_err(|e: merkle_crypto::UnknownEncoding| TreeError::InvalidConfig(e.to_string()))?;
        Ok(self)
    }

    /// If set, text records are hashed as their raw UTF-8 bytes without
    /// going through the configured encoding.
    pub fn raw_bytes(mut self, raw_bytes: bool) -> Self {
        self.raw_bytes = raw_bytes;
        self
    }

    /// Enables domain-separation prefixes on every digest.
    pub fn security(mut self, security: bool) -> Self {
        self.security = security;
        self
    }

    /// Builds an empty tree under this configuration.
    pub fn build(self) -> MerkleTree {
        tracing::trace!(
            hash_type = self.hash_type.name(),
            encoding = self.encoding.name(),
            security = self.security,
            raw_bytes = self.raw_bytes,
            "building merkle tree"
        );
        MerkleTree {
            id: Uuid::new_v4(),
            engine: HashEngine::new(self.hash_type, self.security),
            encoding: self.encoding,
            raw_bytes: self.raw_bytes,
            arena: Arena::default(),
            leaves: Vec::new(),
            principal_sub_roots: Vec::new(),
            completed_blocks: HashMap::new(),
        }
    }

    /// Builds a tree and appends `records` to it in order.
    pub fn build_with_records<'a, I>(self, records: I) -> Result<MerkleTree, TreeError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut tree = self.build();
        for record in records {
            tree.update(record)?;
        }
        Ok(tree)
    }
}

/// The append-only Merkle tree, carrying the node graph and the current
/// principal sub-root bookkeeping needed to answer proof queries without
/// rescanning the whole structure.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    /// Identifies this tree as the `provider` of any proof it generates.
    id: Uuid,
    engine: HashEngine,
    encoding: TextEncoding,
    raw_bytes: bool,
    arena: Arena,
    leaves: Vec<Handle>,
    /// Current principal sub-roots, left to right, strictly descending
    /// height — the binary-counter invariant maintained by `reduce`.
    principal_sub_roots: Vec<StackEntry>,
    /// Every block that has ever been a principal sub-root, keyed by its
    /// `(start, height)`. A block's digest never changes once recorded, so
    /// this lets `consistency_proof` recover the principal sub-roots of any
    /// historical prefix length in O(log n) instead of replaying append.
    completed_blocks: HashMap<(u64, u32), Handle>,
}

impl Default for MerkleTree {
    fn default() -> Self {
        MerkleTreeBuilder::default().build()
    }
}

impl MerkleTree {
    /// An empty tree with the default configuration (sha256, utf-8,
    /// insecure, text records).
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a configuration builder.
    pub fn builder() -> MerkleTreeBuilder {
        MerkleTreeBuilder::new()
    }

    /// Number of appended records.
    pub fn length(&self) -> usize {
        self.leaves.len()
    }

    /// The hash algorithm this tree was configured with.
    pub fn hash_type(&self) -> HashAlgorithm {
        self.engine.algorithm()
    }

    /// The text encoding this tree was configured with.
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Whether domain-separation prefixes are enabled.
    pub fn security(&self) -> bool {
        self.engine.security()
    }

    /// Whether text records bypass the configured encoding.
    pub fn raw_bytes(&self) -> bool {
        self.raw_bytes
    }

    /// This tree's identity, recorded as `provider` on every proof it
    /// generates.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The current root digest. For a zero-length tree this is `H(empty)`
    /// under the tree's configured algorithm, so the call never fails even
    /// when nothing has been appended yet.
    pub fn root_hash(&self) -> Vec<u8> {
        let digests: Vec<Vec<u8>> = self
            .principal_sub_roots
            .iter()
            .map(|entry| self.arena.digest(entry.handle).to_vec())
            .collect();
        fold_digests(&digests, &self.engine)
    }

    /// Appends a text record, encoding it per the tree's configuration
    /// (or taking its raw UTF-8 bytes, if `raw_bytes` is set).
    pub fn update(&mut self, record: &str) -> Result<(), TreeError> {
        let bytes = if self.raw_bytes {
            record.as_bytes().to_vec()
        } else {
            self.encoding.encode(record)?
        };
        self.append_bytes(bytes);
        Ok(())
    }

    /// Appends a raw byte record, bypassing the configured encoding.
    pub fn update_bytes(&mut self, record: &[u8]) {
        self.append_bytes(record.to_vec());
    }

    /// Appends a leaf built directly from a pre-computed digest rather than
    /// hashing a record.
    pub fn update_digest(&mut self, digest: Vec<u8>) {
        self.append_leaf_digest(digest);
    }

    fn append_bytes(&mut self, record: Vec<u8>) {
        let digest = self.engine.leaf_digest(&record);
        self.append_leaf_digest(digest);
    }

    fn append_leaf_digest(&mut self, digest: Vec<u8>) {
        let start = self.leaves.len() as u64;
        let handle = self.arena.push_leaf(digest);
        self.leaves.push(handle);
        self.completed_blocks.insert((start, 0), handle);
        self.principal_sub_roots.push(StackEntry {
            handle,
            height: 0,
            start,
        });
        self.reduce();
        tracing::debug!(length = self.leaves.len(), "appended record");
    }

    /// Merges the two rightmost principal sub-roots while they share a
    /// height, the classic binary-counter carry.
    fn reduce(&mut self) {
        while self.principal_sub_roots.len() >= 2 {
            let n = self.principal_sub_roots.len();
            let top = self.principal_sub_roots[n - 1].clone();
            let second = self.principal_sub_roots[n - 2].clone();
            if top.height != second.height {
                break;
            }

            let merged_digest = self
                .engine
                .branch_digest(self.arena.digest(second.handle), self.arena.digest(top.handle));
            let merged_handle = self.arena.push_internal(second.handle, top.handle, merged_digest);
            let merged = StackEntry {
                handle: merged_handle,
                height: second.height + 1,
                start: second.start,
            };

            self.principal_sub_roots.truncate(n - 2);
            self.completed_blocks
                .insert((merged.start, merged.height), merged.handle);
            self.principal_sub_roots.push(merged);
        }
    }

    fn find_leaf_index(&self, digest: &[u8]) -> Option<usize> {
        self.leaves
            .iter()
            .position(|handle| self.arena.digest(*handle) == digest)
    }

    /// Builds an audit proof for the leaf at `index`, or a sentinel proof
    /// guaranteed to fail verification if `index` is out of range.
    pub fn audit_proof_by_index(&self, index: i64) -> Proof {
        match self.resolve_index(index) {
            Some(i) => self.audit_proof_for(i),
            None => self.sentinel(ProofKind::Audit),
        }
    }

    /// Builds an audit proof for the leftmost leaf matching `record`'s
    /// encoded bytes, or a sentinel if no leaf matches.
    pub fn audit_proof_by_record(&self, record: &str) -> Proof {
        let bytes = if self.raw_bytes {
            Some(record.as_bytes().to_vec())
        } else {
            self.encoding.encode(record).ok()
        };
        match bytes.and_then(|b| self.find_leaf_index(&self.engine.leaf_digest(&b))) {
            Some(i) => self.audit_proof_for(i),
            None => self.sentinel(ProofKind::Audit),
        }
    }

    /// Builds an audit proof for the leftmost leaf with digest
    /// `self.hash_type().digest(record)`, bypassing text encoding.
    pub fn audit_proof_by_bytes(&self, record: &[u8]) -> Proof {
        match self.find_leaf_index(&self.engine.leaf_digest(record)) {
            Some(i) => self.audit_proof_for(i),
            None => self.sentinel(ProofKind::Audit),
        }
    }

    fn resolve_index(&self, index: i64) -> Option<usize> {
        if index < 0 {
            return None;
        }
        let index = index as usize;
        if index >= self.leaves.len() {
            return None;
        }
        Some(index)
    }

    fn audit_proof_for(&self, index: usize) -> Proof {
        let leaf_handle = self.leaves[index];
        let mut path = vec![(0i8, self.arena.digest(leaf_handle).to_vec())];
        path.extend(self.path_to_root(leaf_handle));
        tracing::debug!(index, "generated audit proof");
        Proof::new(ProofKind::Audit, self.id, &self.engine, self.encoding, self.raw_bytes, path)
    }

    /// Builds a consistency proof that this tree, at its current length, is
    /// an append-extension of a tree with root `subhash` and length
    /// `sublen`. Returns a sentinel if `subhash`/`sublen` do not describe a
    /// genuine earlier state of this tree.
    pub fn consistency_proof(&self, subhash: &[u8], sublen: i64) -> Proof {
        if sublen <= 0 || sublen as usize > self.leaves.len() {
            return self.sentinel(ProofKind::Consistency);
        }
        let sublen = sublen as usize;

        let prefix_blocks = decompose_prefix(sublen as u64);
        let mut prefix_digests = Vec::with_capacity(prefix_blocks.len());
        for key in &prefix_blocks {
            match self.completed_blocks.get(key) {
                Some(handle) => prefix_digests.push(self.arena.digest(*handle).to_vec()),
                None => return self.sentinel(ProofKind::Consistency),
            }
        }
        let computed = fold_digests(&prefix_digests, &self.engine);
        if computed.as_slice() != subhash {
            return self.sentinel(ProofKind::Consistency);
        }

        if sublen == self.leaves.len() {
            tracing::debug!(sublen, "generated trivial consistency proof");
            return Proof::new(
                ProofKind::Consistency,
                self.id,
                &self.engine,
                self.encoding,
                self.raw_bytes,
                vec![(0i8, subhash.to_vec())],
            );
        }

        let blocks: Vec<(Handle, u64)> = self
            .principal_sub_roots
            .iter()
            .map(|entry| (entry.handle, 1u64 << entry.height))
            .collect();
        match self.subproof_general(sublen as u64, &blocks) {
            Some(path) => {
                tracing::debug!(sublen, "generated consistency proof");
                Proof::new(ProofKind::Consistency, self.id, &self.engine, self.encoding, self.raw_bytes, path)
            }
            None => self.sentinel(ProofKind::Consistency),
        }
    }

    fn sentinel(&self, kind: ProofKind) -> Proof {
        Proof::sentinel(kind, self.id, &self.engine, self.encoding, self.raw_bytes)
    }

    /// Walks from `start` (a leaf or an absorbed internal block) up to the
    /// principal sub-root that contains it, collecting siblings, then folds
    /// in the remaining principal sub-roots to reach the overall root.
    /// Shared by audit proofs (start = a leaf) and the bridging half of
    /// consistency proofs (start = an internal node reached by `subproof`).
    fn path_to_root(&self, start: Handle) -> Vec<(i8, Vec<u8>)> {
        let mut path = Vec::new();
        let mut current = start;
        while let Some(child) = self.arena.child(current) {
            if self.arena.is_left_parent(current) {
                let sibling = match self.arena.right(child) {
                    Ok(sibling) => sibling,
                    Err(_) => unreachable!("a left parent's child always has a right operand"),
                };
                path.push((1i8, self.arena.digest(sibling).to_vec()));
            } else {
                let sibling = match self.arena.left(child) {
                    Ok(sibling) => sibling,
                    Err(_) => unreachable!("a right parent's child always has a left operand"),
                };
                path.push((-1i8, self.arena.digest(sibling).to_vec()));
            }
            current = child;
        }
        path.extend(self.stack_to_root(current));
        path
    }

    /// Folds a principal sub-root (already reached, with no `child`) up to
    /// the overall root by combining it with its neighbors in the
    /// principal sub-root list, right-fold order.
    fn stack_to_root(&self, top: Handle) -> Vec<(i8, Vec<u8>)> {
        let k = match self.principal_sub_roots.iter().position(|e| e.handle == top) {
            Some(k) => k,
            None => unreachable!("a childless node is always a principal sub-root"),
        };
        let n = self.principal_sub_roots.len();
        let mut path = Vec::new();
        if k + 1 < n {
            let rest: Vec<Vec<u8>> = self.principal_sub_roots[k + 1..]
                .iter()
                .map(|entry| self.arena.digest(entry.handle).to_vec())
                .collect();
            path.push((1i8, fold_digests(&rest, &self.engine)));
        }
        for entry in self.principal_sub_roots[..k].iter().rev() {
            path.push((-1i8, self.arena.digest(entry.handle).to_vec()));
        }
        path
    }

    /// The classical (RFC 6962-style) recursive split, generalized to our
    /// non-power-of-two top level: peels the largest (leftmost) principal
    /// sub-root block off and recurses on the rest, or descends into the
    /// single remaining block's real subtree via `subproof`. `m` is the
    /// prefix length being proven, relative to the start of `blocks`.
    fn subproof_general(&self, m: u64, blocks: &[(Handle, u64)]) -> Option<Vec<(i8, Vec<u8>)>> {
        let (first_handle, first_size) = *blocks.first()?;
        if blocks.len() == 1 {
            return self.subproof(m, first_handle, first_size);
        }
        if m <= first_size {
            let mut path = self.subproof(m, first_handle, first_size)?;
            let rest: Vec<Vec<u8>> = blocks[1..]
                .iter()
                .map(|(handle, _)| self.arena.digest(*handle).to_vec())
                .collect();
            path.push((1i8, fold_digests(&rest, &self.engine)));
            Some(path)
        } else {
            let mut path = self.subproof_general(m - first_size, &blocks[1..])?;
            path.push((-1i8, self.arena.digest(first_handle).to_vec()));
            Some(path)
        }
    }

    /// Recurses within a single real perfect subtree of `size` leaves
    /// rooted at `handle`, returning the path that lets a single
    /// accumulator fold from `MTH(D[0:m])` up to `MTH(D)` (this subtree's
    /// own digest). `size` is always a power of two; `0 < m <= size`.
    fn subproof(&self, m: u64, handle: Handle, size: u64) -> Option<Vec<(i8, Vec<u8>)>> {
        if m == size {
            return Some(vec![(0i8, self.arena.digest(handle).to_vec())]);
        }
        let left = self.arena.left(handle).ok()?;
        let right = self.arena.right(handle).ok()?;
        let k = size / 2;
        if m <= k {
            let mut path = self.subproof(m, left, k)?;
            path.push((1i8, self.arena.digest(right).to_vec()));
            Some(path)
        } else {
            let mut path = self.subproof(m - k, right, k)?;
            path.push((-1i8, self.arena.digest(left).to_vec()));
            Some(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sha256_secure() -> MerkleTree {
        MerkleTreeBuilder::new().security(true).build()
    }

    #[test]
    fn empty_tree_root_is_hash_of_empty_input() {
        let tree = sha256_secure();
        assert_eq!(tree.length(), 0);
        assert_eq!(tree.root_hash(), tree.engine.empty_digest());
    }

    #[test]
    fn one_record_root_matches_worked_scenario() {
        let mut tree = sha256_secure();
        tree.update("a").unwrap();
        let expected = tree.engine.leaf_digest(b"a");
        assert_eq!(tree.root_hash(), expected);
    }

    #[test]
    fn two_records_root_matches_worked_scenario() {
        let mut tree = sha256_secure();
        tree.update("a").unwrap();
        tree.update("b").unwrap();

        let ha = tree.engine.leaf_digest(b"a");
        let hb = tree.engine.leaf_digest(b"b");
        let expected = tree.engine.branch_digest(&ha, &hb);
        assert_eq!(tree.root_hash(), expected);
    }

    #[test]
    fn three_records_have_two_principal_sub_roots() {
        let mut tree = sha256_secure();
        tree.update("a").unwrap();
        tree.update("b").unwrap();
        tree.update("c").unwrap();

        assert_eq!(tree.principal_sub_roots.len(), 2);
        assert_eq!(tree.principal_sub_roots[0].height, 1);
        assert_eq!(tree.principal_sub_roots[1].height, 0);

        let ha = tree.engine.leaf_digest(b"a");
        let hb = tree.engine.leaf_digest(b"b");
        let hc = tree.engine.leaf_digest(b"c");
        let r_ab = tree.engine.branch_digest(&ha, &hb);
        let expected = tree.engine.branch_digest(&r_ab, &hc);
        assert_eq!(tree.root_hash(), expected);
    }

    #[test]
    fn decompose_prefix_matches_binary_expansion() {
        assert_eq!(decompose_prefix(0), vec![]);
        assert_eq!(decompose_prefix(1), vec![(0, 0)]);
        assert_eq!(decompose_prefix(2), vec![(0, 1)]);
        assert_eq!(decompose_prefix(3), vec![(0, 1), (2, 0)]);
        assert_eq!(decompose_prefix(7), vec![(0, 2), (4, 1), (6, 0)]);
    }
}
