//! Property tests for the tree/proof/verify trio, kept in their own file for
//! size but compiled inline like every other test module here rather than
//! as a separate integration-test crate.

use proptest::prelude::*;

use crate::tree::{MerkleTree, MerkleTreeBuilder};
use crate::verify::validate_proof;

fn build_tree(records: &[String]) -> MerkleTree {
    let mut tree = MerkleTreeBuilder::new().security(true).build();
    for record in records {
        tree.update(record).unwrap();
    }
    tree
}

proptest! {
    /// Length always equals the number of successful updates.
    #[test]
    fn length_tracks_update_count(records in proptest::collection::vec(".*", 0..50)) {
        let tree = build_tree(&records);
        prop_assert_eq!(tree.length(), records.len());
    }

    /// The root hash is a pure function of the record sequence.
    #[test]
    fn root_hash_is_deterministic(records in proptest::collection::vec(".*", 0..50)) {
        let a = build_tree(&records);
        let b = build_tree(&records);
        prop_assert_eq!(a.root_hash(), b.root_hash());
    }

    /// Appending a record changes the root hash (collisions aside).
    #[test]
    fn appending_changes_root_hash(
        records in proptest::collection::vec(".*", 0..50),
        extra in ".*",
    ) {
        let mut tree = build_tree(&records);
        let before = tree.root_hash();
        tree.update(&extra).unwrap();
        prop_assert_ne!(before, tree.root_hash());
    }

    /// Every leaf has a valid audit proof against the current root, whether
    /// requested by index, by its original record text, or by its raw
    /// encoded bytes.
    #[test]
    fn every_leaf_has_a_valid_audit_proof(records in proptest::collection::vec(".*", 1..50)) {
        let tree = build_tree(&records);
        let root = tree.root_hash();
        for (i, record) in records.iter().enumerate() {
            let by_index = tree.audit_proof_by_index(i as i64);
            prop_assert!(validate_proof(&root, &by_index));

            let by_record = tree.audit_proof_by_record(record);
            prop_assert!(validate_proof(&root, &by_record));

            let by_bytes = tree.audit_proof_by_bytes(record.as_bytes());
            prop_assert!(validate_proof(&root, &by_bytes));
        }
    }

    /// An audit proof requested by a record that was never appended is a
    /// sentinel and never validates.
    #[test]
    fn audit_proof_by_unknown_record_never_validates(
        records in proptest::collection::vec(".*", 0..50),
        unknown in ".*",
    ) {
        let tree = build_tree(&records);
        prop_assume!(!records.contains(&unknown));
        let root = tree.root_hash();

        let by_record = tree.audit_proof_by_record(&unknown);
        prop_assert!(by_record.is_sentinel());
        prop_assert!(!validate_proof(&root, &by_record));

        let by_bytes = tree.audit_proof_by_bytes(unknown.as_bytes());
        prop_assert!(by_bytes.is_sentinel());
        prop_assert!(!validate_proof(&root, &by_bytes));
    }

    /// An audit proof for an out-of-range or negative index is a sentinel
    /// and never validates.
    #[test]
    fn out_of_range_audit_index_never_validates(
        records in proptest::collection::vec(".*", 0..50),
        offset in 0i64..1000,
    ) {
        let tree = build_tree(&records);
        let root = tree.root_hash();
        let proof = tree.audit_proof_by_index(tree.length() as i64 + offset);
        prop_assert!(proof.is_sentinel());
        prop_assert!(!validate_proof(&root, &proof));

        let negative = tree.audit_proof_by_index(-1 - offset);
        prop_assert!(negative.is_sentinel());
        prop_assert!(!validate_proof(&root, &negative));
    }

    /// For every sublen in [1, length], the consistency proof against the
    /// true prefix root validates.
    #[test]
    fn every_prefix_has_a_valid_consistency_proof(records in proptest::collection::vec(".*", 1..50)) {
        let full = build_tree(&records);
        let root = full.root_hash();
        for sublen in 1..=records.len() {
            let prefix = build_tree(&records[..sublen]);
            let subhash = prefix.root_hash();
            let proof = full.consistency_proof(&subhash, sublen as i64);
            prop_assert!(validate_proof(&root, &proof), "sublen {} should validate", sublen);
        }
    }

    /// A consistency proof against a wrong subhash is a sentinel.
    #[test]
    fn wrong_subhash_never_validates(
        records in proptest::collection::vec(".*", 1..50),
        sublen in 1usize..50,
    ) {
        let full = build_tree(&records);
        let root = full.root_hash();
        let sublen = sublen.min(records.len());
        let bogus = vec![0xABu8; 32];
        let proof = full.consistency_proof(&bogus, sublen as i64);
        prop_assert!(proof.is_sentinel());
        prop_assert!(!validate_proof(&root, &proof));
    }

    /// A sublen of zero or beyond the tree's length is always rejected.
    #[test]
    fn consistency_proof_rejects_degenerate_sublen(
        records in proptest::collection::vec(".*", 0..50),
        over in 1i64..1000,
    ) {
        let tree = build_tree(&records);
        let root = tree.root_hash();

        let zero_proof = tree.consistency_proof(&root, 0);
        prop_assert!(zero_proof.is_sentinel());

        let too_long = tree.consistency_proof(&root, tree.length() as i64 + over);
        prop_assert!(too_long.is_sentinel());
    }

    /// The `security` flag changes the root hash of a non-empty tree.
    #[test]
    fn security_flag_changes_root_hash_for_nonempty_trees(records in proptest::collection::vec(".*", 1..20)) {
        let insecure = MerkleTreeBuilder::new()
            .security(false)
            .build_with_records(records.iter().map(String::as_str))
            .unwrap();
        let secure = MerkleTreeBuilder::new()
            .security(true)
            .build_with_records(records.iter().map(String::as_str))
            .unwrap();
        prop_assert_ne!(insecure.root_hash(), secure.root_hash());
    }
}

#[test]
fn empty_tree_has_no_valid_audit_or_consistency_proof() {
    let tree = MerkleTree::new();
    let root = tree.root_hash();

    let audit = tree.audit_proof_by_index(0);
    assert!(audit.is_sentinel());
    assert!(!validate_proof(&root, &audit));

    let consistency = tree.consistency_proof(&root, 1);
    assert!(consistency.is_sentinel());
    assert!(!validate_proof(&root, &consistency));
}
