use regex_dfa::{DenseDFABuilder, TransitionTable, DFA};

use crate::fixtures::{
    abc_or_a_fwd, all_variants, assert_equivalent, empty_pattern,
    foo_digits_fwd, haystacks, never_matches,
};

#[test]
fn sparse_agrees_with_dense_everywhere() {
    for table in
        &[foo_digits_fwd(), abc_or_a_fwd(), empty_pattern(), never_matches()]
    {
        for (name, dense) in all_variants(table) {
            let sparse = dense.to_sparse_dfa().unwrap();
            assert_equivalent(&dense, &sparse);
            for haystack in haystacks() {
                assert_eq!(
                    dense.find(&haystack),
                    sparse.find(&haystack),
                    "{} on {:?}",
                    name,
                    haystack,
                );
                assert_eq!(
                    dense.shortest_match(&haystack),
                    sparse.shortest_match(&haystack),
                    "{} on {:?}",
                    name,
                    haystack,
                );
            }
        }
    }
}

#[test]
fn dead_state_laws() {
    let dense = DenseDFABuilder::new().build(&foo_digits_fwd()).unwrap();
    let sparse = dense.to_sparse_dfa().unwrap();
    let dead = regex_dfa::dead_id::<usize>();
    assert!(sparse.is_dead_state(dead));
    assert!(!sparse.is_match_state(dead));
    for input in 0..=255u8 {
        assert_eq!(dead, sparse.next_state(dead, input));
    }
}

#[test]
fn sparse_is_smaller_than_uncompressed_dense() {
    let dense = DenseDFABuilder::new()
        .byte_classes(false)
        .premultiply(false)
        .build(&foo_digits_fwd())
        .unwrap();
    let sparse = dense.to_sparse_dfa().unwrap();
    assert!(sparse.memory_usage() < dense.memory_usage());
}

#[test]
fn borrowed_form_agrees_with_owned() {
    let dense = DenseDFABuilder::new().build(&foo_digits_fwd()).unwrap();
    let sparse = dense.to_sparse_dfa().unwrap();
    let borrowed = sparse.as_dfa_ref();
    assert_equivalent(&sparse, &borrowed);
    for haystack in haystacks() {
        assert_eq!(sparse.find(&haystack), borrowed.find(&haystack));
    }
}

#[test]
fn narrow_offsets_are_rejected_not_truncated() {
    // Sparse state identifiers are byte offsets into the encoded table, so
    // a modest chain of states overflows u8 offsets long before it has 256
    // states.
    let mut table = TransitionTable::new();
    let mut prev = table.add_state(false);
    table.set_start(prev);
    for _ in 0..60 {
        let next = table.add_state(false);
        table.set_transition(prev, b'a', next);
        prev = next;
    }
    let last = table.add_state(true);
    table.set_transition(prev, b'a', last);

    let dense = DenseDFABuilder::new().build(&table).unwrap();
    assert!(dense.to_sparse_dfa_sized::<u8>().is_err());
    let sparse = dense.to_sparse_dfa_sized::<u16>().unwrap();
    let haystack = vec![b'a'; 62];
    assert_eq!(dense.find(&haystack), sparse.find(&haystack));
    assert_eq!(Some(61), sparse.find(&haystack));
}

quickcheck::quickcheck! {
    fn prop_sparse_agrees_with_dense(haystack: Vec<u8>) -> bool {
        let dense =
            DenseDFABuilder::new().build(&foo_digits_fwd()).unwrap();
        let sparse = dense.to_sparse_dfa().unwrap();
        dense.find(&haystack) == sparse.find(&haystack)
            && dense.is_match(&haystack) == sparse.is_match(&haystack)
    }
}
