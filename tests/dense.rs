use regex_dfa::{DenseDFABuilder, DenseDFAKind, DFA};

use crate::fixtures::{
    abc_or_a_fwd, all_variants, empty_pattern, foo_digits_fwd, haystacks,
    never_matches,
};

#[test]
fn variants_agree_on_corpus() {
    for table in
        &[foo_digits_fwd(), abc_or_a_fwd(), empty_pattern(), never_matches()]
    {
        let variants = all_variants(table);
        let (base_name, base) = &variants[0];
        for (name, dfa) in &variants[1..] {
            for haystack in haystacks() {
                assert_eq!(
                    base.is_match(&haystack),
                    dfa.is_match(&haystack),
                    "{} vs {} on {:?}",
                    base_name,
                    name,
                    haystack,
                );
                assert_eq!(
                    base.shortest_match(&haystack),
                    dfa.shortest_match(&haystack),
                    "{} vs {} on {:?}",
                    base_name,
                    name,
                    haystack,
                );
                assert_eq!(
                    base.find(&haystack),
                    dfa.find(&haystack),
                    "{} vs {} on {:?}",
                    base_name,
                    name,
                    haystack,
                );
            }
        }
    }
}

#[test]
fn dead_state_laws() {
    for table in &[foo_digits_fwd(), empty_pattern(), never_matches()] {
        for (name, dfa) in all_variants(table) {
            let dead = regex_dfa::dead_id::<usize>();
            assert!(dfa.is_dead_state(dead), "{}", name);
            assert!(!dfa.is_match_state(dead), "{}", name);
            for input in 0..=255u8 {
                assert_eq!(
                    dead,
                    dfa.next_state(dead, input),
                    "{} escapes the dead state on 0x{:02X}",
                    name,
                    input,
                );
            }
        }
    }
}

#[test]
fn find_reports_end_of_leftmost_match() {
    for (name, dfa) in all_variants(&foo_digits_fwd()) {
        assert_eq!(Some(8), dfa.find(b"foo12345"), "{}", name);
        assert_eq!(Some(5), dfa.find(b"xfoo1bar"), "{}", name);
        assert_eq!(None, dfa.find(b"bar"), "{}", name);
        assert!(!dfa.is_match(b"bar"), "{}", name);
        // The end of the first possible match is after the first digit.
        assert_eq!(Some(4), dfa.shortest_match(b"foo12345"), "{}", name);
    }
}

#[test]
fn empty_pattern_matches_everywhere() {
    for (name, dfa) in all_variants(&empty_pattern()) {
        assert!(dfa.is_match(b""), "{}", name);
        assert!(dfa.is_match(b"ab"), "{}", name);
        assert_eq!(Some(0), dfa.find(b"ab"), "{}", name);
        assert_eq!(Some(0), dfa.shortest_match(b"ab"), "{}", name);
    }
}

#[test]
fn automaton_without_match_states_never_matches() {
    for (name, dfa) in all_variants(&never_matches()) {
        for haystack in haystacks() {
            assert!(!dfa.is_match(&haystack), "{}", name);
            assert_eq!(None, dfa.find(&haystack), "{}", name);
        }
    }
}

#[test]
fn byte_class_compression_preserves_language() {
    let table = foo_digits_fwd();
    let classed = DenseDFABuilder::new()
        .byte_classes(true)
        .premultiply(false)
        .build(&table)
        .unwrap();
    assert_eq!(DenseDFAKind::ByteClass, classed.kind());
    let standard = classed.to_standard().unwrap();
    assert_eq!(DenseDFAKind::Standard, standard.kind());
    crate::fixtures::assert_equivalent(&classed, &standard);
}

#[test]
fn sized_conversions_preserve_language() {
    let dfa = DenseDFABuilder::new().build(&foo_digits_fwd()).unwrap();
    let small = dfa.to_u8().unwrap();
    let medium = dfa.to_u16().unwrap();
    for haystack in haystacks() {
        assert_eq!(dfa.find(&haystack), small.find(&haystack));
        assert_eq!(dfa.find(&haystack), medium.find(&haystack));
    }
    crate::fixtures::assert_equivalent(&dfa, &small);
}

#[test]
fn minimized_is_never_larger() {
    for table in &[foo_digits_fwd(), abc_or_a_fwd(), empty_pattern()] {
        let plain = DenseDFABuilder::new()
            .premultiply(false)
            .build(table)
            .unwrap();
        let minimal = DenseDFABuilder::new()
            .premultiply(false)
            .minimize(true)
            .build(table)
            .unwrap();
        assert!(minimal.memory_usage() <= plain.memory_usage());
        crate::fixtures::assert_equivalent(&plain, &minimal);
    }
}

quickcheck::quickcheck! {
    fn prop_variants_agree(haystack: Vec<u8>) -> bool {
        let variants = all_variants(&foo_digits_fwd());
        let expected = variants[0].1.find(&haystack);
        variants.iter().all(|(_, dfa)| dfa.find(&haystack) == expected)
    }

    fn prop_shortest_match_is_never_later(haystack: Vec<u8>) -> bool {
        let dfa = DenseDFABuilder::new().build(&foo_digits_fwd()).unwrap();
        match (dfa.shortest_match(&haystack), dfa.find(&haystack)) {
            (None, None) => true,
            (Some(shortest), Some(end)) => shortest <= end,
            _ => false,
        }
    }
}
