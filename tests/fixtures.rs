use regex_dfa::{DenseDFA, DenseDFABuilder, TransitionTable, DFA};

/// The forward automaton for an unanchored leftmost-first search of
/// `foo[0-9]+`.
///
/// The scanning state restarts the prefix search on every byte, so the
/// automaton finds a match starting anywhere. Once the first digit has been
/// seen the pattern has matched, and from there only more digits extend it;
/// anything else leads to the dead state so the search reports the leftmost
/// match instead of a later one.
pub fn foo_digits_fwd() -> TransitionTable {
    let mut t = TransitionTable::new();
    let scan = t.add_state(false);
    let f = t.add_state(false);
    let fo = t.add_state(false);
    let foo = t.add_state(false);
    let digits = t.add_state(true);
    t.set_start(scan);

    for state in &[scan, f, fo, foo] {
        t.set_transition_range(*state, 0, 255, scan);
        t.set_transition(*state, b'f', f);
    }
    t.set_transition(f, b'o', fo);
    t.set_transition(fo, b'o', foo);
    t.set_transition_range(foo, b'0', b'9', digits);
    t.set_transition_range(digits, b'0', b'9', digits);
    t
}

/// The reverse automaton for `foo[0-9]+`: it recognizes `[0-9]+oof`,
/// anchored, and is meant to be run backward from the end of a match found
/// by [`foo_digits_fwd`].
pub fn foo_digits_rev() -> TransitionTable {
    let mut t = TransitionTable::new();
    let start = t.add_state(false);
    let digits = t.add_state(false);
    let o = t.add_state(false);
    let oo = t.add_state(false);
    let done = t.add_state(true);
    t.set_start(start);

    t.set_transition_range(start, b'0', b'9', digits);
    t.set_transition_range(digits, b'0', b'9', digits);
    t.set_transition(digits, b'o', o);
    t.set_transition(o, b'o', oo);
    t.set_transition(oo, b'f', done);
    t
}

/// An automaton for the empty pattern: its start state matches and nothing
/// else does. Works for both scan directions.
pub fn empty_pattern() -> TransitionTable {
    let mut t = TransitionTable::new();
    let start = t.add_state(true);
    t.set_start(start);
    t
}

/// The forward automaton for `abc|a`, anchored. Under leftmost-first
/// semantics the `abc` branch wins when both match, which the topology
/// encodes by continuing past the `a` match state on `b`.
pub fn abc_or_a_fwd() -> TransitionTable {
    let mut t = TransitionTable::new();
    let s1 = t.add_state(false);
    let a = t.add_state(true);
    let ab = t.add_state(false);
    let abc = t.add_state(true);
    t.set_start(s1);
    t.set_transition(s1, b'a', a);
    t.set_transition(a, b'b', ab);
    t.set_transition(ab, b'c', abc);
    t
}

/// The reverse automaton for `abc|a`: recognizes `cba|a`, anchored.
pub fn abc_or_a_rev() -> TransitionTable {
    let mut t = TransitionTable::new();
    let s1 = t.add_state(false);
    let a = t.add_state(true);
    let c = t.add_state(false);
    let cb = t.add_state(false);
    let cba = t.add_state(true);
    t.set_start(s1);
    t.set_transition(s1, b'a', a);
    t.set_transition(s1, b'c', c);
    t.set_transition(c, b'b', cb);
    t.set_transition(cb, b'a', cba);
    t
}

/// An automaton with no match states at all.
pub fn never_matches() -> TransitionTable {
    TransitionTable::new()
}

/// Every way this crate can encode one topology as a dense DFA, labeled for
/// test failure messages.
pub fn all_variants(table: &TransitionTable) -> Vec<(&'static str, DenseDFA)> {
    let mut variants = vec![];
    let mut builder = DenseDFABuilder::new();
    builder.byte_classes(false).premultiply(false);
    variants.push(("standard", builder.build(table).unwrap()));
    builder.byte_classes(true);
    variants.push(("byte-class", builder.build(table).unwrap()));
    builder.premultiply(true);
    variants.push(("premultiplied", builder.build(table).unwrap()));
    builder.byte_classes(false);
    variants.push(("premultiplied-raw", builder.build(table).unwrap()));
    builder.byte_classes(true).premultiply(false).minimize(true);
    variants.push(("minimized", builder.build(table).unwrap()));
    variants
}

/// A corpus of haystacks that exercises match, no-match, empty input and
/// every-byte-value cases.
pub fn haystacks() -> Vec<Vec<u8>> {
    let mut corpus: Vec<Vec<u8>> = vec![
        b"".to_vec(),
        b"a".to_vec(),
        b"ab".to_vec(),
        b"abc".to_vec(),
        b"foo12345".to_vec(),
        b"xfoo1bar".to_vec(),
        b"bar".to_vec(),
        b"foo".to_vec(),
        b"fffoo1".to_vec(),
        b"foo1 foo12 foo123".to_vec(),
        b"zzzfoo12345zzz".to_vec(),
        b"\x00\xFF\x00\xFF".to_vec(),
    ];
    corpus.push((0..=255).collect());
    corpus
}

/// Assert that two automata recognize identical languages with identical
/// state classifications, by walking their product exhaustively: every
/// reachable pair of states is compared on all 256 bytes.
pub fn assert_equivalent<D1, D2>(d1: &D1, d2: &D2)
where
    D1: DFA,
    D2: DFA,
{
    use std::collections::{HashMap, VecDeque};

    let mut map = HashMap::new();
    let mut queue = VecDeque::new();
    map.insert(d1.start_state(), d2.start_state());
    queue.push_back((d1.start_state(), d2.start_state()));
    while let Some((s1, s2)) = queue.pop_front() {
        assert_eq!(d1.is_match_state(s1), d2.is_match_state(s2));
        assert_eq!(d1.is_dead_state(s1), d2.is_dead_state(s2));
        for input in 0..=255u8 {
            let (n1, n2) = (d1.next_state(s1, input), d2.next_state(s2, input));
            match map.get(&n1) {
                Some(&mapped) => assert_eq!(
                    mapped, n2,
                    "states diverge on input 0x{:02X}",
                    input,
                ),
                None => {
                    map.insert(n1, n2);
                    queue.push_back((n1, n2));
                }
            }
        }
    }
}
