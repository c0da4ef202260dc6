use std::fmt;
use std::iter;
use std::mem::size_of;
use std::slice;

use crate::classes::ByteClasses;
use crate::dense_ref::DenseDFARef;
use crate::dfa::DFA;
use crate::error::{Error, Result};
use crate::minimize::Minimizer;
use crate::sparse::SparseDFA;
use crate::state_id::{
    dead_id, next_state_id, premultiply_overflow_error, StateID,
};

/// The size of the alphabet in a standard DFA.
///
/// Specifically, this length controls the number of transitions present in
/// each DFA state. However, when the byte class optimization is enabled,
/// then each DFA maps the space of all possible 256 byte values to at most
/// 256 distinct equivalence classes. In this case, the number of distinct
/// equivalence classes corresponds to the internal alphabet of the DFA, in
/// the sense that each DFA state has a number of transitions equal to the
/// number of equivalence classes despite supporting matching on all possible
/// byte values.
pub const ALPHABET_LEN: usize = 256;

/// A heap allocated table-based deterministic finite automaton (DFA).
///
/// A dense DFA represents the core matching primitive in this crate. That
/// is, logically, all DFAs have a single start state, one or more match
/// states and a transition table that maps the current state and the current
/// byte of input to the next state. A DFA can use this information to
/// implement fast searching. In particular, the use of a dense DFA generally
/// makes the trade off that match speed is the most valuable characteristic,
/// even if building the DFA may take significant time *and* space. As such,
/// the processing of every byte of input is done with a small constant
/// number of operations that does not vary with the pattern, its size or the
/// size of the alphabet. If your needs don't line up with this trade off,
/// then a [`SparseDFA`](struct.SparseDFA.html) may be a better fit: it uses
/// less space but will execute a variable number of instructions per byte at
/// match time.
///
/// A dense DFA is built from an already determinized transition layout using
/// a [`DenseDFABuilder`](struct.DenseDFABuilder.html). This crate does not
/// compile patterns; producing the layout is the responsibility of the
/// caller.
///
/// A single DFA fundamentally supports the following operations:
///
/// 1. Detection of a match.
/// 2. Location of the end of the first possible match.
/// 3. Location of the end of the leftmost first match.
///
/// A notable absence from the above list of capabilities is the location of
/// the *start* of a match. In order to provide both the start and end of a
/// match, *two* DFAs are required. This functionality is provided by a
/// [`Regex`](struct.Regex.html).
///
/// # State size
///
/// A `DenseDFA` has a single type parameter, `S`, which corresponds to the
/// representation used for the DFA's state identifiers as described by the
/// [`StateID`](trait.StateID.html) trait. This type parameter is, by
/// default, set to `usize`. Other valid choices provided by this crate
/// include `u8`, `u16`, `u32` and `u64`. The primary reason for choosing a
/// different state identifier representation than the default is to reduce
/// the amount of memory used by a DFA, both on the heap and in its
/// serialized form. Note though, that if the chosen representation cannot
/// accommodate the size of your DFA, then building the DFA will fail and
/// return an error.
///
/// # Variants
///
/// The transition table of a dense DFA can be encoded in one of three ways,
/// reported by [`kind`](struct.DenseDFA.html#method.kind). All of them use
/// the same row major layout, but vary in how a transition lookup is
/// computed:
///
/// * `Standard` indexes rows directly with the input byte.
/// * `ByteClass` first maps the input byte to its equivalence class, which
///   shrinks each row from 256 entries down to one entry per class.
/// * `Premultiplied` additionally stores every state identifier pre-scaled
///   by the number of classes, which removes a multiply from every lookup.
///   This changes the encoding of identifiers, but not the logical
///   automaton.
///
/// The distinction only matters for the transition lookup itself. The
/// searching routines on this type resolve it once per search call, so each
/// byte of input is processed without re-examining the DFA's kind.
#[derive(Clone)]
pub struct DenseDFA<S = usize> {
    /// The type of DFA. This tag controls how the state transition table is
    /// interpreted. It is never correct to read the transition table without
    /// knowing the DFA's kind.
    kind: DenseDFAKind,
    /// The initial start state ID.
    start: S,
    /// The total number of states in this DFA. Note that a DFA always has at
    /// least one state---the dead state---even the empty DFA. In particular,
    /// the dead state always has ID 0 and is correspondingly always the
    /// first state. The dead state is never a match state.
    state_count: usize,
    /// States in a DFA have a *partial* ordering such that a match state
    /// always precedes any non-match state (except for the special dead
    /// state).
    ///
    /// `max_match` corresponds to the last state that is a match state. This
    /// encoding has two critical benefits. Firstly, we are not required to
    /// store any additional per-state information about whether it is a
    /// match state or not. Secondly, when searching with the DFA, we can do
    /// a single comparison with `max_match` for each byte instead of two
    /// comparisons for each byte (one testing whether it is a match and the
    /// other testing whether we've reached a dead state).
    max_match: S,
    /// The total number of transitions per state in this DFA. This is always
    /// equivalent to 256, unless the DFA was built with byte classes, in
    /// which case this is equal to the number of equivalence classes.
    alphabet_len: usize,
    /// A set of equivalence classes, where a single equivalence class
    /// represents a set of bytes that never discriminate between a match
    /// and a non-match in the DFA. Each equivalence class corresponds to a
    /// single letter in this DFA's alphabet, where the maximum number of
    /// letters is 256 (each possible value of a byte). When the DFA's kind
    /// does not use byte classes, this is the identity map.
    byte_classes: ByteClasses,
    /// A contiguous region of memory representing the transition table in
    /// row-major order. The representation is dense. That is, every state
    /// has precisely the same number of transitions.
    trans: Vec<S>,
}

impl<S: StateID> DenseDFA<S> {
    /// Create a new empty DFA with the given set of byte equivalence
    /// classes. An empty DFA never matches any input, and contains only the
    /// dead state.
    pub(crate) fn empty_with_byte_classes(
        byte_classes: ByteClasses,
    ) -> DenseDFA<S> {
        let (kind, alphabet_len) = if byte_classes.is_singleton() {
            (DenseDFAKind::Standard, ALPHABET_LEN)
        } else {
            (DenseDFAKind::ByteClass, byte_classes.alphabet_len())
        };
        let mut dfa = DenseDFA {
            kind,
            start: dead_id(),
            state_count: 0,
            max_match: dead_id(),
            alphabet_len,
            byte_classes,
            trans: vec![],
        };
        // Every state ID representation can fit at least one state.
        dfa.add_empty_state().unwrap();
        dfa
    }

    pub(crate) fn from_parts(
        kind: DenseDFAKind,
        start: S,
        state_count: usize,
        max_match: S,
        byte_classes: ByteClasses,
        trans: Vec<S>,
    ) -> DenseDFA<S> {
        let alphabet_len = if kind.is_byte_class() {
            byte_classes.alphabet_len()
        } else {
            ALPHABET_LEN
        };
        DenseDFA {
            kind,
            start,
            state_count,
            max_match,
            alphabet_len,
            byte_classes,
            trans,
        }
    }
}

impl<S: StateID> DenseDFA<S> {
    /// Returns true if and only if the given bytes match this DFA.
    ///
    /// This routine may short circuit if it knows that scanning future input
    /// will never lead to a different result. In particular, if a DFA enters
    /// a match state or a dead state, then this routine will return `true`
    /// or `false`, respectively, without inspecting any future input.
    pub fn is_match(&self, bytes: &[u8]) -> bool {
        self.as_dfa_ref().is_match_inline(bytes)
    }

    /// Returns the first position at which a match is found.
    ///
    /// This routine stops scanning input in precisely the same circumstances
    /// as `is_match`. The key difference is that this routine returns the
    /// position at which it stopped scanning input if and only if a match
    /// was found. If no match is found, then `None` is returned.
    pub fn shortest_match(&self, bytes: &[u8]) -> Option<usize> {
        self.as_dfa_ref().shortest_match_inline(bytes)
    }

    /// Returns the end offset of the leftmost first match. If no match
    /// exists, then `None` is returned.
    ///
    /// The "leftmost first" match corresponds to the match with the smallest
    /// starting offset, but where the end offset is determined by preferring
    /// earlier branches in the original pattern. The preference between
    /// branches is baked into the automaton's topology and is not a runtime
    /// choice made by this routine.
    pub fn find(&self, bytes: &[u8]) -> Option<usize> {
        self.as_dfa_ref().find_inline(bytes)
    }

    /// Returns the start offset of the leftmost first match in reverse, by
    /// searching from the end of the input towards the start of the input.
    /// If no match exists, then `None` is returned.
    ///
    /// This routine is principally useful on a DFA built from the reversed
    /// language of a pattern. In general, it's unlikely to be correct to use
    /// both `find` and `rfind` with the same DFA.
    pub fn rfind(&self, bytes: &[u8]) -> Option<usize> {
        self.as_dfa_ref().rfind_inline(bytes)
    }

    /// Return a borrowed version of this DFA.
    ///
    /// A [`DenseDFARef`](struct.DenseDFARef.html) implements the same
    /// matching contract as this type, but does not own its transition
    /// table. It is the type produced by zero-copy deserialization.
    pub fn as_dfa_ref(&self) -> DenseDFARef<'_, S> {
        DenseDFARef::from_parts(
            self.kind,
            self.start,
            self.state_count,
            self.max_match,
            self.alphabet_len,
            self.byte_classes.as_slice(),
            &self.trans,
        )
    }

    /// Return this DFA's transition table kind.
    pub fn kind(&self) -> DenseDFAKind {
        self.kind
    }

    /// Returns the memory usage, in bytes, of this DFA.
    ///
    /// The memory usage is computed based on the number of bytes used to
    /// represent this DFA's transition table. This corresponds to heap
    /// memory usage.
    ///
    /// This does **not** include the stack size used up by this DFA. To
    /// compute that, use `std::mem::size_of::<DenseDFA>()`.
    pub fn memory_usage(&self) -> usize {
        self.trans.len() * size_of::<S>()
    }

    /// Serialize this DFA to raw bytes in little endian format.
    pub fn to_bytes_little_endian(&self) -> Result<Vec<u8>> {
        self.as_dfa_ref().to_bytes_little_endian()
    }

    /// Serialize this DFA to raw bytes in big endian format.
    pub fn to_bytes_big_endian(&self) -> Result<Vec<u8>> {
        self.as_dfa_ref().to_bytes_big_endian()
    }

    /// Serialize this DFA to raw bytes in native endian format.
    ///
    /// Generally, it is better to pick an explicit endianness using either
    /// `to_bytes_little_endian` or `to_bytes_big_endian`. This routine is
    /// useful in tests where the DFA is serialized and deserialized on the
    /// same platform.
    pub fn to_bytes_native_endian(&self) -> Result<Vec<u8>> {
        self.as_dfa_ref().to_bytes_native_endian()
    }

    /// Deserialize a DFA with a specific state identifier representation,
    /// copying the transition table onto the heap.
    ///
    /// The bytes given should be generated by the serialization of a DFA
    /// with either the `to_bytes_little_endian` method or the
    /// `to_bytes_big_endian` method, matching the endianness of the machine
    /// doing the deserialization. A buffer with a foreign endianness,
    /// unsupported version, mismatched state identifier width or truncated
    /// contents is rejected with an error; decoding never panics and never
    /// silently misbehaves.
    ///
    /// Unlike [`DenseDFARef::from_bytes`](struct.DenseDFARef.html#method.from_bytes),
    /// this copies the transition table out of the buffer, so the buffer
    /// needs no particular alignment.
    pub fn from_bytes(buf: &[u8]) -> Result<DenseDFA<S>> {
        crate::dense_ref::from_bytes_owned(buf)
    }

    /// Create a new DFA whose match semantics are equivalent to this DFA,
    /// but attempt to use `u8` for the representation of state identifiers.
    /// If `u8` is insufficient to represent all state identifiers in this
    /// DFA, then this returns an error.
    ///
    /// This is a convenience routine for `to_sized::<u8>()`.
    pub fn to_u8(&self) -> Result<DenseDFA<u8>> {
        self.to_sized()
    }

    /// Create a new DFA whose match semantics are equivalent to this DFA,
    /// but attempt to use `u16` for the representation of state identifiers.
    /// If `u16` is insufficient to represent all state identifiers in this
    /// DFA, then this returns an error.
    ///
    /// This is a convenience routine for `to_sized::<u16>()`.
    pub fn to_u16(&self) -> Result<DenseDFA<u16>> {
        self.to_sized()
    }

    /// Create a new DFA whose match semantics are equivalent to this DFA,
    /// but attempt to use `u32` for the representation of state identifiers.
    /// If `u32` is insufficient to represent all state identifiers in this
    /// DFA, then this returns an error.
    ///
    /// This is a convenience routine for `to_sized::<u32>()`.
    pub fn to_u32(&self) -> Result<DenseDFA<u32>> {
        self.to_sized()
    }

    /// Create a new DFA whose match semantics are equivalent to this DFA,
    /// but attempt to use `u64` for the representation of state identifiers.
    /// If `u64` is insufficient to represent all state identifiers in this
    /// DFA, then this returns an error.
    ///
    /// This is a convenience routine for `to_sized::<u64>()`.
    pub fn to_u64(&self) -> Result<DenseDFA<u64>> {
        self.to_sized()
    }

    /// Create a new DFA whose match semantics are equivalent to this DFA,
    /// but attempt to use `A` for the representation of state identifiers.
    /// If `A` is insufficient to represent all state identifiers in this
    /// DFA, then this returns an error.
    ///
    /// An alternative way to construct such a DFA is to use
    /// [`DenseDFABuilder::build_with_size`](struct.DenseDFABuilder.html#method.build_with_size).
    pub fn to_sized<A: StateID>(&self) -> Result<DenseDFA<A>> {
        // Check that this DFA can fit into A's representation. The largest
        // identifier in use is the last state's, scaled by the alphabet
        // length if this DFA is premultiplied.
        let mut last_state_id = self.state_count - 1;
        if self.kind.is_premultiplied() {
            last_state_id *= self.alphabet_len();
        }
        if last_state_id > A::max_id() {
            return Err(Error::state_id_overflow(A::max_id(), last_state_id));
        }

        // We're off to the races. The new DFA is the same as the old one,
        // but its transition table is rewritten in the new representation.
        let mut new = DenseDFA {
            kind: self.kind,
            start: A::from_usize(self.start.to_usize()),
            state_count: self.state_count,
            max_match: A::from_usize(self.max_match.to_usize()),
            alphabet_len: self.alphabet_len,
            byte_classes: self.byte_classes,
            trans: vec![dead_id::<A>(); self.trans.len()],
        };
        for (i, id) in new.trans.iter_mut().enumerate() {
            *id = A::from_usize(self.trans[i].to_usize());
        }
        Ok(new)
    }

    /// Create a new DFA whose match semantics are equivalent to this DFA,
    /// but whose transition table is indexed directly by raw byte values
    /// with no equivalence classes.
    ///
    /// This expands each state's row back out to 256 transitions, so the
    /// result is typically much bigger. It exists primarily so that the byte
    /// class optimization can be checked against the straightforward
    /// encoding.
    ///
    /// Re-encoding a premultiplied DFA is not supported, since its state
    /// identifiers are scaled by a different alphabet length; attempting it
    /// returns an error. Rebuild from the original transition layout
    /// instead.
    pub fn to_standard(&self) -> Result<DenseDFA<S>> {
        match self.kind {
            DenseDFAKind::Standard => Ok(self.clone()),
            DenseDFAKind::Premultiplied => {
                Err(Error::unsupported_conversion(
                    "a premultiplied transition table cannot be re-encoded \
                     with a raw byte alphabet",
                ))
            }
            DenseDFAKind::ByteClass => {
                let mut trans =
                    vec![dead_id::<S>(); self.state_count * ALPHABET_LEN];
                for id in 0..self.state_count {
                    for b in 0..ALPHABET_LEN {
                        let class = self.byte_classes.get(b as u8) as usize;
                        trans[id * ALPHABET_LEN + b] =
                            self.trans[id * self.alphabet_len + class];
                    }
                }
                Ok(DenseDFA {
                    kind: DenseDFAKind::Standard,
                    start: self.start,
                    state_count: self.state_count,
                    max_match: self.max_match,
                    alphabet_len: ALPHABET_LEN,
                    byte_classes: ByteClasses::singletons(),
                    trans,
                })
            }
        }
    }

    /// Convert this dense DFA to a sparse DFA with an equivalent matching
    /// behavior, keeping the same state identifier representation.
    ///
    /// A sparse DFA stores, for each state, a short list of byte ranges and
    /// their targets instead of a full row, which usually shrinks the
    /// automaton considerably at the cost of a slower transition lookup.
    pub fn to_sparse_dfa(&self) -> Result<SparseDFA<S>> {
        self.to_sparse_dfa_sized::<S>()
    }

    /// Convert this dense DFA to a sparse DFA with an equivalent matching
    /// behavior, using `A` for the sparse DFA's state identifiers.
    ///
    /// Sparse state identifiers are byte offsets into the sparse transition
    /// table, so a sparse DFA may need a wider representation than the dense
    /// DFA it was built from. If `A` is too narrow, then this returns an
    /// error.
    pub fn to_sparse_dfa_sized<A: StateID>(&self) -> Result<SparseDFA<A>> {
        SparseDFA::from_dense_sized(self)
    }
}

/// Internal accessors used by searching, conversion to sparse and
/// minimization.
impl<S: StateID> DenseDFA<S> {
    pub(crate) fn state_id_to_offset(&self, id: S) -> usize {
        if self.kind.is_premultiplied() {
            id.to_usize()
        } else {
            id.to_usize() * self.alphabet_len()
        }
    }

    pub(crate) fn state_id_to_index(&self, id: S) -> usize {
        if self.kind.is_premultiplied() {
            id.to_usize() / self.alphabet_len()
        } else {
            id.to_usize()
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.state_count
    }

    pub(crate) fn alphabet_len(&self) -> usize {
        self.alphabet_len
    }

    pub(crate) fn start(&self) -> S {
        self.start
    }

    pub(crate) fn byte_classes(&self) -> &ByteClasses {
        &self.byte_classes
    }

    pub(crate) fn max_match_state(&self) -> S {
        self.max_match
    }

    pub(crate) fn trans(&self) -> &[S] {
        &self.trans
    }

    pub(crate) fn iter(&self) -> StateIter<'_, S> {
        let it = self.trans.chunks(self.alphabet_len());
        StateIter { dfa: self, it: it.enumerate() }
    }
}

/// Internal mutation, used only while an automaton is under construction by
/// the builder and the minimizer. A `DenseDFA` handed to a caller is never
/// mutated.
impl<S: StateID> DenseDFA<S> {
    pub(crate) fn set_start_state(&mut self, start: S) {
        assert!(start.to_usize() < self.len());
        self.start = start;
    }

    pub(crate) fn set_max_match_state(&mut self, id: S) {
        self.max_match = id;
    }

    pub(crate) fn set_transition(&mut self, from: S, input: u8, to: S) {
        let class = self.byte_classes.get(input);
        let i = self.state_id_to_offset(from) + class as usize;
        self.trans[i] = to;
    }

    pub(crate) fn add_empty_state(&mut self) -> Result<S> {
        let id = if self.state_count == 0 {
            S::from_usize(0)
        } else {
            next_state_id(S::from_usize(self.state_count - 1))?
        };
        let alphabet_len = self.alphabet_len();
        self.trans.extend(iter::repeat(dead_id::<S>()).take(alphabet_len));
        // This can never wrap, since the transition table would have run out
        // of room long ago.
        self.state_count += 1;
        Ok(id)
    }

    pub(crate) fn get_state_mut(&mut self, id: S) -> StateMut<'_, S> {
        let i = self.state_id_to_offset(id);
        let alphabet_len = self.alphabet_len();
        StateMut { transitions: &mut self.trans[i..i + alphabet_len] }
    }

    pub(crate) fn swap_states(&mut self, id1: S, id2: S) {
        let o1 = self.state_id_to_offset(id1);
        let o2 = self.state_id_to_offset(id2);
        for b in 0..self.alphabet_len() {
            self.trans.swap(o1 + b, o2 + b);
        }
    }

    pub(crate) fn truncate_states(&mut self, count: usize) {
        let alphabet_len = self.alphabet_len();
        self.trans.truncate(count * alphabet_len);
        self.state_count = count;
    }

    /// This routine shuffles all match states in this DFA---according to the
    /// given predicate, indexed by state---to the beginning of the DFA such
    /// that every non-match state appears after every match state. (With one
    /// exception: the special dead state remains as the first state.)
    ///
    /// The purpose of doing this shuffling is to avoid the need to store
    /// additional state to determine whether a state is a match state or
    /// not. It also enables a single conditional in the core matching loop
    /// instead of two.
    ///
    /// This updates `self.max_match` to point to the last matching state.
    pub(crate) fn shuffle_match_states(&mut self, is_match: &[bool]) {
        assert!(
            !self.kind.is_premultiplied(),
            "cannot shuffle match states of premultiplied DFA"
        );
        assert_eq!(self.len(), is_match.len());
        assert!(!is_match[0], "the dead state cannot be a match state");

        if self.len() <= 2 {
            self.max_match = if self.len() == 2 && is_match[1] {
                S::from_usize(1)
            } else {
                dead_id()
            };
            return;
        }

        let mut first_non_match = 1;
        while first_non_match < self.len() && is_match[first_non_match] {
            first_non_match += 1;
        }

        let mut swaps: Vec<S> = vec![dead_id(); self.len()];
        let mut cur = self.len() - 1;
        while cur > first_non_match {
            if is_match[cur] {
                self.swap_states(
                    S::from_usize(cur),
                    S::from_usize(first_non_match),
                );
                swaps[cur] = S::from_usize(first_non_match);
                swaps[first_non_match] = S::from_usize(cur);

                first_non_match += 1;
                while first_non_match < cur && is_match[first_non_match] {
                    first_non_match += 1;
                }
            }
            cur -= 1;
        }
        for id in (0..self.len()).map(S::from_usize) {
            for (_, next) in self.get_state_mut(id).iter_mut() {
                if swaps[next.to_usize()] != dead_id() {
                    *next = swaps[next.to_usize()];
                }
            }
        }
        if swaps[self.start.to_usize()] != dead_id() {
            self.start = swaps[self.start.to_usize()];
        }
        self.max_match = S::from_usize(first_non_match - 1);
    }

    pub(crate) fn minimize(&mut self) {
        assert!(!self.kind.is_premultiplied());
        Minimizer::new(self).run();
    }

    pub(crate) fn premultiply(&mut self) -> Result<()> {
        if self.kind.is_premultiplied() || self.len() == 0 {
            return Ok(());
        }

        let alpha_len = self.alphabet_len();
        premultiply_overflow_error(
            S::from_usize(self.len() - 1),
            alpha_len,
        )?;

        for id in (0..self.len()).map(S::from_usize) {
            for (_, next) in self.get_state_mut(id).iter_mut() {
                *next = S::from_usize(next.to_usize() * alpha_len);
            }
        }
        self.kind = self.kind.premultiplied();
        self.start = S::from_usize(self.start.to_usize() * alpha_len);
        self.max_match = S::from_usize(self.max_match.to_usize() * alpha_len);
        Ok(())
    }
}

impl<S: StateID> DFA for DenseDFA<S> {
    type ID = S;

    fn start_state(&self) -> S {
        self.start
    }

    fn is_match_state(&self, id: S) -> bool {
        id <= self.max_match && id != dead_id()
    }

    fn is_possible_match_state(&self, id: S) -> bool {
        id <= self.max_match
    }

    fn is_dead_state(&self, id: S) -> bool {
        id == dead_id()
    }

    fn next_state(&self, current: S, input: u8) -> S {
        self.as_dfa_ref().next_state(current, input)
    }

    unsafe fn next_state_unchecked(&self, current: S, input: u8) -> S {
        self.as_dfa_ref().next_state_unchecked(current, input)
    }

    // The provided search routines would perform the case analysis between
    // transition table kinds for every byte of input. Specialize them so it
    // happens once per search instead.

    fn is_match(&self, bytes: &[u8]) -> bool {
        DenseDFA::is_match(self, bytes)
    }

    fn shortest_match(&self, bytes: &[u8]) -> Option<usize> {
        DenseDFA::shortest_match(self, bytes)
    }

    fn find(&self, bytes: &[u8]) -> Option<usize> {
        DenseDFA::find(self, bytes)
    }

    fn rfind(&self, bytes: &[u8]) -> Option<usize> {
        DenseDFA::rfind(self, bytes)
    }
}

/// An iterator over the states of a dense DFA, yielding pairs of the state's
/// identifier (in this DFA's identifier encoding) and the state itself.
pub(crate) struct StateIter<'a, S> {
    dfa: &'a DenseDFA<S>,
    it: iter::Enumerate<slice::Chunks<'a, S>>,
}

impl<'a, S: StateID> Iterator for StateIter<'a, S> {
    type Item = (S, State<'a, S>);

    fn next(&mut self) -> Option<(S, State<'a, S>)> {
        self.it.next().map(|(id, chunk)| {
            let state = State {
                transitions: chunk,
                byte_classes: &self.dfa.byte_classes,
            };
            let id = if self.dfa.kind.is_premultiplied() {
                id * self.dfa.alphabet_len()
            } else {
                id
            };
            (S::from_usize(id), state)
        })
    }
}

/// A single state of a dense DFA: one row of the transition table, together
/// with the class map needed to interpret it.
pub(crate) struct State<'a, S> {
    transitions: &'a [S],
    byte_classes: &'a ByteClasses,
}

impl<'a, S: StateID> State<'a, S> {
    /// Return the target of this state's transition on the given byte.
    pub(crate) fn next(&self, input: u8) -> S {
        self.transitions[self.byte_classes.get(input) as usize]
    }

    /// Return this state's transitions as maximal contiguous ranges of byte
    /// values with a common target. The ranges are returned in ascending
    /// order and cover all 256 byte values, including those whose target is
    /// the dead state.
    pub(crate) fn sparse_transitions(&self) -> Vec<(u8, u8, S)> {
        let mut ranges = vec![];
        let mut cur: Option<(u8, u8, S)> = None;
        for b in 0..=255 {
            let next_id = self.next(b);
            cur = match cur {
                None => Some((b, b, next_id)),
                Some((start, _, prev_id)) if prev_id == next_id => {
                    Some((start, b, prev_id))
                }
                Some(range) => {
                    ranges.push(range);
                    Some((b, b, next_id))
                }
            };
        }
        ranges.push(cur.unwrap());
        ranges
    }
}

/// A mutable view of a single state's transitions, used during construction.
pub(crate) struct StateMut<'a, S> {
    transitions: &'a mut [S],
}

impl<'a, S: StateID> StateMut<'a, S> {
    pub(crate) fn iter_mut(&mut self) -> StateTransitionIterMut<'_, S> {
        StateTransitionIterMut {
            it: self.transitions.iter_mut().enumerate(),
        }
    }
}

pub(crate) struct StateTransitionIterMut<'a, S> {
    it: iter::Enumerate<slice::IterMut<'a, S>>,
}

impl<'a, S: StateID> Iterator for StateTransitionIterMut<'a, S> {
    type Item = (usize, &'a mut S);

    fn next(&mut self) -> Option<(usize, &'a mut S)> {
        self.it.next()
    }
}

/// The kind of a dense DFA's transition table. The kind controls how a
/// transition lookup interprets the table and the state identifiers stored
/// in it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DenseDFAKind {
    /// The transition table is indexed by raw byte values. Each state has
    /// 256 transitions.
    Standard,
    /// The transition table is indexed by byte equivalence class. Each state
    /// has one transition per class.
    ByteClass,
    /// Like `ByteClass`, but every stored state identifier is additionally
    /// pre-multiplied by the number of classes, so that a transition lookup
    /// needs no multiply.
    Premultiplied,
}

impl DenseDFAKind {
    /// Returns true if and only if this kind maps input bytes through the
    /// equivalence class table before indexing a state's row.
    pub fn is_byte_class(&self) -> bool {
        match *self {
            DenseDFAKind::Standard => false,
            DenseDFAKind::ByteClass | DenseDFAKind::Premultiplied => true,
        }
    }

    /// Returns true if and only if this kind stores state identifiers
    /// pre-multiplied by the alphabet length.
    pub fn is_premultiplied(&self) -> bool {
        match *self {
            DenseDFAKind::Standard | DenseDFAKind::ByteClass => false,
            DenseDFAKind::Premultiplied => true,
        }
    }

    pub(crate) fn premultiplied(self) -> DenseDFAKind {
        match self {
            DenseDFAKind::Standard | DenseDFAKind::ByteClass => {
                DenseDFAKind::Premultiplied
            }
            DenseDFAKind::Premultiplied => {
                panic!("DFA already has pre-multiplied state IDs")
            }
        }
    }

    pub(crate) fn to_byte(&self) -> u8 {
        match *self {
            DenseDFAKind::Standard => 0,
            DenseDFAKind::ByteClass => 1,
            DenseDFAKind::Premultiplied => 2,
        }
    }

    pub(crate) fn from_byte(b: u8) -> Option<DenseDFAKind> {
        match b {
            0 => Some(DenseDFAKind::Standard),
            1 => Some(DenseDFAKind::ByteClass),
            2 => Some(DenseDFAKind::Premultiplied),
            _ => None,
        }
    }
}

impl<S: StateID> fmt::Debug for DenseDFA<S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (id, state) in self.iter() {
            let mut status = [b' ', b' '];
            if id == dead_id() {
                status[0] = b'D';
            } else if id == self.start {
                status[0] = b'>';
            }
            if self.is_match_state(id) {
                status[1] = b'*';
            }
            writeln!(
                f,
                "{}{:04}: {:?}",
                String::from_utf8_lossy(&status),
                id.to_usize(),
                state,
            )?;
        }
        Ok(())
    }
}

impl<'a, S: StateID> fmt::Debug for State<'a, S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut transitions = vec![];
        for (start, end, next_id) in self.sparse_transitions() {
            if next_id == dead_id() {
                continue;
            }
            let line = if start == end {
                format!("{} => {}", escape(start), next_id.to_usize())
            } else {
                format!(
                    "{}-{} => {}",
                    escape(start),
                    escape(end),
                    next_id.to_usize(),
                )
            };
            transitions.push(line);
        }
        write!(f, "{}", transitions.join(", "))
    }
}

/// Return the given byte as its escaped string form.
pub(crate) fn escape(b: u8) -> String {
    use std::ascii;

    String::from_utf8(ascii::escape_default(b).collect::<Vec<_>>()).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{DenseDFABuilder, TransitionTable};
    use crate::dfa::DFA;

    fn anchored_abc() -> TransitionTable {
        let mut table = TransitionTable::new();
        let s1 = table.add_state(false);
        let s2 = table.add_state(false);
        let s3 = table.add_state(false);
        let s4 = table.add_state(true);
        table.set_start(s1);
        table.set_transition(s1, b'a', s2);
        table.set_transition(s2, b'b', s3);
        table.set_transition(s3, b'c', s4);
        table
    }

    #[test]
    fn dead_state_is_absorbing() {
        let dfa = DenseDFABuilder::new().build(&anchored_abc()).unwrap();
        let dead = dead_id::<usize>();
        for b in 0..=255 {
            assert_eq!(dead, dfa.next_state(dead, b));
        }
        assert!(!dfa.is_match_state(dead));
        assert!(dfa.is_dead_state(dead));
    }

    #[test]
    fn errors_when_converting_to_smaller_rep() {
        let mut table = TransitionTable::new();
        let first = table.add_state(true);
        table.set_start(first);
        for _ in 0..300 {
            table.add_state(false);
        }
        let dfa = DenseDFABuilder::new()
            .byte_classes(false)
            .premultiply(false)
            .build_with_size::<u16>(&table)
            .unwrap();
        assert!(dfa.to_u8().is_err());
        assert!(dfa.to_u16().is_ok());
    }

    #[test]
    fn standard_expansion_is_equivalent() {
        let table = anchored_abc();
        let dfa = DenseDFABuilder::new()
            .premultiply(false)
            .build(&table)
            .unwrap();
        assert_eq!(DenseDFAKind::ByteClass, dfa.kind());
        let standard = dfa.to_standard().unwrap();
        assert_eq!(DenseDFAKind::Standard, standard.kind());
        for haystack in &[&b"abc"[..], b"ab", b"abcd", b"xabc", b""] {
            assert_eq!(dfa.find(haystack), standard.find(haystack));
        }
    }

    #[test]
    fn standard_expansion_of_premultiplied_is_rejected() {
        let dfa = DenseDFABuilder::new().build(&anchored_abc()).unwrap();
        assert_eq!(DenseDFAKind::Premultiplied, dfa.kind());
        assert!(dfa.to_standard().is_err());
    }
}
