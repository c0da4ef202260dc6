use std::iter;

use crate::classes::ByteClasses;
use crate::dense::DenseDFA;
use crate::error::Result;
use crate::state_id::{usize_to_state_id, StateID};

/// A fully determinized transition layout, used as the input for building a
/// [`DenseDFA`](enum.DenseDFA.html).
///
/// This crate does not parse patterns or determinize NFAs. Instead, callers
/// hand it the finished topology: a set of states, a transition for every
/// state and byte value, a start state and a set of match states. A
/// `TransitionTable` is that hand off format. It is cheap to build, uses
/// plain `usize` identifiers and performs no compression; all of the
/// interesting encoding choices (byte classes, state identifier width,
/// premultiplication) are applied by
/// [`DenseDFABuilder`](struct.DenseDFABuilder.html).
///
/// A new table always contains one state: the dead state, with identifier
/// `0`. The dead state transitions to itself on every byte, is never a match
/// state and cannot be modified. Any transition not explicitly set points at
/// the dead state, so a partially specified state fails all continuations by
/// default.
///
/// # Example
///
/// This builds the transition layout for the language `a+`, anchored at the
/// start of the input:
///
/// ```
/// use regex_dfa::TransitionTable;
///
/// let mut table = TransitionTable::new();
/// let s1 = table.add_state(false);
/// let s2 = table.add_state(true);
/// table.set_start(s1);
/// table.set_transition(s1, b'a', s2);
/// table.set_transition(s2, b'a', s2);
/// assert_eq!(3, table.len());
/// ```
#[derive(Clone, Debug)]
pub struct TransitionTable {
    /// Transitions in row major order, with a row of 256 targets per state.
    trans: Vec<usize>,
    /// Whether each state is a match state.
    is_match: Vec<bool>,
    /// The start state. Defaults to the dead state, which produces an
    /// automaton that can never match.
    start: usize,
}

/// The identifier of the dead state in a `TransitionTable`.
const DEAD: usize = 0;

impl TransitionTable {
    /// Create a new transition layout containing only the dead state.
    pub fn new() -> TransitionTable {
        let mut table = TransitionTable {
            trans: vec![],
            is_match: vec![],
            start: DEAD,
        };
        table.add_state(false);
        table
    }

    /// Add a new state and return its identifier. Identifiers are handed out
    /// sequentially starting at `1`.
    ///
    /// All of the new state's transitions point at the dead state until they
    /// are set explicitly.
    pub fn add_state(&mut self, is_match: bool) -> usize {
        let id = self.is_match.len();
        self.trans.extend(iter::repeat(DEAD).take(256));
        self.is_match.push(is_match);
        id
    }

    /// Set the transition out of state `from` on the byte `input` to the
    /// state `to`.
    ///
    /// # Panics
    ///
    /// Panics if `from` or `to` is not a state in this table, or if `from`
    /// is the dead state. The dead state's self transitions are an invariant
    /// of every automaton built from this table and cannot be changed.
    pub fn set_transition(&mut self, from: usize, input: u8, to: usize) {
        assert!(from != DEAD, "cannot set transitions out of the dead state");
        assert!(from < self.len(), "invalid 'from' state: {}", from);
        assert!(to < self.len(), "invalid 'to' state: {}", to);
        self.trans[from * 256 + input as usize] = to;
    }

    /// Set the transition out of state `from` to the state `to` for every
    /// byte in the inclusive range `start..=end`.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as `set_transition`, or if
    /// `start > end`.
    pub fn set_transition_range(
        &mut self,
        from: usize,
        start: u8,
        end: u8,
        to: usize,
    ) {
        assert!(start <= end, "invalid byte range {}-{}", start, end);
        for input in start..=end {
            self.set_transition(from, input, to);
        }
    }

    /// Set the start state.
    ///
    /// The start state may be the dead state, in which case the resulting
    /// automaton can never match anything.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a state in this table.
    pub fn set_start(&mut self, id: usize) {
        assert!(id < self.len(), "invalid start state: {}", id);
        self.start = id;
    }

    /// Return the total number of states in this table, including the dead
    /// state.
    pub fn len(&self) -> usize {
        self.is_match.len()
    }

    /// Returns true if and only if this table contains only the dead state.
    pub fn is_empty(&self) -> bool {
        self.len() == 1
    }

    pub(crate) fn transitions(&self) -> &[usize] {
        &self.trans
    }

    pub(crate) fn is_match(&self) -> &[bool] {
        &self.is_match
    }

    pub(crate) fn start(&self) -> usize {
        self.start
    }
}

impl Default for TransitionTable {
    fn default() -> TransitionTable {
        TransitionTable::new()
    }
}

/// A builder for constructing a dense deterministic finite automaton from a
/// [`TransitionTable`](struct.TransitionTable.html).
///
/// This builder permits configuring how the transition table is encoded:
///
/// * Whether to shrink the alphabet by partitioning bytes into equivalence
///   classes, where two bytes share a class precisely when the automaton
///   cannot distinguish them. On for typical patterns, this cuts the
///   transition table's width from 256 down to a handful of columns.
/// * Whether to reduce the automaton to its minimal number of states before
///   encoding it.
/// * Whether to premultiply state identifiers, which trades a slightly
///   larger identifier space for removing one multiply from every
///   transition lookup.
/// * Which state identifier representation to use, via
///   [`build_with_size`](struct.DenseDFABuilder.html#method.build_with_size).
#[derive(Clone, Debug)]
pub struct DenseDFABuilder {
    byte_classes: bool,
    premultiply: bool,
    minimize: bool,
}

impl DenseDFABuilder {
    /// Create a new dense DFA builder with the default configuration.
    ///
    /// The default configuration uses byte classes and premultiplication,
    /// and does not minimize.
    pub fn new() -> DenseDFABuilder {
        DenseDFABuilder {
            byte_classes: true,
            premultiply: true,
            minimize: false,
        }
    }

    /// Whether to partition the alphabet into equivalence classes of bytes.
    /// This is enabled by default.
    ///
    /// When disabled, each DFA state has a transition for each of the 256
    /// possible byte values, which makes lookups marginally cheaper at a
    /// significant cost in memory.
    pub fn byte_classes(&mut self, yes: bool) -> &mut DenseDFABuilder {
        self.byte_classes = yes;
        self
    }

    /// Whether to premultiply state identifiers. This is enabled by default.
    ///
    /// Premultiplied identifiers are stored pre-scaled by the number of
    /// transitions per state, so a lookup is a single addition and read
    /// instead of requiring a multiply. The cost is that the scaled
    /// identifiers must fit in the chosen representation, so building may
    /// report an overflow for automata that would otherwise fit.
    pub fn premultiply(&mut self, yes: bool) -> &mut DenseDFABuilder {
        self.premultiply = yes;
        self
    }

    /// Whether to reduce the automaton to its minimal number of equivalent
    /// states before encoding. This is disabled by default, since it can be
    /// costly for large automata and topologies are often handed to this
    /// crate already minimized.
    pub fn minimize(&mut self, yes: bool) -> &mut DenseDFABuilder {
        self.minimize = yes;
        self
    }

    /// Build a dense DFA from the given transition layout, using `usize` as
    /// the state identifier representation.
    pub fn build(&self, table: &TransitionTable) -> Result<DenseDFA<usize>> {
        self.build_with_size::<usize>(table)
    }

    /// Build a dense DFA from the given transition layout, using `S` as the
    /// state identifier representation.
    ///
    /// If every state identifier---scaled by the alphabet length when
    /// premultiplication is enabled---cannot fit in `S`, then this returns a
    /// state ID overflow error. Identifiers are never silently truncated.
    pub fn build_with_size<S: StateID>(
        &self,
        table: &TransitionTable,
    ) -> Result<DenseDFA<S>> {
        // Fail before doing any real work if the topology cannot fit. The
        // identifiers assigned below never exceed the input's own.
        usize_to_state_id::<S>(table.len() - 1)?;

        let classes = if self.byte_classes {
            ByteClasses::from_transitions(table.transitions(), table.len())
        } else {
            ByteClasses::singletons()
        };
        debug!(
            "building dense DFA: {} states, {} byte classes",
            table.len(),
            classes.alphabet_len(),
        );

        let mut dfa = DenseDFA::empty_with_byte_classes(classes);
        for _ in 1..table.len() {
            dfa.add_empty_state()?;
        }
        let reps = dfa.byte_classes().representatives();
        for id in 1..table.len() {
            for &input in reps.iter() {
                let next = table.transitions()[id * 256 + input as usize];
                dfa.set_transition(
                    S::from_usize(id),
                    input,
                    S::from_usize(next),
                );
            }
        }
        dfa.set_start_state(S::from_usize(table.start()));
        dfa.shuffle_match_states(table.is_match());

        if self.minimize {
            dfa.minimize();
            debug!("minimized dense DFA down to {} states", dfa.len());
        }
        if self.premultiply {
            dfa.premultiply()?;
            trace!("premultiplied dense DFA state identifiers");
        }
        Ok(dfa)
    }
}

impl Default for DenseDFABuilder {
    fn default() -> DenseDFABuilder {
        DenseDFABuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dfa::DFA;

    fn anchored_a_plus() -> TransitionTable {
        let mut table = TransitionTable::new();
        let s1 = table.add_state(false);
        let s2 = table.add_state(true);
        table.set_start(s1);
        table.set_transition(s1, b'a', s2);
        table.set_transition(s2, b'a', s2);
        table
    }

    #[test]
    fn empty_table_never_matches() {
        let table = TransitionTable::new();
        let dfa = DenseDFABuilder::new().build(&table).unwrap();
        assert!(!dfa.is_match(b""));
        assert!(!dfa.is_match(b"a"));
        assert_eq!(None, dfa.find(b"aaa"));
    }

    #[test]
    fn non_matching_state_is_not_reported_as_match() {
        // A single live state that never reaches a match. This exercises the
        // boundary case where the automaton has exactly one state besides
        // the dead state.
        let mut table = TransitionTable::new();
        let s1 = table.add_state(false);
        table.set_start(s1);
        table.set_transition(s1, b'a', s1);
        let dfa = DenseDFABuilder::new().build(&table).unwrap();
        assert!(!dfa.is_match(b""));
        assert!(!dfa.is_match(b"aaaa"));
    }

    #[test]
    fn errors_when_state_count_overflows() {
        let mut table = TransitionTable::new();
        let first = table.add_state(true);
        table.set_start(first);
        for _ in 0..300 {
            table.add_state(false);
        }
        let mut builder = DenseDFABuilder::new();
        builder.byte_classes(false).premultiply(false);
        assert!(builder.build_with_size::<u16>(&table).is_ok());
        // ... but u8 cannot represent 300 states.
        assert!(builder.build_with_size::<u8>(&table).is_err());
    }

    #[test]
    fn errors_when_premultiply_would_overflow() {
        let table = anchored_a_plus();
        let mut builder = DenseDFABuilder::new();
        builder.byte_classes(false).premultiply(false);
        assert!(builder.build_with_size::<u8>(&table).is_ok());
        // Premultiplying by a 256 wide alphabet overflows u8.
        builder.premultiply(true);
        assert!(builder.build_with_size::<u8>(&table).is_err());
    }

    #[test]
    #[should_panic]
    fn rejects_transitions_out_of_the_dead_state() {
        let mut table = TransitionTable::new();
        let s1 = table.add_state(false);
        table.set_transition(0, b'a', s1);
    }
}
