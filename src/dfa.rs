use crate::state_id::StateID;

/// A trait describing the interface of a deterministic finite automaton
/// (DFA).
///
/// Every DFA in this crate---dense or sparse, owned or borrowed---has a
/// single start state, a dead state, zero or more match states and a
/// transition function mapping the current state and the current input byte
/// to the next state. This trait captures exactly that contract, so that
/// search routines (including the composed searches performed by
/// [`Regex`](struct.Regex.html)) can drive any automaton without knowing its
/// concrete representation.
///
/// The transition function and the state predicates are total: once an
/// automaton has been successfully built or deserialized, no call through
/// this trait can fail, for any state identifier previously returned by the
/// automaton and any input byte.
///
/// # The dead state
///
/// Every DFA has a special dead state. It is a non-match state that
/// transitions to itself on every input byte. Since no suffix of the input
/// can change the outcome once the dead state has been entered, every search
/// routine stops as soon as it observes it.
///
/// # Provided searches
///
/// The searching routines provided here are implemented in terms of the
/// transition function, so they work for any automaton. However, each
/// concrete automaton in this crate overrides them so that the case analysis
/// between transition table variants is performed once per search instead of
/// once per byte. Callers should therefore prefer these methods over writing
/// their own loops.
pub trait DFA {
    /// The representation used for state identifiers in this DFA.
    type ID: StateID;

    /// Return the identifier of this DFA's start state.
    fn start_state(&self) -> Self::ID;

    /// Returns true if and only if the given identifier corresponds to a
    /// match state.
    fn is_match_state(&self, id: Self::ID) -> bool;

    /// Returns true if and only if the given identifier corresponds to
    /// either a match state or the dead state.
    ///
    /// Searches use this as a cheap first test: states are ordered such that
    /// a single comparison rules out everything that could neither finish
    /// nor kill the search.
    fn is_possible_match_state(&self, id: Self::ID) -> bool;

    /// Returns true if and only if the given identifier corresponds to the
    /// dead state. When a search enters the dead state, it can never leave
    /// and therefore no future match can ever occur.
    fn is_dead_state(&self, id: Self::ID) -> bool;

    /// Given the current state and the current input byte, return the next
    /// state.
    ///
    /// `current` must be a state identifier previously returned by this DFA;
    /// any input byte is permitted.
    fn next_state(&self, current: Self::ID, input: u8) -> Self::ID;

    /// Like `next_state`, but its implementation may elide bounds checks.
    ///
    /// # Safety
    ///
    /// `current` must be a state identifier previously returned by this DFA.
    /// An arbitrary identifier may cause an out of bounds table access.
    unsafe fn next_state_unchecked(
        &self,
        current: Self::ID,
        input: u8,
    ) -> Self::ID;

    /// Returns true if and only if the given bytes match this DFA.
    ///
    /// This routine may short circuit if it knows that scanning future input
    /// will never lead to a different result. In particular, if a DFA enters
    /// a match state or a dead state, then this routine will return `true`
    /// or `false`, respectively, without inspecting any future input.
    fn is_match(&self, bytes: &[u8]) -> bool {
        is_match!(self, bytes, next_state_unchecked)
    }

    /// Returns the first position at which a match is found.
    ///
    /// This routine stops scanning input in precisely the same circumstances
    /// as `is_match`. The key difference is that this routine returns the
    /// position at which it stopped scanning input if and only if a match
    /// was found. If no match is found, then `None` is returned.
    fn shortest_match(&self, bytes: &[u8]) -> Option<usize> {
        shortest_match!(self, bytes, next_state_unchecked)
    }

    /// Returns the end offset of the leftmost first match. If no match
    /// exists, then `None` is returned.
    ///
    /// The "leftmost first" match corresponds to the match with the smallest
    /// starting offset, but where the end offset is determined by preferring
    /// earlier branches in the original pattern. The preference order itself
    /// is baked into the automaton's topology; this routine merely records
    /// the most recent position at which a match state was entered and stops
    /// once the automaton dies.
    fn find(&self, bytes: &[u8]) -> Option<usize> {
        find!(self, bytes, next_state_unchecked)
    }

    /// Returns the start offset of the leftmost first match in reverse, by
    /// searching from the end of the input towards the start of the input.
    /// If no match exists, then `None` is returned.
    ///
    /// This routine is principally useful on an automaton built from the
    /// reversed language of a pattern, as the reverse half of a
    /// [`Regex`](struct.Regex.html). In general, it is unlikely to be
    /// correct to use both `find` and `rfind` with the same automaton.
    fn rfind(&self, bytes: &[u8]) -> Option<usize> {
        rfind!(self, bytes, next_state_unchecked)
    }
}

impl<'a, T: DFA> DFA for &'a T {
    type ID = T::ID;

    fn start_state(&self) -> Self::ID {
        (**self).start_state()
    }

    fn is_match_state(&self, id: Self::ID) -> bool {
        (**self).is_match_state(id)
    }

    fn is_possible_match_state(&self, id: Self::ID) -> bool {
        (**self).is_possible_match_state(id)
    }

    fn is_dead_state(&self, id: Self::ID) -> bool {
        (**self).is_dead_state(id)
    }

    fn next_state(&self, current: Self::ID, input: u8) -> Self::ID {
        (**self).next_state(current, input)
    }

    unsafe fn next_state_unchecked(
        &self,
        current: Self::ID,
        input: u8,
    ) -> Self::ID {
        (**self).next_state_unchecked(current, input)
    }

    fn is_match(&self, bytes: &[u8]) -> bool {
        (**self).is_match(bytes)
    }

    fn shortest_match(&self, bytes: &[u8]) -> Option<usize> {
        (**self).shortest_match(bytes)
    }

    fn find(&self, bytes: &[u8]) -> Option<usize> {
        (**self).find(bytes)
    }

    fn rfind(&self, bytes: &[u8]) -> Option<usize> {
        (**self).rfind(bytes)
    }
}
