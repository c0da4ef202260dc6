use crate::dense::DenseDFA;
use crate::dfa::DFA;
use crate::error::Result;
use crate::sparse::SparseDFA;
use crate::state_id::StateID;

/// A regular expression that uses deterministic finite automata for fast
/// searching.
///
/// A single DFA scanning left to right can report where a match *ends*, but
/// not where it starts: tracking both boundaries in one automaton can blow
/// up its size exponentially for some patterns. A `Regex` therefore couples
/// two automata built from the same pattern. The forward automaton finds the
/// end of the leftmost first match. The reverse automaton recognizes the
/// reversal of the pattern's language; running it backward over the bytes
/// already scanned is then guaranteed to find the match's start at or before
/// the end. Both passes are linear in the input with constant work per byte.
///
/// Building the two automata---including reversing the pattern's
/// language---is the responsibility of the caller, since this crate consumes
/// already determinized transition layouts. A `Regex` is assembled from its
/// halves with [`from_dfas`](struct.Regex.html#method.from_dfas), and is
/// immutable from then on: searches share it freely across threads.
///
/// The type parameter `D` is the automaton representation, which can be any
/// implementation of the [`DFA`](trait.DFA.html) trait: dense or sparse,
/// owned or borrowed. The forward and reverse halves always use the same
/// representation.
///
/// # Example
///
/// This searches with an anchored automaton for the pattern `ab`. The
/// forward DFA recognizes `ab` and the reverse DFA recognizes `ba`.
///
/// ```
/// use regex_dfa::{DenseDFABuilder, Regex, TransitionTable};
///
/// # fn example() -> Result<(), regex_dfa::Error> {
/// let mut fwd = TransitionTable::new();
/// let (s1, s2, s3) = (
///     fwd.add_state(false),
///     fwd.add_state(false),
///     fwd.add_state(true),
/// );
/// fwd.set_start(s1);
/// fwd.set_transition(s1, b'a', s2);
/// fwd.set_transition(s2, b'b', s3);
///
/// let mut rev = TransitionTable::new();
/// let (r1, r2, r3) = (
///     rev.add_state(false),
///     rev.add_state(false),
///     rev.add_state(true),
/// );
/// rev.set_start(r1);
/// rev.set_transition(r1, b'b', r2);
/// rev.set_transition(r2, b'a', r3);
///
/// let builder = DenseDFABuilder::new();
/// let re = Regex::from_dfas(
///     builder.build(&fwd)?,
///     builder.build(&rev)?,
/// );
/// assert_eq!(Some((0, 2)), re.find(b"ab"));
/// assert_eq!(None, re.find(b"ba"));
/// # Ok(()) }; example().unwrap()
/// ```
#[derive(Clone, Debug)]
pub struct Regex<D: DFA> {
    forward: D,
    reverse: D,
}

impl<D: DFA> Regex<D> {
    /// Build a new regex from its constituent forward and reverse DFAs.
    ///
    /// The two DFAs must be built from the same pattern: `reverse` must
    /// recognize exactly the reversal of the language that `forward`
    /// recognizes, with `forward` arranged to report ends of matches
    /// scanning left to right and `reverse` arranged to report starts of
    /// matches scanning right to left. This pairing is what makes
    /// [`find`](struct.Regex.html#method.find) sound; it is not something
    /// this type can check.
    pub fn from_dfas(forward: D, reverse: D) -> Regex<D> {
        Regex { forward, reverse }
    }

    /// Returns true if and only if the given bytes match.
    ///
    /// This routine may short circuit if it knows that scanning future input
    /// will never lead to a different result. In particular, if the
    /// underlying DFA enters a match state or a dead state, then this
    /// routine will return `true` or `false`, respectively, without
    /// inspecting any future input.
    pub fn is_match(&self, input: &[u8]) -> bool {
        self.forward().is_match(input)
    }

    /// Returns the first position at which a match is found.
    ///
    /// This routine stops scanning input in precisely the same circumstances
    /// as `is_match`. The key difference is that this routine returns the
    /// position at which it stopped scanning input if and only if a match
    /// was found. If no match is found, then `None` is returned.
    pub fn shortest_match(&self, input: &[u8]) -> Option<usize> {
        self.forward().shortest_match(input)
    }

    /// Returns the start and end offset of the leftmost first match. If no
    /// match exists, then `None` is returned.
    ///
    /// The match is a half-open range `[start, end)` of byte offsets into
    /// the input, with `start <= end`. The "leftmost first" match
    /// corresponds to the match with the smallest starting offset, but where
    /// the end offset is determined by preferring earlier branches in the
    /// original pattern, as baked into the automaton topology by whatever
    /// compiled it.
    pub fn find(&self, input: &[u8]) -> Option<(usize, usize)> {
        let end = match self.forward().find(input) {
            None => return None,
            Some(end) => end,
        };
        let start = self
            .reverse()
            .rfind(&input[..end])
            .expect("reverse search must match if forward search does");
        Some((start, end))
    }

    /// Returns an iterator over all non-overlapping leftmost first matches
    /// in the given bytes. If no match exists, then the iterator yields no
    /// elements.
    pub fn find_iter<'r, 't>(&'r self, input: &'t [u8]) -> Matches<'r, 't, D> {
        Matches::new(self, input)
    }

    /// Return the underlying DFA responsible for forward matching.
    pub fn forward(&self) -> &D {
        &self.forward
    }

    /// Return the underlying DFA responsible for reverse matching.
    pub fn reverse(&self) -> &D {
        &self.reverse
    }
}

impl<S: StateID> Regex<DenseDFA<S>> {
    /// Re-encode both of this regex's automata in sparse form, yielding a
    /// regex with identical match semantics that trades some search speed
    /// for a (usually much) smaller memory footprint.
    pub fn to_sparse(&self) -> Result<Regex<SparseDFA<S>>> {
        self.to_sparse_sized::<S>()
    }

    /// Re-encode both of this regex's automata in sparse form, using `A` for
    /// the sparse automata's state identifiers.
    ///
    /// Sparse state identifiers are byte offsets into the sparse transition
    /// table, so they may need a wider representation than the dense
    /// automata use. If `A` is too narrow, then this returns an error.
    pub fn to_sparse_sized<A: StateID>(&self) -> Result<Regex<SparseDFA<A>>> {
        let forward = self.forward().to_sparse_dfa_sized::<A>()?;
        let reverse = self.reverse().to_sparse_dfa_sized::<A>()?;
        Ok(Regex::from_dfas(forward, reverse))
    }
}

/// An iterator over all non-overlapping matches for a particular search.
///
/// The iterator yields a `(usize, usize)` value until no more matches could
/// be found. The first `usize` is the start of the match (inclusive) while
/// the second `usize` is the end of the match (exclusive).
///
/// The lifetime variables are as follows:
///
/// * `'r` is the lifetime of the regular expression value itself.
/// * `'t` is the lifetime of the text being searched.
#[derive(Clone, Debug)]
pub struct Matches<'r, 't, D: DFA> {
    re: &'r Regex<D>,
    text: &'t [u8],
    last_end: usize,
    last_match: Option<usize>,
}

impl<'r, 't, D: DFA> Matches<'r, 't, D> {
    fn new(re: &'r Regex<D>, text: &'t [u8]) -> Matches<'r, 't, D> {
        Matches { re, text, last_end: 0, last_match: None }
    }
}

impl<'r, 't, D: DFA> Iterator for Matches<'r, 't, D> {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<(usize, usize)> {
        if self.last_end > self.text.len() {
            return None;
        }
        let (s, e) = match self.re.find(&self.text[self.last_end..]) {
            None => return None,
            Some((s, e)) => (self.last_end + s, self.last_end + e),
        };
        if s == e {
            // This is an empty match. To ensure we make progress, start
            // the next search at the smallest possible starting position
            // of the next match following this one.
            self.last_end = e + 1;
            // Don't accept empty matches immediately following a match.
            // Just move on to the next match.
            if Some(e) == self.last_match {
                return self.next();
            }
        } else {
            self.last_end = e;
        }
        self.last_match = Some(e);
        Some((s, e))
    }
}
