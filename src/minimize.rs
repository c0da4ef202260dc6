use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::dense::DenseDFA;
use crate::state_id::{dead_id, StateID};

/// A partition refinement minimizer for dense DFAs.
///
/// This merges every pair of behaviorally equivalent states, including
/// states that are equivalent to the dead state, producing the unique
/// minimal DFA for the same language. It runs on an automaton whose match
/// states have already been shuffled into the low identifier range and
/// before premultiplication, and it maintains both properties: the dead
/// state keeps identifier 0, match states stay in front of non-match states
/// and the maximum match state is recomputed.
pub(crate) struct Minimizer<'a, S: StateID> {
    dfa: &'a mut DenseDFA<S>,
    /// For each state index and each equivalence class, the indexes of every
    /// state with a transition on that class into the state.
    in_transitions: Vec<Vec<Vec<usize>>>,
    partitions: Vec<StateSet>,
    waiting: Vec<StateSet>,
}

/// A set of state indexes, maintained in sorted order. Sets are shared
/// between the partition list and the waiting list, so they are reference
/// counted.
#[derive(Clone, Debug, Eq, PartialEq)]
struct StateSet(Rc<RefCell<Vec<usize>>>);

impl<'a, S: StateID> Minimizer<'a, S> {
    pub(crate) fn new(dfa: &'a mut DenseDFA<S>) -> Minimizer<'a, S> {
        let in_transitions = Minimizer::incoming_transitions(dfa);
        let partitions = Minimizer::initial_partitions(dfa);
        let waiting = vec![partitions[0].clone()];
        Minimizer { dfa, in_transitions, partitions, waiting }
    }

    pub(crate) fn run(mut self) {
        if self.dfa.max_match_state() == dead_id() {
            // Without any match states, every state is equivalent to the
            // dead state, and the minimal automaton is the dead state alone.
            self.dfa.set_start_state(dead_id());
            self.dfa.set_max_match_state(dead_id());
            self.dfa.truncate_states(1);
            return;
        }

        let alphabet_len = self.dfa.alphabet_len();
        let mut incoming = StateSet::empty();
        while let Some(set) = self.waiting.pop() {
            for class in 0..alphabet_len {
                self.find_incoming_to(class, &set, &mut incoming);
                if incoming.is_empty() {
                    continue;
                }

                let mut newparts = vec![];
                for p in 0..self.partitions.len() {
                    let x = self.partitions[p].intersection(&incoming);
                    if x.is_empty() {
                        newparts.push(self.partitions[p].clone());
                        continue;
                    }

                    let y = self.partitions[p].subtract(&incoming);
                    if y.is_empty() {
                        newparts.push(self.partitions[p].clone());
                        continue;
                    }

                    newparts.push(x.clone());
                    newparts.push(y.clone());
                    let pos = self
                        .waiting
                        .iter()
                        .position(|s| s == &self.partitions[p]);
                    match pos {
                        Some(i) => {
                            self.waiting[i] = x;
                            self.waiting.push(y);
                        }
                        None => {
                            if x.len() <= y.len() {
                                self.waiting.push(x);
                            } else {
                                self.waiting.push(y);
                            }
                        }
                    }
                }
                self.partitions = newparts;
            }
        }

        // Every partition is collapsed down to a single state: its smallest
        // member, which serves as the representative.
        let state_count = self.dfa.len();
        let mut state_to_rep = vec![0usize; state_count];
        for p in &self.partitions {
            let rep = p.first();
            p.iter(|id| state_to_rep[id] = rep);
        }

        // Representatives keep their relative order, which preserves the
        // match-states-first arrangement (and keeps the dead state at 0).
        let mut new_ids = vec![0usize; state_count];
        let mut minimal_count = 0;
        for id in 0..state_count {
            if state_to_rep[id] == id {
                new_ids[id] = minimal_count;
                minimal_count += 1;
            }
        }

        // Rewrite each representative's transitions in terms of the new
        // identifiers and move its row into its new slot. Representatives
        // are visited in increasing order and only ever move down, so a
        // representative's row is never clobbered before it is processed.
        for id in 0..state_count {
            if state_to_rep[id] != id {
                continue;
            }
            let mut state = self.dfa.get_state_mut(S::from_usize(id));
            for (_, next) in state.iter_mut() {
                let next_rep = state_to_rep[next.to_usize()];
                *next = S::from_usize(new_ids[next_rep]);
            }
            self.dfa
                .swap_states(S::from_usize(id), S::from_usize(new_ids[id]));
        }

        let old_start = self.dfa.start().to_usize();
        let old_max = self.dfa.max_match_state().to_usize();
        self.dfa
            .set_start_state(S::from_usize(new_ids[state_to_rep[old_start]]));
        let mut new_max = 0;
        for id in 1..state_count {
            if state_to_rep[id] == id && id <= old_max {
                new_max = new_ids[id];
            }
        }
        self.dfa.set_max_match_state(S::from_usize(new_max));
        self.dfa.truncate_states(minimal_count);
    }

    fn find_incoming_to(
        &self,
        class: usize,
        set: &StateSet,
        incoming: &mut StateSet,
    ) {
        incoming.clear();
        set.iter(|id| {
            for &inid in &self.in_transitions[id][class] {
                incoming.add(inid);
            }
        });
        incoming.canonicalize();
    }

    fn initial_partitions(dfa: &DenseDFA<S>) -> Vec<StateSet> {
        let mut is_match = StateSet::empty();
        let mut no_match = StateSet::empty();
        for id in 0..dfa.len() {
            if dfa.is_match_state(S::from_usize(id)) {
                is_match.add(id);
            } else {
                no_match.add(id);
            }
        }

        let mut sets = vec![];
        if !is_match.is_empty() {
            sets.push(is_match);
        }
        if !no_match.is_empty() {
            sets.push(no_match);
        }
        sets.sort_by_key(|s| s.len());
        sets
    }

    fn incoming_transitions(dfa: &DenseDFA<S>) -> Vec<Vec<Vec<usize>>> {
        let alphabet_len = dfa.alphabet_len();
        let mut incoming = vec![vec![vec![]; alphabet_len]; dfa.len()];
        let trans = dfa.trans();
        for id in 0..dfa.len() {
            for class in 0..alphabet_len {
                let next = trans[id * alphabet_len + class].to_usize();
                incoming[next][class].push(id);
            }
        }
        incoming
    }
}

impl<'a, S: StateID> fmt::Debug for Minimizer<'a, S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Minimizer")
            .field("partitions", &self.partitions)
            .field("waiting", &self.waiting)
            .finish()
    }
}

impl StateSet {
    fn empty() -> StateSet {
        StateSet(Rc::new(RefCell::new(vec![])))
    }

    fn add(&mut self, id: usize) {
        self.0.borrow_mut().push(id);
    }

    fn first(&self) -> usize {
        self.0.borrow()[0]
    }

    fn canonicalize(&mut self) {
        self.0.borrow_mut().sort();
        self.0.borrow_mut().dedup();
    }

    fn clear(&mut self) {
        self.0.borrow_mut().clear();
    }

    fn len(&self) -> usize {
        self.0.borrow().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn deep_clone(&self) -> StateSet {
        let ids = self.0.borrow().iter().cloned().collect();
        StateSet(Rc::new(RefCell::new(ids)))
    }

    fn iter(&self, mut f: impl FnMut(usize)) {
        for &id in self.0.borrow().iter() {
            f(id);
        }
    }

    /// Return the intersection of two sorted sets.
    fn intersection(&self, other: &StateSet) -> StateSet {
        if self.is_empty() || other.is_empty() {
            return StateSet::empty();
        }

        let mut result = StateSet::empty();
        let (seta, setb) = (self.0.borrow(), other.0.borrow());
        let (mut ita, mut itb) = (seta.iter().cloned(), setb.iter().cloned());
        let (mut a, mut b) = (ita.next().unwrap(), itb.next().unwrap());
        loop {
            if a == b {
                result.add(a);
                a = match ita.next() {
                    None => break,
                    Some(a) => a,
                };
                b = match itb.next() {
                    None => break,
                    Some(b) => b,
                };
            } else if a < b {
                a = match ita.next() {
                    None => break,
                    Some(a) => a,
                };
            } else {
                b = match itb.next() {
                    None => break,
                    Some(b) => b,
                };
            }
        }
        result
    }

    /// Return the elements of this sorted set that are not in the other.
    fn subtract(&self, other: &StateSet) -> StateSet {
        if self.is_empty() || other.is_empty() {
            return self.deep_clone();
        }

        let mut result = StateSet::empty();
        let (seta, setb) = (self.0.borrow(), other.0.borrow());
        let (mut ita, mut itb) = (seta.iter().cloned(), setb.iter().cloned());
        let (mut a, mut b) = (ita.next().unwrap(), itb.next().unwrap());
        loop {
            if a == b {
                a = match ita.next() {
                    None => break,
                    Some(a) => a,
                };
                b = match itb.next() {
                    None => {
                        result.add(a);
                        break;
                    }
                    Some(b) => b,
                };
            } else if a < b {
                result.add(a);
                a = match ita.next() {
                    None => break,
                    Some(a) => a,
                };
            } else {
                b = match itb.next() {
                    None => {
                        result.add(a);
                        break;
                    }
                    Some(b) => b,
                };
            }
        }
        for a in ita {
            result.add(a);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::{DenseDFABuilder, TransitionTable};
    use crate::dfa::DFA;

    // Two redundant copies of the same 'ab' suffix should collapse.
    fn redundant_ab() -> TransitionTable {
        let mut table = TransitionTable::new();
        let s1 = table.add_state(false);
        let a1 = table.add_state(false);
        let a2 = table.add_state(false);
        let b1 = table.add_state(true);
        let b2 = table.add_state(true);
        table.set_start(s1);
        table.set_transition(s1, b'x', a1);
        table.set_transition(s1, b'y', a2);
        table.set_transition(a1, b'b', b1);
        table.set_transition(a2, b'b', b2);
        table
    }

    #[test]
    fn merges_equivalent_states() {
        let table = redundant_ab();
        let unmin = DenseDFABuilder::new()
            .premultiply(false)
            .build(&table)
            .unwrap();
        let min = DenseDFABuilder::new()
            .premultiply(false)
            .minimize(true)
            .build(&table)
            .unwrap();
        // dead, start, one 'seen x or y' state, one match state.
        assert_eq!(6, unmin.len());
        assert_eq!(4, min.len());
        for haystack in
            &[&b"xb"[..], b"yb", b"x", b"y", b"b", b"", b"xyb", b"xbb"]
        {
            assert_eq!(unmin.find(haystack), min.find(haystack));
        }
    }

    #[test]
    fn collapses_states_that_cannot_match() {
        // A state that loops forever without reaching a match is equivalent
        // to the dead state.
        let mut table = TransitionTable::new();
        let s1 = table.add_state(false);
        let s2 = table.add_state(true);
        let pit = table.add_state(false);
        table.set_start(s1);
        table.set_transition(s1, b'a', s2);
        table.set_transition(s1, b'z', pit);
        table.set_transition_range(pit, 0, 255, pit);
        let min = DenseDFABuilder::new()
            .premultiply(false)
            .minimize(true)
            .build(&table)
            .unwrap();
        assert_eq!(3, min.len());
        assert!(min.is_match(b"a"));
        assert!(!min.is_match(b"z"));
    }

    #[test]
    fn no_match_states_collapse_to_dead() {
        let mut table = TransitionTable::new();
        let s1 = table.add_state(false);
        let s2 = table.add_state(false);
        table.set_start(s1);
        table.set_transition(s1, b'a', s2);
        table.set_transition(s2, b'a', s1);
        let min = DenseDFABuilder::new()
            .premultiply(false)
            .minimize(true)
            .build(&table)
            .unwrap();
        assert_eq!(1, min.len());
        assert!(!min.is_match(b""));
        assert!(!min.is_match(b"aaaa"));
    }
}
