/*!
A low level regular expression matching engine based on deterministic finite
automata (DFAs).

This crate does not parse patterns. Its input is an already determinized
transition layout---typically produced by a separate compiler that parses a
pattern, builds an NFA and determinizes it---described with a
[`TransitionTable`](struct.TransitionTable.html). From that layout it builds
automata that answer, for a sequence of bytes: is there a match, where does
the match end, and (by pairing a forward automaton with a reverse one in a
[`Regex`](struct.Regex.html)) where does the match start.

Two automaton representations are provided, both implementing the
[`DFA`](trait.DFA.html) matching contract:

* [`DenseDFA`](struct.DenseDFA.html) stores a full transition table and
  answers every transition with a constant number of operations, independent
  of the pattern. This is the fast representation. Its table can be encoded
  with byte equivalence classes and premultiplied state identifiers to shrink
  it and speed it up further.
* [`SparseDFA`](struct.SparseDFA.html) stores per-state byte ranges instead
  of full rows, typically shrinking the automaton considerably at the cost
  of a scan per transition.

Automata can be serialized to raw bytes with an explicit endianness and
rebuilt later---either by copying the table to the heap, or as a zero-copy
[`DenseDFARef`](struct.DenseDFARef.html)/[`SparseDFARef`](struct.SparseDFARef.html)
view over caller-owned memory such as a memory map. Deserialization validates
the buffer and fails closed; reconstructed automata match bit-for-bit like
their originals.

# Example: full match spans

This builds forward and reverse automata for the pattern `a+` (unanchored on
the left, so the forward automaton scans for the earliest start) and then
recovers full match spans:

```
use regex_dfa::{DenseDFABuilder, Regex, TransitionTable};

# fn example() -> Result<(), regex_dfa::Error> {
// Forward: scan for 'a', then consume as many as possible.
let mut fwd = TransitionTable::new();
let scan = fwd.add_state(false);
let run = fwd.add_state(true);
fwd.set_start(scan);
fwd.set_transition_range(scan, 0, 255, scan);
fwd.set_transition(scan, b'a', run);
fwd.set_transition(run, b'a', run);

// Reverse: from the end of a match, consume 'a's backward.
let mut rev = TransitionTable::new();
let start = rev.add_state(false);
let run = rev.add_state(true);
rev.set_start(start);
rev.set_transition(start, b'a', run);
rev.set_transition(run, b'a', run);

let builder = DenseDFABuilder::new();
let re = Regex::from_dfas(builder.build(&fwd)?, builder.build(&rev)?);
assert_eq!(Some((4, 7)), re.find(b"xyz aaa bc"));
# Ok(()) }; example().unwrap()
```

# Example: trading speed for space

An automaton is built dense and can then be re-encoded sparse:

```
use regex_dfa::{DenseDFABuilder, DFA, TransitionTable};

# fn example() -> Result<(), regex_dfa::Error> {
let mut table = TransitionTable::new();
let s1 = table.add_state(false);
let s2 = table.add_state(true);
table.set_start(s1);
table.set_transition_range(s1, b'0', b'9', s2);
table.set_transition_range(s2, b'0', b'9', s2);

let dense = DenseDFABuilder::new().byte_classes(false).build(&table)?;
let sparse = dense.to_sparse_dfa()?;
assert_eq!(dense.find(b"1234x"), sparse.find(b"1234x"));
assert!(sparse.memory_usage() < dense.memory_usage());
# Ok(()) }; example().unwrap()
```

# Example: serialization

Automata can be serialized with a fixed endianness and state identifier
width, and deserialized on a machine of matching endianness---on the wrong
machine, deserialization fails with an error instead of misbehaving:

```
use regex_dfa::{DenseDFA, DenseDFABuilder, TransitionTable};

# fn example() -> Result<(), regex_dfa::Error> {
let mut table = TransitionTable::new();
let s1 = table.add_state(false);
let s2 = table.add_state(true);
table.set_start(s1);
table.set_transition(s1, b'z', s2);

let dfa = DenseDFABuilder::new().build_with_size::<u16>(&table)?;
let bytes = dfa.to_bytes_native_endian()?;
let back: DenseDFA<u16> = DenseDFA::from_bytes(&bytes)?;
assert_eq!(Some(1), back.find(b"z"));
# Ok(()) }; example().unwrap()
```

# Cheap deserialization

The `from_bytes` routines on [`DenseDFARef`](struct.DenseDFARef.html) and
[`SparseDFARef`](struct.SparseDFARef.html) borrow the transition table
straight out of the given buffer instead of copying it, which makes them
usable with automata compiled into static data or loaded from file-backed
memory maps. The buffer is validated up front and treated as read-only for
the automaton's entire lifetime.

# Crate features

* `logging` - Emits build-time diagnostics through the
  [`log`](https://docs.rs/log) crate's macros. Searches never log.
*/

#![deny(missing_docs)]

#[macro_use]
mod macros;

mod builder;
mod classes;
mod dense;
mod dense_ref;
mod dfa;
mod error;
mod minimize;
mod regex;
mod sparse;
mod state_id;

pub use crate::builder::{DenseDFABuilder, TransitionTable};
pub use crate::classes::ByteClasses;
pub use crate::dense::{DenseDFA, DenseDFAKind, ALPHABET_LEN};
pub use crate::dense_ref::DenseDFARef;
pub use crate::dfa::DFA;
pub use crate::error::{Error, ErrorKind};
pub use crate::regex::{Matches, Regex};
pub use crate::sparse::{SparseDFA, SparseDFARef};
pub use crate::state_id::{dead_id, StateID};
