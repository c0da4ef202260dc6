use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use std::mem::size_of;

use byteorder::{BigEndian, ByteOrder, LittleEndian, NativeEndian};

use crate::dense::{self, DenseDFA};
use crate::dfa::DFA;
use crate::error::{Error, Result};
use crate::state_id::{dead_id, usize_to_state_id, StateID};

/// The version of the sparse serialization format.
const FORMAT_VERSION: u32 = 1;

const TAG_LITTLE_ENDIAN: u8 = 1;
const TAG_BIG_ENDIAN: u8 = 2;

/// The serialized header of a sparse DFA:
///
/// ```text
/// [version: u32]                    offset 0
/// [endianness tag: u8]              offset 4
/// [state ID width: u8]              offset 5
/// [padding: u16]                    offset 6
/// [state count: u32]                offset 8
/// [transition table length: u32]    offset 12
/// ```
///
/// It is followed by the start state and maximum match state (one state ID
/// each) and the encoded transition table. Sparse state identifiers are read
/// bytewise, so the table needs no particular alignment.
const HEADER_LEN: usize = 16;

fn native_endian_tag() -> u8 {
    if cfg!(target_endian = "little") {
        TAG_LITTLE_ENDIAN
    } else {
        TAG_BIG_ENDIAN
    }
}

/// A sparse table-based deterministic finite automaton (DFA).
///
/// A sparse DFA makes the opposite trade off of a
/// [`DenseDFA`](struct.DenseDFA.html): it uses (often much) less space, but
/// searching executes a variable number of instructions per byte. Instead of
/// one row per state with one transition per alphabet letter, each state
/// stores an ordered list of inclusive byte ranges along with the state to
/// transition to for bytes in that range. The ranges of a state are
/// non-overlapping and cover all 256 byte values, so a lookup always
/// resolves; ranges whose target is the dead state are stored explicitly.
///
/// A sparse DFA is built by re-encoding a dense DFA via
/// [`DenseDFA::to_sparse_dfa`](struct.DenseDFA.html#method.to_sparse_dfa),
/// and is always equivalent to its source: for every state and every input
/// byte, both report the same transition, match and dead classifications.
///
/// Sparse state identifiers are byte offsets into the encoded transition
/// table. As with dense DFAs, the identifier representation `S` is chosen at
/// construction and conversion fails with an error---it never truncates---if
/// an offset cannot fit.
///
/// This type owns its transition table; [`SparseDFARef`](struct.SparseDFARef.html)
/// is the borrowed form produced by zero-copy deserialization. Both
/// implement the [`DFA`](trait.DFA.html) matching contract, so all searching
/// routines are available through that trait.
#[derive(Clone)]
pub struct SparseDFA<S = usize> {
    repr: Repr<Vec<u8>, S>,
}

impl<S: StateID> SparseDFA<S> {
    pub(crate) fn from_dense_sized<A: StateID>(
        dfa: &DenseDFA<A>,
    ) -> Result<SparseDFA<S>> {
        Repr::from_dense_sized(dfa).map(|repr| SparseDFA { repr })
    }

    /// Cheaply return a borrowed version of this sparse DFA.
    pub fn as_dfa_ref(&self) -> SparseDFARef<'_, S> {
        SparseDFARef { repr: self.repr.as_ref() }
    }

    /// Returns the memory usage, in bytes, of this DFA.
    ///
    /// The memory usage is computed based on the number of bytes used to
    /// represent this DFA's transition table. This corresponds to heap
    /// memory usage.
    pub fn memory_usage(&self) -> usize {
        self.repr.memory_usage()
    }

    /// Serialize this DFA to raw bytes in little endian format.
    pub fn to_bytes_little_endian(&self) -> Result<Vec<u8>> {
        self.repr.to_bytes::<LittleEndian>()
    }

    /// Serialize this DFA to raw bytes in big endian format.
    pub fn to_bytes_big_endian(&self) -> Result<Vec<u8>> {
        self.repr.to_bytes::<BigEndian>()
    }

    /// Serialize this DFA to raw bytes in native endian format.
    ///
    /// Generally, it is better to pick an explicit endianness using either
    /// `to_bytes_little_endian` or `to_bytes_big_endian`. This routine is
    /// useful in tests where the DFA is serialized and deserialized on the
    /// same platform.
    pub fn to_bytes_native_endian(&self) -> Result<Vec<u8>> {
        self.repr.to_bytes::<NativeEndian>()
    }

    /// Deserialize a sparse DFA, copying its transition table onto the heap.
    ///
    /// The buffer must have been produced by one of the `to_bytes` routines
    /// using this machine's endianness; decoding validates the buffer's tags
    /// and contents and fails closed on any mismatch.
    pub fn from_bytes(buf: &[u8]) -> Result<SparseDFA<S>> {
        SparseDFARef::from_bytes(buf).map(|dfa| dfa.to_owned())
    }
}

impl<S: StateID> DFA for SparseDFA<S> {
    type ID = S;

    fn start_state(&self) -> S {
        self.repr.start_state()
    }

    fn is_match_state(&self, id: S) -> bool {
        self.repr.is_match_state(id)
    }

    fn is_possible_match_state(&self, id: S) -> bool {
        self.repr.is_possible_match_state(id)
    }

    fn is_dead_state(&self, id: S) -> bool {
        self.repr.is_dead_state(id)
    }

    fn next_state(&self, current: S, input: u8) -> S {
        self.repr.state(current).next(input)
    }

    unsafe fn next_state_unchecked(&self, current: S, input: u8) -> S {
        self.next_state(current, input)
    }
}

impl<S: StateID> fmt::Debug for SparseDFA<S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.repr.fmt(f)
    }
}

/// A borrowed sparse DFA, with its transition table in caller-managed
/// memory.
///
/// This is the sparse counterpart of
/// [`DenseDFARef`](struct.DenseDFARef.html): it implements the same matching
/// contract as [`SparseDFA`](struct.SparseDFA.html) with identical behavior,
/// and is the type produced by zero-copy deserialization. The borrowed
/// region is treated as read-only for the automaton's entire lifetime.
#[derive(Clone, Copy)]
pub struct SparseDFARef<'a, S = usize> {
    repr: Repr<&'a [u8], S>,
}

impl<'a, S: StateID> SparseDFARef<'a, S> {
    /// Return an owned version of this sparse DFA, copying its transition
    /// table onto the heap.
    pub fn to_owned(&self) -> SparseDFA<S> {
        SparseDFA { repr: self.repr.to_owned() }
    }

    /// Returns the memory usage, in bytes, of this DFA's transition table.
    pub fn memory_usage(&self) -> usize {
        self.repr.memory_usage()
    }

    /// Deserialize a sparse DFA, borrowing its transition table directly
    /// from the given buffer.
    ///
    /// The buffer must have been produced by one of the `to_bytes` routines
    /// using this machine's endianness. Decoding fails closed: foreign
    /// endianness, an unsupported version, a state identifier width other
    /// than `S`, truncated contents, malformed range lists and transition
    /// targets that do not point at a state are all rejected with an error.
    /// Unlike dense deserialization, no particular buffer alignment is
    /// required, since sparse state identifiers are read bytewise.
    pub fn from_bytes(buf: &'a [u8]) -> Result<SparseDFARef<'a, S>> {
        Repr::from_bytes(buf).map(|repr| SparseDFARef { repr })
    }
}

impl<'a, S: StateID> DFA for SparseDFARef<'a, S> {
    type ID = S;

    fn start_state(&self) -> S {
        self.repr.start_state()
    }

    fn is_match_state(&self, id: S) -> bool {
        self.repr.is_match_state(id)
    }

    fn is_possible_match_state(&self, id: S) -> bool {
        self.repr.is_possible_match_state(id)
    }

    fn is_dead_state(&self, id: S) -> bool {
        self.repr.is_dead_state(id)
    }

    fn next_state(&self, current: S, input: u8) -> S {
        self.repr.state(current).next(input)
    }

    unsafe fn next_state_unchecked(&self, current: S, input: u8) -> S {
        self.next_state(current, input)
    }
}

impl<'a, S: StateID> fmt::Debug for SparseDFARef<'a, S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.repr.fmt(f)
    }
}

/// The underlying representation of a sparse DFA, shared by the owned and
/// borrowed forms.
///
/// Each state is encoded as:
///
/// ```text
/// [range count: u16][range starts/ends: count * 2 u8][targets: count * S]
/// ```
///
/// with the ranges in ascending order, non-overlapping and together covering
/// every byte value. State identifiers are the byte offsets at which a
/// state's encoding begins.
#[derive(Clone, Copy)]
struct Repr<T: AsRef<[u8]>, S: StateID = usize> {
    start: S,
    state_count: usize,
    max_match: S,
    trans: T,
}

impl<T: AsRef<[u8]>, S: StateID> Repr<T, S> {
    fn as_ref(&self) -> Repr<&'_ [u8], S> {
        Repr {
            start: self.start,
            state_count: self.state_count,
            max_match: self.max_match,
            trans: self.trans(),
        }
    }

    fn to_owned(&self) -> Repr<Vec<u8>, S> {
        Repr {
            start: self.start,
            state_count: self.state_count,
            max_match: self.max_match,
            trans: self.trans().to_vec(),
        }
    }

    fn memory_usage(&self) -> usize {
        self.trans().len()
    }

    fn start_state(&self) -> S {
        self.start
    }

    fn is_match_state(&self, id: S) -> bool {
        self.is_possible_match_state(id) && !self.is_dead_state(id)
    }

    fn is_possible_match_state(&self, id: S) -> bool {
        id <= self.max_match
    }

    fn is_dead_state(&self, id: S) -> bool {
        id == dead_id()
    }

    fn trans(&self) -> &[u8] {
        self.trans.as_ref()
    }

    /// Return a convenient representation of the state at the given
    /// identifier (byte offset).
    ///
    /// This is marked as inline because it doesn't seem to get inlined
    /// otherwise, which leads to a fairly significant performance loss.
    #[inline]
    fn state(&self, id: S) -> State<'_, S> {
        let mut pos = id.to_usize();
        let ntrans = NativeEndian::read_u16(&self.trans()[pos..]) as usize;
        pos += 2;
        let input_ranges = &self.trans()[pos..pos + (ntrans * 2)];
        pos += 2 * ntrans;
        let next = &self.trans()[pos..pos + (ntrans * size_of::<S>())];
        State { _state_id_repr: PhantomData, ntrans, input_ranges, next }
    }

    /// Return an iterator over all of the states in this DFA, in the order
    /// in which they are encoded.
    fn states(&self) -> StateIter<'_, T, S> {
        StateIter { dfa: self, id: dead_id() }
    }

    fn to_bytes<B: ByteOrder>(&self) -> Result<Vec<u8>> {
        let state_size = size_of::<S>();
        if ![1, 2, 4, 8].contains(&state_size) {
            return Err(Error::format_mismatch(format!(
                "cannot serialize state identifiers of {} bytes; must \
                 be 1, 2, 4 or 8",
                state_size,
            )));
        }
        if self.state_count > u32::MAX as usize
            || self.trans().len() > u32::MAX as usize
        {
            return Err(Error::format_mismatch(
                "sparse DFA is too big to serialize",
            ));
        }

        let mut probe = [0u8; 2];
        B::write_u16(&mut probe, 1);
        let endian_tag =
            if probe[0] == 1 { TAG_LITTLE_ENDIAN } else { TAG_BIG_ENDIAN };

        let size = HEADER_LEN + 2 * state_size + self.trans().len();
        let mut buf = vec![0; size];
        B::write_u32(&mut buf[0..], FORMAT_VERSION);
        buf[4] = endian_tag;
        buf[5] = state_size as u8;
        B::write_u32(&mut buf[8..], self.state_count as u32);
        B::write_u32(&mut buf[12..], self.trans().len() as u32);

        let mut i = HEADER_LEN;
        write_state_id::<B, S>(&mut buf[i..], self.start);
        i += state_size;
        write_state_id::<B, S>(&mut buf[i..], self.max_match);
        i += state_size;

        // The in-memory transition table stores its range counts and state
        // identifiers in native byte order, so each state is re-encoded
        // rather than copied wholesale.
        for (_, state) in self.states() {
            B::write_u16(&mut buf[i..], state.ntrans as u16);
            i += 2;
            buf[i..i + 2 * state.ntrans]
                .copy_from_slice(state.input_ranges);
            i += 2 * state.ntrans;
            for j in 0..state.ntrans {
                write_state_id::<B, S>(&mut buf[i..], state.next_at(j));
                i += state_size;
            }
        }
        assert_eq!(size, i, "expected to consume entire buffer");
        Ok(buf)
    }
}

impl<'a, S: StateID> Repr<&'a [u8], S> {
    fn from_bytes(buf: &'a [u8]) -> Result<Repr<&'a [u8], S>> {
        if buf.len() < HEADER_LEN {
            return Err(Error::format_mismatch(format!(
                "buffer of {} bytes is too small to contain a sparse \
                 DFA header of {} bytes",
                buf.len(),
                HEADER_LEN,
            )));
        }
        let endian = buf[4];
        if endian != TAG_LITTLE_ENDIAN && endian != TAG_BIG_ENDIAN {
            return Err(Error::format_mismatch(format!(
                "unrecognized endianness tag: 0x{:02X}",
                endian,
            )));
        }
        if endian != native_endian_tag() {
            return Err(Error::format_mismatch(
                "buffer was serialized with a different endianness than \
                 this machine's",
            ));
        }
        let version = NativeEndian::read_u32(&buf[0..4]);
        if version != FORMAT_VERSION {
            return Err(Error::format_mismatch(format!(
                "expected format version {}, but found version {}",
                FORMAT_VERSION, version,
            )));
        }
        let width = buf[5] as usize;
        if width != size_of::<S>() {
            return Err(Error::format_mismatch(format!(
                "state ID width of buffer ({}) does not match requested \
                 state ID width ({})",
                width,
                size_of::<S>(),
            )));
        }
        let state_count = NativeEndian::read_u32(&buf[8..12]) as usize;
        let trans_len = NativeEndian::read_u32(&buf[12..16]) as usize;
        let total = HEADER_LEN + 2 * width + trans_len;
        if buf.len() < total {
            return Err(Error::format_mismatch(format!(
                "buffer of {} bytes is too small for the declared \
                 transition table ({} bytes required)",
                buf.len(),
                total,
            )));
        }
        let start = S::read_bytes(&buf[HEADER_LEN..]);
        let max_match = S::read_bytes(&buf[HEADER_LEN + width..]);
        let trans = &buf[HEADER_LEN + 2 * width..total];

        // Walk the encoded states once to find where each begins, checking
        // that every range list is well formed along the way.
        let mut offsets = HashSet::new();
        let mut count = 0;
        let mut pos = 0;
        while pos < trans.len() {
            offsets.insert(pos);
            pos = validate_state::<S>(trans, pos)?;
            count += 1;
        }
        if count != state_count {
            return Err(Error::format_mismatch(format!(
                "buffer declares {} states, but its transition table \
                 contains {}",
                state_count, count,
            )));
        }
        if count == 0 {
            return Err(Error::format_mismatch(
                "a DFA must contain at least its dead state",
            ));
        }
        // Now that the state boundaries are known, check that the start
        // state and every transition target point at one of them.
        if !offsets.contains(&start.to_usize()) {
            return Err(Error::format_mismatch(format!(
                "start state {} is not a valid state identifier",
                start.to_usize(),
            )));
        }
        if !offsets.contains(&max_match.to_usize()) {
            return Err(Error::format_mismatch(format!(
                "max match state {} is not a valid state identifier",
                max_match.to_usize(),
            )));
        }
        let repr = Repr { start, state_count, max_match, trans };
        for (_, state) in repr.states() {
            for i in 0..state.ntrans {
                let next = state.next_at(i).to_usize();
                if !offsets.contains(&next) {
                    return Err(Error::format_mismatch(format!(
                        "transition targets {}, which is not a valid \
                         state identifier",
                        next,
                    )));
                }
            }
        }
        Ok(repr)
    }
}

/// Check that the state encoded at `pos` is well formed: its range count and
/// targets fit in the buffer, and its ranges are ascending, non-overlapping
/// and cover every byte value. Returns the position one past the end of the
/// state's encoding.
fn validate_state<S: StateID>(trans: &[u8], mut pos: usize) -> Result<usize> {
    let malformed = |what: String| Error::format_mismatch(what);

    if pos + 2 > trans.len() {
        return Err(malformed(format!(
            "state at offset {} is truncated",
            pos,
        )));
    }
    let ntrans = NativeEndian::read_u16(&trans[pos..]) as usize;
    let end = pos + 2 + ntrans * (2 + size_of::<S>());
    if ntrans == 0 || ntrans > 256 || end > trans.len() {
        return Err(malformed(format!(
            "state at offset {} declares {} ranges, which does not fit \
             its buffer",
            pos, ntrans,
        )));
    }
    pos += 2;
    let mut expected_start = 0usize;
    for i in 0..ntrans {
        let (lo, hi) = (trans[pos + i * 2], trans[pos + i * 2 + 1]);
        if lo as usize != expected_start || hi < lo {
            return Err(malformed(format!(
                "state range {}-{} is out of order or leaves a gap",
                lo, hi,
            )));
        }
        expected_start = hi as usize + 1;
    }
    if expected_start != 256 {
        return Err(malformed(
            "state ranges do not cover all byte values".to_string(),
        ));
    }
    Ok(end)
}

impl<S: StateID> Repr<Vec<u8>, S> {
    /// Re-encode the given dense DFA in sparse form.
    ///
    /// In order to build the transition table, we need to be able to write
    /// state identifiers for each of the "next" transitions in each state.
    /// Our state identifiers correspond to the byte offset in the transition
    /// table at which the state is encoded. Therefore, we do not actually
    /// know what the state identifiers are until we've allocated exactly as
    /// much space as we need for each state. Thus, construction of the
    /// transition table happens in two passes.
    ///
    /// In the first pass, we fill out the shell of each state, which
    /// includes the transition count, the input byte ranges and zero-filled
    /// space for the transitions. In this first pass, we also build up a map
    /// from the state identifier index of the dense DFA to the state
    /// identifier in this sparse DFA.
    ///
    /// In the second pass, we fill in the transitions based on the map built
    /// in the first pass.
    fn from_dense_sized<A: StateID>(
        dfa: &DenseDFA<A>,
    ) -> Result<Repr<Vec<u8>, S>> {
        let state_count = dfa.len();

        let mut trans = vec![];
        let mut remap: Vec<S> = vec![dead_id(); state_count];
        for (old_id, state) in dfa.iter() {
            let pos = trans.len();
            remap[dfa.state_id_to_index(old_id)] = usize_to_state_id(pos)?;

            let ranges = state.sparse_transitions();
            let ntrans = ranges.len();
            trans.push(0);
            trans.push(0);
            NativeEndian::write_u16(&mut trans[pos..], ntrans as u16);
            for &(start, end, _) in &ranges {
                trans.push(start);
                trans.push(end);
            }
            // Zero-filled space for the transitions themselves.
            trans.resize(trans.len() + ntrans * size_of::<S>(), 0);
        }

        let mut pos = 0;
        for (_, state) in dfa.iter() {
            let ranges = state.sparse_transitions();
            pos += 2 + 2 * ranges.len();
            for &(_, _, next) in &ranges {
                let next = remap[dfa.state_id_to_index(next)];
                next.write_bytes(&mut trans[pos..]);
                pos += size_of::<S>();
            }
        }

        let start = remap[dfa.state_id_to_index(dfa.start())];
        let max_match = remap[dfa.state_id_to_index(dfa.max_match_state())];
        Ok(Repr { start, state_count, max_match, trans })
    }
}

impl<T: AsRef<[u8]>, S: StateID> fmt::Debug for Repr<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f)?;
        for (id, state) in self.states() {
            let mut status = [b' ', b' '];
            if self.is_dead_state(id) {
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

/// An iterator over all states in a sparse DFA.
///
/// This iterator yields tuples, where the first element is the state ID and
/// the second element is the state itself.
struct StateIter<'a, T: AsRef<[u8]>, S: StateID> {
    dfa: &'a Repr<T, S>,
    id: S,
}

impl<'a, T: AsRef<[u8]>, S: StateID> Iterator for StateIter<'a, T, S> {
    type Item = (S, State<'a, S>);

    fn next(&mut self) -> Option<(S, State<'a, S>)> {
        if self.id.to_usize() >= self.dfa.trans().len() {
            return None;
        }
        let id = self.id;
        let state = self.dfa.state(id);
        self.id = S::from_usize(self.id.to_usize() + state.bytes());
        Some((id, state))
    }
}

/// A representation of a sparse DFA state that can be cheaply materialized
/// from a state identifier.
#[derive(Clone)]
struct State<'a, S: StateID> {
    /// The state identifier representation used by the DFA from which this
    /// state was extracted. Since the transition table is compacted into a
    /// `&[u8]`, the identifier type does not appear in the field types; this
    /// prevents reading a state with the wrong representation.
    _state_id_repr: PhantomData<S>,
    /// The number of transitions in this state.
    ntrans: usize,
    /// Pairs of input ranges, where there is one pair for each transition.
    /// Each pair specifies an inclusive start and end byte range for the
    /// corresponding transition.
    input_ranges: &'a [u8],
    /// Transitions to the next state. This slice contains native endian
    /// encoded state identifiers, with `S` as the representation. Thus,
    /// there are `ntrans * size_of::<S>()` bytes in this slice.
    next: &'a [u8],
}

impl<'a, S: StateID> State<'a, S> {
    /// Searches for the next transition given an input byte.
    ///
    /// A state's ranges cover every byte value, so the search always finds
    /// one. This straight linear search was observed to be much better than
    /// binary search on ASCII haystacks, likely because a binary search
    /// visits the ASCII case last but a linear search sees it first.
    fn next(&self, input: u8) -> S {
        for i in 0..self.ntrans {
            let (start, end) = self.range(i);
            if start <= input && input <= end {
                return self.next_at(i);
            }
        }
        dead_id()
    }

    /// Returns the inclusive input byte range for the ith transition in this
    /// state.
    fn range(&self, i: usize) -> (u8, u8) {
        (self.input_ranges[i * 2], self.input_ranges[i * 2 + 1])
    }

    /// Returns the next state for the ith transition in this state.
    fn next_at(&self, i: usize) -> S {
        S::read_bytes(&self.next[i * size_of::<S>()..])
    }

    /// Return the total number of bytes that this state consumes in its
    /// encoded form.
    fn bytes(&self) -> usize {
        2 + (self.ntrans * 2) + (self.ntrans * size_of::<S>())
    }
}

impl<'a, S: StateID> fmt::Debug for State<'a, S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut transitions = vec![];
        for i in 0..self.ntrans {
            let next = self.next_at(i);
            if next == dead_id() {
                continue;
            }
            let (start, end) = self.range(i);
            if start == end {
                transitions.push(format!(
                    "{} => {}",
                    dense::escape(start),
                    next.to_usize(),
                ));
            } else {
                transitions.push(format!(
                    "{}-{} => {}",
                    dense::escape(start),
                    dense::escape(end),
                    next.to_usize(),
                ));
            }
        }
        write!(f, "{}", transitions.join(", "))
    }
}

fn write_state_id<B: ByteOrder, S: StateID>(buf: &mut [u8], id: S) {
    match size_of::<S>() {
        1 => buf[0] = id.to_usize() as u8,
        2 => B::write_u16(buf, id.to_usize() as u16),
        4 => B::write_u32(buf, id.to_usize() as u32),
        8 => B::write_u64(buf, id.to_usize() as u64),
        size => unreachable!("unsupported state ID size: {}", size),
    }
}
