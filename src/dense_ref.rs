use std::fmt;
use std::mem::{align_of, size_of};
use std::slice;

use byteorder::{BigEndian, ByteOrder, LittleEndian, NativeEndian};

use crate::classes::ByteClasses;
use crate::dense::{DenseDFA, DenseDFAKind, ALPHABET_LEN};
use crate::dfa::DFA;
use crate::error::{Error, Result};
use crate::state_id::{dead_id, StateID};

/// The version of the serialization format. Bump this whenever the layout
/// written by `to_bytes` changes in any way.
const FORMAT_VERSION: u32 = 1;

/// Endianness tags. The tag is a single byte so that it can be read before
/// the buffer's byte order is known.
const TAG_LITTLE_ENDIAN: u8 = 1;
const TAG_BIG_ENDIAN: u8 = 2;

/// The serialized header occupies a fixed prefix of the buffer:
///
/// ```text
/// [version: u32]            offset 0
/// [endianness tag: u8]      offset 4
/// [state ID width: u8]      offset 5
/// [kind tag: u8]            offset 6
/// [padding: u8]             offset 7
/// [alphabet length: u32]    offset 8
/// [byte class map: 256 u8]  offset 12
/// [state count: u32]        offset 268
/// ```
///
/// It is followed by the start state and the maximum match state (one state
/// ID each) and then the transition table itself. The header length is a
/// multiple of 8, so for every supported state ID width the transition table
/// begins at an offset aligned for that width.
const HEADER_LEN: usize = 272;

fn native_endian_tag() -> u8 {
    if cfg!(target_endian = "little") {
        TAG_LITTLE_ENDIAN
    } else {
        TAG_BIG_ENDIAN
    }
}

/// A borrowed table-based deterministic finite automaton (DFA).
///
/// A `DenseDFARef` is the borrowed counterpart of
/// [`DenseDFA`](struct.DenseDFA.html); the documentation for `DenseDFA`
/// applies equally well to this type. Both implement the
/// [`DFA`](trait.DFA.html) matching contract with identical behavior, and
/// differ only in who owns the transition table.
///
/// The transition table of a `DenseDFARef` can be any region in memory,
/// including, but not limited to, heap memory, stack memory, read-only
/// memory or a file-backed memory map. The region is treated as read-only
/// for the lifetime of the automaton. This type is principally useful as a
/// way of deserializing a DFA from raw bytes without copying the transition
/// table to the heap; see
/// [`from_bytes`](struct.DenseDFARef.html#method.from_bytes).
#[derive(Clone, Copy)]
pub struct DenseDFARef<'a, S = usize> {
    kind: DenseDFAKind,
    start: S,
    state_count: usize,
    max_match: S,
    alphabet_len: usize,
    /// The class of each of the 256 byte values. For kinds that do not use
    /// byte classes, this is the identity map.
    byte_classes: &'a [u8],
    trans: &'a [S],
}

impl<'a, S: StateID> DenseDFARef<'a, S> {
    pub(crate) fn from_parts(
        kind: DenseDFAKind,
        start: S,
        state_count: usize,
        max_match: S,
        alphabet_len: usize,
        byte_classes: &'a [u8],
        trans: &'a [S],
    ) -> DenseDFARef<'a, S> {
        DenseDFARef {
            kind,
            start,
            state_count,
            max_match,
            alphabet_len,
            byte_classes,
            trans,
        }
    }

    /// Returns true if and only if the given bytes match this DFA.
    ///
    /// This routine may short circuit if it knows that scanning future
    /// input will never lead to a different result. In particular, if a DFA
    /// enters a match state or a dead state, then this routine will return
    /// `true` or `false`, respectively, without inspecting any future input.
    pub fn is_match(&self, bytes: &[u8]) -> bool {
        self.is_match_inline(bytes)
    }

    /// Returns the first position at which a match is found.
    ///
    /// This routine stops scanning input in precisely the same circumstances
    /// as `is_match`. The key difference is that this routine returns the
    /// position at which it stopped scanning input if and only if a match
    /// was found. If no match is found, then `None` is returned.
    pub fn shortest_match(&self, bytes: &[u8]) -> Option<usize> {
        self.shortest_match_inline(bytes)
    }

    /// Returns the end offset of the leftmost first match. If no match
    /// exists, then `None` is returned.
    pub fn find(&self, bytes: &[u8]) -> Option<usize> {
        self.find_inline(bytes)
    }

    /// Returns the start offset of the leftmost first match in reverse, by
    /// searching from the end of the input towards the start of the input.
    /// If no match exists, then `None` is returned.
    pub fn rfind(&self, bytes: &[u8]) -> Option<usize> {
        self.rfind_inline(bytes)
    }

    /// Return this DFA's transition table kind.
    pub fn kind(&self) -> DenseDFAKind {
        self.kind
    }

    /// Build an owned DFA from this borrowed DFA, copying its transition
    /// table onto the heap.
    pub fn to_owned(&self) -> DenseDFA<S> {
        DenseDFA::from_parts(
            self.kind,
            self.start,
            self.state_count,
            self.max_match,
            ByteClasses::from_slice(self.byte_classes),
            self.trans.to_vec(),
        )
    }

    /// Returns the memory usage, in bytes, of this DFA's transition table.
    /// For a `DenseDFARef` built from static data or a memory map, this
    /// corresponds to the amount of external data used.
    pub fn memory_usage(&self) -> usize {
        self.byte_classes.len() + (self.trans.len() * size_of::<S>())
    }
}

/// Serialization.
impl<'a, S: StateID> DenseDFARef<'a, S> {
    /// Serialize this DFA to raw bytes in little endian format.
    pub fn to_bytes_little_endian(&self) -> Result<Vec<u8>> {
        self.to_bytes::<LittleEndian>()
    }

    /// Serialize this DFA to raw bytes in big endian format.
    pub fn to_bytes_big_endian(&self) -> Result<Vec<u8>> {
        self.to_bytes::<BigEndian>()
    }

    /// Serialize this DFA to raw bytes in native endian format.
    ///
    /// Generally, it is better to pick an explicit endianness using either
    /// `to_bytes_little_endian` or `to_bytes_big_endian`. This routine is
    /// useful in tests where the DFA is serialized and deserialized on the
    /// same platform.
    pub fn to_bytes_native_endian(&self) -> Result<Vec<u8>> {
        self.to_bytes::<NativeEndian>()
    }

    fn to_bytes<T: ByteOrder>(&self) -> Result<Vec<u8>> {
        let state_size = size_of::<S>();
        if ![1, 2, 4, 8].contains(&state_size) {
            return Err(Error::format_mismatch(format!(
                "cannot serialize state identifiers of {} bytes; must \
                 be 1, 2, 4 or 8",
                state_size,
            )));
        }
        if self.state_count > u32::MAX as usize {
            return Err(Error::format_mismatch(format!(
                "cannot serialize a DFA with {} states; at most {} are \
                 supported",
                self.state_count,
                u32::MAX,
            )));
        }

        // Detect which endianness `T` is by writing a probe value. This
        // avoids needing distinct serialization routines per byte order.
        let mut probe = [0u8; 2];
        T::write_u16(&mut probe, 1);
        let endian_tag =
            if probe[0] == 1 { TAG_LITTLE_ENDIAN } else { TAG_BIG_ENDIAN };

        let trans_size = state_size * self.trans.len();
        let size = HEADER_LEN + 2 * state_size + trans_size;
        let mut buf = vec![0; size];

        T::write_u32(&mut buf[0..], FORMAT_VERSION);
        buf[4] = endian_tag;
        buf[5] = state_size as u8;
        buf[6] = self.kind.to_byte();
        buf[7] = 0;
        T::write_u32(&mut buf[8..], self.alphabet_len as u32);
        buf[12..268].copy_from_slice(self.byte_classes);
        T::write_u32(&mut buf[268..], self.state_count as u32);

        let mut i = HEADER_LEN;
        write_state_id::<T, S>(&mut buf[i..], self.start);
        i += state_size;
        write_state_id::<T, S>(&mut buf[i..], self.max_match);
        i += state_size;
        for &id in self.trans {
            write_state_id::<T, S>(&mut buf[i..], id);
            i += state_size;
        }
        assert_eq!(size, i, "expected to consume entire buffer");
        Ok(buf)
    }

    /// Deserialize a DFA with a specific state identifier representation,
    /// borrowing its transition table directly from the given buffer.
    ///
    /// Deserializing a DFA using this routine will **not** allocate any new
    /// memory for the transition table, which makes it appropriate for
    /// automata compiled into static data or loaded from memory maps. The
    /// buffer must outlive the automaton and is treated as read-only for its
    /// entire lifetime.
    ///
    /// The bytes given should be generated by the serialization of a DFA
    /// with either the `to_bytes_little_endian` method or the
    /// `to_bytes_big_endian` method, matching the endianness of the machine
    /// doing the deserialization.
    ///
    /// # Errors
    ///
    /// Decoding fails closed. In particular, this returns an error if:
    ///
    /// * The buffer was serialized with a different endianness than this
    ///   machine's, or carries an unsupported format version.
    /// * The state identifier width in the buffer does not match `S`.
    /// * The buffer is too short for the dimensions it declares, or declares
    ///   an unknown transition table kind.
    /// * The byte class map is inconsistent with the declared alphabet
    ///   length.
    /// * Any state identifier in the buffer---including the start state and
    ///   every transition target---is not a valid identifier for the
    ///   declared state count and kind.
    /// * The transition table's position in the buffer is not aligned for
    ///   `S`. Buffers produced by `to_bytes` place the table at an offset
    ///   that is a multiple of 8 from the start of the buffer, so it
    ///   suffices to store the buffer at an 8 byte boundary.
    ///
    /// Since every identifier is checked here, searching with the resulting
    /// DFA never reads out of bounds even if the buffer was corrupted in a
    /// way that these checks cannot detect (such checks can only prove the
    /// table is well formed, not that it matches the automaton originally
    /// serialized).
    pub fn from_bytes(buf: &'a [u8]) -> Result<DenseDFARef<'a, S>> {
        let d = decode::<S>(buf)?;
        if d.table.as_ptr() as usize % align_of::<S>() != 0 {
            return Err(Error::format_mismatch(format!(
                "transition table is not aligned to {} bytes",
                align_of::<S>(),
            )));
        }
        // SAFETY: The alignment of the table was just checked, the decoder
        // checked that the buffer contains at least state_count *
        // alphabet_len identifiers of exactly size_of::<S>() bytes each, and
        // the buffer's endianness tag matches this machine.
        let trans = unsafe {
            slice::from_raw_parts(
                d.table.as_ptr() as *const S,
                d.state_count * d.alphabet_len,
            )
        };
        Ok(DenseDFARef {
            kind: d.kind,
            start: S::from_usize(d.start),
            state_count: d.state_count,
            max_match: S::from_usize(d.max_match),
            alphabet_len: d.alphabet_len,
            byte_classes: d.byte_classes,
            trans,
        })
    }
}

/// Deserialize an owned DFA from the given buffer, copying the transition
/// table to the heap. This performs exactly the same validation as the
/// borrowed deserialization, but has no alignment requirement.
pub(crate) fn from_bytes_owned<S: StateID>(buf: &[u8]) -> Result<DenseDFA<S>> {
    let d = decode::<S>(buf)?;
    let len = d.state_count * d.alphabet_len;
    let mut trans = Vec::with_capacity(len);
    for i in 0..len {
        trans.push(S::read_bytes(&d.table[i * size_of::<S>()..]));
    }
    Ok(DenseDFA::from_parts(
        d.kind,
        S::from_usize(d.start),
        d.state_count,
        S::from_usize(d.max_match),
        ByteClasses::from_slice(d.byte_classes),
        trans,
    ))
}

/// The result of decoding and validating a serialized dense DFA, with the
/// variable length portions still in their raw byte form.
struct Decoded<'a> {
    kind: DenseDFAKind,
    start: usize,
    state_count: usize,
    max_match: usize,
    alphabet_len: usize,
    byte_classes: &'a [u8],
    table: &'a [u8],
}

fn decode<S: StateID>(buf: &[u8]) -> Result<Decoded<'_>> {
    if buf.len() < HEADER_LEN {
        return Err(Error::format_mismatch(format!(
            "buffer of {} bytes is too small to contain a DFA header \
             of {} bytes",
            buf.len(),
            HEADER_LEN,
        )));
    }

    // The endianness tag is a single byte, so it can be read before the
    // buffer's byte order is known. Everything else is rejected unless the
    // buffer was written in this machine's byte order.
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
    let kind = match DenseDFAKind::from_byte(buf[6]) {
        Some(kind) => kind,
        None => {
            return Err(Error::format_mismatch(format!(
                "unrecognized DFA kind tag: 0x{:02X}",
                buf[6],
            )));
        }
    };

    let alphabet_len = NativeEndian::read_u32(&buf[8..12]) as usize;
    let byte_classes = &buf[12..268];
    if !kind.is_byte_class() {
        if alphabet_len != ALPHABET_LEN {
            return Err(Error::format_mismatch(format!(
                "a {:?} DFA must declare an alphabet of {} bytes, but \
                 the buffer declares {}",
                kind, ALPHABET_LEN, alphabet_len,
            )));
        }
        for (b, &class) in byte_classes.iter().enumerate() {
            if class as usize != b {
                return Err(Error::invalid_byte_classes(format!(
                    "a {:?} DFA requires the identity class map, but \
                     byte 0x{:02X} is in class {}",
                    kind, b, class,
                )));
            }
        }
    }
    if alphabet_len == 0 || alphabet_len > ALPHABET_LEN {
        return Err(Error::invalid_byte_classes(format!(
            "declared alphabet length {} is not in 1..=256",
            alphabet_len,
        )));
    }
    ByteClasses::from_slice(byte_classes).validate(alphabet_len)?;

    let state_count = NativeEndian::read_u32(&buf[268..272]) as usize;
    if state_count == 0 {
        return Err(Error::format_mismatch(
            "a DFA must contain at least its dead state",
        ));
    }
    let table_len = state_count
        .checked_mul(alphabet_len)
        .and_then(|n| n.checked_mul(width))
        .ok_or_else(|| {
            Error::format_mismatch("declared transition table size overflows")
        })?;
    let table_start = HEADER_LEN + 2 * width;
    let total = table_start.checked_add(table_len).ok_or_else(|| {
        Error::format_mismatch("declared transition table size overflows")
    })?;
    if buf.len() < total {
        return Err(Error::format_mismatch(format!(
            "buffer of {} bytes is too small for the declared {} \
             states ({} bytes required)",
            buf.len(),
            state_count,
            total,
        )));
    }

    let start = S::read_bytes(&buf[HEADER_LEN..]).to_usize();
    let max_match = S::read_bytes(&buf[HEADER_LEN + width..]).to_usize();
    let table = &buf[table_start..total];

    let valid_id = |id: usize| {
        if kind.is_premultiplied() {
            id % alphabet_len == 0 && id / alphabet_len < state_count
        } else {
            id < state_count
        }
    };
    if !valid_id(start) {
        return Err(Error::format_mismatch(format!(
            "start state {} is not a valid state identifier",
            start,
        )));
    }
    if !valid_id(max_match) {
        return Err(Error::format_mismatch(format!(
            "max match state {} is not a valid state identifier",
            max_match,
        )));
    }
    for i in 0..state_count * alphabet_len {
        let id = S::read_bytes(&table[i * width..]).to_usize();
        if !valid_id(id) {
            return Err(Error::format_mismatch(format!(
                "transition {} targets {}, which is not a valid state \
                 identifier",
                i, id,
            )));
        }
    }

    Ok(Decoded {
        kind,
        start,
        state_count,
        max_match,
        alphabet_len,
        byte_classes,
        table,
    })
}

fn write_state_id<T: ByteOrder, S: StateID>(buf: &mut [u8], id: S) {
    match size_of::<S>() {
        1 => buf[0] = id.to_usize() as u8,
        2 => T::write_u16(buf, id.to_usize() as u16),
        4 => T::write_u32(buf, id.to_usize() as u32),
        8 => T::write_u64(buf, id.to_usize() as u64),
        size => unreachable!("unsupported state ID size: {}", size),
    }
}

/// Transition lookups, one pair of routines per transition table kind. The
/// searching routines below pick one of these once per search, so that the
/// per-byte work never re-examines the DFA's kind.
impl<'a, S: StateID> DenseDFARef<'a, S> {
    fn next_state_standard(&self, current: S, input: u8) -> S {
        self.trans[current.to_usize() * ALPHABET_LEN + input as usize]
    }

    unsafe fn next_state_standard_unchecked(
        &self,
        current: S,
        input: u8,
    ) -> S {
        *self
            .trans
            .get_unchecked(current.to_usize() * ALPHABET_LEN + input as usize)
    }

    fn next_state_byte_class(&self, current: S, input: u8) -> S {
        let input = self.byte_classes[input as usize];
        self.trans[current.to_usize() * self.alphabet_len + input as usize]
    }

    unsafe fn next_state_byte_class_unchecked(
        &self,
        current: S,
        input: u8,
    ) -> S {
        let input = *self.byte_classes.get_unchecked(input as usize);
        *self.trans.get_unchecked(
            current.to_usize() * self.alphabet_len + input as usize,
        )
    }

    fn next_state_premultiplied(&self, current: S, input: u8) -> S {
        let input = self.byte_classes[input as usize];
        self.trans[current.to_usize() + input as usize]
    }

    unsafe fn next_state_premultiplied_unchecked(
        &self,
        current: S,
        input: u8,
    ) -> S {
        let input = *self.byte_classes.get_unchecked(input as usize);
        *self.trans.get_unchecked(current.to_usize() + input as usize)
    }
}

impl<'a, S: StateID> DenseDFARef<'a, S> {
    #[inline(always)]
    pub(crate) fn is_match_inline(&self, bytes: &[u8]) -> bool {
        match self.kind {
            DenseDFAKind::Standard => self.is_match_standard(bytes),
            DenseDFAKind::ByteClass => self.is_match_byte_class(bytes),
            DenseDFAKind::Premultiplied => {
                self.is_match_premultiplied(bytes)
            }
        }
    }

    fn is_match_standard(&self, bytes: &[u8]) -> bool {
        is_match!(self, bytes, next_state_standard_unchecked)
    }

    fn is_match_byte_class(&self, bytes: &[u8]) -> bool {
        is_match!(self, bytes, next_state_byte_class_unchecked)
    }

    fn is_match_premultiplied(&self, bytes: &[u8]) -> bool {
        is_match!(self, bytes, next_state_premultiplied_unchecked)
    }

    #[inline(always)]
    pub(crate) fn shortest_match_inline(&self, bytes: &[u8]) -> Option<usize> {
        match self.kind {
            DenseDFAKind::Standard => self.shortest_match_standard(bytes),
            DenseDFAKind::ByteClass => self.shortest_match_byte_class(bytes),
            DenseDFAKind::Premultiplied => {
                self.shortest_match_premultiplied(bytes)
            }
        }
    }

    fn shortest_match_standard(&self, bytes: &[u8]) -> Option<usize> {
        shortest_match!(self, bytes, next_state_standard_unchecked)
    }

    fn shortest_match_byte_class(&self, bytes: &[u8]) -> Option<usize> {
        shortest_match!(self, bytes, next_state_byte_class_unchecked)
    }

    fn shortest_match_premultiplied(&self, bytes: &[u8]) -> Option<usize> {
        shortest_match!(self, bytes, next_state_premultiplied_unchecked)
    }

    #[inline(always)]
    pub(crate) fn find_inline(&self, bytes: &[u8]) -> Option<usize> {
        match self.kind {
            DenseDFAKind::Standard => self.find_standard(bytes),
            DenseDFAKind::ByteClass => self.find_byte_class(bytes),
            DenseDFAKind::Premultiplied => self.find_premultiplied(bytes),
        }
    }

    fn find_standard(&self, bytes: &[u8]) -> Option<usize> {
        find!(self, bytes, next_state_standard_unchecked)
    }

    fn find_byte_class(&self, bytes: &[u8]) -> Option<usize> {
        find!(self, bytes, next_state_byte_class_unchecked)
    }

    fn find_premultiplied(&self, bytes: &[u8]) -> Option<usize> {
        find!(self, bytes, next_state_premultiplied_unchecked)
    }

    #[inline(always)]
    pub(crate) fn rfind_inline(&self, bytes: &[u8]) -> Option<usize> {
        match self.kind {
            DenseDFAKind::Standard => self.rfind_standard(bytes),
            DenseDFAKind::ByteClass => self.rfind_byte_class(bytes),
            DenseDFAKind::Premultiplied => self.rfind_premultiplied(bytes),
        }
    }

    fn rfind_standard(&self, bytes: &[u8]) -> Option<usize> {
        rfind!(self, bytes, next_state_standard_unchecked)
    }

    fn rfind_byte_class(&self, bytes: &[u8]) -> Option<usize> {
        rfind!(self, bytes, next_state_byte_class_unchecked)
    }

    fn rfind_premultiplied(&self, bytes: &[u8]) -> Option<usize> {
        rfind!(self, bytes, next_state_premultiplied_unchecked)
    }
}

impl<'a, S: StateID> DFA for DenseDFARef<'a, S> {
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
        match self.kind {
            DenseDFAKind::Standard => {
                self.next_state_standard(current, input)
            }
            DenseDFAKind::ByteClass => {
                self.next_state_byte_class(current, input)
            }
            DenseDFAKind::Premultiplied => {
                self.next_state_premultiplied(current, input)
            }
        }
    }

    unsafe fn next_state_unchecked(&self, current: S, input: u8) -> S {
        match self.kind {
            DenseDFAKind::Standard => {
                self.next_state_standard_unchecked(current, input)
            }
            DenseDFAKind::ByteClass => {
                self.next_state_byte_class_unchecked(current, input)
            }
            DenseDFAKind::Premultiplied => {
                self.next_state_premultiplied_unchecked(current, input)
            }
        }
    }

    fn is_match(&self, bytes: &[u8]) -> bool {
        self.is_match_inline(bytes)
    }

    fn shortest_match(&self, bytes: &[u8]) -> Option<usize> {
        self.shortest_match_inline(bytes)
    }

    fn find(&self, bytes: &[u8]) -> Option<usize> {
        self.find_inline(bytes)
    }

    fn rfind(&self, bytes: &[u8]) -> Option<usize> {
        self.rfind_inline(bytes)
    }
}

impl<'a, S: StateID> fmt::Debug for DenseDFARef<'a, S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "DenseDFARef(kind: {:?}, states: {}, alphabet: {})",
            self.kind, self.state_count, self.alphabet_len,
        )
    }
}
