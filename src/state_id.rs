use std::fmt::Debug;
use std::hash::Hash;
use std::mem::size_of;

use byteorder::{ByteOrder, NativeEndian};

use crate::error::{Error, Result};

/// Return the identifier for a DFA's dead state in the representation
/// indicated by `S`.
///
/// The dead state is always the first state in a DFA's transition table, so
/// its identifier is `0` in every representation. Note that in a
/// premultiplied DFA, `0 * alphabet_len == 0`, so this holds for
/// premultiplied identifiers as well.
pub fn dead_id<S: StateID>() -> S {
    S::from_usize(0)
}

/// Convert the given `usize` to the chosen state identifier representation.
/// If the given value cannot fit in the chosen representation, then an error
/// is returned.
pub(crate) fn usize_to_state_id<S: StateID>(value: usize) -> Result<S> {
    if value > S::max_id() {
        Err(Error::state_id_overflow(S::max_id(), value))
    } else {
        Ok(S::from_usize(value))
    }
}

/// Check that the premultiplication of the given state identifier can fit
/// into the representation indicated by `S`. If it cannot, or if it overflows
/// `usize` itself, then an error is returned.
pub(crate) fn premultiply_overflow_error<S: StateID>(
    last_state: S,
    alphabet_len: usize,
) -> Result<()> {
    let requested = match last_state.to_usize().checked_mul(alphabet_len) {
        Some(requested) => requested,
        None => return Err(Error::state_id_overflow(S::max_id(), usize::MAX)),
    };
    if requested > S::max_id() {
        return Err(Error::state_id_overflow(S::max_id(), requested));
    }
    Ok(())
}

/// Allocate the next sequential identifier for a fresh state given the
/// previously constructed state identified by `current`. If the next
/// sequential identifier would overflow `usize` or the chosen representation
/// indicated by `S`, then an error is returned.
pub(crate) fn next_state_id<S: StateID>(current: S) -> Result<S> {
    let next = match current.to_usize().checked_add(1) {
        Some(next) => next,
        None => return Err(Error::state_id_overflow(S::max_id(), usize::MAX)),
    };
    usize_to_state_id(next)
}

/// A trait describing the representation of a DFA's state identifier.
///
/// The purpose of this trait is to safely express both the possible state
/// identifier representations that can be used in a DFA and the conversions
/// between them that are necessary for building DFAs and reading them from
/// byte buffers. In general, one picks the narrowest representation that can
/// hold every state in a particular DFA; building fails---it never
/// truncates---if the DFA has too many states.
///
/// Implementations are provided for `u8`, `u16`, `u32`, `u64` and `usize`.
pub trait StateID:
    Clone + Copy + Debug + Eq + Hash + PartialEq + PartialOrd + Ord
{
    /// Convert from a `usize` to this implementation's representation.
    ///
    /// Implementors may assume that `n <= Self::max_id`. That is, implementors
    /// do not need to check whether `n` can fit inside this implementation's
    /// representation.
    fn from_usize(n: usize) -> Self;

    /// Convert this implementation's representation to a `usize`.
    ///
    /// Implementors must not return a value greater than `Self::max_id` and
    /// must not permit overflow.
    fn to_usize(self) -> usize;

    /// Return the maximum state identifier supported by this representation.
    fn max_id() -> usize;

    /// Read a single state identifier from the beginning of the given slice
    /// of bytes, in native endian format.
    ///
    /// Implementors may assume the slice has length at least
    /// `size_of::<Self>()`.
    fn read_bytes(slice: &[u8]) -> Self;

    /// Write this state identifier to the beginning of the given slice of
    /// bytes, in native endian format.
    ///
    /// Implementors may assume the slice has length at least
    /// `size_of::<Self>()`.
    fn write_bytes(self, slice: &mut [u8]);
}

impl StateID for usize {
    #[inline]
    fn from_usize(n: usize) -> usize {
        n
    }

    #[inline]
    fn to_usize(self) -> usize {
        self
    }

    #[inline]
    fn max_id() -> usize {
        usize::MAX
    }

    #[inline]
    fn read_bytes(slice: &[u8]) -> Self {
        NativeEndian::read_uint(slice, size_of::<usize>()) as usize
    }

    #[inline]
    fn write_bytes(self, slice: &mut [u8]) {
        NativeEndian::write_uint(slice, self as u64, size_of::<usize>())
    }
}

impl StateID for u8 {
    #[inline]
    fn from_usize(n: usize) -> u8 {
        n as u8
    }

    #[inline]
    fn to_usize(self) -> usize {
        self as usize
    }

    #[inline]
    fn max_id() -> usize {
        u8::MAX as usize
    }

    #[inline]
    fn read_bytes(slice: &[u8]) -> Self {
        slice[0]
    }

    #[inline]
    fn write_bytes(self, slice: &mut [u8]) {
        slice[0] = self;
    }
}

impl StateID for u16 {
    #[inline]
    fn from_usize(n: usize) -> u16 {
        n as u16
    }

    #[inline]
    fn to_usize(self) -> usize {
        self as usize
    }

    #[inline]
    fn max_id() -> usize {
        u16::MAX as usize
    }

    #[inline]
    fn read_bytes(slice: &[u8]) -> Self {
        NativeEndian::read_u16(slice)
    }

    #[inline]
    fn write_bytes(self, slice: &mut [u8]) {
        NativeEndian::write_u16(slice, self)
    }
}

#[cfg(any(target_pointer_width = "32", target_pointer_width = "64"))]
impl StateID for u32 {
    #[inline]
    fn from_usize(n: usize) -> u32 {
        n as u32
    }

    #[inline]
    fn to_usize(self) -> usize {
        self as usize
    }

    #[inline]
    fn max_id() -> usize {
        u32::MAX as usize
    }

    #[inline]
    fn read_bytes(slice: &[u8]) -> Self {
        NativeEndian::read_u32(slice)
    }

    #[inline]
    fn write_bytes(self, slice: &mut [u8]) {
        NativeEndian::write_u32(slice, self)
    }
}

#[cfg(target_pointer_width = "64")]
impl StateID for u64 {
    #[inline]
    fn from_usize(n: usize) -> u64 {
        n as u64
    }

    #[inline]
    fn to_usize(self) -> usize {
        self as usize
    }

    #[inline]
    fn max_id() -> usize {
        u64::MAX as usize
    }

    #[inline]
    fn read_bytes(slice: &[u8]) -> Self {
        NativeEndian::read_u64(slice)
    }

    #[inline]
    fn write_bytes(self, slice: &mut [u8]) {
        NativeEndian::write_u64(slice, self)
    }
}
