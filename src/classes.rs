use std::collections::HashMap;
use std::fmt;

use crate::error::{Error, Result};

/// A representation of byte oriented equivalence classes.
///
/// This is used in a DFA to reduce the size of the transition table. This can
/// have a particularly large impact not only on the total size of a dense
/// DFA, but also on serialized size and cache behavior at search time.
///
/// Two bytes belong to the same equivalence class if and only if every state
/// in the DFA transitions to the same target on both bytes. That is, classes
/// are behaviorally indistinguishable, so collapsing each class down to a
/// single column in the transition table can never change the language
/// recognized by the DFA.
#[derive(Clone, Copy)]
pub struct ByteClasses([u8; 256]);

impl ByteClasses {
    /// Creates a new set of equivalence classes where all bytes are mapped to
    /// the same class.
    pub fn empty() -> ByteClasses {
        ByteClasses([0; 256])
    }

    /// Creates a new set of equivalence classes where each byte belongs to
    /// its own equivalence class.
    pub fn singletons() -> ByteClasses {
        let mut classes = ByteClasses::empty();
        for b in 0..256 {
            classes.set(b as u8, b as u8);
        }
        classes
    }

    /// Compute the coarsest set of equivalence classes for the given
    /// transition table, where `trans` has a row of 256 transitions for each
    /// of `state_count` states.
    ///
    /// Two bytes are assigned to the same class precisely when their columns
    /// in the transition table are identical. Anything coarser would change
    /// the language recognized by the DFA, and anything finer would waste
    /// space.
    pub(crate) fn from_transitions(
        trans: &[usize],
        state_count: usize,
    ) -> ByteClasses {
        assert_eq!(trans.len(), state_count * 256);

        let columns: Vec<Vec<usize>> = (0..256)
            .map(|b| (0..state_count).map(|s| trans[s * 256 + b]).collect())
            .collect();
        let mut classes = ByteClasses::empty();
        let mut assigned: HashMap<&Vec<usize>, u8> = HashMap::new();
        let mut next_class = 0usize;
        for (b, column) in columns.iter().enumerate() {
            let class = match assigned.get(column) {
                Some(&class) => class,
                None => {
                    // There can be at most 256 distinct columns, so this
                    // never exceeds u8::MAX.
                    let class = next_class as u8;
                    assigned.insert(column, class);
                    next_class += 1;
                    class
                }
            };
            classes.set(b as u8, class);
        }
        classes
    }

    /// Copy a class map out of the 256 byte slice given. The slice must have
    /// length at least 256.
    pub(crate) fn from_slice(slice: &[u8]) -> ByteClasses {
        let mut classes = ByteClasses::empty();
        for (b, &class) in slice[..256].iter().enumerate() {
            classes.set(b as u8, class);
        }
        classes
    }

    /// Check that this class map is consistent with the given declared
    /// alphabet length. Namely, every class index must be strictly less than
    /// `alphabet_len`, and `alphabet_len` must be exactly one more than the
    /// largest class index in use.
    pub(crate) fn validate(&self, alphabet_len: usize) -> Result<()> {
        for b in 0..256 {
            let class = self.get(b as u8) as usize;
            if class >= alphabet_len {
                return Err(Error::invalid_byte_classes(format!(
                    "byte 0x{:02X} is in class {}, but the alphabet \
                     length is {}",
                    b, class, alphabet_len,
                )));
            }
        }
        if self.alphabet_len() != alphabet_len {
            return Err(Error::invalid_byte_classes(format!(
                "class map uses {} classes, but the alphabet length \
                 is declared as {}",
                self.alphabet_len(),
                alphabet_len,
            )));
        }
        Ok(())
    }

    /// Set the equivalence class for the given byte.
    #[inline]
    pub fn set(&mut self, byte: u8, class: u8) {
        self.0[byte as usize] = class;
    }

    /// Get the equivalence class for the given byte.
    #[inline]
    pub fn get(&self, byte: u8) -> u8 {
        self.0[byte as usize]
    }

    /// Get the equivalence class for the given byte while forcefully eliding
    /// bounds checks.
    #[inline]
    pub(crate) unsafe fn get_unchecked(&self, byte: u8) -> u8 {
        *self.0.get_unchecked(byte as usize)
    }

    /// Return the total number of elements in the alphabet represented by
    /// these equivalence classes. Equivalently, this returns the total number
    /// of equivalence classes.
    #[inline]
    pub fn alphabet_len(&self) -> usize {
        self.0.iter().map(|&class| class as usize).max().unwrap() + 1
    }

    /// Returns true if and only if every byte in this class maps to its own
    /// equivalence class. Equivalently, there are 256 equivalence classes
    /// and each class contains exactly one byte.
    #[inline]
    pub fn is_singleton(&self) -> bool {
        self.alphabet_len() == 256
    }

    /// Return the underlying class map as a slice of 256 bytes.
    pub(crate) fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Return, for each equivalence class in ascending order, an arbitrary
    /// representative byte drawn from that class.
    ///
    /// This is useful when compressing a 256 column transition table down to
    /// one column per class: reading the representative's column yields the
    /// class's column.
    pub(crate) fn representatives(&self) -> Vec<u8> {
        let mut reps = vec![0u8; self.alphabet_len()];
        // Walk high to low so each class ends up with its smallest byte.
        for b in (0..256).rev() {
            reps[self.get(b as u8) as usize] = b as u8;
        }
        reps
    }
}

impl fmt::Debug for ByteClasses {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_singleton() {
            return write!(f, "ByteClasses({{singletons}})");
        }
        write!(f, "ByteClasses(")?;
        for class in 0..self.alphabet_len() {
            if class > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} => [", class)?;
            let mut first = true;
            let mut range: Option<(u8, u8)> = None;
            for b in 0..256 {
                if self.get(b as u8) as usize != class {
                    continue;
                }
                let b = b as u8;
                range = match range {
                    Some((start, end)) if end as usize + 1 == b as usize => {
                        Some((start, b))
                    }
                    Some((start, end)) => {
                        write_range(f, first, start, end)?;
                        first = false;
                        Some((b, b))
                    }
                    None => Some((b, b)),
                };
            }
            if let Some((start, end)) = range {
                write_range(f, first, start, end)?;
            }
            write!(f, "]")?;
        }
        write!(f, ")")
    }
}

fn write_range(
    f: &mut fmt::Formatter,
    first: bool,
    start: u8,
    end: u8,
) -> fmt::Result {
    if !first {
        write!(f, ", ")?;
    }
    if start == end {
        write!(f, "{:?}", start as char)
    } else {
        write!(f, "{:?}-{:?}", start as char, end as char)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A transition table over three states where bytes a-c behave alike
    // everywhere, digits behave alike everywhere, and every other byte leads
    // everywhere to the dead state.
    fn table() -> Vec<usize> {
        let mut trans = vec![0; 3 * 256];
        for b in b'a'..=b'c' {
            trans[1 * 256 + b as usize] = 2;
            trans[2 * 256 + b as usize] = 1;
        }
        for b in b'0'..=b'9' {
            trans[1 * 256 + b as usize] = 1;
            trans[2 * 256 + b as usize] = 1;
        }
        trans
    }

    #[test]
    fn coarsest_partition() {
        let classes = ByteClasses::from_transitions(&table(), 3);
        // dead bytes, a-c and 0-9.
        assert_eq!(classes.alphabet_len(), 3);
        assert_eq!(classes.get(b'a'), classes.get(b'c'));
        assert_eq!(classes.get(b'0'), classes.get(b'9'));
        assert_ne!(classes.get(b'a'), classes.get(b'0'));
        assert_ne!(classes.get(b'a'), classes.get(b'z'));
        assert_eq!(classes.get(b'z'), classes.get(0));
    }

    #[test]
    fn partition_is_behavioral() {
        let trans = table();
        let classes = ByteClasses::from_transitions(&trans, 3);
        for s in 0..3 {
            for b1 in 0..256 {
                for b2 in 0..256 {
                    if classes.get(b1 as u8) == classes.get(b2 as u8) {
                        assert_eq!(
                            trans[s * 256 + b1],
                            trans[s * 256 + b2],
                            "bytes {} and {} share a class but disagree \
                             in state {}",
                            b1,
                            b2,
                            s,
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn singleton_laws() {
        let classes = ByteClasses::singletons();
        assert!(classes.is_singleton());
        assert_eq!(classes.alphabet_len(), 256);
        for b in 0..256 {
            assert_eq!(classes.get(b as u8), b as u8);
        }
    }

    #[test]
    fn representatives_cover_all_classes() {
        let classes = ByteClasses::from_transitions(&table(), 3);
        let reps = classes.representatives();
        assert_eq!(reps.len(), classes.alphabet_len());
        for (class, &rep) in reps.iter().enumerate() {
            assert_eq!(classes.get(rep) as usize, class);
        }
    }

    #[test]
    fn validation_rejects_inconsistent_maps() {
        let classes = ByteClasses::from_transitions(&table(), 3);
        assert!(classes.validate(3).is_ok());
        assert!(classes.validate(2).is_err());
        assert!(classes.validate(4).is_err());
    }
}
