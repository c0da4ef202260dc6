use std::slice;

use regex_dfa::{
    DenseDFA, DenseDFABuilder, DenseDFARef, ErrorKind, Regex, SparseDFA,
    SparseDFARef, DFA,
};

use crate::fixtures::{
    all_variants, assert_equivalent, foo_digits_fwd, foo_digits_rev,
    haystacks,
};

/// Run `f` on a copy of `bytes` whose start is 8 byte aligned, which is the
/// strictest alignment any state identifier representation requires of a
/// dense transition table.
fn with_aligned<T>(bytes: &[u8], f: impl FnOnce(&[u8]) -> T) -> T {
    let mut buf = vec![0u64; (bytes.len() + 7) / 8];
    let copy = unsafe {
        slice::from_raw_parts_mut(buf.as_mut_ptr() as *mut u8, bytes.len())
    };
    copy.copy_from_slice(bytes);
    f(copy)
}

fn is_format_mismatch(err: &regex_dfa::Error) -> bool {
    matches!(err.kind(), ErrorKind::SerializationFormatMismatch(_))
}

fn serialize_foreign_endian(dfa: &DenseDFA<u16>) -> Vec<u8> {
    if cfg!(target_endian = "little") {
        dfa.to_bytes_big_endian().unwrap()
    } else {
        dfa.to_bytes_little_endian().unwrap()
    }
}

#[test]
fn dense_round_trip() {
    for (name, dfa) in all_variants(&foo_digits_fwd()) {
        let dfa = dfa.to_u16().unwrap();
        let bytes = dfa.to_bytes_native_endian().unwrap();
        let back: DenseDFA<u16> = DenseDFA::from_bytes(&bytes).unwrap();
        assert_equivalent(&dfa, &back);
        for haystack in haystacks() {
            assert_eq!(
                dfa.find(&haystack),
                back.find(&haystack),
                "{} on {:?}",
                name,
                haystack,
            );
        }
    }
}

#[test]
fn dense_borrowed_round_trip() {
    for (name, dfa) in all_variants(&foo_digits_fwd()) {
        let dfa = dfa.to_u16().unwrap();
        let bytes = dfa.to_bytes_native_endian().unwrap();
        with_aligned(&bytes, |buf| {
            let back: DenseDFARef<u16> =
                DenseDFARef::from_bytes(buf).unwrap();
            assert_equivalent(&dfa, &back);
            for haystack in haystacks() {
                assert_eq!(
                    dfa.find(&haystack),
                    back.find(&haystack),
                    "{} on {:?}",
                    name,
                    haystack,
                );
            }
            // An owned copy of the borrowed automaton behaves the same.
            assert_equivalent(&back.to_owned(), &dfa);
        });
    }
}

#[test]
fn foreign_endianness_is_rejected() {
    let dfa = DenseDFABuilder::new()
        .build_with_size::<u16>(&foo_digits_fwd())
        .unwrap();
    let bytes = serialize_foreign_endian(&dfa);
    let err = DenseDFA::<u16>::from_bytes(&bytes).unwrap_err();
    assert!(is_format_mismatch(&err), "{}", err);
    with_aligned(&bytes, |buf| {
        let err = DenseDFARef::<u16>::from_bytes(buf).unwrap_err();
        assert!(is_format_mismatch(&err), "{}", err);
    });
}

#[test]
fn truncated_buffers_are_rejected() {
    let dfa = DenseDFABuilder::new()
        .build_with_size::<u16>(&foo_digits_fwd())
        .unwrap();
    let bytes = dfa.to_bytes_native_endian().unwrap();
    for len in &[0, 4, 100, bytes.len() - 1] {
        let err = DenseDFA::<u16>::from_bytes(&bytes[..*len]).unwrap_err();
        assert!(is_format_mismatch(&err), "len {}: {}", len, err);
    }
}

#[test]
fn unsupported_version_is_rejected() {
    let dfa = DenseDFABuilder::new()
        .build_with_size::<u16>(&foo_digits_fwd())
        .unwrap();
    let mut bytes = dfa.to_bytes_native_endian().unwrap();
    bytes[0] = 0xAA;
    bytes[1] = 0xBB;
    let err = DenseDFA::<u16>::from_bytes(&bytes).unwrap_err();
    assert!(is_format_mismatch(&err), "{}", err);
}

#[test]
fn mismatched_state_id_width_is_rejected() {
    let dfa = DenseDFABuilder::new()
        .build_with_size::<u16>(&foo_digits_fwd())
        .unwrap();
    let bytes = dfa.to_bytes_native_endian().unwrap();
    let err = DenseDFA::<u32>::from_bytes(&bytes).unwrap_err();
    assert!(is_format_mismatch(&err), "{}", err);
}

#[test]
fn unknown_kind_tag_is_rejected() {
    let dfa = DenseDFABuilder::new()
        .build_with_size::<u16>(&foo_digits_fwd())
        .unwrap();
    let mut bytes = dfa.to_bytes_native_endian().unwrap();
    bytes[6] = 0x7F;
    let err = DenseDFA::<u16>::from_bytes(&bytes).unwrap_err();
    assert!(is_format_mismatch(&err), "{}", err);
}

#[test]
fn corrupt_byte_class_map_is_rejected() {
    let dfa = DenseDFABuilder::new()
        .build_with_size::<u16>(&foo_digits_fwd())
        .unwrap();
    let mut bytes = dfa.to_bytes_native_endian().unwrap();
    // The class map occupies bytes 12..268; a class at or past the declared
    // alphabet length makes the map inconsistent.
    bytes[12] = 0xFF;
    let err = DenseDFA::<u16>::from_bytes(&bytes).unwrap_err();
    assert!(
        matches!(err.kind(), ErrorKind::InvalidByteClassPartition(_)),
        "{}",
        err,
    );
}

#[test]
fn out_of_range_transition_is_rejected() {
    let dfa = DenseDFABuilder::new()
        .build_with_size::<u16>(&foo_digits_fwd())
        .unwrap();
    let mut bytes = dfa.to_bytes_native_endian().unwrap();
    // The first transition entry sits just past the header, the start state
    // and the max match state.
    let table_start = 272 + 2 * 2;
    bytes[table_start] = 0xFF;
    bytes[table_start + 1] = 0xFF;
    let err = DenseDFA::<u16>::from_bytes(&bytes).unwrap_err();
    assert!(is_format_mismatch(&err), "{}", err);
}

#[test]
fn sparse_round_trip() {
    let dense = DenseDFABuilder::new()
        .build_with_size::<u16>(&foo_digits_fwd())
        .unwrap();
    let sparse = dense.to_sparse_dfa().unwrap();
    let bytes = sparse.to_bytes_native_endian().unwrap();

    let owned: SparseDFA<u16> = SparseDFA::from_bytes(&bytes).unwrap();
    assert_equivalent(&sparse, &owned);

    // Sparse identifiers are read bytewise, so the borrowed form has no
    // alignment requirement; deserialize straight from the vec.
    let borrowed: SparseDFARef<u16> =
        SparseDFARef::from_bytes(&bytes).unwrap();
    assert_equivalent(&sparse, &borrowed);
    for haystack in haystacks() {
        assert_eq!(sparse.find(&haystack), owned.find(&haystack));
        assert_eq!(sparse.find(&haystack), borrowed.find(&haystack));
    }
}

#[test]
fn sparse_foreign_endianness_is_rejected() {
    let dense = DenseDFABuilder::new()
        .build_with_size::<u16>(&foo_digits_fwd())
        .unwrap();
    let sparse = dense.to_sparse_dfa().unwrap();
    let bytes = if cfg!(target_endian = "little") {
        sparse.to_bytes_big_endian().unwrap()
    } else {
        sparse.to_bytes_little_endian().unwrap()
    };
    let err = SparseDFA::<u16>::from_bytes(&bytes).unwrap_err();
    assert!(is_format_mismatch(&err), "{}", err);
}

#[test]
fn sparse_corrupt_buffers_are_rejected() {
    let dense = DenseDFABuilder::new()
        .build_with_size::<u16>(&foo_digits_fwd())
        .unwrap();
    let sparse = dense.to_sparse_dfa().unwrap();
    let bytes = sparse.to_bytes_native_endian().unwrap();

    for len in &[0, 8, bytes.len() - 1] {
        let err = SparseDFA::<u16>::from_bytes(&bytes[..*len]).unwrap_err();
        assert!(is_format_mismatch(&err), "len {}: {}", len, err);
    }

    // Pointing the last transition target outside the table must fail the
    // state identifier validation.
    let mut corrupt = bytes.clone();
    let n = corrupt.len();
    corrupt[n - 1] = 0xFF;
    corrupt[n - 2] = 0xFF;
    let err = SparseDFA::<u16>::from_bytes(&corrupt).unwrap_err();
    assert!(is_format_mismatch(&err), "{}", err);
}

#[test]
fn regex_survives_round_trip() {
    let builder = DenseDFABuilder::new();
    let fwd = builder.build_with_size::<u32>(&foo_digits_fwd()).unwrap();
    let rev = builder.build_with_size::<u32>(&foo_digits_rev()).unwrap();
    let re = Regex::from_dfas(fwd.clone(), rev.clone());

    let fwd_bytes = fwd.to_bytes_native_endian().unwrap();
    let rev_bytes = rev.to_bytes_native_endian().unwrap();
    let re2 = Regex::from_dfas(
        DenseDFA::<u32>::from_bytes(&fwd_bytes).unwrap(),
        DenseDFA::<u32>::from_bytes(&rev_bytes).unwrap(),
    );
    for haystack in haystacks() {
        assert_eq!(re.find(&haystack), re2.find(&haystack), "{:?}", haystack);
    }
    assert_eq!(Some((1, 5)), re2.find(b"xfoo1bar"));
}

quickcheck::quickcheck! {
    fn prop_round_trip_is_lossless(haystack: Vec<u8>) -> bool {
        let dfa = DenseDFABuilder::new()
            .build_with_size::<u16>(&foo_digits_fwd())
            .unwrap();
        let bytes = dfa.to_bytes_native_endian().unwrap();
        let back: DenseDFA<u16> = DenseDFA::from_bytes(&bytes).unwrap();
        dfa.find(&haystack) == back.find(&haystack)
    }
}
