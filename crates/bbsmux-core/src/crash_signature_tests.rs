// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn ring_discards_oldest_on_overflow() {
    let mut ring = Ring::new(8);
    ring.push(b"abcdefgh");
    ring.push(b"ij");
    assert_eq!(ring.as_str(), "cdefghij");
}

#[test]
fn ring_handles_chunk_larger_than_capacity() {
    let mut ring = Ring::new(4);
    ring.push(b"0123456789");
    assert_eq!(ring.as_str(), "6789");
}

#[test]
fn ring_accumulates_within_capacity() {
    let mut ring = Ring::new(16);
    ring.push(b"hello ");
    ring.push(b"world");
    assert_eq!(ring.as_str(), "hello world");
}

#[test]
fn signature_matches_known_marker() {
    let mut ring = Ring::new(DEFAULT_RING_CAPACITY);
    ring.push(b"booting...\nOld language file, please recompile\nexiting\n");
    let sig = extract_signature(&ring, DEFAULT_MARKERS);
    assert_eq!(sig, "Old language file, please recompile");
}

#[test]
fn signature_falls_back_to_last_nonempty_line() {
    let mut ring = Ring::new(DEFAULT_RING_CAPACITY);
    ring.push(b"starting up\nsome output\nfatal: unexpected state\n\n");
    let sig = extract_signature(&ring, DEFAULT_MARKERS);
    assert_eq!(sig, "fatal: unexpected state");
}

#[test]
fn signature_of_empty_ring_is_unknown() {
    let ring = Ring::new(DEFAULT_RING_CAPACITY);
    assert_eq!(extract_signature(&ring, DEFAULT_MARKERS), "unknown");
}

#[test]
fn custom_marker_list_is_honored() {
    let mut ring = Ring::new(DEFAULT_RING_CAPACITY);
    ring.push(b"custom marker XYZ-CODE here\n");
    let sig = extract_signature(&ring, &["XYZ-CODE"]);
    assert_eq!(sig, "custom marker XYZ-CODE here");
}
