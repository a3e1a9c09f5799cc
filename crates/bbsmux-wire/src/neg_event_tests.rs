// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn parse_naws_reads_big_endian_width_height() {
    let size = parse_naws(&[0, 132, 0, 50]).unwrap();
    assert_eq!(size.width, 132);
    assert_eq!(size.height, 50);
}

#[test]
fn parse_naws_rejects_short_payload() {
    assert!(parse_naws(&[0, 132]).is_none());
}

#[test]
fn parse_ttype_is_strips_tag_and_decodes_name() {
    let name = parse_ttype_is(&[crate::iac::TTYPE_IS, b'V', b'T', b'1', b'0', b'0']).unwrap();
    assert_eq!(name, "VT100");
}

#[test]
fn parse_ttype_is_rejects_send_tag() {
    assert!(parse_ttype_is(&[crate::iac::TTYPE_SEND, b'x']).is_none());
}
