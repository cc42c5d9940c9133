//! Format detection: each formatter's image is recognized as itself, and a
//! blank/garbage image is recognized as none of them.

mod common;

use atrfs::container::Container;
use atrfs::detect::{self, Detected};
use atrfs::fs::dos::types::Variant;

#[test]
fn detects_dos2s() {
    let fs = common::format_dos(Variant::Dos2s, 720, 128, 361);
    let container = fs.into_container();
    let detected = detect::detect(container, None).ok().expect("should detect");
    assert_eq!(detected.as_engine().fs_name(), "DOS 2.0s");
}

#[test]
fn detects_mydos() {
    let fs = common::format_dos(Variant::MyDos, 720, 256, 361);
    let container = fs.into_container();
    let detected = detect::detect(container, None).ok().expect("should detect");
    assert_eq!(detected.as_engine().fs_name(), "MyDOS");
}

#[test]
fn detects_sparta() {
    let fs = common::format_sparta(720, 256);
    let container = fs.into_container();
    let detected = detect::detect(container, None).ok().expect("should detect");
    assert_eq!(detected.as_engine().fs_name(), "SpartaDOS");
}

#[test]
fn blank_image_detects_as_nothing() {
    let c = Container::create(720, 128);
    match detect::detect(c, None) {
        Ok(_) => panic!("a zero-filled image should not sanity-check as any format"),
        Err(_) => {}
    }
}

#[test]
fn sparta_512_byte_sectors_are_unsupported() {
    // A 512-byte-sector Sparta image is a stubbed, unsupported case even when
    // sector 1 carries a plausible-looking volume header.
    let fs = common::format_sparta(720, 256);
    let mut bytes = fs.into_container().to_bytes().to_vec();
    bytes[4] = 0x00;
    bytes[5] = 0x02; // sector_size = 512
    let c = Container::from_bytes(bytes, false).unwrap();
    assert!(detect::detect(c, None).is_err());
}

#[test]
fn sparta_is_tried_before_dos_family() {
    // A Sparta-formatted image must never be mistaken for a DOS-family disk,
    // even though both use sector 360-ish regions for bookkeeping.
    let fs = common::format_sparta(720, 256);
    let container = fs.into_container();
    let detected = detect::detect(container, None).ok().expect("should detect");
    assert!(matches!(detected, Detected::Sparta(_)));
}
