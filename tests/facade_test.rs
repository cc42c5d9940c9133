//! The mount-facing `FileSystemFacade`: synthetic dotfiles layered over a
//! real engine, and the plain errno-style return convention used by hosts.

mod common;

use atrfs::container::Container;
use atrfs::detect;
use atrfs::errno;
use atrfs::facade::FileSystemFacade;
use atrfs::fs::dos::types::Variant;

#[test]
fn info_dotfile_reports_real_file_metadata() {
    let fs = common::format_dos(Variant::Dos2s, 720, 128, 361);
    let mut facade = FileSystemFacade::new(fs);
    facade.create("NOTES.TXT");
    facade.write("NOTES.TXT", b"remember this", 0);

    let mut buf = vec![0u8; 4096];
    let n = facade.read("NOTES.TXT.info", &mut buf, 0);
    assert!(n > 0, "expected .info content, got errno {}", n);
    let text = String::from_utf8_lossy(&buf[..n as usize]);
    assert!(text.contains("NOTES.TXT"));
    assert!(text.contains("size: 13 bytes"));
}

#[test]
fn fsinfo_reports_sector_geometry() {
    let fs = common::format_dos(Variant::Dos2s, 720, 128, 361);
    let mut facade = FileSystemFacade::new(fs);
    let mut buf = vec![0u8; 4096];
    let n = facade.read(".fsinfo", &mut buf, 0);
    assert!(n > 0);
    let text = String::from_utf8_lossy(&buf[..n as usize]);
    assert!(text.contains("total sectors: 720"));
}

#[test]
fn write_to_unknown_path_returns_enoent() {
    let fs = common::format_dos(Variant::Dos2s, 720, 128, 361);
    let mut facade = FileSystemFacade::new(fs);
    let n = facade.write("NOPE.TXT", b"x", 0);
    assert_eq!(n, -errno::ENOENT);
}

#[test]
fn mkdir_on_dotfile_name_is_rejected() {
    let fs = common::format_dos(Variant::Dos2s, 720, 128, 361);
    let mut facade = FileSystemFacade::new(fs);
    let n = facade.mkdir(".fsinfo");
    assert_eq!(n, -errno::EACCES);
}

#[test]
fn read_only_image_rejects_every_mutation() {
    let fs = common::format_dos(Variant::Dos2s, 720, 128, 361);
    let bytes = fs.into_container().to_bytes().to_vec();
    let reopened = Container::from_bytes(bytes, true).unwrap();
    let redetected = detect::detect(reopened, None).ok().expect("still detects as DOS");
    let mut facade = FileSystemFacade::new(redetected);

    assert_eq!(facade.create("NEW.TXT"), -errno::EACCES);
    assert_eq!(facade.write("NEW.TXT", b"x", 0), -errno::EACCES);
    assert_eq!(facade.mkdir("SUB"), -errno::EACCES);
    assert_eq!(facade.unlink("NEW.TXT"), -errno::EACCES);
    assert_eq!(facade.truncate("NEW.TXT", 0), -errno::EACCES);
}

#[test]
fn getattr_on_sparta_entry_carries_modified_time() {
    let fs = common::format_sparta(720, 256);
    let mut facade = FileSystemFacade::new(fs);
    facade.create("TIMED.TXT");
    let attr = facade.getattr("TIMED.TXT").unwrap();
    assert!(attr.modified.is_some());
}
