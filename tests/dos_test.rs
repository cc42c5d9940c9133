//! End-to-end coverage of the DOS-family engine: create/write/read/rename/
//! delete, directory and bitmap bookkeeping, and the image round-tripping
//! through `Container::to_bytes`/`from_bytes`.

mod common;

use atrfs::container::Container;
use atrfs::detect::{self, Detected};
use atrfs::fs::dos::types::Variant;
use atrfs::fs::dos::vtoc;
use atrfs::fs::{Engine, Error, RenameFlags};

fn engine(d: &Detected) -> &dyn Engine {
    d.as_engine()
}

fn engine_mut(d: &mut Detected) -> &mut dyn Engine {
    d.as_engine_mut()
}

#[test]
fn create_write_read_round_trips() {
    let mut fs = common::format_dos(Variant::Dos2s, 720, 128, 361);
    engine_mut(&mut fs).create("HELLO.TXT").unwrap();
    let n = engine_mut(&mut fs).write("HELLO.TXT", b"hello world", 0).unwrap();
    assert_eq!(n, 11);
    let data = engine(&fs).read("HELLO.TXT", 0, 64).unwrap();
    assert_eq!(&data, b"hello world");
}

#[test]
fn readdir_lists_created_files() {
    let mut fs = common::format_dos(Variant::Dos2s, 720, 128, 361);
    engine_mut(&mut fs).create("A.TXT").unwrap();
    engine_mut(&mut fs).create("B.TXT").unwrap();
    let names: Vec<_> = engine(&fs).readdir("").unwrap().into_iter().map(|e| e.name).collect();
    assert!(names.contains(&"A.TXT".to_string()));
    assert!(names.contains(&"B.TXT".to_string()));
}

#[test]
fn unlink_removes_entry_and_frees_sectors() {
    let mut fs = common::format_dos(Variant::Dos2s, 720, 128, 361);
    engine_mut(&mut fs).create("GONE.TXT").unwrap();
    engine_mut(&mut fs).write("GONE.TXT", &vec![1u8; 500], 0).unwrap();
    let before = engine(&fs).statfs().unwrap().free_sectors;
    engine_mut(&mut fs).unlink("GONE.TXT").unwrap();
    let after = engine(&fs).statfs().unwrap().free_sectors;
    assert!(after > before);
    assert_eq!(engine(&fs).resolve("GONE.TXT").unwrap_err(), Error::NotFound);
}

#[test]
fn rename_moves_the_directory_slot() {
    let mut fs = common::format_dos(Variant::Dos2s, 720, 128, 361);
    engine_mut(&mut fs).create("OLD.TXT").unwrap();
    engine_mut(&mut fs).rename("OLD.TXT", "NEW.TXT", RenameFlags::default()).unwrap();
    assert_eq!(engine(&fs).resolve("OLD.TXT").unwrap_err(), Error::NotFound);
    assert!(engine(&fs).resolve("NEW.TXT").is_ok());
}

#[test]
fn truncate_grows_and_shrinks() {
    let mut fs = common::format_dos(Variant::Dos2s, 720, 128, 361);
    engine_mut(&mut fs).create("T.TXT").unwrap();
    engine_mut(&mut fs).write("T.TXT", b"0123456789", 0).unwrap();
    engine_mut(&mut fs).truncate("T.TXT", 4).unwrap();
    assert_eq!(engine(&fs).read("T.TXT", 0, 64).unwrap(), b"0123");
    engine_mut(&mut fs).truncate("T.TXT", 8).unwrap();
    let grown = engine(&fs).read("T.TXT", 0, 64).unwrap();
    assert_eq!(grown.len(), 8);
    assert_eq!(&grown[..4], b"0123");
}

#[test]
fn name_too_long_is_rejected() {
    let mut fs = common::format_dos(Variant::Dos2s, 720, 128, 361);
    assert_eq!(
        engine_mut(&mut fs).create("WAYTOOLONGNAME.TXT").unwrap_err(),
        Error::NameTooLong
    );
}

#[test]
fn locked_file_rejects_write_and_unlink() {
    let mut fs = common::format_dos(Variant::Dos2s, 720, 128, 361);
    engine_mut(&mut fs).create("LOCK.TXT").unwrap();
    engine_mut(&mut fs).chmod("LOCK.TXT", false).unwrap();
    assert_eq!(engine_mut(&mut fs).write("LOCK.TXT", b"x", 0).unwrap_err(), Error::PermissionDenied);
}

#[test]
fn mkdir_then_rmdir_round_trips_on_mydos() {
    let mut fs = common::format_dos(Variant::MyDos, 720, 256, 361);
    engine_mut(&mut fs).mkdir("SUBDIR").unwrap();
    assert!(engine(&fs).resolve("SUBDIR").unwrap().is_dir);
    engine_mut(&mut fs).rmdir("SUBDIR").unwrap();
    assert_eq!(engine(&fs).resolve("SUBDIR").unwrap_err(), Error::NotFound);
}

#[test]
fn chain_sectors_matches_directory_entry_sector_count() {
    let mut fs = common::format_dos(Variant::Dos2s, 720, 128, 361);
    engine_mut(&mut fs).create("MULTI.TXT").unwrap();
    let data = vec![7u8; 128 * 3];
    engine_mut(&mut fs).write("MULTI.TXT", &data, 0).unwrap();
    let resolved = engine(&fs).resolve("MULTI.TXT").unwrap();
    let sectors = engine(&fs).chain_sectors("MULTI.TXT").unwrap();
    assert_eq!(sectors.len(), resolved.sector_count as usize);
}

#[test]
fn dos25_statfs_tracks_both_bitmaps() {
    let mut fs = common::format_dos(Variant::Dos25, 1040, 128, 361);
    let before = engine(&fs).statfs().unwrap().free_sectors;
    engine_mut(&mut fs).create("FILE.TXT").unwrap();
    engine_mut(&mut fs).write("FILE.TXT", &vec![9u8; 200], 0).unwrap();
    let after = engine(&fs).statfs().unwrap().free_sectors;
    assert!(after < before);
    assert_eq!(engine(&fs).read("FILE.TXT", 0, 256).unwrap(), vec![9u8; 200]);
}

#[test]
fn mydos_chain_survives_growth_past_sector_1023() {
    let mut fs = common::format_dos(Variant::MyDos, 1100, 128, 361);
    if let Detected::Dos(dosfs) = &mut fs {
        let c = dosfs.container_mut();
        // Leave sector 4 free so `create` lands below the 1023 threshold;
        // block everything else up to it so the later `write` growth must
        // jump straight past it.
        for s in 5..=1023 {
            vtoc::set_free(c, Variant::MyDos, s, false).unwrap();
        }
    }
    engine_mut(&mut fs).create("BIG.TXT").unwrap();
    let data = vec![0xABu8; 300];
    engine_mut(&mut fs).write("BIG.TXT", &data, 0).unwrap();

    let sectors = engine(&fs).chain_sectors("BIG.TXT").unwrap();
    assert!(sectors.iter().any(|&s| s > 1023), "expected a sector beyond 1023, got {:?}", sectors);
    assert_eq!(engine(&fs).read("BIG.TXT", 0, 512).unwrap(), data);
}

#[test]
fn image_round_trips_through_bytes_and_redetects() {
    let mut fs = common::format_dos(Variant::Dos2s, 720, 128, 361);
    engine_mut(&mut fs).create("SURVIVE.TXT").unwrap();
    engine_mut(&mut fs).write("SURVIVE.TXT", b"persisted", 0).unwrap();
    let container = fs.into_container();
    let bytes = container.to_bytes().to_vec();

    let reopened = Container::from_bytes(bytes, false).unwrap();
    let redetected = detect::detect(reopened, None).ok().expect("still detects as DOS");
    let data = redetected.as_engine().read("SURVIVE.TXT", 0, 64).unwrap();
    assert_eq!(&data, b"persisted");
}
