//! Shared image-formatting helpers for the integration tests. These poke
//! VTOC/bitmap/header bytes directly rather than going through a real
//! formatter utility (this crate doesn't ship one), matching the pattern
//! already used by the in-crate `facade` unit tests.

use atrfs::common::{le16, put_le16};
use atrfs::container::Container;
use atrfs::detect::Detected;
use atrfs::fs::dos::types::{pack_litedos_vtoc_byte0, Variant};
use atrfs::fs::dos::vtoc;
use atrfs::fs::dos::DosFs;
use atrfs::fs::sparta::types::{DirEntry, DirHeader, MapHeader, SpartaTime, DIRENT_LEN, MAP_HEADER_LEN};
use atrfs::fs::sparta::SpartaFs;

/// Format a blank image into a mountable DOS-family disk of `variant`: every
/// sector free in the VTOC bitmap(s), then sector 0, the VTOC sector and the
/// root directory reserved, matching what a real formatter leaves behind.
pub fn format_dos(variant: Variant, sector_count: u32, sector_size: u16, root_base: u32) -> Detected {
    let mut c = Container::create(sector_count, sector_size);
    {
        let marker = match variant {
            Variant::Dos1 => 1,
            Variant::LiteDos => pack_litedos_vtoc_byte0(4),
            _ => 2,
        };
        let sec = c.sector_mut(vtoc::VTOC_SECTOR).unwrap();
        sec[0] = marker;
        for b in &mut sec[vtoc::BITMAP_OFFSET..vtoc::BITMAP_OFFSET + vtoc::BITMAP_LEN] {
            *b = 0xff;
        }
        let primary_free = u32::min(vtoc::BITMAP_LEN as u32 * 8, sector_count) as u16;
        put_le16(&mut sec[vtoc::FREE_COUNT_OFFSET..vtoc::FREE_COUNT_OFFSET + 2], primary_free);
        if variant == Variant::Dos25 {
            put_le16(&mut sec[vtoc::FREE_COUNT2_OFFSET..vtoc::FREE_COUNT2_OFFSET + 2], 0);
        }
    }
    if variant == Variant::Dos25 {
        let sec = c.sector_mut(vtoc::DOS25_BITMAP_SECTOR).unwrap();
        for b in &mut sec[0..vtoc::DOS25_BITMAP_LEN] {
            *b = 0xff;
        }
    }
    let mut mydos_ext_sectors = Vec::new();
    if variant == Variant::MyDos && sector_count > vtoc::MYDOS_BITMAP_BASE {
        let mut covers_from = vtoc::MYDOS_BITMAP_BASE;
        let mut ext_sector = vtoc::MYDOS_EXT_FIRST_SECTOR;
        let mut extra_free: u32 = 0;
        while covers_from < sector_count && ext_sector > 0 {
            let len = c.sector_len(ext_sector);
            let sec = c.sector_mut(ext_sector).unwrap();
            for b in &mut sec[0..len] {
                *b = 0xff;
            }
            let bits = (len * 8) as u32;
            extra_free += u32::min(bits, sector_count - covers_from);
            covers_from += bits;
            mydos_ext_sectors.push(ext_sector);
            ext_sector -= 1;
        }
        let sec = c.sector_mut(vtoc::VTOC_SECTOR).unwrap();
        let cur = le16(&sec[vtoc::FREE_COUNT_OFFSET..vtoc::FREE_COUNT_OFFSET + 2]) as u32;
        put_le16(&mut sec[vtoc::FREE_COUNT_OFFSET..vtoc::FREE_COUNT_OFFSET + 2], (cur + extra_free) as u16);
    }
    vtoc::mark_reserved(&mut c, variant, root_base).unwrap();
    // The extension-bitmap sectors themselves hold bookkeeping bytes, not
    // file data, and sit inside the primary bitmap's own covered range.
    for s in mydos_ext_sectors {
        vtoc::set_free(&mut c, variant, s, false).unwrap();
    }
    Detected::Dos(DosFs::new(c, variant, root_base))
}

/// Format a blank image into a mountable Sparta/SDFS disk: sector 1 volume
/// header, a single-sector bitmap covering the whole image, and an empty
/// root directory (map sector 3, one data sector 4, a header entry and one
/// blank slot).
pub fn format_sparta(sector_count: u32, sector_size: u16) -> Detected {
    let mut c = Container::create(sector_count, sector_size);
    let first_bitmap: u16 = 2;
    let bitmap_sectors: u16 = 1;
    let dir_map: u16 = 3;
    let dir_data: u16 = 4;
    let reserved: u32 = 4;

    {
        let sec1 = c.sector_mut(1).unwrap();
        sec1[0] = b'S';
        sec1[1] = 0x30;
        put_le16(&mut sec1[2..4], sector_count as u16);
        put_le16(&mut sec1[4..6], sector_count as u16 - reserved);
        put_le16(&mut sec1[6..8], bitmap_sectors);
        put_le16(&mut sec1[8..10], first_bitmap);
        put_le16(&mut sec1[10..12], dir_map);
    }

    {
        let sec = c.sector_mut(first_bitmap as u32).unwrap();
        for b in sec.iter_mut() {
            *b = 0xff;
        }
        for s in 1u32..=reserved {
            let byte = (s / 8) as usize;
            let bit = (s % 8) as usize;
            sec[byte] &= !(0x80u8 >> bit);
        }
    }

    {
        let sec = c.sector_mut(dir_map as u32).unwrap();
        let h = MapHeader {
            next_map_sector: 0,
            previous_map_sector: 0,
        };
        h.write(sec);
        put_le16(&mut sec[MAP_HEADER_LEN..MAP_HEADER_LEN + 2], dir_data);
    }

    {
        let sec = c.sector_mut(dir_data as u32).unwrap();
        let header = DirHeader {
            status: 0,
            parent_map_sector: 0,
            length: (2 * DIRENT_LEN) as u32,
            name: [b' '; 11],
            created: SpartaTime::default(),
        };
        sec[..DIRENT_LEN].copy_from_slice(&header.to_bytes());
    }

    Detected::Sparta(SpartaFs::new(c).unwrap())
}

/// Read a directory's own `DirHeader` straight off disk, bypassing the
/// engine's live-recomputed `resolve()`/`readdir()` sizes, by following the
/// map sector's slot 0 to the directory's first data sector. Assumes the
/// directory fits in a single map/data sector, true for every fixture built
/// by these tests.
pub fn raw_dir_header(c: &Container, dir_map: u16) -> DirHeader {
    let maphdr_sec = c.sector(dir_map as u32).unwrap();
    let data_sector = le16(&maphdr_sec[MAP_HEADER_LEN..MAP_HEADER_LEN + 2]);
    let data_sec = c.sector(data_sector as u32).unwrap();
    DirHeader::from_bytes(&data_sec[0..DIRENT_LEN])
}

/// Read one raw `DirEntry` slot straight off disk, same caveat as
/// `raw_dir_header`.
pub fn raw_dirent(c: &Container, dir_map: u16, index: usize) -> DirEntry {
    let byte_off = index * DIRENT_LEN;
    let sector_size = c.sector_size as usize;
    let seq = byte_off / sector_size;
    let in_off = byte_off % sector_size;
    let maphdr_sec = c.sector(dir_map as u32).unwrap();
    let slot_off = MAP_HEADER_LEN + seq * 2;
    let data_sector = le16(&maphdr_sec[slot_off..slot_off + 2]);
    let data_sec = c.sector(data_sector as u32).unwrap();
    DirEntry::from_bytes(&data_sec[in_off..in_off + DIRENT_LEN])
}
