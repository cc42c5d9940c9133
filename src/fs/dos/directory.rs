//! Directory-slot addressing and scanning shared by every DOS-family
//! directory, root or MyDOS subdirectory alike (`spec.md` §3 "DOS-family
//! directory entry", §4.3 "Directory scan tie-breaks and edge cases").

use crate::container::Container;
use crate::fs::dos::types::{DirEntry, ENTRIES_PER_SECTOR, ENTRY_LEN};
use crate::fs::Error;

/// Map a directory slot index (0..64) to a (sector-offset-from-base,
/// byte-offset) pair. In double-density images only the first 8 entries of
/// each 256-byte sector are used; the second half of the sector is wasted.
pub fn slot_location(index: usize) -> (u32, usize) {
    let sector_offset = (index / ENTRIES_PER_SECTOR) as u32;
    let byte_offset = (index % ENTRIES_PER_SECTOR) * ENTRY_LEN;
    (sector_offset, byte_offset)
}

pub fn read_entry(container: &Container, dir_base: u32, index: usize) -> Result<DirEntry, Error> {
    let (off, byte) = slot_location(index);
    let sec = container.sector(dir_base + off).map_err(|_| Error::Io)?;
    Ok(DirEntry::from_bytes(&sec[byte..byte + ENTRY_LEN]))
}

pub fn write_entry(
    container: &mut Container,
    dir_base: u32,
    index: usize,
    entry: &DirEntry,
) -> Result<(), Error> {
    let (off, byte) = slot_location(index);
    let sec = container.sector_mut(dir_base + off).map_err(|_| Error::Io)?;
    sec[byte..byte + ENTRY_LEN].copy_from_slice(&entry.to_bytes());
    Ok(())
}

/// Scan in directory-slot order, halting at the first zero-flag entry
/// (end-of-directory marker). Returns every slot up to, but not including,
/// the terminator — deleted slots are included so callers can distinguish
/// "free for reuse" from "occupied".
pub fn scan(container: &Container, dir_base: u32) -> Result<Vec<(usize, DirEntry)>, Error> {
    let mut out = Vec::new();
    for i in 0..crate::fs::dos::types::ENTRIES_PER_DIR {
        let entry = read_entry(container, dir_base, i)?;
        if entry.is_end_marker() {
            break;
        }
        out.push((i, entry));
    }
    Ok(out)
}

/// Find the slot to use for a new entry: the earliest deleted slot before
/// the end marker, else the end-marker slot itself. `None` means the
/// directory is full (all 64 slots occupied with no terminator).
pub fn find_free_slot(container: &Container, dir_base: u32) -> Result<Option<usize>, Error> {
    for i in 0..crate::fs::dos::types::ENTRIES_PER_DIR {
        let entry = read_entry(container, dir_base, i)?;
        if entry.is_end_marker() || entry.is_deleted() {
            return Ok(Some(i));
        }
    }
    Ok(None)
}

/// Look up a directory entry by display name among occupied (non-deleted)
/// slots.
pub fn find_by_name(
    container: &Container,
    dir_base: u32,
    name: &str,
) -> Result<Option<(usize, DirEntry)>, Error> {
    for (i, entry) in scan(container, dir_base)? {
        if !entry.is_deleted() && crate::common::names_equal(&entry.display_name(), name) {
            return Ok(Some((i, entry)));
        }
    }
    Ok(None)
}
