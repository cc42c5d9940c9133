//! # DOS-family engine
//!
//! One engine shared by DOS 1, DOS 2.0s, DOS 2.0d, DOS 2.5, MyDOS and
//! LiteDOS (`spec.md` §4.3). The formats share a VTOC bitmap, a fixed
//! 8-sector root directory, and sector-chain file layout with a per-sector
//! trailer; they differ in trailer packing, bitmap extent, and a handful of
//! sanity constants, captured by `types::Variant`.

pub mod directory;
pub mod types;
pub mod vtoc;

use std::collections::HashSet;

use log::{debug, warn};

use crate::common::Name83;
use crate::container::Container;
use crate::fs::{DirEntryInfo, Engine, Error, FsResult, RenameFlags, Resolved, StatFs, Utimens};
use types::{flag, DirEntry, Trailer, Variant, DIR_SECTORS, ENTRIES_PER_DIR};

/// Strip a trailing `.info` suffix, case-insensitively, reporting whether it
/// was present (`spec.md` §4.3 `resolve` ".info suffix").
fn strip_info(raw: &str) -> (String, bool) {
    if raw.len() > 5 && raw[raw.len() - 5..].eq_ignore_ascii_case(".info") {
        (raw[..raw.len() - 5].to_string(), true)
    } else {
        (raw.to_string(), false)
    }
}

fn lookup_name(raw: &str) -> FsResult<String> {
    let n = Name83::parse(raw).map_err(|_| Error::NameTooLong)?;
    Ok(if n.ext.is_empty() {
        n.base
    } else {
        format!("{}.{}", n.base, n.ext)
    })
}

pub struct DosFs {
    container: Container,
    variant: Variant,
    root_base: u32,
}

impl DosFs {
    pub fn new(container: Container, variant: Variant, root_base: u32) -> Self {
        Self {
            container,
            variant,
            root_base,
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn into_container(self) -> Container {
        self.container
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn container_mut(&mut self) -> &mut Container {
        &mut self.container
    }

    /// Per-format validity predicate (`spec.md` §4.2). Side-effect free.
    pub fn sanity(container: &Container, variant: Variant, root_base: u32) -> bool {
        if container.sector_count < root_base + DIR_SECTORS || container.sector_count < vtoc::VTOC_SECTOR {
            debug!("{}: image too small for VTOC/root directory", variant.name());
            return false;
        }
        let sec1 = match container.sector(1) {
            Ok(s) => s,
            Err(_) => return false,
        };
        if sec1[0] == b'S' || sec1[0] == b'X' {
            debug!("{}: byte 0 marker collides with Sparta/DOS-XE", variant.name());
            return false;
        }
        let vtoc_sec = match container.sector(vtoc::VTOC_SECTOR) {
            Ok(s) => s,
            Err(_) => return false,
        };
        let marker_ok = match variant {
            Variant::Dos1 => vtoc_sec[0] == 1,
            Variant::LiteDos => {
                types::litedos_cluster_size(vtoc_sec[0]).is_some()
            }
            _ => vtoc_sec[0] == 2,
        };
        if !marker_ok {
            debug!("{}: VTOC marker byte {} rejected", variant.name(), vtoc_sec[0]);
            return false;
        }
        let free = match vtoc::free_count(container, variant) {
            Ok(f) => f,
            Err(_) => return false,
        };
        if free > container.sector_count as u64 {
            debug!("{}: free count {} exceeds sector count", variant.name(), free);
            return false;
        }
        // reserved sectors must be allocated
        for s in [0u32, vtoc::VTOC_SECTOR] {
            match vtoc::is_free(container, variant, s) {
                Ok(true) => {
                    debug!("{}: reserved sector {} marked free", variant.name(), s);
                    return false;
                }
                Ok(false) => {}
                Err(_) => return false,
            }
        }
        for s in root_base..root_base + DIR_SECTORS {
            match vtoc::is_free(container, variant, s) {
                Ok(true) => return false,
                Ok(false) => {}
                Err(_) => return false,
            }
        }
        // root directory entry flags must use only defined bits
        const DEFINED: u8 = flag::OPEN_FOR_WRITE
            | flag::DOS2_CREATED
            | flag::NO_FILE_NUMBER
            | flag::DIRECTORY
            | flag::LOCKED
            | flag::IN_USE
            | flag::DELETED;
        for i in 0..ENTRIES_PER_DIR {
            let entry = match directory::read_entry(container, root_base, i) {
                Ok(e) => e,
                Err(_) => return false,
            };
            if entry.is_end_marker() {
                break;
            }
            if entry.flags & !DEFINED != 0 {
                debug!("{}: root directory entry {} has undefined flag bits", variant.name(), i);
                return false;
            }
        }
        true
    }

    fn find_entry(&self, path: &str) -> FsResult<(u32, usize, DirEntry)> {
        let comps = crate::common::split_path(path);
        if comps.is_empty() {
            return Err(Error::IsADirectory);
        }
        let mut dir_base = self.root_base;
        let n = comps.len();
        for (i, raw) in comps.iter().enumerate() {
            let name = lookup_name(raw)?;
            match directory::find_by_name(&self.container, dir_base, &name)? {
                Some((idx, entry)) => {
                    if i == n - 1 {
                        return Ok((dir_base, idx, entry));
                    }
                    if !entry.is_dir() || self.variant != Variant::MyDos {
                        return Err(Error::NotADirectory);
                    }
                    dir_base = entry.first_sector as u32;
                }
                None => return Err(Error::NotFound),
            }
        }
        unreachable!()
    }

    fn resolve_dir_base(&self, path: &str) -> FsResult<u32> {
        let comps = crate::common::split_path(path);
        if comps.is_empty() {
            return Ok(self.root_base);
        }
        let (_, _, entry) = self.find_entry(path)?;
        if !entry.is_dir() {
            return Err(Error::NotADirectory);
        }
        Ok(entry.first_sector as u32)
    }

    /// Walk a sector chain, returning the visited sectors in order and the
    /// concatenated payload bytes. Any invalid `next` pointer or a loop
    /// longer than the image's sector count is a fatal `CorruptChain` for
    /// this one file (`spec.md` §4.3 "Failure semantics").
    fn walk_chain(&self, entry: &DirEntry) -> FsResult<(Vec<u32>, Vec<u8>)> {
        let no_fileno = entry.flags & flag::NO_FILE_NUMBER != 0;
        let mut sectors = Vec::new();
        let mut data = Vec::new();
        let mut cur = entry.first_sector as u32;
        let mut visited = HashSet::new();
        if cur == 0 {
            return Ok((sectors, data));
        }
        loop {
            if cur == 0 || cur > self.container.sector_count {
                return Err(Error::CorruptChain);
            }
            if !visited.insert(cur) {
                return Err(Error::CorruptChain);
            }
            let sector = self.container.sector(cur).map_err(|_| Error::Io)?;
            let trailer = Trailer::read(sector, self.variant, no_fileno);
            let cap = sector.len() - 3;
            let payload_len = if self.variant.is_dos1() {
                cap
            } else {
                (trailer.used as usize).min(cap)
            };
            sectors.push(cur);
            data.extend_from_slice(&sector[..payload_len]);
            if self.variant.is_dos1() {
                if !trailer.dos1_eof && trailer.next_sector == 0 {
                    warn!("DOS 1 file missing EOF flag but next==0, treating as end of chain");
                }
                if trailer.dos1_eof || trailer.next_sector == 0 {
                    break;
                }
            } else if trailer.next_sector == 0 {
                break;
            }
            cur = trailer.next_sector as u32;
        }
        Ok((sectors, data))
    }

    fn compute_size(&self, entry: &DirEntry) -> FsResult<u64> {
        if entry.is_dir() {
            return Ok(entry.sector_count as u64 * self.container.sector_size as u64);
        }
        let (_, data) = self.walk_chain(entry)?;
        Ok(data.len() as u64)
    }

    fn default_flags_for_sector(&self, sector: u32) -> u8 {
        match self.variant {
            Variant::Dos1 => flag::IN_USE,
            Variant::Dos2s | Variant::Dos2d | Variant::LiteDos => flag::IN_USE | flag::DOS2_CREATED,
            Variant::MyDos => {
                if sector > 1023 {
                    flag::IN_USE | flag::DOS2_CREATED | flag::NO_FILE_NUMBER
                } else {
                    flag::IN_USE | flag::DOS2_CREATED
                }
            }
            Variant::Dos25 => {
                if sector >= vtoc::DOS25_BITMAP_BASE {
                    // The original marks files in the extended bitmap range with the
                    // raw flag byte 0x03; that clears IN_USE and would violate the
                    // end-of-directory convention (zero flags), so here IN_USE is
                    // kept set alongside it.
                    flag::IN_USE | flag::DOS2_CREATED | flag::OPEN_FOR_WRITE
                } else {
                    flag::IN_USE | flag::DOS2_CREATED
                }
            }
        }
    }

    fn find_contiguous_free(&self, count: u32) -> FsResult<u32> {
        let limit = self.container.sector_count;
        'outer: for base in 4..=limit.saturating_sub(count - 1) {
            for s in base..base + count {
                if !vtoc::is_free(&self.container, self.variant, s)? {
                    continue 'outer;
                }
            }
            return Ok(base);
        }
        Err(Error::NoSpace)
    }
}

impl Engine for DosFs {
    fn resolve(&self, path: &str) -> FsResult<Resolved> {
        let comps = crate::common::split_path(path);
        if comps.is_empty() {
            return Ok(Resolved {
                starting_sector: self.root_base as u16,
                parent_dir_sector: self.root_base as u16,
                sector_count: DIR_SECTORS as u16,
                locked: false,
                file_number: None,
                dir_entry_index: None,
                is_dir: true,
                is_info: false,
                size: DIR_SECTORS as u64 * self.container.sector_size as u64,
                modified: None,
            });
        }
        let mut comps = comps;
        let last = comps.pop().unwrap();
        let (stripped, is_info) = strip_info(&last);
        comps.push(stripped);
        let path2 = comps.join("/");
        match self.find_entry(&path2) {
            Ok((dir_base, idx, entry)) => Ok(Resolved {
                starting_sector: entry.first_sector,
                parent_dir_sector: dir_base as u16,
                sector_count: entry.sector_count,
                locked: entry.is_locked(),
                file_number: if self.variant.uses_file_numbers() {
                    Some(idx as u8)
                } else {
                    None
                },
                dir_entry_index: Some(idx),
                is_dir: entry.is_dir(),
                is_info,
                size: self.compute_size(&entry)?,
                modified: None,
            }),
            Err(e) => Err(e),
        }
    }

    fn readdir(&self, path: &str) -> FsResult<Vec<DirEntryInfo>> {
        let dir_base = self.resolve_dir_base(path)?;
        let mut out = Vec::new();
        for (_, entry) in directory::scan(&self.container, dir_base)? {
            if entry.is_deleted() {
                continue;
            }
            out.push(DirEntryInfo {
                name: entry.display_name(),
                is_dir: entry.is_dir(),
                locked: entry.is_locked(),
                size: self.compute_size(&entry)?,
            });
        }
        Ok(out)
    }

    fn read(&self, path: &str, offset: u64, size: usize) -> FsResult<Vec<u8>> {
        let (_, _, entry) = self.find_entry(path)?;
        if entry.is_dir() {
            return Err(Error::IsADirectory);
        }
        let (_, data) = self.walk_chain(&entry)?;
        let start = offset as usize;
        if start >= data.len() {
            return Ok(Vec::new());
        }
        let end = usize::min(data.len(), start + size);
        Ok(data[start..end].to_vec())
    }

    fn write(&mut self, path: &str, buf: &[u8], offset: u64) -> FsResult<usize> {
        let (dir_base, idx, mut entry) = self.find_entry(path)?;
        if entry.is_dir() {
            return Err(Error::IsADirectory);
        }
        if entry.is_locked() {
            return Err(Error::PermissionDenied);
        }
        let mut no_fileno_flag = entry.flags & flag::NO_FILE_NUMBER != 0;
        let payload_cap = self.container.sector_size as usize - 3;
        let (existing, cur_bytes) = self.walk_chain(&entry)?;
        let offset = offset as usize;
        let new_len = usize::max(cur_bytes.len(), offset + buf.len());
        let new_sector_count = usize::max(1, (new_len + payload_cap - 1) / payload_cap);

        let mut sectors = existing;
        let mut alloc_failed = false;
        while sectors.len() < new_sector_count {
            match vtoc::allocate(&mut self.container, self.variant) {
                Ok(s) => {
                    if let Ok(sec) = self.container.sector_mut(s) {
                        for b in sec.iter_mut() {
                            *b = 0;
                        }
                    }
                    if s > 1023 && self.variant == Variant::MyDos {
                        no_fileno_flag = true;
                    }
                    sectors.push(s);
                }
                Err(_) => {
                    alloc_failed = true;
                    break;
                }
            }
        }

        let actual_len = usize::min(new_len, sectors.len() * payload_cap);
        let mut data = cur_bytes;
        data.resize(new_len, 0);
        let write_end = usize::min(offset + buf.len(), data.len());
        if write_end > offset {
            data[offset..write_end].copy_from_slice(&buf[..write_end - offset]);
        }
        data.truncate(actual_len);

        for (i, &sec_num) in sectors.iter().enumerate() {
            let start = i * payload_cap;
            let end = usize::min(data.len(), start + payload_cap);
            let payload: &[u8] = if start < data.len() { &data[start..end] } else { &[] };
            let is_last = i == sectors.len() - 1;
            let next = if is_last { 0 } else { sectors[i + 1] as u16 };
            let trailer = Trailer {
                file_number: idx as u8,
                next_sector: next,
                used: payload.len() as u8,
                dos1_eof: is_last,
            };
            let sec_buf = self.container.sector_mut(sec_num).map_err(|_| Error::Io)?;
            sec_buf[..payload.len()].copy_from_slice(payload);
            trailer.write(sec_buf, self.variant, no_fileno_flag);
        }

        entry.sector_count = sectors.len() as u16;
        if let Some(&first) = sectors.first() {
            entry.first_sector = first;
        }
        if no_fileno_flag {
            entry.flags |= flag::NO_FILE_NUMBER;
        }
        directory::write_entry(&mut self.container, dir_base, idx, &entry)?;

        let written = if offset >= actual_len {
            0
        } else {
            usize::min(buf.len(), actual_len - offset)
        };
        if alloc_failed && written == 0 {
            return Err(Error::NoSpace);
        }
        Ok(written)
    }

    fn create(&mut self, path: &str) -> FsResult<()> {
        let comps = crate::common::split_path(path);
        if comps.is_empty() {
            return Err(Error::InvalidArgument);
        }
        let mut comps = comps;
        let name = comps.pop().unwrap();
        let parent = comps.join("/");
        let dir_base = self.resolve_dir_base(&parent)?;
        let lookup = lookup_name(&name)?;
        if directory::find_by_name(&self.container, dir_base, &lookup)?.is_some() {
            return Err(Error::AlreadyExists);
        }
        let idx = directory::find_free_slot(&self.container, dir_base)?.ok_or(Error::NoSpace)?;
        let sector = vtoc::allocate(&mut self.container, self.variant)?;
        {
            let sec = self.container.sector_mut(sector).map_err(|_| Error::Io)?;
            for b in sec.iter_mut() {
                *b = 0;
            }
            let trailer = Trailer {
                file_number: idx as u8,
                next_sector: 0,
                used: 0,
                dos1_eof: true,
            };
            let no_fileno = sector > 1023 && self.variant == Variant::MyDos;
            trailer.write(sec, self.variant, no_fileno);
        }
        let n83 = Name83::parse(&name).map_err(|_| Error::NameTooLong)?;
        let (name_field, ext_field) = n83.to_dos_fields();
        let entry = DirEntry {
            flags: self.default_flags_for_sector(sector),
            sector_count: 1,
            first_sector: sector as u16,
            name: name_field,
            ext: ext_field,
        };
        directory::write_entry(&mut self.container, dir_base, idx, &entry)?;

        if dir_base == self.root_base && crate::common::names_equal(&lookup, "DOS.SYS") {
            let root_base = self.root_base;
            let variant = self.variant;
            let mut boot = crate::boot::BootRegion::new(&mut self.container, 3);
            let _ = boot.patch_dos_sys(1, sector as u16);
            let _ = (root_base, variant); // constants retained for future variants needing them
        }
        Ok(())
    }

    fn mkdir(&mut self, path: &str) -> FsResult<()> {
        if self.variant != Variant::MyDos {
            return Err(Error::InvalidArgument);
        }
        let comps = crate::common::split_path(path);
        if comps.is_empty() {
            return Err(Error::InvalidArgument);
        }
        let mut comps = comps;
        let name = comps.pop().unwrap();
        let parent = comps.join("/");
        let dir_base = self.resolve_dir_base(&parent)?;
        let lookup = lookup_name(&name)?;
        if directory::find_by_name(&self.container, dir_base, &lookup)?.is_some() {
            return Err(Error::AlreadyExists);
        }
        let idx = directory::find_free_slot(&self.container, dir_base)?.ok_or(Error::NoSpace)?;
        let base = self.find_contiguous_free(DIR_SECTORS)?;
        for s in base..base + DIR_SECTORS {
            vtoc::set_free(&mut self.container, self.variant, s, false)?;
            let sec = self.container.sector_mut(s).map_err(|_| Error::Io)?;
            for b in sec.iter_mut() {
                *b = 0;
            }
        }
        let n83 = Name83::parse(&name).map_err(|_| Error::NameTooLong)?;
        let (name_field, ext_field) = n83.to_dos_fields();
        let entry = DirEntry {
            flags: flag::IN_USE | flag::DIRECTORY,
            sector_count: DIR_SECTORS as u16,
            first_sector: base as u16,
            name: name_field,
            ext: ext_field,
        };
        directory::write_entry(&mut self.container, dir_base, idx, &entry)
    }

    fn unlink(&mut self, path: &str) -> FsResult<()> {
        let (dir_base, idx, entry) = self.find_entry(path)?;
        if entry.is_dir() {
            return Err(Error::IsADirectory);
        }
        if entry.is_locked() {
            return Err(Error::PermissionDenied);
        }
        let (sectors, _) = self.walk_chain(&entry)?;
        for s in sectors {
            vtoc::free_sector(&mut self.container, self.variant, s)?;
        }
        let deleted = DirEntry {
            flags: flag::DELETED,
            ..entry
        };
        directory::write_entry(&mut self.container, dir_base, idx, &deleted)
    }

    fn rmdir(&mut self, path: &str) -> FsResult<()> {
        let (dir_base, idx, entry) = self.find_entry(path)?;
        if !entry.is_dir() {
            return Err(Error::NotADirectory);
        }
        let child_base = entry.first_sector as u32;
        if directory::scan(&self.container, child_base)?
            .iter()
            .any(|(_, e)| !e.is_deleted())
        {
            return Err(Error::NotEmpty);
        }
        for s in child_base..child_base + entry.sector_count as u32 {
            vtoc::free_sector(&mut self.container, self.variant, s)?;
        }
        let deleted = DirEntry {
            flags: flag::DELETED,
            ..entry
        };
        directory::write_entry(&mut self.container, dir_base, idx, &deleted)
    }

    fn rename(&mut self, old: &str, new: &str, flags: RenameFlags) -> FsResult<()> {
        let (old_dir, old_idx, old_entry) = self.find_entry(old)?;
        if old_entry.is_locked() {
            return Err(Error::PermissionDenied);
        }
        let mut new_comps = crate::common::split_path(new);
        if new_comps.is_empty() {
            return Err(Error::InvalidArgument);
        }
        let new_name = new_comps.pop().unwrap();
        let new_parent = new_comps.join("/");
        let new_dir = self.resolve_dir_base(&new_parent)?;
        let n83 = Name83::parse(&new_name).map_err(|_| Error::NameTooLong)?;
        let (name_field, ext_field) = n83.to_dos_fields();

        if let Some((new_idx, new_entry)) = directory::find_by_name(&self.container, new_dir, &lookup_name(&new_name)?)? {
            if new_dir == old_dir && new_idx == old_idx {
                // renaming to the same slot: nothing to do
                return Ok(());
            }
            if flags.noreplace {
                return Err(Error::AlreadyExists);
            }
            if flags.exchange {
                let swapped_old = DirEntry {
                    flags: new_entry.flags,
                    sector_count: new_entry.sector_count,
                    first_sector: new_entry.first_sector,
                    name: old_entry.name,
                    ext: old_entry.ext,
                };
                let swapped_new = DirEntry {
                    flags: old_entry.flags,
                    sector_count: old_entry.sector_count,
                    first_sector: old_entry.first_sector,
                    name: new_entry.name,
                    ext: new_entry.ext,
                };
                directory::write_entry(&mut self.container, old_dir, old_idx, &swapped_old)?;
                directory::write_entry(&mut self.container, new_dir, new_idx, &swapped_new)?;
                return Ok(());
            }
            if new_entry.is_dir() {
                if directory::scan(&self.container, new_entry.first_sector as u32)?
                    .iter()
                    .any(|(_, e)| !e.is_deleted())
                {
                    return Err(Error::NotEmpty);
                }
            }
            let (sectors, _) = if new_entry.is_dir() {
                (
                    (new_entry.first_sector as u32..new_entry.first_sector as u32 + new_entry.sector_count as u32)
                        .collect::<Vec<_>>(),
                    Vec::new(),
                )
            } else {
                self.walk_chain(&new_entry)?
            };
            for s in sectors {
                vtoc::free_sector(&mut self.container, self.variant, s)?;
            }
            let deleted = DirEntry {
                flags: flag::DELETED,
                ..new_entry
            };
            directory::write_entry(&mut self.container, new_dir, new_idx, &deleted)?;
        }

        if old_entry.is_dir() {
            let old_path_norm = format!("/{}", crate::common::split_path(old).join("/"));
            let new_path_norm = format!("/{}", crate::common::split_path(new).join("/"));
            if new_path_norm.starts_with(&format!("{}/", old_path_norm)) {
                return Err(Error::InvalidArgument);
            }
        }

        if new_dir == old_dir {
            let renamed = DirEntry {
                name: name_field,
                ext: ext_field,
                ..old_entry
            };
            return directory::write_entry(&mut self.container, old_dir, old_idx, &renamed);
        }

        let new_idx = directory::find_free_slot(&self.container, new_dir)?.ok_or(Error::NoSpace)?;
        let no_fileno = old_entry.flags & flag::NO_FILE_NUMBER != 0;
        if self.variant.uses_file_numbers() && !no_fileno && !old_entry.is_dir() {
            let (sectors, _) = self.walk_chain(&old_entry)?;
            for s in sectors {
                let sec = self.container.sector_mut(s).map_err(|_| Error::Io)?;
                let mut trailer = Trailer::read(sec, self.variant, no_fileno);
                trailer.file_number = new_idx as u8;
                trailer.write(sec, self.variant, no_fileno);
            }
        }
        let moved = DirEntry {
            name: name_field,
            ext: ext_field,
            ..old_entry
        };
        directory::write_entry(&mut self.container, new_dir, new_idx, &moved)?;
        let deleted = DirEntry {
            flags: flag::DELETED,
            ..old_entry
        };
        directory::write_entry(&mut self.container, old_dir, old_idx, &deleted)
    }

    fn chmod(&mut self, path: &str, writable: bool) -> FsResult<()> {
        let (dir_base, idx, mut entry) = self.find_entry(path)?;
        if writable {
            entry.flags &= !flag::LOCKED;
        } else {
            entry.flags |= flag::LOCKED;
        }
        directory::write_entry(&mut self.container, dir_base, idx, &entry)
    }

    fn truncate(&mut self, path: &str, size: u64) -> FsResult<()> {
        let (dir_base, idx, mut entry) = self.find_entry(path)?;
        if entry.is_dir() {
            return Err(Error::IsADirectory);
        }
        if entry.is_locked() {
            return Err(Error::PermissionDenied);
        }
        let (sectors, data) = self.walk_chain(&entry)?;
        let cur_len = data.len() as u64;
        if size == cur_len {
            return Ok(());
        }
        if size > cur_len {
            let zeros = vec![0u8; (size - cur_len) as usize];
            self.write(path, &zeros, cur_len)?;
            return Ok(());
        }
        let payload_cap = self.container.sector_size as usize - 3;
        let keep = usize::max(1, ((size as usize) + payload_cap - 1) / payload_cap.max(1));
        let keep = usize::min(keep, sectors.len());
        let no_fileno = entry.flags & flag::NO_FILE_NUMBER != 0;
        for &s in &sectors[keep..] {
            vtoc::free_sector(&mut self.container, self.variant, s)?;
        }
        if let Some(&last_kept) = sectors[..keep].last() {
            let used_in_last = (size as usize) - (keep - 1) * payload_cap;
            let sec = self.container.sector_mut(last_kept).map_err(|_| Error::Io)?;
            let trailer = Trailer {
                file_number: idx as u8,
                next_sector: 0,
                used: used_in_last as u8,
                dos1_eof: true,
            };
            trailer.write(sec, self.variant, no_fileno);
        }
        entry.sector_count = keep as u16;
        directory::write_entry(&mut self.container, dir_base, idx, &entry)
    }

    fn utimens(&mut self, _path: &str, _times: Utimens) -> FsResult<()> {
        // DOS-family directory entries carry no timestamp fields.
        Ok(())
    }

    fn statfs(&self) -> FsResult<StatFs> {
        Ok(StatFs {
            total_sectors: self.container.sector_count as u64,
            free_sectors: vtoc::free_count(&self.container, self.variant)?,
            files: if self.variant == Variant::MyDos { 0 } else { ENTRIES_PER_DIR as u64 },
        })
    }

    fn fs_name(&self) -> &'static str {
        self.variant.name()
    }

    fn chain_sectors(&self, path: &str) -> FsResult<Vec<u32>> {
        let comps = crate::common::split_path(path);
        if comps.is_empty() {
            return Ok((self.root_base..self.root_base + DIR_SECTORS).collect());
        }
        let mut comps = comps;
        let last = comps.pop().unwrap();
        let (stripped, _) = strip_info(&last);
        comps.push(stripped);
        let path2 = comps.join("/");
        let (_, _, entry) = self.find_entry(&path2)?;
        if entry.is_dir() {
            let base = entry.first_sector as u32;
            Ok((base..base + entry.sector_count as u32).collect())
        } else {
            let (sectors, _) = self.walk_chain(&entry)?;
            Ok(sectors)
        }
    }
}
