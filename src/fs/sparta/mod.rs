//! # Sparta/SDFS engine
//!
//! Unlike the DOS family's per-sector trailer chains, Sparta files are
//! addressed through a sector-map ("inode"): a small tree of map sectors each
//! holding an array of data-sector pointers, zero meaning a sparse hole
//! (`spec.md` §4.4). Directories are themselves map-addressed byte streams of
//! 23-byte entries, so `read_via_map`/`write_via_map` below serve both files
//! and directories.

pub mod bitmap;
pub mod types;

use chrono::{Datelike, Local, TimeZone, Timelike};
use log::debug;

use crate::common::{le16, names_equal, put_le16, split_path, validate_sparta_chars, Name83};
use crate::container::Container;
use crate::fs::{DirEntryInfo, Engine, Error, FsResult, RenameFlags, Resolved, StatFs, Utimens};
use types::{status, DirEntry, DirHeader, MapHeader, SpartaTime, VolumeHeader, DIRENT_LEN, MAP_HEADER_LEN};

fn strip_info(raw: &str) -> (String, bool) {
    if raw.len() > 5 && raw[raw.len() - 5..].eq_ignore_ascii_case(".info") {
        (raw[..raw.len() - 5].to_string(), true)
    } else {
        (raw.to_string(), false)
    }
}

pub struct SpartaFs {
    container: Container,
    header: VolumeHeader,
}

impl SpartaFs {
    pub fn new(container: Container) -> FsResult<Self> {
        let header = {
            let sec1 = container.sector(1).map_err(|_| Error::Io)?;
            VolumeHeader::from_bytes(sec1)
        };
        Ok(Self { container, header })
    }

    pub fn into_container(mut self) -> Container {
        let sec1 = self.container.sector_mut(1).expect("sector 1 always addressable");
        self.header.write(sec1);
        self.container
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn container_mut(&mut self) -> &mut Container {
        &mut self.container
    }

    /// Validity predicate used by the detection sweep (`spec.md` §4.2).
    pub fn sanity(container: &Container) -> bool {
        if container.sector_size == 512 {
            // 512-byte-sector SpartaDOS images are a stubbed, unsupported case.
            return false;
        }
        let sec1 = match container.sector(1) {
            Ok(s) => s,
            Err(_) => return false,
        };
        if sec1[types::SECTOR1_MARKER_OFFSET] != types::SECTOR1_MARKER {
            return false;
        }
        let header = VolumeHeader::from_bytes(sec1);
        if header.sectors as u32 > container.sector_count {
            debug!("Sparta: header sector count exceeds image");
            return false;
        }
        if header.free > header.sectors {
            debug!("Sparta: free counter exceeds total sectors");
            return false;
        }
        if header.first_bitmap == 0 || header.dir == 0 {
            return false;
        }
        if header.first_bitmap as u32 + header.bitmap_sectors as u32 > container.sector_count + 1 {
            debug!("Sparta: bitmap run runs past the end of the image");
            return false;
        }
        true
    }

    fn now(&self) -> SpartaTime {
        let n = Local::now();
        SpartaTime::pack(n.year(), n.month() as u8, n.day() as u8, n.hour() as u8, n.minute() as u8, n.second() as u8)
    }

    /// Interpret a `SpartaTime` as a local wall-clock time and convert to
    /// Unix seconds, for `.info` display and `utimens` round-tripping. `None`
    /// if the fields don't name a valid calendar time (e.g. a never-written
    /// blank entry).
    fn sparta_time_to_unix(t: SpartaTime) -> Option<i64> {
        Local
            .with_ymd_and_hms(t.full_year(), t.month as u32, t.day as u32, t.hour as u32, t.minute as u32, t.second as u32)
            .single()
            .map(|dt| dt.timestamp())
    }

    fn get_sector_ro(&self, first_map: u16, seq: usize) -> FsResult<u32> {
        let slots_per = MapHeader::slots_per_sector(self.container.sector_size);
        let mut map_sector = first_map as u32;
        let mut remaining = seq;
        let mut prev: u32 = 0;
        let mut first = true;
        loop {
            if map_sector == 0 {
                return Ok(0);
            }
            let sec = self.container.sector(map_sector).map_err(|_| Error::Io)?;
            let maphdr = MapHeader::from_bytes(sec);
            if !first && maphdr.previous_map_sector as u32 != prev {
                return Err(Error::CorruptChain);
            }
            first = false;
            if remaining < slots_per {
                let off = MAP_HEADER_LEN + remaining * 2;
                return Ok(le16(&sec[off..off + 2]) as u32);
            }
            remaining -= slots_per;
            prev = map_sector;
            map_sector = maphdr.next_map_sector as u32;
        }
    }

    fn get_sector_rw(&mut self, first_map: u16, seq: usize) -> FsResult<u32> {
        let slots_per = MapHeader::slots_per_sector(self.container.sector_size);
        let mut map_sector = first_map as u32;
        if map_sector == 0 {
            return Err(Error::CorruptChain);
        }
        let mut remaining = seq;
        loop {
            let maphdr = {
                let sec = self.container.sector(map_sector).map_err(|_| Error::Io)?;
                MapHeader::from_bytes(sec)
            };
            if remaining < slots_per {
                let off = MAP_HEADER_LEN + remaining * 2;
                let existing = {
                    let sec = self.container.sector(map_sector).map_err(|_| Error::Io)?;
                    le16(&sec[off..off + 2])
                };
                if existing != 0 {
                    return Ok(existing as u32);
                }
                let newsec = bitmap::allocate(&mut self.container, &mut self.header)?;
                let sec = self.container.sector_mut(map_sector).map_err(|_| Error::Io)?;
                put_le16(&mut sec[off..off + 2], newsec as u16);
                return Ok(newsec);
            }
            remaining -= slots_per;
            if maphdr.next_map_sector == 0 {
                let newmap = bitmap::allocate(&mut self.container, &mut self.header)?;
                {
                    let sec = self.container.sector_mut(map_sector).map_err(|_| Error::Io)?;
                    let mut h = MapHeader::from_bytes(sec);
                    h.next_map_sector = newmap as u16;
                    h.write(sec);
                }
                {
                    let sec = self.container.sector_mut(newmap).map_err(|_| Error::Io)?;
                    let h = MapHeader {
                        next_map_sector: 0,
                        previous_map_sector: map_sector as u16,
                    };
                    h.write(sec);
                }
                map_sector = newmap;
            } else {
                map_sector = maphdr.next_map_sector as u32;
            }
        }
    }

    fn alloc_new_map(&mut self) -> FsResult<u16> {
        let s = bitmap::allocate(&mut self.container, &mut self.header)?;
        Ok(s as u16)
    }

    fn read_via_map(&self, map_sector: u16, offset: usize, len: usize) -> FsResult<Vec<u8>> {
        let sector_size = self.container.sector_size as usize;
        let mut out = vec![0u8; len];
        let mut pos = offset;
        let mut cursor = 0;
        while cursor < len {
            let seq = pos / sector_size;
            let in_off = pos % sector_size;
            let take = usize::min(len - cursor, sector_size - in_off);
            let sec_num = self.get_sector_ro(map_sector, seq)?;
            if sec_num != 0 {
                let sec = self.container.sector(sec_num).map_err(|_| Error::Io)?;
                out[cursor..cursor + take].copy_from_slice(&sec[in_off..in_off + take]);
            }
            pos += take;
            cursor += take;
        }
        Ok(out)
    }

    /// Write `data` at `offset` within the byte-stream addressed by
    /// `map_sector`, allocating data/map sectors as needed. Returns the
    /// number of bytes actually written; stops (without error) at the first
    /// allocation failure so the partial write already committed survives
    /// (`spec.md` §4.3 `write`, shared by Sparta per §4.4 "mirror §4.3").
    fn write_via_map(&mut self, map_sector: u16, offset: usize, data: &[u8]) -> FsResult<usize> {
        let sector_size = self.container.sector_size as usize;
        let mut pos = offset;
        let mut cursor = 0;
        while cursor < data.len() {
            let seq = pos / sector_size;
            let in_off = pos % sector_size;
            let take = usize::min(data.len() - cursor, sector_size - in_off);
            let sec_num = match self.get_sector_rw(map_sector, seq) {
                Ok(s) => s,
                Err(Error::NoSpace) => break,
                Err(e) => return Err(e),
            };
            let sec = self.container.sector_mut(sec_num).map_err(|_| Error::Io)?;
            sec[in_off..in_off + take].copy_from_slice(&data[cursor..cursor + take]);
            pos += take;
            cursor += take;
        }
        Ok(cursor)
    }

    fn get_dir_header(&self, dir_map: u16) -> FsResult<DirHeader> {
        Ok(DirHeader::from_bytes(&self.read_via_map(dir_map, 0, DIRENT_LEN)?))
    }

    fn put_dir_header(&mut self, dir_map: u16, header: &DirHeader) -> FsResult<()> {
        self.write_via_map(dir_map, 0, &header.to_bytes())?;
        Ok(())
    }

    fn get_dirent(&self, dir_map: u16, index: usize) -> FsResult<DirEntry> {
        Ok(DirEntry::from_bytes(&self.read_via_map(dir_map, index * DIRENT_LEN, DIRENT_LEN)?))
    }

    fn put_dirent(&mut self, dir_map: u16, index: usize, bytes: &[u8; DIRENT_LEN]) -> FsResult<()> {
        self.write_via_map(dir_map, index * DIRENT_LEN, bytes)?;
        Ok(())
    }

    fn find_entry_in_dir(&self, dir_map: u16, name: &str) -> FsResult<Option<(usize, DirEntry)>> {
        let header = self.get_dir_header(dir_map)?;
        let count = header.length as usize / DIRENT_LEN;
        for idx in 1..count {
            let e = self.get_dirent(dir_map, idx)?;
            if e.is_blank() {
                continue;
            }
            if !e.is_deleted() && names_equal(&e.display_name(), name) {
                return Ok(Some((idx, e)));
            }
        }
        Ok(None)
    }

    fn find_free_slot(&mut self, dir_map: u16) -> FsResult<usize> {
        let header = self.get_dir_header(dir_map)?;
        let count = header.length as usize / DIRENT_LEN;
        for idx in 1..count {
            let e = self.get_dirent(dir_map, idx)?;
            if e.is_blank() || e.is_deleted() {
                return Ok(idx);
            }
        }
        self.extend_directory(dir_map)
    }

    /// Append one blank entry at the tail, enforcing the per-revision entry
    /// count ceiling (`spec.md` §4.4 `extend_directory`).
    fn extend_directory(&mut self, dir_map: u16) -> FsResult<usize> {
        let mut header = self.get_dir_header(dir_map)?;
        let count = header.length as usize / DIRENT_LEN;
        if count + 1 > self.header.entry_limit() {
            return Err(Error::NoSpace);
        }
        let blank = DirEntry {
            status: 0,
            map_sector: 0,
            size: 0,
            name: [0; 11],
            modified: SpartaTime::default(),
        };
        self.put_dirent(dir_map, count, &blank.to_bytes())?;
        header.length += DIRENT_LEN as u32;
        self.put_dir_header(dir_map, &header)?;
        Ok(count)
    }

    fn find_entry_path(&self, path: &str) -> FsResult<(u16, usize, DirEntry)> {
        let comps = split_path(path);
        if comps.is_empty() {
            return Err(Error::IsADirectory);
        }
        let mut dir_map = self.header.dir;
        let n = comps.len();
        for (i, raw) in comps.iter().enumerate() {
            match self.find_entry_in_dir(dir_map, raw)? {
                Some((idx, entry)) => {
                    if i == n - 1 {
                        return Ok((dir_map, idx, entry));
                    }
                    if !entry.is_dir() {
                        return Err(Error::NotADirectory);
                    }
                    dir_map = entry.map_sector;
                }
                None => return Err(Error::NotFound),
            }
        }
        unreachable!()
    }

    fn resolve_dir_map(&self, path: &str) -> FsResult<u16> {
        let comps = split_path(path);
        if comps.is_empty() {
            return Ok(self.header.dir);
        }
        let (_, _, entry) = self.find_entry_path(path)?;
        if !entry.is_dir() {
            return Err(Error::NotADirectory);
        }
        Ok(entry.map_sector)
    }

    fn free_map_chain(&mut self, first_map: u16) -> FsResult<()> {
        let slots_per = MapHeader::slots_per_sector(self.container.sector_size);
        let mut map_sector = first_map as u32;
        while map_sector != 0 {
            let (maphdr, slots) = {
                let sec = self.container.sector(map_sector).map_err(|_| Error::Io)?;
                let h = MapHeader::from_bytes(sec);
                let mut v = Vec::with_capacity(slots_per);
                for i in 0..slots_per {
                    let off = MAP_HEADER_LEN + i * 2;
                    v.push(le16(&sec[off..off + 2]));
                }
                (h, v)
            };
            for s in slots {
                if s != 0 {
                    bitmap::free_sector(&mut self.container, &mut self.header, s as u32)?;
                }
            }
            let next = maphdr.next_map_sector;
            bitmap::free_sector(&mut self.container, &mut self.header, map_sector)?;
            map_sector = next as u32;
        }
        Ok(())
    }

    /// Every non-hole data sector addressed by `map_sector` over `length`
    /// bytes, in traversal order (`spec.md` §4.6 "compacted sector list").
    fn data_sectors(&self, map_sector: u16, length: usize) -> FsResult<Vec<u32>> {
        let sector_size = self.container.sector_size as usize;
        let count = (length + sector_size - 1) / sector_size;
        let mut out = Vec::with_capacity(count);
        for seq in 0..count {
            let s = self.get_sector_ro(map_sector, seq)?;
            if s != 0 {
                out.push(s);
            }
        }
        Ok(out)
    }

    /// Refreshes the parent's directory entry for `dir_map` after a mutation
    /// that may have changed its contents: timestamp, and the `size` field,
    /// which must always mirror the child's own `header.length`
    /// (`spec.md` §8 "parent's file-size field equals the child's header's
    /// length field, in both directions").
    fn touch_parent(&mut self, dir_map: u16) -> FsResult<()> {
        let header = self.get_dir_header(dir_map)?;
        if header.parent_map_sector == 0 {
            return Ok(());
        }
        let parent_map = header.parent_map_sector;
        let phdr = self.get_dir_header(parent_map)?;
        let count = phdr.length as usize / DIRENT_LEN;
        let now = self.now();
        for idx in 1..count {
            let mut e = self.get_dirent(parent_map, idx)?;
            if !e.is_blank() && !e.is_deleted() && e.map_sector == dir_map {
                e.modified = now;
                e.size = header.length;
                self.put_dirent(parent_map, idx, &e.to_bytes())?;
                break;
            }
        }
        Ok(())
    }
}

impl Engine for SpartaFs {
    fn resolve(&self, path: &str) -> FsResult<Resolved> {
        let comps = split_path(path);
        if comps.is_empty() {
            let header = self.get_dir_header(self.header.dir)?;
            return Ok(Resolved {
                starting_sector: self.header.dir,
                parent_dir_sector: 0,
                sector_count: 0,
                locked: false,
                file_number: None,
                dir_entry_index: None,
                is_dir: true,
                is_info: false,
                size: header.length as u64,
                modified: Self::sparta_time_to_unix(header.created),
            });
        }
        let mut comps = comps;
        let last = comps.pop().unwrap();
        let (stripped, is_info) = strip_info(&last);
        comps.push(stripped);
        let path2 = comps.join("/");
        match self.find_entry_path(&path2) {
            Ok((dir_map, idx, entry)) => {
                let size = if entry.is_dir() {
                    self.get_dir_header(entry.map_sector)?.length as u64
                } else {
                    entry.size as u64
                };
                Ok(Resolved {
                    starting_sector: entry.map_sector,
                    parent_dir_sector: dir_map,
                    sector_count: 0,
                    locked: entry.is_locked(),
                    file_number: None,
                    dir_entry_index: Some(idx),
                    is_dir: entry.is_dir(),
                    is_info,
                    size,
                    modified: Self::sparta_time_to_unix(entry.modified),
                })
            }
            Err(e) => Err(e),
        }
    }

    fn readdir(&self, path: &str) -> FsResult<Vec<DirEntryInfo>> {
        let dir_map = self.resolve_dir_map(path)?;
        let header = self.get_dir_header(dir_map)?;
        let count = header.length as usize / DIRENT_LEN;
        let mut out = Vec::new();
        for idx in 1..count {
            let e = self.get_dirent(dir_map, idx)?;
            if e.is_blank() || e.is_deleted() {
                continue;
            }
            let size = if e.is_dir() {
                self.get_dir_header(e.map_sector)?.length as u64
            } else {
                e.size as u64
            };
            out.push(DirEntryInfo {
                name: e.display_name(),
                is_dir: e.is_dir(),
                locked: e.is_locked(),
                size,
            });
        }
        Ok(out)
    }

    fn read(&self, path: &str, offset: u64, size: usize) -> FsResult<Vec<u8>> {
        let (_, _, entry) = self.find_entry_path(path)?;
        if entry.is_dir() {
            return Err(Error::IsADirectory);
        }
        let total = entry.size as usize;
        let start = offset as usize;
        if start >= total {
            return Ok(Vec::new());
        }
        let take = usize::min(size, total - start);
        self.read_via_map(entry.map_sector, start, take)
    }

    fn write(&mut self, path: &str, buf: &[u8], offset: u64) -> FsResult<usize> {
        let (dir_map, idx, mut entry) = self.find_entry_path(path)?;
        if entry.is_dir() {
            return Err(Error::IsADirectory);
        }
        if entry.is_locked() {
            return Err(Error::PermissionDenied);
        }
        let offset = offset as usize;
        let written = self.write_via_map(entry.map_sector, offset, buf)?;
        if written == 0 && !buf.is_empty() {
            return Err(Error::NoSpace);
        }
        entry.size = usize::max(entry.size as usize, offset + written) as u32;
        entry.modified = self.now();
        self.put_dirent(dir_map, idx, &entry.to_bytes())?;
        self.touch_parent(dir_map)?;
        Ok(written)
    }

    fn create(&mut self, path: &str) -> FsResult<()> {
        let mut comps = split_path(path);
        if comps.is_empty() {
            return Err(Error::InvalidArgument);
        }
        let name = comps.pop().unwrap();
        validate_sparta_chars(&name)?;
        let parent = comps.join("/");
        let dir_map = self.resolve_dir_map(&parent)?;
        if self.find_entry_in_dir(dir_map, &name)?.is_some() {
            return Err(Error::AlreadyExists);
        }
        let map_sector = self.alloc_new_map()?;
        let now = self.now();
        let n83 = Name83::parse(&name).map_err(|_| Error::NameTooLong)?;
        let entry = DirEntry {
            status: status::IN_USE,
            map_sector,
            size: 0,
            name: n83.to_sparta_field(),
            modified: now,
        };
        let idx = self.find_free_slot(dir_map)?;
        self.put_dirent(dir_map, idx, &entry.to_bytes())?;
        self.touch_parent(dir_map)
    }

    fn mkdir(&mut self, path: &str) -> FsResult<()> {
        let mut comps = split_path(path);
        if comps.is_empty() {
            return Err(Error::InvalidArgument);
        }
        let name = comps.pop().unwrap();
        validate_sparta_chars(&name)?;
        let parent = comps.join("/");
        let dir_map = self.resolve_dir_map(&parent)?;
        if self.find_entry_in_dir(dir_map, &name)?.is_some() {
            return Err(Error::AlreadyExists);
        }
        let new_map = self.alloc_new_map()?;
        let now = self.now();
        let n83 = Name83::parse(&name).map_err(|_| Error::NameTooLong)?;
        let header = DirHeader {
            status: 0,
            parent_map_sector: dir_map,
            length: (2 * DIRENT_LEN) as u32,
            name: n83.to_sparta_field(),
            created: now,
        };
        self.put_dir_header(new_map, &header)?;
        let entry = DirEntry {
            status: status::IN_USE | status::DIRECTORY,
            map_sector: new_map,
            size: (2 * DIRENT_LEN) as u32,
            name: n83.to_sparta_field(),
            modified: now,
        };
        let idx = self.find_free_slot(dir_map)?;
        self.put_dirent(dir_map, idx, &entry.to_bytes())?;
        self.touch_parent(dir_map)
    }

    fn unlink(&mut self, path: &str) -> FsResult<()> {
        let (dir_map, idx, entry) = self.find_entry_path(path)?;
        if entry.is_dir() {
            return Err(Error::IsADirectory);
        }
        if entry.is_locked() {
            return Err(Error::PermissionDenied);
        }
        self.free_map_chain(entry.map_sector)?;
        let deleted = DirEntry {
            status: status::DELETED,
            ..entry
        };
        self.put_dirent(dir_map, idx, &deleted.to_bytes())?;
        self.touch_parent(dir_map)
    }

    fn rmdir(&mut self, path: &str) -> FsResult<()> {
        let (dir_map, idx, entry) = self.find_entry_path(path)?;
        if !entry.is_dir() {
            return Err(Error::NotADirectory);
        }
        let child_map = entry.map_sector;
        let header = self.get_dir_header(child_map)?;
        let count = header.length as usize / DIRENT_LEN;
        for i in 1..count {
            let e = self.get_dirent(child_map, i)?;
            if !e.is_blank() && !e.is_deleted() {
                return Err(Error::NotEmpty);
            }
        }
        self.free_map_chain(child_map)?;
        let deleted = DirEntry {
            status: status::DELETED,
            ..entry
        };
        self.put_dirent(dir_map, idx, &deleted.to_bytes())?;
        self.touch_parent(dir_map)
    }

    fn rename(&mut self, old: &str, new: &str, flags: RenameFlags) -> FsResult<()> {
        let (old_dir, old_idx, old_entry) = self.find_entry_path(old)?;
        if old_entry.is_locked() {
            return Err(Error::PermissionDenied);
        }
        let mut new_comps = split_path(new);
        if new_comps.is_empty() {
            return Err(Error::InvalidArgument);
        }
        let new_name = new_comps.pop().unwrap();
        validate_sparta_chars(&new_name)?;
        let new_parent = new_comps.join("/");
        let new_dir = self.resolve_dir_map(&new_parent)?;
        let n83 = Name83::parse(&new_name).map_err(|_| Error::NameTooLong)?;
        let field = n83.to_sparta_field();

        if let Some((new_idx, new_entry)) = self.find_entry_in_dir(new_dir, &new_name)? {
            if new_dir == old_dir && new_idx == old_idx {
                return Ok(());
            }
            if flags.noreplace {
                return Err(Error::AlreadyExists);
            }
            if flags.exchange {
                let now = self.now();
                let swapped_old = DirEntry {
                    status: new_entry.status,
                    map_sector: new_entry.map_sector,
                    size: new_entry.size,
                    name: old_entry.name,
                    modified: now,
                };
                let swapped_new = DirEntry {
                    status: old_entry.status,
                    map_sector: old_entry.map_sector,
                    size: old_entry.size,
                    name: new_entry.name,
                    modified: now,
                };
                self.put_dirent(old_dir, old_idx, &swapped_old.to_bytes())?;
                self.put_dirent(new_dir, new_idx, &swapped_new.to_bytes())?;
                return Ok(());
            }
            if new_entry.is_dir() {
                let h = self.get_dir_header(new_entry.map_sector)?;
                let cnt = h.length as usize / DIRENT_LEN;
                for i in 1..cnt {
                    let e = self.get_dirent(new_entry.map_sector, i)?;
                    if !e.is_blank() && !e.is_deleted() {
                        return Err(Error::NotEmpty);
                    }
                }
            }
            self.free_map_chain(new_entry.map_sector)?;
            let deleted = DirEntry {
                status: status::DELETED,
                ..new_entry
            };
            self.put_dirent(new_dir, new_idx, &deleted.to_bytes())?;
        }

        if old_entry.is_dir() {
            let old_norm = format!("/{}", split_path(old).join("/"));
            let new_norm = format!("/{}", split_path(new).join("/"));
            if new_norm.starts_with(&format!("{}/", old_norm)) {
                return Err(Error::InvalidArgument);
            }
            let mut h = self.get_dir_header(old_entry.map_sector)?;
            h.name = field;
            h.parent_map_sector = new_dir;
            self.put_dir_header(old_entry.map_sector, &h)?;
        }

        if new_dir == old_dir {
            let renamed = DirEntry { name: field, ..old_entry };
            self.put_dirent(old_dir, old_idx, &renamed.to_bytes())?;
            return Ok(());
        }

        let new_idx = self.find_free_slot(new_dir)?;
        let moved = DirEntry { name: field, ..old_entry };
        self.put_dirent(new_dir, new_idx, &moved.to_bytes())?;
        let deleted = DirEntry {
            status: status::DELETED,
            ..old_entry
        };
        self.put_dirent(old_dir, old_idx, &deleted.to_bytes())?;
        self.touch_parent(old_dir)?;
        self.touch_parent(new_dir)
    }

    fn chmod(&mut self, path: &str, writable: bool) -> FsResult<()> {
        let (dir_map, idx, mut entry) = self.find_entry_path(path)?;
        if writable {
            entry.status &= !status::LOCKED;
        } else {
            entry.status |= status::LOCKED;
        }
        self.put_dirent(dir_map, idx, &entry.to_bytes())
    }

    fn truncate(&mut self, path: &str, size: u64) -> FsResult<()> {
        let (dir_map, idx, mut entry) = self.find_entry_path(path)?;
        if entry.is_dir() {
            return Err(Error::IsADirectory);
        }
        if entry.is_locked() {
            return Err(Error::PermissionDenied);
        }
        let cur = entry.size as u64;
        if size == cur {
            return Ok(());
        }
        if size > cur {
            let zeros = vec![0u8; (size - cur) as usize];
            let written = self.write_via_map(entry.map_sector, cur as usize, &zeros)?;
            entry.size = cur as u32 + written as u32;
        } else {
            let sector_size = self.container.sector_size as usize;
            let slots_per = MapHeader::slots_per_sector(self.container.sector_size);
            let new_last_seq = if size == 0 { 0 } else { (size as usize - 1) / sector_size };
            let keep_map_index = new_last_seq / slots_per;
            let mut map_sector = entry.map_sector as u32;
            let mut map_idx = 0usize;
            loop {
                if map_sector == 0 {
                    break;
                }
                let maphdr = {
                    let sec = self.container.sector(map_sector).map_err(|_| Error::Io)?;
                    MapHeader::from_bytes(sec)
                };
                if map_idx == keep_map_index {
                    let local_cut = if size == 0 { 0 } else { new_last_seq % slots_per + 1 };
                    let mut slots = vec![0u16; slots_per];
                    {
                        let sec = self.container.sector(map_sector).map_err(|_| Error::Io)?;
                        for i in 0..slots_per {
                            let off = MAP_HEADER_LEN + i * 2;
                            slots[i] = le16(&sec[off..off + 2]);
                        }
                    }
                    for slot in slots.iter_mut().skip(local_cut) {
                        if *slot != 0 {
                            bitmap::free_sector(&mut self.container, &mut self.header, *slot as u32)?;
                            *slot = 0;
                        }
                    }
                    let next = maphdr.next_map_sector;
                    {
                        let sec = self.container.sector_mut(map_sector).map_err(|_| Error::Io)?;
                        let mut h = maphdr;
                        h.next_map_sector = 0;
                        h.write(sec);
                        for (i, slot) in slots.iter().enumerate() {
                            let off = MAP_HEADER_LEN + i * 2;
                            put_le16(&mut sec[off..off + 2], *slot);
                        }
                    }
                    if next != 0 {
                        self.free_map_chain(next)?;
                    }
                    break;
                }
                map_idx += 1;
                map_sector = maphdr.next_map_sector as u32;
            }
            entry.size = size as u32;
        }
        self.put_dirent(dir_map, idx, &entry.to_bytes())?;
        self.touch_parent(dir_map)
    }

    fn utimens(&mut self, path: &str, times: Utimens) -> FsResult<()> {
        let (dir_map, idx, mut entry) = self.find_entry_path(path)?;
        if let Some(mt) = times.mtime {
            if let Some(dt) = Local.timestamp_opt(mt, 0).single() {
                entry.modified =
                    SpartaTime::pack(dt.year(), dt.month() as u8, dt.day() as u8, dt.hour() as u8, dt.minute() as u8, dt.second() as u8);
            }
        }
        self.put_dirent(dir_map, idx, &entry.to_bytes())
    }

    fn statfs(&self) -> FsResult<StatFs> {
        Ok(StatFs {
            total_sectors: self.container.sector_count as u64,
            free_sectors: self.header.free as u64,
            files: 0,
        })
    }

    fn fs_name(&self) -> &'static str {
        "SpartaDOS"
    }

    fn chain_sectors(&self, path: &str) -> FsResult<Vec<u32>> {
        let mut comps = split_path(path);
        if comps.is_empty() {
            let header = self.get_dir_header(self.header.dir)?;
            return self.data_sectors(self.header.dir, header.length as usize);
        }
        let last = comps.pop().unwrap();
        let (stripped, _) = strip_info(&last);
        comps.push(stripped);
        let path2 = comps.join("/");
        let (_, _, entry) = self.find_entry_path(&path2)?;
        if entry.is_dir() {
            let header = self.get_dir_header(entry.map_sector)?;
            self.data_sectors(entry.map_sector, header.length as usize)
        } else {
            self.data_sectors(entry.map_sector, entry.size as usize)
        }
    }
}
