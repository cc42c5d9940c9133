//! # FileSystemFacade
//!
//! The single VFS-like callback surface the host mounts against
//! (`spec.md` §4.5, §6.5). Every call first checks whether `path` names one
//! of the synthetic dotfiles (`.bootinfo`, `.bootsectors`, `.fsinfo` at the
//! root, `.info` appended to any path) and, if not, dispatches to whichever
//! `Engine` the image was detected as.
//!
//! Methods mirror the POSIX-ish surface of `spec.md` §6.5 directly: `read`
//! and `write` return a byte count or a negative `errno`, matching what a
//! FUSE-style host expects to see verbatim.

use log::warn;

use crate::boot::BootRegion;
use crate::container::Container;
use crate::detect::Detected;
use crate::diag;
use crate::fs::{DirEntryInfo, Engine, Error, FsResult, RenameFlags, StatFs, Utimens};

const BOOT_SECTORS: u16 = 3;

/// `getattr`-style attribute bundle (`spec.md` §6.5 `getattr(path, stbuf)`).
#[derive(Debug, Clone, Copy)]
pub struct Attr {
    pub size: u64,
    pub is_dir: bool,
    pub writable: bool,
    pub modified: Option<i64>,
}

/// Which synthetic name, if any, `path` refers to.
enum Dotfile {
    BootInfo,
    BootSectors,
    FsInfo,
    Info(String),
}

fn classify(path: &str) -> Option<Dotfile> {
    let trimmed = path.trim_start_matches('/');
    match trimmed {
        ".bootinfo" => Some(Dotfile::BootInfo),
        ".bootsectors" => Some(Dotfile::BootSectors),
        ".fsinfo" => Some(Dotfile::FsInfo),
        _ => {
            if trimmed.len() > 5 && trimmed[trimmed.len() - 5..].eq_ignore_ascii_case(".info") {
                Some(Dotfile::Info(trimmed[..trimmed.len() - 5].to_string()))
            } else {
                None
            }
        }
    }
}

pub struct FileSystemFacade {
    detected: Detected,
}

impl FileSystemFacade {
    pub fn new(detected: Detected) -> Self {
        Self { detected }
    }

    pub fn into_container(self) -> Container {
        self.detected.into_container()
    }

    pub fn fs_name(&self) -> &'static str {
        self.detected.as_engine().fs_name()
    }

    fn boot_region(&mut self) -> BootRegion<'_> {
        let sectors = BOOT_SECTORS.min(self.detected.container().sector_count as u16);
        BootRegion::new(self.detected.container_mut(), sectors)
    }

    fn reject_if_read_only(&self) -> FsResult<()> {
        if self.detected.container().read_only {
            return Err(Error::PermissionDenied);
        }
        Ok(())
    }

    fn bootinfo_text(&mut self) -> FsResult<String> {
        let data = self.boot_region().read().map_err(|_| Error::Io)?;
        let flag = data.first().copied().unwrap_or(0);
        let start = if data.len() >= 3 {
            crate::common::le16(&data[1..3])
        } else {
            0
        };
        Ok(format!(
            "bootable: {}\nDOS start sector: {}\nboot region length: {} bytes\n",
            flag != 0,
            start,
            data.len()
        ))
    }

    fn fsinfo_text(&self) -> FsResult<String> {
        let stat = self.detected.as_engine().statfs()?;
        let c = self.detected.container();
        Ok(format!(
            "file system: {}\nsector size: {}\ntotal sectors: {}\nfree sectors: {}\nshort sectors: {}\nread only: {}\n",
            self.detected.as_engine().fs_name(),
            c.sector_size,
            stat.total_sectors,
            stat.free_sectors,
            c.short_sectors,
            c.read_only,
        ))
    }

    pub fn getattr(&mut self, path: &str) -> FsResult<Attr> {
        match classify(path) {
            Some(Dotfile::BootInfo) => Ok(Attr {
                size: self.bootinfo_text()?.len() as u64,
                is_dir: false,
                writable: false,
                modified: None,
            }),
            Some(Dotfile::BootSectors) => {
                let len = self.boot_region().read().map_err(|_| Error::Io)?.len() as u64;
                Ok(Attr {
                    size: len,
                    is_dir: false,
                    writable: true,
                    modified: None,
                })
            }
            Some(Dotfile::FsInfo) => Ok(Attr {
                size: self.fsinfo_text()?.len() as u64,
                is_dir: false,
                writable: false,
                modified: None,
            }),
            Some(Dotfile::Info(real)) => {
                let text = diag::render(&self.detected, &real)?;
                Ok(Attr {
                    size: text.len() as u64,
                    is_dir: false,
                    writable: false,
                    modified: None,
                })
            }
            None => {
                let r = self.detected.as_engine().resolve(path)?;
                Ok(Attr {
                    size: r.size,
                    is_dir: r.is_dir,
                    writable: !r.locked,
                    modified: r.modified,
                })
            }
        }
    }

    /// `spec.md` §4.5: the root listing always carries the three
    /// synthetic dotfiles alongside whatever the engine reports.
    pub fn readdir(&self, path: &str) -> FsResult<Vec<DirEntryInfo>> {
        let mut out = self.detected.as_engine().readdir(path)?;
        let comps = crate::common::split_path(path);
        if comps.is_empty() {
            out.push(DirEntryInfo {
                name: ".bootinfo".to_string(),
                is_dir: false,
                locked: true,
                size: 0,
            });
            out.push(DirEntryInfo {
                name: ".bootsectors".to_string(),
                is_dir: false,
                locked: false,
                size: 0,
            });
            out.push(DirEntryInfo {
                name: ".fsinfo".to_string(),
                is_dir: false,
                locked: true,
                size: 0,
            });
        }
        Ok(out)
    }

    fn read_bytes(&mut self, path: &str, offset: u64, size: usize) -> FsResult<Vec<u8>> {
        let body = match classify(path) {
            Some(Dotfile::BootInfo) => self.bootinfo_text()?.into_bytes(),
            Some(Dotfile::BootSectors) => self.boot_region().read().map_err(|_| Error::Io)?,
            Some(Dotfile::FsInfo) => self.fsinfo_text()?.into_bytes(),
            Some(Dotfile::Info(real)) => diag::render(&self.detected, &real)?.into_bytes(),
            None => return self.detected.as_engine().read(path, offset, size),
        };
        let start = offset as usize;
        if start >= body.len() {
            return Ok(Vec::new());
        }
        let end = usize::min(body.len(), start + size);
        Ok(body[start..end].to_vec())
    }

    /// Fill `buf` from `path` at `offset`; returns the byte count written to
    /// `buf`, or a negative `errno` (`spec.md` §6.5 `read`).
    pub fn read(&mut self, path: &str, buf: &mut [u8], offset: u64) -> i32 {
        match self.read_bytes(path, offset, buf.len()) {
            Ok(data) => {
                buf[..data.len()].copy_from_slice(&data);
                data.len() as i32
            }
            Err(e) => e.to_errno(),
        }
    }

    /// Writes `buf` into `path` at `offset`; returns the byte count accepted,
    /// or a negative `errno` (`spec.md` §6.5 `write`).
    pub fn write(&mut self, path: &str, buf: &[u8], offset: u64) -> i32 {
        if let Err(e) = self.reject_if_read_only() {
            return e.to_errno();
        }
        match classify(path) {
            Some(Dotfile::BootSectors) => {
                if offset != 0 {
                    return Error::InvalidArgument.to_errno();
                }
                match self.boot_region().write(buf) {
                    Ok(()) => buf.len() as i32,
                    Err(crate::boot::Error::TooLarge) => Error::InvalidArgument.to_errno(),
                    Err(_) => Error::Io.to_errno(),
                }
            }
            Some(_) => Error::PermissionDenied.to_errno(),
            None => match self.detected.as_engine_mut().write(path, buf, offset) {
                Ok(n) => n as i32,
                Err(e) => e.to_errno(),
            },
        }
    }

    pub fn create(&mut self, path: &str) -> i32 {
        if let Err(e) = self.reject_if_read_only() {
            return e.to_errno();
        }
        if classify(path).is_some() {
            return Error::PermissionDenied.to_errno();
        }
        to_errno(self.detected.as_engine_mut().create(path))
    }

    pub fn mkdir(&mut self, path: &str) -> i32 {
        if let Err(e) = self.reject_if_read_only() {
            return e.to_errno();
        }
        if classify(path).is_some() {
            return Error::PermissionDenied.to_errno();
        }
        to_errno(self.detected.as_engine_mut().mkdir(path))
    }

    pub fn unlink(&mut self, path: &str) -> i32 {
        if let Err(e) = self.reject_if_read_only() {
            return e.to_errno();
        }
        if classify(path).is_some() {
            return Error::PermissionDenied.to_errno();
        }
        to_errno(self.detected.as_engine_mut().unlink(path))
    }

    pub fn rmdir(&mut self, path: &str) -> i32 {
        if let Err(e) = self.reject_if_read_only() {
            return e.to_errno();
        }
        if classify(path).is_some() {
            return Error::PermissionDenied.to_errno();
        }
        to_errno(self.detected.as_engine_mut().rmdir(path))
    }

    pub fn rename(&mut self, old: &str, new: &str, flags: RenameFlags) -> i32 {
        if let Err(e) = self.reject_if_read_only() {
            return e.to_errno();
        }
        if classify(old).is_some() || classify(new).is_some() {
            return Error::PermissionDenied.to_errno();
        }
        to_errno(self.detected.as_engine_mut().rename(old, new, flags))
    }

    pub fn chmod(&mut self, path: &str, writable: bool) -> i32 {
        if let Err(e) = self.reject_if_read_only() {
            return e.to_errno();
        }
        if classify(path).is_some() {
            return Error::PermissionDenied.to_errno();
        }
        to_errno(self.detected.as_engine_mut().chmod(path, writable))
    }

    pub fn truncate(&mut self, path: &str, size: u64) -> i32 {
        if let Err(e) = self.reject_if_read_only() {
            return e.to_errno();
        }
        match classify(path) {
            Some(Dotfile::BootSectors) => {
                warn!(".bootsectors has a fixed length, truncate is rejected");
                Error::InvalidArgument.to_errno()
            }
            Some(_) => Error::PermissionDenied.to_errno(),
            None => to_errno(self.detected.as_engine_mut().truncate(path, size)),
        }
    }

    pub fn utimens(&mut self, path: &str, times: Utimens) -> i32 {
        if let Err(e) = self.reject_if_read_only() {
            return e.to_errno();
        }
        if classify(path).is_some() {
            return Error::PermissionDenied.to_errno();
        }
        to_errno(self.detected.as_engine_mut().utimens(path, times))
    }

    pub fn statfs(&self) -> FsResult<StatFs> {
        self.detected.as_engine().statfs()
    }
}

fn to_errno(r: FsResult<()>) -> i32 {
    match r {
        Ok(()) => 0,
        Err(e) => e.to_errno(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Container;
    use crate::fs::dos::types::{Variant, DEFAULT_ROOT_BASE};
    use crate::fs::dos::vtoc;
    use crate::fs::dos::DosFs;

    /// Format a blank image into a mountable fresh DOS 2.0s disk: mark every
    /// sector free in the VTOC bitmap, then reserve sector 0, the VTOC
    /// sector and the root directory, matching what the original formatter
    /// would leave behind.
    fn fresh_dos2s() -> Detected {
        let mut c = Container::create(720, 128);
        {
            let sec = c.sector_mut(vtoc::VTOC_SECTOR).unwrap();
            sec[0] = 2;
            for b in &mut sec[vtoc::BITMAP_OFFSET..vtoc::BITMAP_OFFSET + vtoc::BITMAP_LEN] {
                *b = 0xff;
            }
            crate::common::put_le16(&mut sec[vtoc::FREE_COUNT_OFFSET..vtoc::FREE_COUNT_OFFSET + 2], 720);
        }
        vtoc::mark_reserved(&mut c, Variant::Dos2s, DEFAULT_ROOT_BASE).unwrap();
        Detected::Dos(DosFs::new(c, Variant::Dos2s, DEFAULT_ROOT_BASE))
    }

    #[test]
    fn root_listing_always_shows_dotfiles() {
        let facade = FileSystemFacade::new(fresh_dos2s());
        let listing = facade.readdir("/").unwrap();
        let names: Vec<_> = listing.iter().map(|e| e.name.as_str()).collect();
        assert!(names.contains(&".bootinfo"));
        assert!(names.contains(&".bootsectors"));
        assert!(names.contains(&".fsinfo"));
    }

    #[test]
    fn bootsectors_write_then_read_round_trips() {
        let mut facade = FileSystemFacade::new(fresh_dos2s());
        let data = vec![0xAAu8; 3 * 128];
        assert_eq!(facade.write(".bootsectors", &data, 0), data.len() as i32);
        let mut buf = vec![0u8; data.len()];
        let n = facade.read(".bootsectors", &mut buf, 0);
        assert_eq!(n as usize, data.len());
        assert_eq!(buf, data);
    }

    #[test]
    fn create_on_dotfile_is_rejected() {
        let mut facade = FileSystemFacade::new(fresh_dos2s());
        assert_eq!(facade.create(".fsinfo"), Error::PermissionDenied.to_errno());
    }
}
