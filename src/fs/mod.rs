//! # File system module
//!
//! This module holds everything shared by the individual on-disk format
//! engines: the common `Engine` trait that the `facade` dispatches through,
//! the error taxonomy of `spec.md` §7, and small value types passed across
//! the `Engine` boundary (`Resolved`, `DirEntryInfo`, `StatFs`, `RenameFlags`).
//!
//! There is one sub-module per engine family:
//! * `dos` implements DOS 1 / DOS 2.0s / DOS 2.0d / DOS 2.5 / MyDOS / LiteDOS,
//!   which all share a VTOC bitmap and a sector-chain file layout.
//! * `sparta` implements SpartaDOS / SDFS, which uses sector-map files and
//!   hierarchical, time-stamped directories.

pub mod dos;
pub mod sparta;

/// Enumerates file system errors. Each variant documents which `spec.md` §7
/// category it belongs to and the `errno` the facade maps it to.
#[derive(thiserror::Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// Policy error: no such file or directory. -> `ENOENT`
    #[error("no such file or directory")]
    NotFound,
    /// Policy error: expected a directory, found a file. -> `ENOTDIR`
    #[error("not a directory")]
    NotADirectory,
    /// Policy error: expected a file, found a directory. -> `EISDIR`
    #[error("is a directory")]
    IsADirectory,
    /// Name-validation error: 8.3 envelope exceeded. -> `ENAMETOOLONG`
    #[error("name too long")]
    NameTooLong,
    /// Name-validation error: disallowed character in a Sparta name. -> `EINVAL`
    #[error("invalid name")]
    InvalidName,
    /// Policy error: target already exists. -> `EEXIST`
    #[error("already exists")]
    AlreadyExists,
    /// Policy error: directory not empty. -> `ENOTEMPTY`
    #[error("directory not empty")]
    NotEmpty,
    /// Policy error: write to a locked entry or a synthetic read-only file. -> `EACCES`
    #[error("permission denied")]
    PermissionDenied,
    /// Resource-exhaustion error: bitmap or directory slot-table full. -> `ENOSPC`
    #[error("no space left on device")]
    NoSpace,
    /// Format-corruption error: bad sector-chain next pointer or loop. -> `EIO`
    #[error("corrupt sector chain")]
    CorruptChain,
    /// Format-corruption error: bitmap/VTOC inconsistency. -> `EIO`
    #[error("corrupt free-space bitmap")]
    CorruptBitmap,
    /// Generic I/O failure reaching the underlying container. -> `EIO`
    #[error("I/O error")]
    Io,
    /// Policy error: argument out of range for the operation. -> `EINVAL`
    #[error("invalid argument")]
    InvalidArgument,
}

impl Error {
    /// Map to the negative-errno discipline of `spec.md` §6.5. The facade is
    /// the only place this is called; engines always return `Result<_, Error>`.
    pub fn to_errno(self) -> i32 {
        match self {
            Error::NotFound => -crate::errno::ENOENT,
            Error::NotADirectory => -crate::errno::ENOTDIR,
            Error::IsADirectory => -crate::errno::EISDIR,
            Error::NameTooLong => -crate::errno::ENAMETOOLONG,
            Error::InvalidName => -crate::errno::EINVAL,
            Error::AlreadyExists => -crate::errno::EEXIST,
            Error::NotEmpty => -crate::errno::ENOTEMPTY,
            Error::PermissionDenied => -crate::errno::EACCES,
            Error::NoSpace => -crate::errno::ENOSPC,
            Error::CorruptChain => -crate::errno::EIO,
            Error::CorruptBitmap => -crate::errno::EIO,
            Error::Io => -crate::errno::EIO,
            Error::InvalidArgument => -crate::errno::EINVAL,
        }
    }
}

pub type FsResult<T> = Result<T, Error>;

/// The outcome of resolving a path to a directory-entry-backed object.
/// Mirrors `spec.md` §4.3 `resolve(path)`.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub starting_sector: u16,
    pub parent_dir_sector: u16,
    pub sector_count: u16,
    pub locked: bool,
    pub file_number: Option<u8>,
    pub dir_entry_index: Option<usize>,
    pub is_dir: bool,
    pub is_info: bool,
    pub size: u64,
    /// Entry modification time as Unix seconds, Sparta/SDFS only. `None` for
    /// the DOS family, which carries no timestamp fields.
    pub modified: Option<i64>,
}

/// One directory listing row, as returned by `readdir`.
#[derive(Debug, Clone)]
pub struct DirEntryInfo {
    pub name: String,
    pub is_dir: bool,
    pub locked: bool,
    pub size: u64,
}

/// Aggregate free/used statistics, as returned by `statfs`.
#[derive(Debug, Clone, Copy)]
pub struct StatFs {
    pub total_sectors: u64,
    pub free_sectors: u64,
    pub files: u64,
}

/// `rename(2)`-style flags, per `spec.md` §4.3 `rename`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenameFlags {
    pub noreplace: bool,
    pub exchange: bool,
}

/// A POSIX-style timestamp pair used by `utimens`, seconds since epoch.
/// `None` means `UTIME_OMIT` (leave the existing stamp alone).
#[derive(Debug, Clone, Copy, Default)]
pub struct Utimens {
    pub atime: Option<i64>,
    pub mtime: Option<i64>,
}

/// Common operation surface every on-disk engine implements. The `facade`
/// dispatches every host callback (`spec.md` §6.5) to whichever engine
/// matches the image's detected `fstype`.
///
/// All paths are absolute, `/`-separated, case-insensitive 8.3 (DOS family)
/// or hierarchical Sparta names. Implementations never panic on a malformed
/// path; they return `Error::NotFound`/`Error::InvalidName` instead.
pub trait Engine {
    fn resolve(&self, path: &str) -> FsResult<Resolved>;
    fn readdir(&self, path: &str) -> FsResult<Vec<DirEntryInfo>>;
    fn read(&self, path: &str, offset: u64, size: usize) -> FsResult<Vec<u8>>;
    fn write(&mut self, path: &str, buf: &[u8], offset: u64) -> FsResult<usize>;
    fn create(&mut self, path: &str) -> FsResult<()>;
    fn mkdir(&mut self, path: &str) -> FsResult<()>;
    fn unlink(&mut self, path: &str) -> FsResult<()>;
    fn rmdir(&mut self, path: &str) -> FsResult<()>;
    fn rename(&mut self, old: &str, new: &str, flags: RenameFlags) -> FsResult<()>;
    fn chmod(&mut self, path: &str, writable: bool) -> FsResult<()>;
    fn truncate(&mut self, path: &str, size: u64) -> FsResult<()>;
    fn utimens(&mut self, path: &str, times: Utimens) -> FsResult<()>;
    fn statfs(&self) -> FsResult<StatFs>;
    /// Human-readable name of the concrete format, e.g. `"MyDOS"`, `"SpartaDOS"`.
    fn fs_name(&self) -> &'static str;
    /// Every physical sector backing `path`'s content, in traversal order,
    /// for `.info` reporting (`spec.md` §4.6 "compacted sector list"). Holes
    /// in a sparse Sparta file are omitted rather than reported as sector 0.
    fn chain_sectors(&self, path: &str) -> FsResult<Vec<u32>>;
}
