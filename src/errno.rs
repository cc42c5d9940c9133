//! POSIX errno constants used by the §6.5 callback surface. Kept as plain
//! `i32` constants rather than pulling in a libc binding, since the only
//! consumer is `fs::Error::to_errno` and the host FS shim is out of scope.

pub const ENOENT: i32 = 2;
pub const EIO: i32 = 5;
pub const EACCES: i32 = 13;
pub const EEXIST: i32 = 17;
pub const ENOTDIR: i32 = 20;
pub const EISDIR: i32 = 21;
pub const EINVAL: i32 = 22;
pub const ENOSPC: i32 = 28;
pub const ENAMETOOLONG: i32 = 36;
pub const ENOTEMPTY: i32 = 39;
