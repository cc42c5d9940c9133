//! # `atrfs`
//!
//! A multi-format reader/writer for Atari 8-bit floppy-disk images held in
//! `.atr` container files. It recognizes several historical on-disk
//! layouts (DOS 1, DOS 2.0s, DOS 2.0d, DOS 2.5, MyDOS 4.5x, SpartaDOS/SDFS,
//! and LiteDOS) and exposes the contents through a single mountable,
//! VFS-like surface supporting read, write, create, rename, delete,
//! truncate, directory traversal, attribute change, and (for SpartaDOS)
//! timestamp maintenance.
//!
//! ## Architecture
//!
//! * [`container`] parses the `.atr` header and addresses sectors 1..N,
//!   absorbing the short-sector anomaly so nothing above it ever computes a
//!   byte offset directly.
//! * [`boot`] reads/writes the boot sectors and patches the DOS.SYS boot
//!   header.
//! * [`fs`] holds the `Engine` trait plus one sub-module per format family:
//!   [`fs::dos`] (DOS 1/2.0s/2.0d/2.5/MyDOS/LiteDOS, sharing a VTOC bitmap
//!   and sector-chain files) and [`fs::sparta`] (SpartaDOS/SDFS, using
//!   sector-map files and hierarchical timestamped directories).
//! * [`detect`] runs each format's `sanity()` predicate in a fixed order and
//!   builds the matching engine.
//! * [`facade`] is the single public callback surface a host mounts
//!   against; it synthesizes the `.bootinfo`/`.bootsectors`/`.fsinfo`/`.info`
//!   dotfiles and otherwise dispatches to the detected engine.
//! * [`diag`] renders the `.info` text for one path: directory-slot
//!   metadata, a compacted sector list, Sparta timestamps, and a
//!   hex-preview delegation hook for type-specific content analysis.
//! * [`errno`] holds the small POSIX errno table `fs::Error::to_errno` maps
//!   into.
//!
//! Opening an image is `Container::from_bytes` → `detect::detect` →
//! `facade::FileSystemFacade::new`.

pub mod boot;
pub mod common;
pub mod container;
pub mod detect;
pub mod diag;
pub mod errno;
pub mod facade;
pub mod fs;
