//! # Diag-Info
//!
//! Builds the human-readable text returned for a `.info` dotfile
//! (`spec.md` §4.6): directory-slot metadata, a compacted sector-run list,
//! Sparta timestamps, and a delegation hook for type-specific content
//! analysis. Nothing here mutates the image; `render` only reads through
//! the `Engine` trait plus a hex preview of the first few content bytes.

use std::fmt::Write as _;

use crate::detect::Detected;
use crate::fs::{Engine, FsResult};

/// Collapse a sorted sequence of sector numbers into runs, formatting each
/// run of length > 1 as `A -- B` and singletons as a bare number
/// (`spec.md` §4.6 "compacted sector list").
fn compact_runs(sectors: &[u32]) -> String {
    if sectors.is_empty() {
        return "(none)".to_string();
    }
    let mut out = Vec::new();
    let mut start = sectors[0];
    let mut prev = sectors[0];
    for &s in &sectors[1..] {
        if s == prev + 1 {
            prev = s;
            continue;
        }
        out.push(if start == prev { format!("{}", start) } else { format!("{} -- {}", start, prev) });
        start = s;
        prev = s;
    }
    out.push(if start == prev { format!("{}", start) } else { format!("{} -- {}", start, prev) });
    out.join(", ")
}

/// First handful of content bytes, hex-encoded, as the generic delegation
/// hook named by `spec.md` §4.6 ("binary-load file, BASIC program,
/// AtariDOS-executable -- not specified here"). A real type-specific
/// analyzer would dispatch on this preview; this crate only surfaces it.
fn hex_preview(bytes: &[u8]) -> String {
    let take = bytes.len().min(16);
    hex::encode(&bytes[..take])
}

/// Render the `.info` text for `path` against the detected image. `path`
/// is the real path (the `.info` suffix already stripped by the facade).
pub fn render(detected: &Detected, path: &str) -> FsResult<String> {
    let engine = detected.as_engine();
    let resolved = engine.resolve(path)?;
    let sectors = engine.chain_sectors(path)?;

    let mut out = String::new();
    let _ = writeln!(out, "path: {}", if path.is_empty() { "/" } else { path });
    let _ = writeln!(out, "file system: {}", engine.fs_name());
    let _ = writeln!(out, "kind: {}", if resolved.is_dir { "directory" } else { "file" });
    let _ = writeln!(out, "size: {} bytes", resolved.size);
    let _ = writeln!(out, "locked: {}", resolved.locked);
    let _ = writeln!(out, "starting sector: {}", resolved.starting_sector);
    let _ = writeln!(out, "parent directory sector: {}", resolved.parent_dir_sector);
    match resolved.dir_entry_index {
        Some(idx) => {
            let _ = writeln!(out, "directory entry index: {}", idx);
        }
        None => {
            let _ = writeln!(out, "directory entry index: (root, no slot)");
        }
    }
    if let Some(fnum) = resolved.file_number {
        let _ = writeln!(out, "file number: {}", fnum);
    }
    let _ = writeln!(out, "sectors ({} total): {}", sectors.len(), compact_runs(&sectors));
    if let Some(secs) = resolved.modified {
        let _ = writeln!(out, "modified: {} (unix seconds)", secs);
    }
    if !resolved.is_dir {
        if let Ok(preview) = engine.read(path, 0, 16) {
            let _ = writeln!(out, "content preview (hex): {}", hex_preview(&preview));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::compact_runs;

    #[test]
    fn collapses_contiguous_runs() {
        assert_eq!(compact_runs(&[4, 5, 6, 10, 20, 21]), "4 -- 6, 10, 20 -- 21");
    }

    #[test]
    fn empty_chain_reports_none() {
        assert_eq!(compact_runs(&[]), "(none)");
    }

    #[test]
    fn single_sector_is_not_a_run() {
        assert_eq!(compact_runs(&[42]), "42");
    }
}
