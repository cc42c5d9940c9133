//! # Common utilities
//!
//! Little helpers shared by every engine: little-endian field codecs, 8.3
//! name parsing/formatting, case-folded name comparison, and path splitting.
//! None of this is specific to any one DOS variant or to Sparta.

use crate::fs::Error;

/// Decode a 2-byte little-endian field.
pub fn le16(buf: &[u8]) -> u16 {
    u16::from_le_bytes([buf[0], buf[1]])
}

/// Decode a 3-byte little-endian field (used for Sparta file/directory sizes).
pub fn le24(buf: &[u8]) -> u32 {
    (buf[0] as u32) | ((buf[1] as u32) << 8) | ((buf[2] as u32) << 16)
}

/// Encode a 2-byte little-endian field.
pub fn put_le16(buf: &mut [u8], val: u16) {
    let b = val.to_le_bytes();
    buf[0] = b[0];
    buf[1] = b[1];
}

/// Encode a 3-byte little-endian field, truncating silently above 2^24-1.
pub fn put_le24(buf: &mut [u8], val: u32) {
    buf[0] = (val & 0xff) as u8;
    buf[1] = ((val >> 8) & 0xff) as u8;
    buf[2] = ((val >> 16) & 0xff) as u8;
}

/// Split a logical path into non-empty components. A leading `/` is optional
/// and ignored; `.` and `..` are not special, these are flat 8.3 namespaces
/// (Sparta directories are hierarchical, but still have no `.`/`..` entries).
pub fn split_path(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Case-folded name comparison, since all these file systems store upper case
/// names but hosts frequently pass mixed case.
pub fn names_equal(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// An 8.3 name split into its base and extension, both upper-cased.
pub struct Name83 {
    pub base: String,
    pub ext: String,
}

impl Name83 {
    /// Parse a host-supplied filename into base/extension, validating the 8.3
    /// envelope. Returns `Error::NameTooLong` if either part overflows, and
    /// rejects an empty base.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let upper = raw.to_ascii_uppercase();
        let (base, ext) = match upper.rsplit_once('.') {
            Some((b, e)) => (b.to_string(), e.to_string()),
            None => (upper.clone(), String::new()),
        };
        if base.is_empty() || base.len() > 8 || ext.len() > 3 {
            return Err(Error::NameTooLong);
        }
        Ok(Self { base, ext })
    }

    /// Pack into the fixed 8-byte name / 3-byte extension fields used by
    /// DOS-family directory entries, space-padded.
    pub fn to_dos_fields(&self) -> ([u8; 8], [u8; 3]) {
        let mut name = [b' '; 8];
        let mut ext = [b' '; 3];
        for (i, b) in self.base.bytes().enumerate() {
            name[i] = b;
        }
        for (i, b) in self.ext.bytes().enumerate() {
            ext[i] = b;
        }
        (name, ext)
    }

    /// Pack into the 11-byte Sparta name field (base then extension, no dot,
    /// space-padded, same layout as the classic FAT short name).
    pub fn to_sparta_field(&self) -> [u8; 11] {
        let mut ans = [b' '; 11];
        for (i, b) in self.base.bytes().enumerate() {
            ans[i] = b;
        }
        for (i, b) in self.ext.bytes().enumerate() {
            ans[8 + i] = b;
        }
        ans
    }
}

/// Format a DOS-family 8+3 field pair into a displayable name, stripping
/// trailing spaces and joining with `.` only when the extension is non-empty.
pub fn format_dos_name(name: &[u8], ext: &[u8]) -> String {
    let base = String::from_utf8_lossy(name).trim_end().to_string();
    let extension = String::from_utf8_lossy(ext).trim_end().to_string();
    if extension.is_empty() {
        base
    } else {
        format!("{}.{}", base, extension)
    }
}

/// Format an 11-byte Sparta name field the same way.
pub fn format_sparta_name(field: &[u8; 11]) -> String {
    format_dos_name(&field[0..8], &field[8..11])
}

/// Sparta rejects only `>` and `\`; everything else is left to `Name83::parse`
/// to validate for length and dot placement.
pub fn validate_sparta_chars(name: &str) -> Result<(), Error> {
    if name.contains('>') || name.contains('\\') {
        Err(Error::InvalidName)
    } else {
        Ok(())
    }
}
