//! Sparta free-space bitmap: a single contiguous run of sectors, one bit per
//! sector, MSB-first (`spec.md` §4.4 "Bit-map policy").

use crate::container::Container;
use crate::fs::sparta::types::VolumeHeader;
use crate::fs::Error;

fn bit_location(sector: u32) -> (u32, usize) {
    (sector / 8, (sector % 8) as usize)
}

pub fn is_free(container: &Container, header: &VolumeHeader, sector: u32) -> Result<bool, Error> {
    let (byte_idx, bit) = bit_location(sector);
    let sec_idx = byte_idx / container.sector_size as u32;
    let byte_off = (byte_idx % container.sector_size as u32) as usize;
    let sec = container
        .sector(header.first_bitmap as u32 + sec_idx)
        .map_err(|_| Error::Io)?;
    let byte = sec.get(byte_off).copied().ok_or(Error::CorruptBitmap)?;
    Ok(byte & (0x80 >> bit) != 0)
}

pub fn set_free(
    container: &mut Container,
    header: &mut VolumeHeader,
    sector: u32,
    free: bool,
) -> Result<(), Error> {
    let was_free = is_free(container, header, sector)?;
    if was_free == free {
        return Ok(());
    }
    let (byte_idx, bit) = bit_location(sector);
    let sec_idx = byte_idx / container.sector_size as u32;
    let byte_off = (byte_idx % container.sector_size as u32) as usize;
    let sec = container
        .sector_mut(header.first_bitmap as u32 + sec_idx)
        .map_err(|_| Error::Io)?;
    let mask = 0x80u8 >> bit;
    if free {
        sec[byte_off] |= mask;
        header.free += 1;
    } else {
        sec[byte_off] &= !mask;
        header.free = header.free.saturating_sub(1);
    }
    persist_free(container, header)
}

/// Keep sector 1's on-disk free counter consistent with `header.free` on
/// every mutation, mirroring the DOS-family VTOC counter discipline
/// (`spec.md` §3 "free-space bitmap" invariant) instead of deferring the
/// whole header to unmount.
fn persist_free(container: &mut Container, header: &VolumeHeader) -> Result<(), Error> {
    let sec1 = container.sector_mut(1).map_err(|_| Error::Io)?;
    crate::common::put_le16(
        &mut sec1[crate::fs::sparta::types::SECTOR1_FREE_OFFSET..crate::fs::sparta::types::SECTOR1_FREE_OFFSET + 2],
        header.free,
    );
    Ok(())
}

/// First-fit scan from sector 2 upward (`spec.md` §4.4 "Allocation policy").
/// The freshly allocated sector is zero-filled before returning.
pub fn allocate(container: &mut Container, header: &mut VolumeHeader) -> Result<u32, Error> {
    for s in 2..=container.sector_count {
        if is_free(container, header, s)? {
            set_free(container, header, s, false)?;
            let sec = container.sector_mut(s).map_err(|_| Error::Io)?;
            for b in sec.iter_mut() {
                *b = 0;
            }
            return Ok(s);
        }
    }
    Err(Error::NoSpace)
}

pub fn free_sector(container: &mut Container, header: &mut VolumeHeader, sector: u32) -> Result<(), Error> {
    set_free(container, header, sector, true)
}
