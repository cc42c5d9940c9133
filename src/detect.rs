//! # Sanity/Detect
//!
//! Runs each engine's `sanity()` predicate in the fixed order required by
//! `spec.md` §4.2 — Sparta, then DOS2 (2.0s or 2.0d, picked by sector size),
//! then DOS 2.5, then MyDOS, then DOS 1, then LiteDOS — and returns the first
//! match. None of the predicates mutate the image.

use log::info;

use crate::container::Container;
use crate::fs::dos::types::{Variant, DEFAULT_ROOT_BASE};
use crate::fs::dos::DosFs;
use crate::fs::sparta::SpartaFs;
use crate::fs::Engine;

pub enum Detected {
    Dos(DosFs),
    Sparta(SpartaFs),
}

impl Detected {
    pub fn as_engine(&self) -> &dyn Engine {
        match self {
            Detected::Dos(fs) => fs,
            Detected::Sparta(fs) => fs,
        }
    }

    pub fn as_engine_mut(&mut self) -> &mut dyn Engine {
        match self {
            Detected::Dos(fs) => fs,
            Detected::Sparta(fs) => fs,
        }
    }

    pub fn into_container(self) -> Container {
        match self {
            Detected::Dos(fs) => fs.into_container(),
            Detected::Sparta(fs) => fs.into_container(),
        }
    }

    pub fn container(&self) -> &Container {
        match self {
            Detected::Dos(fs) => fs.container(),
            Detected::Sparta(fs) => fs.container(),
        }
    }

    pub fn container_mut(&mut self) -> &mut Container {
        match self {
            Detected::Dos(fs) => fs.container_mut(),
            Detected::Sparta(fs) => fs.container_mut(),
        }
    }
}

/// Detect the on-disk format and build the matching engine. `root_base` lets
/// callers override the default root-directory start sector (the host's `-r`
/// mount option, `spec.md` §6.3).
pub fn detect(container: Container, root_base: Option<u32>) -> Result<Detected, Container> {
    let root_base = root_base.unwrap_or(DEFAULT_ROOT_BASE);

    if SpartaFs::sanity(&container) {
        info!("detected SpartaDOS/SDFS");
        // sanity() already read sector 1 successfully, so this cannot fail.
        return Ok(Detected::Sparta(SpartaFs::new(container).expect("sector 1 just passed sanity()")));
    }

    let dos2 = if container.sector_size == 256 { Variant::Dos2d } else { Variant::Dos2s };
    for variant in [dos2, Variant::Dos25, Variant::MyDos, Variant::Dos1, Variant::LiteDos] {
        if DosFs::sanity(&container, variant, root_base) {
            info!("detected {}", variant.name());
            return Ok(Detected::Dos(DosFs::new(container, variant, root_base)));
        }
    }

    Err(container)
}
