//! Available-space probes for the content root

use std::io;
use std::path::{Path, PathBuf};

use sysinfo::Disks;

use crate::error::{Error, Result};

/// Reports how many bytes can currently be written under the content root
///
/// Readings are point-in-time snapshots; nothing reserves the space.
pub trait CapacityOracle: Send + Sync + std::fmt::Debug {
    fn available_bytes(&self) -> io::Result<u64>;
}

/// Capacity of the disk holding the content root
#[derive(Debug, Clone)]
pub struct DiskCapacity {
    root: PathBuf,
}

impl DiskCapacity {
    /// Probe the disk that holds `root`
    ///
    /// Fails if `root` cannot be canonicalised or no mounted disk contains it.
    pub fn new(root: &Path) -> Result<Self> {
        let root = root.canonicalize()?;
        let probe = Self { root };
        probe
            .available_bytes()
            .map_err(|_| Error::DiskNotFound(probe.root.display().to_string()))?;
        Ok(probe)
    }
}

impl CapacityOracle for DiskCapacity {
    fn available_bytes(&self) -> io::Result<u64> {
        let disks = Disks::new_with_refreshed_list();
        disks
            .list()
            .iter()
            .filter(|disk| self.root.starts_with(disk.mount_point()))
            .max_by_key(|disk| disk.mount_point().as_os_str().len())
            .map(|disk| disk.available_space())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no disk mounted for {}", self.root.display()),
                )
            })
    }
}

/// Fixed capacity reading
#[derive(Debug, Clone, Copy)]
pub struct FixedCapacity(pub u64);

impl CapacityOracle for FixedCapacity {
    fn available_bytes(&self) -> io::Result<u64> {
        Ok(self.0)
    }
}
