//! Filesystem side of the mirror: walking, path normalization and the disk
//! collaborator the reconciler reads from and writes to.

pub mod disk;
pub mod path;
pub mod walker;

pub use disk::{Disk, LocalDisk, MemoryDisk};
