//! x86 architectural state translation for hardware-assisted virtual CPUs.
//!
//! This crate re-exports the member crates of the workspace:
//!
//! - [`hvx_core`] for the accessor traits and the error type,
//! - [`arch::amd64`] for segmentation, descriptor tables and CPU mode
//!   classification (feature `arch-amd64`).

pub use hvx_core::*;

/// Architecture specific definitions.
pub mod arch {
    /// AMD64 architecture.
    #[cfg(feature = "arch-amd64")]
    pub use hvx_arch_amd64 as amd64;
}
