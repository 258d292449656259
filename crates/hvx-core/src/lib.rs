//! Core HVX functionality.
//!
//! This crate describes the two collaborators every virtual CPU exposes to
//! the architectural translation layer: the hardware virtualization control
//! structure ([`Vmcs`]) and the guest memory view ([`GuestMemory`]).

mod core;
mod error;
mod memory;
mod vmcs;

pub use self::{
    core::{Pa, Va, VcpuId},
    error::HvxError,
    memory::GuestMemory,
    vmcs::Vmcs,
};
