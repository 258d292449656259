//! AMD64 architectural state translation.
//!
//! Interprets the protection-mode state of a guest virtual CPU, as exposed by
//! the VMX control structure, and derives from it:
//!
//! - the execution and paging mode ([`Vcpu::cpu_mode`], [`Vcpu::paging_mode`]),
//! - segment descriptors and call gates stored in the guest's descriptor
//!   tables ([`Vcpu::read_segment_descriptor`], [`Vcpu::read_call_gate`]),
//! - linear addresses of logical `segment:offset` pairs
//!   ([`Vcpu::linear_address`]).
//!
//! Failures are reported as [`HvxError`](hvx_core::HvxError) and never
//! retried; translating them into architectural exceptions is left to the
//! caller.

mod cr;
mod efer;
mod mode;
mod rflags;
mod segment;
mod vcpu;
mod vmcs;

pub use self::{
    cr::{Cr0, Cr4},
    efer::MsrEfer,
    mode::{CpuMode, PagingMode},
    rflags::Rflags,
    segment::{
        CallGate, DescriptorTable, DescriptorType, Granularity, OperationSize, SegmentAccess,
        SegmentDescriptor, SegmentRegister, Selector,
    },
    vcpu::Vcpu,
    vmcs::{Segment, VmcsField},
};
