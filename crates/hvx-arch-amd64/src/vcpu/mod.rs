mod linear;
mod mode;
mod table;

#[cfg(test)]
mod vcpu_tests;

use hvx_core::{GuestMemory, VcpuId, Vmcs};

use crate::{Cr0, Cr4, MsrEfer, Rflags, Segment, SegmentAccess, SegmentRegister, Selector, VmcsField};

/// The architectural view of a single virtual CPU.
///
/// A `Vcpu` pairs the control structure of a virtual CPU with its guest
/// memory view. Nothing is cached: every query re-reads the control
/// structure or guest memory, so results always reflect the latest
/// guest-visible state.
///
/// A `Vcpu` is meant to be used from the thread that runs the virtual CPU.
/// It holds no shared state of its own.
pub struct Vcpu<Control, Memory>
where
    Control: Vmcs<Field = VmcsField>,
    Memory: GuestMemory,
{
    id: VcpuId,
    vmcs: Control,
    memory: Memory,
}

impl<Control, Memory> Vcpu<Control, Memory>
where
    Control: Vmcs<Field = VmcsField>,
    Memory: GuestMemory,
{
    /// Creates a new virtual CPU view from its control structure and guest
    /// memory accessors.
    pub fn new(id: VcpuId, vmcs: Control, memory: Memory) -> Self {
        Self { id, vmcs, memory }
    }

    /// Returns the identifier of the virtual CPU.
    pub fn id(&self) -> VcpuId {
        self.id
    }

    /// Returns the control structure accessor.
    pub fn vmcs(&self) -> &Control {
        &self.vmcs
    }

    /// Returns the guest memory accessor.
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Reads the guest `CR0`.
    pub fn cr0(&self) -> Cr0 {
        Cr0(self.vmcs.read_field(VmcsField::GuestCr0))
    }

    /// Reads the guest `CR4`.
    pub fn cr4(&self) -> Cr4 {
        Cr4(self.vmcs.read_field(VmcsField::GuestCr4))
    }

    /// Reads the guest `IA32_EFER`.
    pub fn msr_efer(&self) -> MsrEfer {
        MsrEfer(self.vmcs.read_field(VmcsField::GuestIa32Efer))
    }

    /// Reads the guest `RFLAGS`.
    pub fn rflags(&self) -> Rflags {
        Rflags(self.vmcs.read_field(VmcsField::GuestRflags))
    }

    /// Reads the selector of a segment register.
    pub fn read_segment_selector(&self, segment: Segment) -> Selector {
        Selector::from(self.vmcs.read_field(segment.selector_field()))
    }

    /// Writes the selector of a segment register.
    ///
    /// Only the visible part of the register changes; the cached base, limit
    /// and access rights are left untouched.
    pub fn write_segment_selector(&self, segment: Segment, selector: Selector) {
        self.vmcs
            .write_field(segment.selector_field(), selector.into());
    }

    /// Reads the cached base address of a segment register.
    pub fn read_segment_base(&self, segment: Segment) -> u64 {
        self.vmcs.read_field(segment.base_field())
    }

    /// Reads the complete cached state of a segment register.
    pub fn read_segment(&self, segment: Segment) -> SegmentRegister {
        SegmentRegister {
            selector: self.read_segment_selector(segment),
            base: self.read_segment_base(segment),
            limit: self.vmcs.read_field(segment.limit_field()) as u32,
            access: SegmentAccess(self.vmcs.read_field(segment.access_rights_field()) as u32),
        }
    }

    /// Writes the complete cached state of a segment register.
    pub fn write_segment(&self, segment: Segment, register: &SegmentRegister) {
        self.write_segment_selector(segment, register.selector);
        self.vmcs.write_field(segment.base_field(), register.base);
        self.vmcs
            .write_field(segment.limit_field(), register.limit as u64);
        self.vmcs
            .write_field(segment.access_rights_field(), register.access.0 as u64);
    }
}
