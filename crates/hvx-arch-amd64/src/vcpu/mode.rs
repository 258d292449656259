use hvx_core::{GuestMemory, Vmcs};

use super::Vcpu;
use crate::{CpuMode, PagingMode, Segment, VmcsField};

impl<Control, Memory> Vcpu<Control, Memory>
where
    Control: Vmcs<Field = VmcsField>,
    Memory: GuestMemory,
{
    /// Checks if the virtual CPU is in protected mode (CR0.PE = 1).
    pub fn is_protected(&self) -> bool {
        self.cr0().protection_enable()
    }

    /// Checks if the virtual CPU is in real-address mode (CR0.PE = 0).
    pub fn is_real(&self) -> bool {
        !self.is_protected()
    }

    /// Checks if the virtual CPU is in virtual-8086 mode.
    ///
    /// RFLAGS.VM only has meaning in protected mode, so the flag alone is
    /// not enough.
    pub fn is_virtual8086(&self) -> bool {
        self.is_protected() && self.rflags().virtual_8086_mode()
    }

    /// Checks if IA-32e mode is active (IA32_EFER.LMA = 1).
    pub fn is_long_mode(&self) -> bool {
        self.msr_efer().long_mode_active()
    }

    /// Checks if the virtual CPU executes 64-bit code.
    ///
    /// Requires IA-32e mode and the L flag in the access rights of the
    /// current code segment descriptor. The descriptor is read from the
    /// descriptor table in guest memory; if it cannot be read, the result is
    /// `false`.
    pub fn is_long64_mode(&self) -> bool {
        if !self.is_long_mode() {
            return false;
        }

        match self.read_segment_descriptor_of(Segment::Cs) {
            Ok(descriptor) => descriptor.access_rights().long_mode(),
            Err(err) => {
                tracing::trace!(vcpu = %self.id, %err, "code segment descriptor not readable");
                false
            }
        }
    }

    /// Checks if paging is enabled (CR0.PG = 1).
    pub fn is_paging(&self) -> bool {
        self.cr0().paging()
    }

    /// Checks if Physical Address Extension is enabled (CR4.PAE = 1).
    pub fn is_pae_enabled(&self) -> bool {
        self.cr4().physical_address_extension()
    }

    /// Classifies the execution mode of the virtual CPU.
    pub fn cpu_mode(&self) -> CpuMode {
        if self.is_real() {
            return CpuMode::Real;
        }

        if self.is_virtual8086() {
            return CpuMode::Virtual8086;
        }

        if !self.is_long_mode() {
            return CpuMode::Protected;
        }

        if self.is_long64_mode() {
            CpuMode::Long64
        }
        else {
            CpuMode::Compatibility
        }
    }

    /// Determines the paging mode of the virtual CPU.
    ///
    /// # Paging Modes
    ///
    /// - **No Paging**: CR0.PG = 0
    /// - **32-bit Paging**: CR0.PG = 1 and CR4.PAE = 0
    /// - **PAE Paging**: CR0.PG = 1, CR4.PAE = 1, and IA32_EFER.LME = 0
    /// - **4-level Paging**: CR0.PG = 1, CR4.PAE = 1, IA32_EFER.LME = 1, and CR4.LA57 = 0
    /// - **5-level Paging**: CR0.PG = 1, CR4.PAE = 1, IA32_EFER.LME = 1, and CR4.LA57 = 1
    ///
    /// Returns `None` if paging is disabled.
    pub fn paging_mode(&self) -> Option<PagingMode> {
        if !self.is_paging() {
            return None;
        }

        let cr4 = self.cr4();
        if !cr4.physical_address_extension() {
            return Some(PagingMode::Legacy);
        }

        if !self.msr_efer().long_mode_enable() {
            return Some(PagingMode::Pae);
        }

        if !cr4.linear_address_57_bit() {
            return Some(PagingMode::Ia32e);
        }

        Some(PagingMode::Ia32eLa57)
    }
}
