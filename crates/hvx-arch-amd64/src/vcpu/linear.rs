use hvx_core::{GuestMemory, Va, Vmcs};

use super::Vcpu;
use crate::{Segment, VmcsField};

impl<Control, Memory> Vcpu<Control, Memory>
where
    Control: Vmcs<Field = VmcsField>,
    Memory: GuestMemory,
{
    /// Computes the linear address of `offset` within `segment`.
    ///
    /// The base comes from the cached segment state in the VMCS, not from
    /// the descriptor table. The sum wraps at 64 bits.
    pub fn linear_address(&self, offset: u64, segment: Segment) -> Va {
        Va(self.read_segment_base(segment)) + offset
    }

    /// Computes the linear address of `offset` within `segment` for an
    /// access with the given address size in bytes.
    ///
    /// Sizes of 2 and 4 truncate the offset to 16 and 32 bits before the
    /// base is added. Any other size uses the full 64-bit offset.
    pub fn linear_address_sized(&self, offset: u64, size: usize, segment: Segment) -> Va {
        let offset = match size {
            2 => offset as u16 as u64,
            4 => offset as u32 as u64,
            _ => offset,
        };

        self.linear_address(offset, segment)
    }

    /// Computes the linear address of the instruction at `rip` in the code
    /// segment.
    pub fn linear_instruction_pointer(&self, rip: u64) -> Va {
        self.linear_address(rip, Segment::Cs)
    }
}
