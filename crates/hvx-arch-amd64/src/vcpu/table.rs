use hvx_core::{GuestMemory, HvxError, Va, Vmcs};

use super::Vcpu;
use crate::{CallGate, DescriptorTable, Segment, SegmentDescriptor, Selector, VmcsField};

/// Size of a single descriptor table entry.
const ENTRY_SIZE: u64 = 8;

/// Computes the address of entry `index` of a table.
///
/// The entry must start strictly below `limit`; the entry is not otherwise
/// required to fit under the limit.
fn entry_address(base: Va, limit: u32, index: u32) -> Result<Va, HvxError> {
    let offset = index as u64 * ENTRY_SIZE;
    if offset >= limit as u64 {
        return Err(HvxError::LimitExceeded { index, limit });
    }

    Ok(base + offset)
}

impl<Control, Memory> Vcpu<Control, Memory>
where
    Control: Vmcs<Field = VmcsField>,
    Memory: GuestMemory,
{
    /// Returns the base and limit of the GDT or LDT.
    fn descriptor_table(&self, table: DescriptorTable) -> (Va, u32) {
        let (base, limit) = match table {
            DescriptorTable::Gdt => (VmcsField::GuestGdtrBase, VmcsField::GuestGdtrLimit),
            DescriptorTable::Ldt => (VmcsField::GuestLdtrBase, VmcsField::GuestLdtrLimit),
        };

        (
            Va(self.vmcs.read_field(base)),
            self.vmcs.read_field(limit) as u32,
        )
    }

    /// Reads the segment descriptor referenced by `selector` from the GDT or
    /// LDT.
    ///
    /// # Errors
    ///
    /// - [`HvxError::InvalidSelector`] for the null selector. Index 0 of the
    ///   LDT is read like any other entry.
    /// - [`HvxError::LimitExceeded`] if the entry starts at or beyond the
    ///   table limit.
    /// - Any error of the guest memory accessor.
    ///
    /// Guest memory is not accessed unless both checks pass.
    pub fn read_segment_descriptor(
        &self,
        selector: Selector,
    ) -> Result<SegmentDescriptor, HvxError> {
        if selector.is_null() {
            return Err(HvxError::InvalidSelector {
                selector: selector.0,
            });
        }

        let table = selector.table();
        let (base, limit) = self.descriptor_table(table);
        let address = entry_address(base, limit, selector.index() as u32).inspect_err(|_| {
            tracing::debug!(
                vcpu = %self.id,
                ?table,
                index = selector.index(),
                limit,
                "descriptor table limit"
            );
        })?;

        self.memory.read_struct(address)
    }

    /// Writes `descriptor` to the GDT or LDT entry referenced by `selector`.
    ///
    /// Unlike [`read_segment_descriptor`], the null selector is not rejected;
    /// only the table limit is checked.
    ///
    /// # Errors
    ///
    /// - [`HvxError::LimitExceeded`] if the entry starts at or beyond the
    ///   table limit. Nothing is written in that case.
    /// - Any error of the guest memory accessor.
    ///
    /// [`read_segment_descriptor`]: Self::read_segment_descriptor
    pub fn write_segment_descriptor(
        &self,
        selector: Selector,
        descriptor: SegmentDescriptor,
    ) -> Result<(), HvxError> {
        let table = selector.table();
        let (base, limit) = self.descriptor_table(table);
        let address = entry_address(base, limit, selector.index() as u32).inspect_err(|_| {
            tracing::debug!(
                vcpu = %self.id,
                ?table,
                index = selector.index(),
                limit,
                "descriptor table limit"
            );
        })?;

        self.memory.write_struct(address, descriptor)
    }

    /// Reads the call gate at index `gate` of the IDT.
    ///
    /// # Errors
    ///
    /// - [`HvxError::LimitExceeded`] if the entry starts at or beyond the IDT
    ///   limit.
    /// - Any error of the guest memory accessor.
    pub fn read_call_gate(&self, gate: u32) -> Result<CallGate, HvxError> {
        let base = Va(self.vmcs.read_field(VmcsField::GuestIdtrBase));
        let limit = self.vmcs.read_field(VmcsField::GuestIdtrLimit) as u32;
        let address = entry_address(base, limit, gate).inspect_err(|_| {
            tracing::debug!(vcpu = %self.id, gate, limit, "idt limit");
        })?;

        self.memory.read_struct(address)
    }

    /// Reads the descriptor referenced by the current selector of a segment
    /// register.
    ///
    /// This goes to the descriptor table in guest memory. Use
    /// [`read_segment`] for the state the processor has cached.
    ///
    /// [`read_segment`]: Self::read_segment
    pub fn read_segment_descriptor_of(
        &self,
        segment: Segment,
    ) -> Result<SegmentDescriptor, HvxError> {
        self.read_segment_descriptor(self.read_segment_selector(segment))
    }
}
