use super::{Granularity, SegmentAccess, SegmentDescriptor, Selector};

/// The hidden part of a segment register, as cached in the guest-state area
/// of the VMCS.
///
/// The processor loads this state from a [`SegmentDescriptor`] whenever a
/// selector is written to a segment register and uses the cached copy
/// afterwards, so it may differ from the descriptor table contents.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SegmentRegister {
    /// The selector of the segment.
    pub selector: Selector,

    /// The linear address of byte 0 of the segment.
    pub base: u64,

    /// The segment limit, in bytes.
    pub limit: u32,

    /// The access rights of the segment.
    pub access: SegmentAccess,
}

impl SegmentRegister {
    /// Builds the cached segment state the processor would load for
    /// `descriptor` through `selector`.
    pub fn from_descriptor(selector: Selector, descriptor: SegmentDescriptor) -> Self {
        Self {
            selector,
            base: descriptor.base() as u64,
            limit: descriptor.effective_limit(),
            access: descriptor.access_rights(),
        }
    }

    /// Rebuilds a descriptor table entry from the cached segment state.
    ///
    /// With page granularity the limit is stored in 4-KByte units. The upper
    /// 32 bits of the base are dropped.
    pub fn to_descriptor(&self) -> SegmentDescriptor {
        let access = self.access;
        let limit = match access.granularity() {
            Granularity::Byte => self.limit,
            Granularity::Page4K => self.limit >> 12,
        };

        SegmentDescriptor::new(self.base as u32, limit)
            .with_type(access.typ())
            .with_descriptor_type(access.descriptor_type())
            .with_descriptor_privilege_level(access.descriptor_privilege_level())
            .with_present(access.present())
            .with_available_bit(access.available_bit())
            .with_long_mode(access.long_mode())
            .with_operation_size(access.operation_size())
            .with_granularity(access.granularity())
    }
}
