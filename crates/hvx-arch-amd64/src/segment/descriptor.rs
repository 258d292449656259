use zerocopy::{
    FromBytes, Immutable, IntoBytes, KnownLayout, byteorder::little_endian::U64,
};

use super::{DescriptorType, Granularity, OperationSize, SegmentAccess};

/// A segment descriptor is an 8-byte entry in a GDT or LDT that provides the
/// processor with the size and location of a segment, as well as access
/// control and status information.
///
/// The entry is kept in its in-memory (little-endian) encoding and decoded
/// through accessors:
///
/// | Bits  | Field                                |
/// |-------|--------------------------------------|
/// | 0-15  | Segment limit 15:0                   |
/// | 16-39 | Base address 23:0                    |
/// | 40-43 | Segment type                         |
/// | 44    | Descriptor type (S)                  |
/// | 45-46 | Descriptor privilege level (DPL)     |
/// | 47    | Segment present (P)                  |
/// | 48-51 | Segment limit 19:16                  |
/// | 52    | Available for use by system software |
/// | 53    | 64-bit code segment (L)              |
/// | 54    | Default operation size (D/B)         |
/// | 55    | Granularity (G)                      |
/// | 56-63 | Base address 31:24                   |
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct SegmentDescriptor(U64);

impl SegmentDescriptor {
    /// Creates a descriptor with the given base and 20-bit limit. All other
    /// fields are zero.
    pub fn new(base: u32, limit: u32) -> Self {
        Self::from_raw(0).with_base(base).with_limit(limit)
    }

    /// Creates a descriptor from its raw 64-bit value.
    pub fn from_raw(value: u64) -> Self {
        Self(U64::new(value))
    }

    /// Returns the raw 64-bit value of the descriptor.
    pub fn raw(self) -> u64 {
        self.0.get()
    }

    fn bits(self, shift: u32, width: u32) -> u64 {
        (self.raw() >> shift) & ((1 << width) - 1)
    }

    fn with_bits(self, shift: u32, width: u32, value: u64) -> Self {
        let mask = ((1u64 << width) - 1) << shift;
        Self::from_raw((self.raw() & !mask) | ((value << shift) & mask))
    }

    /// Returns the 32-bit linear address of byte 0 of the segment.
    pub fn base(self) -> u32 {
        (self.bits(16, 24) | (self.bits(56, 8) << 24)) as u32
    }

    /// Returns the 20-bit segment limit, in the units selected by the
    /// granularity flag.
    pub fn limit(self) -> u32 {
        (self.bits(0, 16) | (self.bits(48, 4) << 16)) as u32
    }

    /// Returns the segment limit in bytes.
    ///
    /// With page granularity the twelve least significant bits of an offset
    /// are not checked against the limit, so they are filled with ones.
    pub fn effective_limit(self) -> u32 {
        match self.granularity() {
            Granularity::Byte => self.limit(),
            Granularity::Page4K => (self.limit() << 12) | 0xfff,
        }
    }

    /// Returns the segment or gate type.
    pub fn typ(self) -> u8 {
        self.bits(40, 4) as _
    }

    /// Specifies whether this is a system descriptor or a code or data
    /// descriptor.
    pub fn descriptor_type(self) -> DescriptorType {
        DescriptorType::from_bit(self.bits(44, 1))
    }

    /// Returns the privilege level of the segment.
    pub fn descriptor_privilege_level(self) -> u8 {
        self.bits(45, 2) as _
    }

    /// Indicates whether the segment is present in memory.
    pub fn present(self) -> bool {
        self.bits(47, 1) != 0
    }

    /// This bit is available for use by system software.
    pub fn available_bit(self) -> bool {
        self.bits(52, 1) != 0
    }

    /// Indicates whether a code segment contains native 64-bit code.
    pub fn long_mode(self) -> bool {
        self.bits(53, 1) != 0
    }

    /// Returns the default operation size (D/B flag).
    pub fn operation_size(self) -> OperationSize {
        OperationSize::from_bit(self.bits(54, 1))
    }

    /// Returns the scaling of the segment limit.
    pub fn granularity(self) -> Granularity {
        Granularity::from_bit(self.bits(55, 1))
    }

    /// Sets the 32-bit base address.
    pub fn with_base(self, base: u32) -> Self {
        let base = base as u64;
        self.with_bits(16, 24, base & 0xff_ffff).with_bits(56, 8, base >> 24)
    }

    /// Sets the segment limit. Only the low 20 bits are kept.
    pub fn with_limit(self, limit: u32) -> Self {
        let limit = limit as u64;
        self.with_bits(0, 16, limit & 0xffff).with_bits(48, 4, limit >> 16)
    }

    /// Sets the segment type. Only the low 4 bits are kept.
    pub fn with_type(self, typ: u8) -> Self {
        self.with_bits(40, 4, typ as u64)
    }

    /// Sets the descriptor type.
    pub fn with_descriptor_type(self, descriptor_type: DescriptorType) -> Self {
        self.with_bits(44, 1, descriptor_type.bit())
    }

    /// Sets the descriptor privilege level. Only the low 2 bits are kept.
    pub fn with_descriptor_privilege_level(self, dpl: u8) -> Self {
        self.with_bits(45, 2, dpl as u64)
    }

    /// Sets the present flag.
    pub fn with_present(self, present: bool) -> Self {
        self.with_bits(47, 1, present as u64)
    }

    /// Sets the available bit.
    pub fn with_available_bit(self, available: bool) -> Self {
        self.with_bits(52, 1, available as u64)
    }

    /// Sets the 64-bit code segment flag.
    pub fn with_long_mode(self, long_mode: bool) -> Self {
        self.with_bits(53, 1, long_mode as u64)
    }

    /// Sets the default operation size.
    pub fn with_operation_size(self, operation_size: OperationSize) -> Self {
        self.with_bits(54, 1, operation_size.bit())
    }

    /// Sets the granularity.
    pub fn with_granularity(self, granularity: Granularity) -> Self {
        self.with_bits(55, 1, granularity.bit())
    }

    /// Encodes the access rights of the descriptor in the VMCS format.
    ///
    /// A descriptor that is not present maps to [`SegmentAccess::UNUSABLE`]
    /// regardless of its other fields.
    pub fn access_rights(self) -> SegmentAccess {
        if !self.present() {
            return SegmentAccess::UNUSABLE;
        }

        let mut ar = self.typ() as u32;
        ar |= (self.descriptor_type().bit() as u32) << 4;
        ar |= (self.descriptor_privilege_level() as u32) << 5;
        ar |= 1 << 7;
        ar |= (self.available_bit() as u32) << 12;
        ar |= (self.long_mode() as u32) << 13;
        ar |= (self.operation_size().bit() as u32) << 14;
        ar |= (self.granularity().bit() as u32) << 15;
        SegmentAccess(ar)
    }
}

impl Default for SegmentDescriptor {
    fn default() -> Self {
        Self::from_raw(0)
    }
}

impl From<u64> for SegmentDescriptor {
    fn from(value: u64) -> Self {
        Self::from_raw(value)
    }
}

impl From<SegmentDescriptor> for u64 {
    fn from(value: SegmentDescriptor) -> Self {
        value.raw()
    }
}

impl std::fmt::Debug for SegmentDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("SegmentDescriptor")
            .field("base", &format_args!("0x{:08x}", self.base()))
            .field("limit", &format_args!("0x{:05x}", self.limit()))
            .field("type", &self.typ())
            .field("descriptor_type", &self.descriptor_type())
            .field(
                "descriptor_privilege_level",
                &self.descriptor_privilege_level(),
            )
            .field("present", &self.present())
            .field("available_bit", &self.available_bit())
            .field("long_mode", &self.long_mode())
            .field("operation_size", &self.operation_size())
            .field("granularity", &self.granularity())
            .finish()
    }
}
