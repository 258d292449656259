use zerocopy::{
    FromBytes, Immutable, IntoBytes, KnownLayout, byteorder::little_endian::U64,
};

use super::{DescriptorType, Selector};

/// A call gate descriptor, read from the interrupt descriptor table.
///
/// | Bits  | Field                            |
/// |-------|----------------------------------|
/// | 0-15  | Offset 15:0                      |
/// | 16-31 | Target code segment selector     |
/// | 32-36 | Parameter count                  |
/// | 37-39 | Reserved                         |
/// | 40-43 | Gate type                        |
/// | 44    | Descriptor type (S, always 0)    |
/// | 45-46 | Descriptor privilege level (DPL) |
/// | 47    | Gate present (P)                 |
/// | 48-63 | Offset 31:16                     |
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct CallGate(U64);

impl CallGate {
    /// Creates a gate targeting `offset` in the segment named by `selector`.
    /// All other fields are zero.
    pub fn new(selector: Selector, offset: u32) -> Self {
        let offset = offset as u64;
        Self::from_raw((offset & 0xffff) | ((selector.0 as u64) << 16) | ((offset >> 16) << 48))
    }

    /// Creates a gate from its raw 64-bit value.
    pub fn from_raw(value: u64) -> Self {
        Self(U64::new(value))
    }

    /// Returns the raw 64-bit value of the gate.
    pub fn raw(self) -> u64 {
        self.0.get()
    }

    /// Returns the entry point offset within the target code segment.
    pub fn offset(self) -> u32 {
        let raw = self.raw();
        ((raw & 0xffff) | ((raw >> 48) << 16)) as u32
    }

    /// Returns the selector of the target code segment.
    pub fn selector(self) -> Selector {
        Selector((self.raw() >> 16) as u16)
    }

    /// Returns the number of parameters copied on a stack switch.
    pub fn parameter_count(self) -> u8 {
        ((self.raw() >> 32) & 0b1_1111) as _
    }

    /// Returns the gate type.
    pub fn typ(self) -> u8 {
        ((self.raw() >> 40) & 0b1111) as _
    }

    /// Returns the descriptor type. Gates are system descriptors.
    pub fn descriptor_type(self) -> DescriptorType {
        DescriptorType::from_bit(self.raw() >> 44)
    }

    /// Returns the descriptor privilege level.
    pub fn descriptor_privilege_level(self) -> u8 {
        ((self.raw() >> 45) & 0b11) as _
    }

    /// Returns whether the gate is present.
    pub fn present(self) -> bool {
        (self.raw() >> 47) & 1 != 0
    }

    /// Sets the parameter count. Only the low 5 bits are kept.
    pub fn with_parameter_count(self, count: u8) -> Self {
        let raw = self.raw() & !(0b1_1111 << 32);
        Self::from_raw(raw | (((count & 0b1_1111) as u64) << 32))
    }

    /// Sets the gate type. Only the low 4 bits are kept.
    pub fn with_type(self, typ: u8) -> Self {
        let raw = self.raw() & !(0b1111 << 40);
        Self::from_raw(raw | (((typ & 0b1111) as u64) << 40))
    }

    /// Sets the descriptor privilege level. Only the low 2 bits are kept.
    pub fn with_descriptor_privilege_level(self, dpl: u8) -> Self {
        let raw = self.raw() & !(0b11 << 45);
        Self::from_raw(raw | (((dpl & 0b11) as u64) << 45))
    }

    /// Sets the present flag.
    pub fn with_present(self, present: bool) -> Self {
        let raw = self.raw() & !(1 << 47);
        Self::from_raw(raw | ((present as u64) << 47))
    }
}

impl Default for CallGate {
    fn default() -> Self {
        Self::from_raw(0)
    }
}

impl From<u64> for CallGate {
    fn from(value: u64) -> Self {
        Self::from_raw(value)
    }
}

impl From<CallGate> for u64 {
    fn from(value: CallGate) -> Self {
        value.raw()
    }
}

impl std::fmt::Debug for CallGate {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("CallGate")
            .field("selector", &self.selector())
            .field("offset", &format_args!("0x{:08x}", self.offset()))
            .field("parameter_count", &self.parameter_count())
            .field("type", &self.typ())
            .field(
                "descriptor_privilege_level",
                &self.descriptor_privilege_level(),
            )
            .field("present", &self.present())
            .finish()
    }
}
