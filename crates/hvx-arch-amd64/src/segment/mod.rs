mod descriptor;
pub use self::descriptor::SegmentDescriptor;

mod gate;
pub use self::gate::CallGate;

mod register;
pub use self::register::SegmentRegister;

mod selector;
pub use self::selector::{DescriptorTable, Selector};


/// Determines the type of segment descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorType {
    /// The descriptor is for a system segment or gate.
    System,

    /// The descriptor is for a code or data segment.
    CodeOrData,
}

impl DescriptorType {
    fn from_bit(bit: u64) -> Self {
        match bit & 1 {
            0 => Self::System,
            _ => Self::CodeOrData,
        }
    }

    fn bit(self) -> u64 {
        match self {
            Self::System => 0,
            Self::CodeOrData => 1,
        }
    }
}

/// Determines the default length for effective addresses and operands
/// referenced by instructions in the segment (the D/B flag).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationSize {
    /// 16-bit addresses and 16-bit or 8-bit operands are assumed.
    Default,

    /// 32-bit addresses and 32-bit or 8-bit operands are assumed.
    Big,
}

impl OperationSize {
    fn from_bit(bit: u64) -> Self {
        match bit & 1 {
            0 => Self::Default,
            _ => Self::Big,
        }
    }

    fn bit(self) -> u64 {
        match self {
            Self::Default => 0,
            Self::Big => 1,
        }
    }
}

/// Determines the scaling of the segment limit field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// The segment limit is interpreted in byte units.
    Byte,

    /// The segment limit is interpreted in 4-KByte units.
    Page4K,
}

impl Granularity {
    fn from_bit(bit: u64) -> Self {
        match bit & 1 {
            0 => Self::Byte,
            _ => Self::Page4K,
        }
    }

    fn bit(self) -> u64 {
        match self {
            Self::Byte => 0,
            Self::Page4K => 1,
        }
    }
}

/// The access rights of a segment, in the packed format used by the
/// guest-state area of the VMCS.
///
/// | Bits  | Field                                   |
/// |-------|-----------------------------------------|
/// | 0-3   | Segment type                            |
/// | 4     | Descriptor type (S)                     |
/// | 5-6   | Descriptor privilege level (DPL)        |
/// | 7     | Segment present (P)                     |
/// | 12    | Available for use by system software    |
/// | 13    | 64-bit mode active (L, CS only)         |
/// | 14    | Default operation size (D/B)            |
/// | 15    | Granularity (G)                         |
/// | 16    | Segment unusable                        |
///
/// All other bits are reserved and zero.
#[derive(Default, Clone, Copy, PartialEq, Eq)]
pub struct SegmentAccess(pub u32);

impl SegmentAccess {
    /// Access rights of a segment that is not present.
    ///
    /// The VMCS marks such segments with the unusable bit and nothing else.
    pub const UNUSABLE: Self = Self(1 << 16);

    /// Returns the segment or gate type.
    ///
    /// The encoding depends on the descriptor type: code, data and system
    /// descriptors each interpret these four bits differently.
    pub fn typ(self) -> u8 {
        (self.0 & 0b1111) as _
    }

    /// Specifies whether the segment is a system segment (S flag clear) or
    /// a code or data segment (S flag set).
    pub fn descriptor_type(self) -> DescriptorType {
        DescriptorType::from_bit((self.0 >> 4) as u64)
    }

    /// Returns the privilege level of the segment.
    pub fn descriptor_privilege_level(self) -> u8 {
        ((self.0 >> 5) & 0b11) as _
    }

    /// Indicates whether the segment is present in memory.
    pub fn present(self) -> bool {
        (self.0 >> 7) & 1 != 0
    }

    /// This bit is available for use by system software.
    pub fn available_bit(self) -> bool {
        (self.0 >> 12) & 1 != 0
    }

    /// Indicates whether a code segment contains native 64-bit code.
    pub fn long_mode(self) -> bool {
        (self.0 >> 13) & 1 != 0
    }

    /// Returns the default operation size (D/B flag).
    pub fn operation_size(self) -> OperationSize {
        OperationSize::from_bit((self.0 >> 14) as u64)
    }

    /// Returns the scaling of the segment limit.
    pub fn granularity(self) -> Granularity {
        Granularity::from_bit((self.0 >> 15) as u64)
    }

    /// Indicates whether the segment is unusable.
    pub fn unusable(self) -> bool {
        (self.0 >> 16) & 1 != 0
    }
}

impl From<u32> for SegmentAccess {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<SegmentAccess> for u32 {
    fn from(value: SegmentAccess) -> Self {
        value.0
    }
}

impl From<SegmentDescriptor> for SegmentAccess {
    fn from(value: SegmentDescriptor) -> Self {
        value.access_rights()
    }
}

impl std::fmt::Debug for SegmentAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("SegmentAccess")
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
            .field("unusable", &self.unusable())
            .finish()
    }
}
