use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// A segment selector is a 16-bit identifier for a segment. It does not point
/// directly to the segment, but instead points to the segment descriptor that
/// defines the segment.
///
/// | Bits | Field                           |
/// |------|---------------------------------|
/// | 0-1  | Requested privilege level (RPL) |
/// | 2    | Table indicator (TI)            |
/// | 3-15 | Index                           |
#[repr(transparent)]
#[derive(Default, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct Selector(pub u16);

/// A descriptor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorTable {
    /// The Global Descriptor Table.
    Gdt,

    /// The Local Descriptor Table.
    Ldt,
}

impl Selector {
    /// Creates a selector from its index, table indicator and requested
    /// privilege level.
    ///
    /// The index is truncated to 13 bits and the privilege level to 2 bits.
    pub fn new(index: u16, table: DescriptorTable, request_privilege_level: u8) -> Self {
        let ti = match table {
            DescriptorTable::Gdt => 0,
            DescriptorTable::Ldt => 1,
        };

        Self(((index & 0x1fff) << 3) | (ti << 2) | (request_privilege_level as u16 & 0b11))
    }

    /// Specifies the privilege level of the selector. The privilege level can
    /// range from 0 to 3, with 0 being the most privileged level.
    pub fn request_privilege_level(self) -> u8 {
        (self.0 & 0b11) as _
    }

    /// Specifies the descriptor table to use: clearing this flag selects the
    /// GDT; setting this flag selects the current LDT.
    pub fn table(self) -> DescriptorTable {
        match (self.0 >> 2) & 1 {
            0 => DescriptorTable::Gdt,
            _ => DescriptorTable::Ldt,
        }
    }

    /// Selects one of 8192 descriptors in the GDT or LDT.
    pub fn index(self) -> u16 {
        (self.0 >> 3) & 0x1fff
    }

    /// Checks if this is the null selector, i.e. index 0 of the GDT.
    ///
    /// The requested privilege level does not matter. Index 0 of the LDT is
    /// an ordinary entry.
    pub fn is_null(self) -> bool {
        self.index() == 0 && self.table() == DescriptorTable::Gdt
    }
}

impl From<u16> for Selector {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl From<Selector> for u16 {
    fn from(value: Selector) -> Self {
        value.0
    }
}

impl From<u64> for Selector {
    fn from(value: u64) -> Self {
        Self(value as u16)
    }
}

impl From<Selector> for u64 {
    fn from(value: Selector) -> Self {
        value.0 as u64
    }
}

impl std::fmt::Debug for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Selector")
            .field("request_privilege_level", &self.request_privilege_level())
            .field("table", &self.table())
            .field("index", &self.index())
            .finish()
    }
}
