/// `CR4` control register.
///
/// Holds the architectural extension enables. Only the bits that influence
/// the execution and paging mode are decoded here.
#[derive(Default, Clone, Copy, PartialEq, Eq)]
pub struct Cr4(pub u64);

impl Cr4 {
    /// Virtual-8086 Mode Extensions (bit 0).
    pub const VME: u64 = 1 << 0;

    /// Page Size Extensions (bit 4).
    pub const PSE: u64 = 1 << 4;

    /// Physical Address Extension (bit 5).
    pub const PAE: u64 = 1 << 5;

    /// 57-bit linear addresses (bit 12).
    pub const LA57: u64 = 1 << 12;

    /// Checks if the CR4.VME flag is set.
    ///
    /// Enables interrupt and exception handling extensions in virtual-8086
    /// mode.
    pub fn virtual_mode_extensions(self) -> bool {
        self.0 & Self::VME != 0
    }

    /// Checks if the CR4.PSE flag is set.
    ///
    /// Enables 4-MByte pages with 32-bit paging.
    pub fn page_size_extension(self) -> bool {
        self.0 & Self::PSE != 0
    }

    /// Checks if the CR4.PAE flag is set.
    ///
    /// When set, paging produces physical addresses with more than 32 bits.
    /// PAE must be set before entering IA-32e mode.
    pub fn physical_address_extension(self) -> bool {
        self.0 & Self::PAE != 0
    }

    /// Checks if the CR4.LA57 flag is set.
    ///
    /// Selects 5-level paging in IA-32e mode.
    pub fn linear_address_57_bit(self) -> bool {
        self.0 & Self::LA57 != 0
    }
}

impl std::fmt::Debug for Cr4 {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Cr4")
            .field("virtual_mode_extensions", &self.virtual_mode_extensions())
            .field("page_size_extension", &self.page_size_extension())
            .field(
                "physical_address_extension",
                &self.physical_address_extension(),
            )
            .field("linear_address_57_bit", &self.linear_address_57_bit())
            .finish()
    }
}

impl From<u64> for Cr4 {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Cr4> for u64 {
    fn from(value: Cr4) -> Self {
        value.0
    }
}
