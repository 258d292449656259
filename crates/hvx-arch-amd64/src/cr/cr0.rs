/// `CR0` control register.
///
/// Controls the operating mode of the processor: protection, paging and a
/// handful of FPU and cache related switches.
#[derive(Default, Clone, Copy, PartialEq, Eq)]
pub struct Cr0(pub u64);

impl Cr0 {
    /// Protection Enable (bit 0).
    pub const PE: u64 = 1 << 0;

    /// Write Protect (bit 16).
    pub const WP: u64 = 1 << 16;

    /// Paging (bit 31).
    pub const PG: u64 = 1 << 31;

    /// Checks if the CR0.PE flag is set.
    ///
    /// Enables protected mode when set; enables real-address mode when
    /// clear. Only segment-level protection is enabled by this flag, paging
    /// additionally requires CR0.PG.
    pub fn protection_enable(self) -> bool {
        self.0 & Self::PE != 0
    }

    /// Checks if the CR0.WP flag is set.
    ///
    /// When set, supervisor-level code cannot write into read-only pages.
    pub fn write_protect(self) -> bool {
        self.0 & Self::WP != 0
    }

    /// Checks if the CR0.PG flag is set.
    ///
    /// Enables paging when set. When paging is disabled, linear addresses
    /// are treated as physical addresses. The flag has no effect unless
    /// CR0.PE is also set.
    pub fn paging(self) -> bool {
        self.0 & Self::PG != 0
    }
}

impl std::fmt::Debug for Cr0 {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Cr0")
            .field("protection_enable", &self.protection_enable())
            .field("write_protect", &self.write_protect())
            .field("paging", &self.paging())
            .finish()
    }
}

impl From<u64> for Cr0 {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Cr0> for u64 {
    fn from(value: Cr0) -> Self {
        value.0
    }
}
