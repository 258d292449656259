/// Extended Feature Enable Register (IA32_EFER).
#[derive(Default, Clone, Copy, PartialEq, Eq)]
pub struct MsrEfer(pub u64);

impl MsrEfer {
    /// Long Mode Enable (bit 8).
    pub const LME: u64 = 1 << 8;

    /// Long Mode Active (bit 10).
    pub const LMA: u64 = 1 << 10;

    /// Execute Disable Enable (bit 11).
    pub const NXE: u64 = 1 << 11;

    /// Checks if long mode (IA-32e mode) is enabled (LME bit).
    ///
    /// Enabling does not activate long mode by itself; it becomes active
    /// once paging is turned on.
    pub fn long_mode_enable(self) -> bool {
        self.0 & Self::LME != 0
    }

    /// Checks if long mode (IA-32e mode) is active (LMA bit).
    ///
    /// Set by the processor when long mode is enabled and paging is on.
    pub fn long_mode_active(self) -> bool {
        self.0 & Self::LMA != 0
    }

    /// Checks if page-level execute protection is enabled (NXE bit).
    pub fn execute_disable(self) -> bool {
        self.0 & Self::NXE != 0
    }
}

impl std::fmt::Debug for MsrEfer {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("MsrEfer")
            .field("long_mode_enable", &self.long_mode_enable())
            .field("long_mode_active", &self.long_mode_active())
            .field("execute_disable", &self.execute_disable())
            .finish()
    }
}

impl From<u64> for MsrEfer {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<MsrEfer> for u64 {
    fn from(value: MsrEfer) -> Self {
        value.0
    }
}
