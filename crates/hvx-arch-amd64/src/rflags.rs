/// The RFLAGS register.
///
/// Only the system flags relevant to mode classification are decoded.
#[derive(Default, Clone, Copy, PartialEq, Eq)]
pub struct Rflags(pub u64);

impl Rflags {
    /// Bits that are fixed to 1.
    pub const FIXED_BITS: u64 = 0x00000002;

    /// Interrupt Enable Flag (bit 9).
    pub const IF: u64 = 1 << 9;

    /// Virtual-8086 Mode (bit 17).
    pub const VM: u64 = 1 << 17;

    /// Checks if the Interrupt Enable Flag (IF) is set.
    pub fn interrupt_enable(self) -> bool {
        self.0 & Self::IF != 0
    }

    /// Returns the I/O Privilege Level (IOPL), a value between 0 and 3.
    pub fn io_privilege_level(self) -> u8 {
        ((self.0 >> 12) & 0b11) as _
    }

    /// Checks if the Virtual-8086 Mode flag (VM) is set.
    ///
    /// The flag only selects virtual-8086 mode while the processor is in
    /// protected mode.
    pub fn virtual_8086_mode(self) -> bool {
        self.0 & Self::VM != 0
    }
}

impl std::fmt::Debug for Rflags {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Rflags")
            .field("interrupt_enable", &self.interrupt_enable())
            .field("io_privilege_level", &self.io_privilege_level())
            .field("virtual_8086_mode", &self.virtual_8086_mode())
            .finish()
    }
}

impl From<u64> for Rflags {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Rflags> for u64 {
    fn from(value: Rflags) -> Self {
        value.0
    }
}
