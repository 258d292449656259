/// The execution mode of a virtual CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuMode {
    /// Real-address mode (CR0.PE = 0).
    Real,

    /// Virtual-8086 mode (CR0.PE = 1, RFLAGS.VM = 1).
    Virtual8086,

    /// Legacy protected mode (CR0.PE = 1, IA32_EFER.LMA = 0).
    Protected,

    /// IA-32e compatibility mode (IA32_EFER.LMA = 1, CS.L = 0).
    Compatibility,

    /// IA-32e 64-bit mode (IA32_EFER.LMA = 1, CS.L = 1).
    Long64,
}

/// Supported paging modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagingMode {
    /// 32-bit paging.
    Legacy,

    /// Physical Address Extension paging.
    Pae,

    /// 4-level paging.
    Ia32e,

    /// 5-level paging (57-bit linear addresses).
    Ia32eLa57,
}

impl PagingMode {
    /// Returns the address width (i.e. pointer size) of the paging mode in
    /// bytes.
    pub fn address_width(self) -> usize {
        match self {
            Self::Legacy => 4,
            Self::Pae => 4,
            Self::Ia32e => 8,
            Self::Ia32eLa57 => 8,
        }
    }
}
