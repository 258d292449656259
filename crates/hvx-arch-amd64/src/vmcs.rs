/// Guest-state fields of the VMCS consumed by this crate.
///
/// The discriminants are the field encodings from the Intel SDM, Vol. 3D,
/// Appendix B.
#[expect(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum VmcsField {
    // 16-bit guest-state fields.
    GuestEsSelector = 0x0800,
    GuestCsSelector = 0x0802,
    GuestSsSelector = 0x0804,
    GuestDsSelector = 0x0806,
    GuestFsSelector = 0x0808,
    GuestGsSelector = 0x080a,
    GuestLdtrSelector = 0x080c,
    GuestTrSelector = 0x080e,

    // 64-bit guest-state fields.
    GuestIa32Efer = 0x2806,

    // 32-bit guest-state fields.
    GuestEsLimit = 0x4800,
    GuestCsLimit = 0x4802,
    GuestSsLimit = 0x4804,
    GuestDsLimit = 0x4806,
    GuestFsLimit = 0x4808,
    GuestGsLimit = 0x480a,
    GuestLdtrLimit = 0x480c,
    GuestTrLimit = 0x480e,
    GuestGdtrLimit = 0x4810,
    GuestIdtrLimit = 0x4812,
    GuestEsAccessRights = 0x4814,
    GuestCsAccessRights = 0x4816,
    GuestSsAccessRights = 0x4818,
    GuestDsAccessRights = 0x481a,
    GuestFsAccessRights = 0x481c,
    GuestGsAccessRights = 0x481e,
    GuestLdtrAccessRights = 0x4820,
    GuestTrAccessRights = 0x4822,

    // Natural-width guest-state fields.
    GuestCr0 = 0x6800,
    GuestCr3 = 0x6802,
    GuestCr4 = 0x6804,
    GuestEsBase = 0x6806,
    GuestCsBase = 0x6808,
    GuestSsBase = 0x680a,
    GuestDsBase = 0x680c,
    GuestFsBase = 0x680e,
    GuestGsBase = 0x6810,
    GuestLdtrBase = 0x6812,
    GuestTrBase = 0x6814,
    GuestGdtrBase = 0x6816,
    GuestIdtrBase = 0x6818,
    GuestRflags = 0x6820,
}

impl VmcsField {
    /// Returns the field encoding passed to `VMREAD`/`VMWRITE`.
    pub fn encoding(self) -> u32 {
        self as u32
    }
}

impl From<VmcsField> for u32 {
    fn from(value: VmcsField) -> Self {
        value.encoding()
    }
}

/// A segment register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Extra segment.
    Es,

    /// Code segment.
    Cs,

    /// Stack segment.
    Ss,

    /// Data segment.
    Ds,

    /// General purpose segment (`FS`).
    Fs,

    /// General purpose segment (`GS`).
    Gs,

    /// Local descriptor table register.
    Ldtr,

    /// Task register.
    Tr,
}

impl Segment {
    /// Returns the VMCS field holding the selector of the segment.
    pub fn selector_field(self) -> VmcsField {
        match self {
            Self::Es => VmcsField::GuestEsSelector,
            Self::Cs => VmcsField::GuestCsSelector,
            Self::Ss => VmcsField::GuestSsSelector,
            Self::Ds => VmcsField::GuestDsSelector,
            Self::Fs => VmcsField::GuestFsSelector,
            Self::Gs => VmcsField::GuestGsSelector,
            Self::Ldtr => VmcsField::GuestLdtrSelector,
            Self::Tr => VmcsField::GuestTrSelector,
        }
    }

    /// Returns the VMCS field holding the base address of the segment.
    pub fn base_field(self) -> VmcsField {
        match self {
            Self::Es => VmcsField::GuestEsBase,
            Self::Cs => VmcsField::GuestCsBase,
            Self::Ss => VmcsField::GuestSsBase,
            Self::Ds => VmcsField::GuestDsBase,
            Self::Fs => VmcsField::GuestFsBase,
            Self::Gs => VmcsField::GuestGsBase,
            Self::Ldtr => VmcsField::GuestLdtrBase,
            Self::Tr => VmcsField::GuestTrBase,
        }
    }

    /// Returns the VMCS field holding the limit of the segment.
    pub fn limit_field(self) -> VmcsField {
        match self {
            Self::Es => VmcsField::GuestEsLimit,
            Self::Cs => VmcsField::GuestCsLimit,
            Self::Ss => VmcsField::GuestSsLimit,
            Self::Ds => VmcsField::GuestDsLimit,
            Self::Fs => VmcsField::GuestFsLimit,
            Self::Gs => VmcsField::GuestGsLimit,
            Self::Ldtr => VmcsField::GuestLdtrLimit,
            Self::Tr => VmcsField::GuestTrLimit,
        }
    }

    /// Returns the VMCS field holding the access rights of the segment.
    pub fn access_rights_field(self) -> VmcsField {
        match self {
            Self::Es => VmcsField::GuestEsAccessRights,
            Self::Cs => VmcsField::GuestCsAccessRights,
            Self::Ss => VmcsField::GuestSsAccessRights,
            Self::Ds => VmcsField::GuestDsAccessRights,
            Self::Fs => VmcsField::GuestFsAccessRights,
            Self::Gs => VmcsField::GuestGsAccessRights,
            Self::Ldtr => VmcsField::GuestLdtrAccessRights,
            Self::Tr => VmcsField::GuestTrAccessRights,
        }
    }
}
