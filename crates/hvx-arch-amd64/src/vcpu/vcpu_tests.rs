use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
};

use hvx_core::{GuestMemory, HvxError, Va, VcpuId, Vmcs};

use super::Vcpu;
use crate::{
    CallGate, CpuMode, Cr0, Cr4, DescriptorTable, MsrEfer, PagingMode, Rflags, Segment,
    SegmentAccess, SegmentDescriptor, SegmentRegister, Selector, VmcsField,
};

///////////////////////////////////////////////////////////////////////////////
// Mock Accessors
///////////////////////////////////////////////////////////////////////////////

#[derive(Default)]
struct MockVmcs {
    fields: RefCell<HashMap<VmcsField, u64>>,
}

impl MockVmcs {
    fn set(&self, field: VmcsField, value: u64) {
        self.fields.borrow_mut().insert(field, value);
    }
}

impl Vmcs for MockVmcs {
    type Field = VmcsField;

    fn read_field(&self, field: VmcsField) -> u64 {
        self.fields.borrow().get(&field).copied().unwrap_or(0)
    }

    fn write_field(&self, field: VmcsField, value: u64) {
        self.set(field, value);
    }
}

/// Flat guest memory that counts every transfer.
struct MockMemory {
    bytes: RefCell<Vec<u8>>,
    reads: Cell<usize>,
    writes: Cell<usize>,
}

impl MockMemory {
    const SIZE: usize = 0x1_0000;

    fn new() -> Self {
        Self {
            bytes: RefCell::new(vec![0u8; Self::SIZE]),
            reads: Cell::new(0),
            writes: Cell::new(0),
        }
    }

    fn transfers(&self) -> usize {
        self.reads.get() + self.writes.get()
    }

    /// Stores a little-endian 64-bit value without counting it as a
    /// transfer.
    fn poke(&self, address: u64, value: u64) {
        let address = address as usize;
        self.bytes.borrow_mut()[address..address + 8].copy_from_slice(&value.to_le_bytes());
    }

    fn peek(&self, address: u64) -> u64 {
        let address = address as usize;
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.bytes.borrow()[address..address + 8]);
        u64::from_le_bytes(bytes)
    }

    fn range(address: Va, len: usize) -> Result<std::ops::Range<usize>, HvxError> {
        let start = address.0 as usize;
        match start.checked_add(len) {
            Some(end) if end <= Self::SIZE => Ok(start..end),
            _ => Err(HvxError::MemoryFault(address)),
        }
    }
}

impl GuestMemory for MockMemory {
    fn read(&self, address: Va, buffer: &mut [u8]) -> Result<(), HvxError> {
        self.reads.set(self.reads.get() + 1);
        let range = Self::range(address, buffer.len())?;
        buffer.copy_from_slice(&self.bytes.borrow()[range]);
        Ok(())
    }

    fn write(&self, address: Va, buffer: &[u8]) -> Result<(), HvxError> {
        self.writes.set(self.writes.get() + 1);
        let range = Self::range(address, buffer.len())?;
        self.bytes.borrow_mut()[range].copy_from_slice(buffer);
        Ok(())
    }
}

///////////////////////////////////////////////////////////////////////////////
// Test Helpers
///////////////////////////////////////////////////////////////////////////////

const GDT_BASE: u64 = 0x1000;
const GDT_LIMIT: u64 = 0x40;
const LDT_BASE: u64 = 0x2000;
const LDT_LIMIT: u64 = 0x20;
const IDT_BASE: u64 = 0x3000;
const IDT_LIMIT: u64 = 0x100;

const FLAT_CODE32: u64 = 0x00cf_9b00_0000_ffff;
const FLAT_CODE64: u64 = 0x00af_9b00_0000_ffff;
const FLAT_DATA: u64 = 0x00cf_9300_0000_ffff;

const CODE32_SELECTOR: Selector = Selector(0x08);
const CODE64_SELECTOR: Selector = Selector(0x10);
const DATA_SELECTOR: Selector = Selector(0x18);

/// A VMCS with the GDT, LDT and IDT registers set up, and a guest memory
/// holding a small GDT.
fn setup() -> (MockVmcs, MockMemory) {
    let vmcs = MockVmcs::default();
    vmcs.set(VmcsField::GuestGdtrBase, GDT_BASE);
    vmcs.set(VmcsField::GuestGdtrLimit, GDT_LIMIT);
    vmcs.set(VmcsField::GuestLdtrBase, LDT_BASE);
    vmcs.set(VmcsField::GuestLdtrLimit, LDT_LIMIT);
    vmcs.set(VmcsField::GuestIdtrBase, IDT_BASE);
    vmcs.set(VmcsField::GuestIdtrLimit, IDT_LIMIT);

    let memory = MockMemory::new();
    memory.poke(GDT_BASE + 0x08, FLAT_CODE32);
    memory.poke(GDT_BASE + 0x10, FLAT_CODE64);
    memory.poke(GDT_BASE + 0x18, FLAT_DATA);

    (vmcs, memory)
}

fn vcpu<'a>(
    vmcs: &'a MockVmcs,
    memory: &'a MockMemory,
) -> Vcpu<&'a MockVmcs, &'a MockMemory> {
    Vcpu::new(VcpuId(0), vmcs, memory)
}

/// Puts the virtual CPU in IA-32e mode with the given code segment.
fn enter_long_mode(vmcs: &MockVmcs, cs: Selector) {
    vmcs.set(VmcsField::GuestCr0, Cr0::PE | Cr0::PG);
    vmcs.set(VmcsField::GuestCr4, Cr4::PAE);
    vmcs.set(VmcsField::GuestIa32Efer, MsrEfer::LME | MsrEfer::LMA);
    vmcs.set(VmcsField::GuestCsSelector, cs.0 as u64);
}

///////////////////////////////////////////////////////////////////////////////
// Descriptor Tables
///////////////////////////////////////////////////////////////////////////////

#[test]
fn read_gdt_descriptor() -> Result<(), HvxError> {
    let (vmcs, memory) = setup();
    let vcpu = vcpu(&vmcs, &memory);

    let descriptor = vcpu.read_segment_descriptor(DATA_SELECTOR)?;
    assert_eq!(descriptor.raw(), FLAT_DATA);
    assert_eq!(memory.reads.get(), 1);

    Ok(())
}

#[test]
fn null_selector_is_rejected_without_memory_access() {
    let (vmcs, memory) = setup();
    let vcpu = vcpu(&vmcs, &memory);

    for rpl in 0..4 {
        let selector = Selector::new(0, DescriptorTable::Gdt, rpl);
        let result = vcpu.read_segment_descriptor(selector);
        assert!(matches!(
            result,
            Err(HvxError::InvalidSelector { selector: raw }) if raw == selector.0
        ));
    }

    assert_eq!(memory.transfers(), 0);
}

#[test]
fn ldt_index_zero_is_read() -> Result<(), HvxError> {
    let (vmcs, memory) = setup();
    memory.poke(LDT_BASE, FLAT_DATA);
    let vcpu = vcpu(&vmcs, &memory);

    let descriptor = vcpu.read_segment_descriptor(Selector::new(0, DescriptorTable::Ldt, 3))?;
    assert_eq!(descriptor.raw(), FLAT_DATA);

    Ok(())
}

#[test]
fn ldt_uses_ldtr_base_and_limit() -> Result<(), HvxError> {
    let (vmcs, memory) = setup();
    memory.poke(LDT_BASE + 0x18, FLAT_CODE32);
    let vcpu = vcpu(&vmcs, &memory);

    // Index 3 is within the LDT limit (0x18 < 0x20), index 4 is not.
    let descriptor = vcpu.read_segment_descriptor(Selector::new(3, DescriptorTable::Ldt, 0))?;
    assert_eq!(descriptor.raw(), FLAT_CODE32);

    let result = vcpu.read_segment_descriptor(Selector::new(4, DescriptorTable::Ldt, 0));
    assert!(matches!(
        result,
        Err(HvxError::LimitExceeded {
            index: 4,
            limit: 0x20
        })
    ));

    Ok(())
}

#[test]
fn read_beyond_limit_is_rejected_without_memory_access() {
    let (vmcs, memory) = setup();
    let vcpu = vcpu(&vmcs, &memory);

    for index in [8, 9, 0x1fff] {
        let result = vcpu.read_segment_descriptor(Selector::new(index, DescriptorTable::Gdt, 0));
        assert!(matches!(result, Err(HvxError::LimitExceeded { limit: 0x40, .. })));
    }

    assert_eq!(memory.transfers(), 0);
}

#[test]
fn write_beyond_limit_is_rejected_without_memory_access() {
    let (vmcs, memory) = setup();
    let vcpu = vcpu(&vmcs, &memory);

    let descriptor = SegmentDescriptor::from_raw(FLAT_DATA);
    for selector in [
        Selector::new(8, DescriptorTable::Gdt, 0),
        Selector::new(4, DescriptorTable::Ldt, 0),
    ] {
        let result = vcpu.write_segment_descriptor(selector, descriptor);
        assert!(matches!(result, Err(HvxError::LimitExceeded { .. })));
    }

    assert_eq!(memory.transfers(), 0);
    assert_eq!(memory.peek(GDT_BASE + 0x40), 0);
}

#[test]
fn written_descriptor_reads_back_unchanged() -> Result<(), HvxError> {
    let (vmcs, memory) = setup();
    let vcpu = vcpu(&vmcs, &memory);

    let selector = Selector::new(5, DescriptorTable::Gdt, 0);
    let descriptor = SegmentDescriptor::from_raw(0xfedc_ba98_7654_3210);

    vcpu.write_segment_descriptor(selector, descriptor)?;
    assert_eq!(memory.peek(GDT_BASE + 5 * 8), 0xfedc_ba98_7654_3210);
    assert_eq!(vcpu.read_segment_descriptor(selector)?, descriptor);

    Ok(())
}

#[test]
fn write_does_not_reject_gdt_index_zero() -> Result<(), HvxError> {
    let (vmcs, memory) = setup();
    let vcpu = vcpu(&vmcs, &memory);

    vcpu.write_segment_descriptor(Selector(0), SegmentDescriptor::from_raw(FLAT_DATA))?;
    assert_eq!(memory.peek(GDT_BASE), FLAT_DATA);

    Ok(())
}

#[test]
fn memory_fault_is_propagated() {
    let (vmcs, memory) = setup();
    vmcs.set(VmcsField::GuestGdtrBase, MockMemory::SIZE as u64);
    let vcpu = vcpu(&vmcs, &memory);

    let result = vcpu.read_segment_descriptor(CODE32_SELECTOR);
    assert!(matches!(
        result,
        Err(HvxError::MemoryFault(Va(address))) if address == MockMemory::SIZE as u64 + 8
    ));
}

#[test]
fn read_call_gate_from_idt() -> Result<(), HvxError> {
    let (vmcs, memory) = setup();
    let gate = CallGate::new(CODE32_SELECTOR, 0x0040_1000)
        .with_type(0xc)
        .with_present(true);
    memory.poke(IDT_BASE + 3 * 8, gate.raw());
    let vcpu = vcpu(&vmcs, &memory);

    assert_eq!(vcpu.read_call_gate(3)?, gate);

    Ok(())
}

#[test]
fn call_gate_beyond_idt_limit_is_rejected() {
    let (vmcs, memory) = setup();
    let vcpu = vcpu(&vmcs, &memory);

    // 0x20 * 8 == IDT_LIMIT
    let result = vcpu.read_call_gate(0x20);
    assert!(matches!(
        result,
        Err(HvxError::LimitExceeded {
            index: 0x20,
            limit: 0x100
        })
    ));
    assert_eq!(memory.transfers(), 0);
}

///////////////////////////////////////////////////////////////////////////////
// Segment State
///////////////////////////////////////////////////////////////////////////////

#[test]
fn segment_state_round_trips_through_vmcs() {
    let (vmcs, memory) = setup();
    let vcpu = vcpu(&vmcs, &memory);

    let register = SegmentRegister::from_descriptor(
        DATA_SELECTOR,
        SegmentDescriptor::from_raw(FLAT_DATA).with_base(0x0010_0000),
    );
    vcpu.write_segment(Segment::Ds, &register);

    assert_eq!(vmcs.read_field(VmcsField::GuestDsSelector), 0x18);
    assert_eq!(vmcs.read_field(VmcsField::GuestDsBase), 0x0010_0000);
    assert_eq!(vmcs.read_field(VmcsField::GuestDsLimit), 0xffff_ffff);
    assert_eq!(vmcs.read_field(VmcsField::GuestDsAccessRights), 0xc093);
    assert_eq!(vcpu.read_segment(Segment::Ds), register);

    // Other segments are untouched.
    assert_eq!(vcpu.read_segment(Segment::Es), SegmentRegister::default());
}

#[test]
fn selector_write_keeps_cached_state() {
    let (vmcs, memory) = setup();
    vmcs.set(VmcsField::GuestSsBase, 0x8000);
    let vcpu = vcpu(&vmcs, &memory);

    vcpu.write_segment_selector(Segment::Ss, DATA_SELECTOR);
    assert_eq!(vcpu.read_segment_selector(Segment::Ss), DATA_SELECTOR);
    assert_eq!(vcpu.read_segment_base(Segment::Ss), 0x8000);
}

#[test]
fn read_descriptor_of_segment_register() -> Result<(), HvxError> {
    let (vmcs, memory) = setup();
    vmcs.set(VmcsField::GuestCsSelector, CODE64_SELECTOR.0 as u64);
    let vcpu = vcpu(&vmcs, &memory);

    let descriptor = vcpu.read_segment_descriptor_of(Segment::Cs)?;
    assert_eq!(descriptor.raw(), FLAT_CODE64);
    assert_eq!(descriptor.access_rights(), SegmentAccess(0xa09b));

    Ok(())
}

///////////////////////////////////////////////////////////////////////////////
// CPU Mode
///////////////////////////////////////////////////////////////////////////////

#[test]
fn real_is_negation_of_protected() {
    let (vmcs, memory) = setup();
    let vcpu = vcpu(&vmcs, &memory);

    for cr0 in [0, Cr0::PE, Cr0::PG, Cr0::PE | Cr0::PG, Cr0::PE | Cr0::WP, u64::MAX] {
        vmcs.set(VmcsField::GuestCr0, cr0);
        assert_eq!(vcpu.is_real(), !vcpu.is_protected());
        assert_eq!(vcpu.is_protected(), cr0 & Cr0::PE != 0);
    }
}

#[test]
fn virtual8086_requires_protected_mode() {
    let (vmcs, memory) = setup();
    vmcs.set(VmcsField::GuestRflags, Rflags::FIXED_BITS | Rflags::VM);
    let vcpu = vcpu(&vmcs, &memory);

    assert!(!vcpu.is_virtual8086());
    assert_eq!(vcpu.cpu_mode(), CpuMode::Real);

    vmcs.set(VmcsField::GuestCr0, Cr0::PE);
    assert!(vcpu.is_virtual8086());
    assert_eq!(vcpu.cpu_mode(), CpuMode::Virtual8086);

    vmcs.set(VmcsField::GuestRflags, Rflags::FIXED_BITS);
    assert!(!vcpu.is_virtual8086());
    assert_eq!(vcpu.cpu_mode(), CpuMode::Protected);
}

#[test]
fn long_mode_follows_efer_lma() {
    let (vmcs, memory) = setup();
    let vcpu = vcpu(&vmcs, &memory);

    vmcs.set(VmcsField::GuestIa32Efer, MsrEfer::LME);
    assert!(!vcpu.is_long_mode());

    vmcs.set(VmcsField::GuestIa32Efer, MsrEfer::LME | MsrEfer::LMA);
    assert!(vcpu.is_long_mode());
}

#[test]
fn long64_mode_with_64bit_code_segment() {
    let (vmcs, memory) = setup();
    enter_long_mode(&vmcs, CODE64_SELECTOR);
    let vcpu = vcpu(&vmcs, &memory);

    assert!(vcpu.is_long64_mode());
    assert_eq!(vcpu.cpu_mode(), CpuMode::Long64);
}

#[test]
fn compatibility_mode_with_32bit_code_segment() {
    let (vmcs, memory) = setup();
    enter_long_mode(&vmcs, CODE32_SELECTOR);
    let vcpu = vcpu(&vmcs, &memory);

    assert!(vcpu.is_long_mode());
    assert!(!vcpu.is_long64_mode());
    assert_eq!(vcpu.cpu_mode(), CpuMode::Compatibility);
}

#[test]
fn long64_mode_is_false_for_unreadable_code_segment() {
    let (vmcs, memory) = setup();
    let vcpu = vcpu(&vmcs, &memory);

    // Null selector.
    enter_long_mode(&vmcs, Selector(0));
    assert!(!vcpu.is_long64_mode());

    // Beyond the GDT limit.
    enter_long_mode(&vmcs, Selector::new(8, DescriptorTable::Gdt, 0));
    assert!(!vcpu.is_long64_mode());

    // GDT outside guest memory.
    enter_long_mode(&vmcs, CODE64_SELECTOR);
    vmcs.set(VmcsField::GuestGdtrBase, MockMemory::SIZE as u64);
    assert!(!vcpu.is_long64_mode());
}

#[test]
fn long64_mode_is_not_checked_outside_long_mode() {
    let (vmcs, memory) = setup();
    vmcs.set(VmcsField::GuestCr0, Cr0::PE);
    vmcs.set(VmcsField::GuestCsSelector, CODE64_SELECTOR.0 as u64);
    let vcpu = vcpu(&vmcs, &memory);

    assert!(!vcpu.is_long64_mode());
    assert_eq!(memory.transfers(), 0);
}

#[test]
fn paging_and_pae_flags() {
    let (vmcs, memory) = setup();
    let vcpu = vcpu(&vmcs, &memory);

    assert!(!vcpu.is_paging());
    assert!(!vcpu.is_pae_enabled());

    vmcs.set(VmcsField::GuestCr0, Cr0::PE | Cr0::PG);
    vmcs.set(VmcsField::GuestCr4, Cr4::PAE);
    assert!(vcpu.is_paging());
    assert!(vcpu.is_pae_enabled());
}

#[test]
fn paging_modes() {
    let (vmcs, memory) = setup();
    let vcpu = vcpu(&vmcs, &memory);

    let cases = [
        (Cr0::PE, 0, 0, None),
        (Cr0::PE | Cr0::PG, 0, 0, Some(PagingMode::Legacy)),
        (Cr0::PE | Cr0::PG, Cr4::PAE, 0, Some(PagingMode::Pae)),
        (
            Cr0::PE | Cr0::PG,
            Cr4::PAE,
            MsrEfer::LME | MsrEfer::LMA,
            Some(PagingMode::Ia32e),
        ),
        (
            Cr0::PE | Cr0::PG,
            Cr4::PAE | Cr4::LA57,
            MsrEfer::LME | MsrEfer::LMA,
            Some(PagingMode::Ia32eLa57),
        ),
    ];

    for (cr0, cr4, efer, expected) in cases {
        vmcs.set(VmcsField::GuestCr0, cr0);
        vmcs.set(VmcsField::GuestCr4, cr4);
        vmcs.set(VmcsField::GuestIa32Efer, efer);
        assert_eq!(vcpu.paging_mode(), expected);
    }
}

///////////////////////////////////////////////////////////////////////////////
// Linear Addresses
///////////////////////////////////////////////////////////////////////////////

#[test]
fn linear_address_adds_segment_base() {
    let (vmcs, memory) = setup();
    vmcs.set(VmcsField::GuestDsBase, 0x0001_0000);
    let vcpu = vcpu(&vmcs, &memory);

    assert_eq!(vcpu.linear_address(0x1234, Segment::Ds), Va(0x0001_1234));
    assert_eq!(vcpu.linear_address(0x1234, Segment::Es), Va(0x1234));
}

#[test]
fn linear_address_wraps() {
    let (vmcs, memory) = setup();
    vmcs.set(VmcsField::GuestFsBase, u64::MAX);
    let vcpu = vcpu(&vmcs, &memory);

    assert_eq!(vcpu.linear_address(2, Segment::Fs), Va(1));
}

#[test]
fn linear_address_truncates_by_size() {
    let (vmcs, memory) = setup();
    let vcpu = vcpu(&vmcs, &memory);

    assert_eq!(vcpu.linear_address_sized(0xffff_ffff, 2, Segment::Ds), Va(0xffff));

    vmcs.set(VmcsField::GuestSsBase, 0x100);
    let offset = 0x1234_5678_9abc_def0;
    assert_eq!(vcpu.linear_address_sized(offset, 2, Segment::Ss), Va(0xdef0 + 0x100));
    assert_eq!(vcpu.linear_address_sized(offset, 4, Segment::Ss), Va(0x9abc_def0 + 0x100));
    assert_eq!(vcpu.linear_address_sized(offset, 8, Segment::Ss), Va(offset + 0x100));
    assert_eq!(vcpu.linear_address_sized(offset, 1, Segment::Ss), Va(offset + 0x100));
}

#[test]
fn linear_instruction_pointer_uses_code_segment() {
    let (vmcs, memory) = setup();
    vmcs.set(VmcsField::GuestCsBase, 0xf_0000);
    vmcs.set(VmcsField::GuestDsBase, 0x1234);
    let vcpu = vcpu(&vmcs, &memory);

    assert_eq!(vcpu.linear_instruction_pointer(0xfff0), Va(0xf_fff0));
}
