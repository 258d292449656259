use std::{cell::RefCell, collections::HashMap};

use hvx::{
    GuestMemory, HvxError, Va, VcpuId, Vmcs,
    arch::amd64::{Cr0, Cr4, MsrEfer, Segment, SegmentDescriptor, Selector, Vcpu, VmcsField},
};

/// VMCS backed by a map of field values.
#[derive(Default)]
struct MapVmcs(RefCell<HashMap<VmcsField, u64>>);

impl Vmcs for MapVmcs {
    type Field = VmcsField;

    fn read_field(&self, field: VmcsField) -> u64 {
        self.0.borrow().get(&field).copied().unwrap_or(0)
    }

    fn write_field(&self, field: VmcsField, value: u64) {
        self.0.borrow_mut().insert(field, value);
    }
}

/// One page of guest memory at address 0.
struct Page(RefCell<Vec<u8>>);

impl GuestMemory for Page {
    fn read(&self, address: Va, buffer: &mut [u8]) -> Result<(), HvxError> {
        let start = address.0 as usize;
        let page = self.0.borrow();
        let bytes = page
            .get(start..start + buffer.len())
            .ok_or(HvxError::MemoryFault(address))?;
        buffer.copy_from_slice(bytes);
        Ok(())
    }

    fn write(&self, address: Va, buffer: &[u8]) -> Result<(), HvxError> {
        let start = address.0 as usize;
        let mut page = self.0.borrow_mut();
        let bytes = page
            .get_mut(start..start + buffer.len())
            .ok_or(HvxError::MemoryFault(address))?;
        bytes.copy_from_slice(buffer);
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .init();

    let vmcs = MapVmcs::default();
    let memory = Page(RefCell::new(vec![0u8; 0x1000]));
    let vcpu = Vcpu::new(VcpuId(0), &vmcs, &memory);

    // A GDT with a null entry, a 32-bit and a 64-bit flat code segment.
    vmcs.write_field(VmcsField::GuestGdtrBase, 0x100);
    vmcs.write_field(VmcsField::GuestGdtrLimit, 0x17);
    vcpu.write_segment_descriptor(Selector(0x08), SegmentDescriptor::from_raw(0x00cf_9b00_0000_ffff))?;
    vcpu.write_segment_descriptor(Selector(0x10), SegmentDescriptor::from_raw(0x00af_9b00_0000_ffff))?;

    println!("reset: {:?}", vcpu.cpu_mode());

    vmcs.write_field(VmcsField::GuestCr0, Cr0::PE);
    vmcs.write_field(VmcsField::GuestCsSelector, 0x08);
    println!("protected: {:?}", vcpu.cpu_mode());

    vmcs.write_field(VmcsField::GuestCr0, Cr0::PE | Cr0::PG);
    vmcs.write_field(VmcsField::GuestCr4, Cr4::PAE);
    vmcs.write_field(VmcsField::GuestIa32Efer, MsrEfer::LME | MsrEfer::LMA);
    println!("long, cs=0x08: {:?}", vcpu.cpu_mode());

    vmcs.write_field(VmcsField::GuestCsSelector, 0x10);
    println!("long, cs=0x10: {:?}", vcpu.cpu_mode());
    println!("paging: {:?}", vcpu.paging_mode());

    // Beyond the GDT limit, reported through tracing.
    vmcs.write_field(VmcsField::GuestCsSelector, 0x18);
    println!("long, cs=0x18: {:?}", vcpu.cpu_mode());

    for (name, segment) in [("cs", Segment::Cs), ("ds", Segment::Ds)] {
        println!("{name}: {:#?}", vcpu.read_segment(segment));
    }

    println!("rip 0xfff0 -> {}", vcpu.linear_instruction_pointer(0xfff0));

    Ok(())
}
