/// Accessor for the virtual machine control structure of a single virtual
/// CPU.
///
/// Field reads and writes are defined never to fail. An implementation backed
/// by a hypervisor call that can fail is expected to resolve the failure
/// itself (typically by aborting the virtual CPU).
pub trait Vmcs {
    /// Identifies a field of the control structure.
    type Field: Copy;

    /// Reads a field of the control structure.
    fn read_field(&self, field: Self::Field) -> u64;

    /// Writes a field of the control structure.
    fn write_field(&self, field: Self::Field, value: u64);
}

impl<T> Vmcs for &T
where
    T: Vmcs + ?Sized,
{
    type Field = T::Field;

    fn read_field(&self, field: Self::Field) -> u64 {
        (**self).read_field(field)
    }

    fn write_field(&self, field: Self::Field, value: u64) {
        (**self).write_field(field, value)
    }
}
