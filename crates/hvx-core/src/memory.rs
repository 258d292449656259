use zerocopy::{FromBytes, Immutable, IntoBytes};

use crate::{HvxError, Va};

/// Guest memory view of a single virtual CPU.
///
/// Addresses are linear addresses in the guest. Implementations perform any
/// translation they need and fail with [`HvxError::MemoryFault`] for
/// addresses outside guest-accessible space.
pub trait GuestMemory {
    /// Reads `buffer.len()` bytes of guest memory starting at `address`.
    fn read(&self, address: Va, buffer: &mut [u8]) -> Result<(), HvxError>;

    /// Writes `buffer` to guest memory starting at `address`.
    fn write(&self, address: Va, buffer: &[u8]) -> Result<(), HvxError>;

    /// Reads a struct from guest memory.
    ///
    /// The result is zero-initialized before the read, so a failed read
    /// never exposes stale bytes.
    fn read_struct<T>(&self, address: Va) -> Result<T, HvxError>
    where
        T: FromBytes + IntoBytes,
        Self: Sized,
    {
        let mut result = T::new_zeroed();
        self.read(address, result.as_mut_bytes())?;
        Ok(result)
    }

    /// Writes a struct to guest memory.
    fn write_struct<T>(&self, address: Va, value: T) -> Result<(), HvxError>
    where
        T: IntoBytes + Immutable,
        Self: Sized,
    {
        self.write(address, value.as_bytes())
    }
}

impl<T> GuestMemory for &T
where
    T: GuestMemory + ?Sized,
{
    fn read(&self, address: Va, buffer: &mut [u8]) -> Result<(), HvxError> {
        (**self).read(address, buffer)
    }

    fn write(&self, address: Va, buffer: &[u8]) -> Result<(), HvxError> {
        (**self).write(address, buffer)
    }
}
