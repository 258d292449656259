mod address;
pub(crate) mod macros;
mod vcpu_id;

pub use self::{
    address::{Pa, Va},
    vcpu_id::VcpuId,
};
