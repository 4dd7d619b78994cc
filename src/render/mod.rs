//! Offscreen rendering: device abstraction, the `vello_cpu` device and frame read-back.

pub(crate) mod cpu;
pub(crate) mod device;
pub(crate) mod frame;
