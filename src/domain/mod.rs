// Domain layer: records, filter state and ports. No I/O here beyond the port traits.

pub mod frame;
pub mod model;
pub mod ports;
