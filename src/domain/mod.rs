// Domain layer: interval/record models and the ports the core talks through.
// No I/O here; concrete adapters live under config/.

pub mod model;
pub mod ports;
