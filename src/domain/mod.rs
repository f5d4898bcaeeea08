// Domain layer: payload model and ports implemented by adapters and sinks.

pub mod model;
pub mod ports;
