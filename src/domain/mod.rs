// Domain layer: venue models and ports (store, config, clock). No I/O here.

pub mod model;
pub mod ports;
