// Domain layer: probe models and ports. No network code lives here.

pub mod model;
pub mod ports;
