// Domain layer: feed models and ports (interfaces).

pub mod model;
pub mod ports;
