// Domain layer: request models and ports for the external services.

pub mod model;
pub mod ports;
