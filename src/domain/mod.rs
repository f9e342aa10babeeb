// Domain layer: row model and ports. Concrete stores live under adapters.

pub mod model;
pub mod ports;
