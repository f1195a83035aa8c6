// Domain layer: listing models and ports. No external dependencies beyond serde and async-trait.

pub mod model;
pub mod ports;
