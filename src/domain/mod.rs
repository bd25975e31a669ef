// Domain layer: project records, order portal payloads and the ports the adapters implement.

pub mod model;
pub mod ports;
