// Domain layer: Sankhya payloads, presentation records and the ports the core talks through.

pub mod model;
pub mod ports;
