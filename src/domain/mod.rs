// Domain layer: the collection model and the ports towards the REST backend.

pub mod model;
pub mod ports;
