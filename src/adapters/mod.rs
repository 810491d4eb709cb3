// Adapters layer: concrete implementations of the domain ports for the local machine.

pub mod storage;
