//! IO modules - side effects (network, filesystem)

pub mod staging;
pub mod transport;
