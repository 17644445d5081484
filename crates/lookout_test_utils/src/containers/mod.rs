//! Docker container management.

pub mod lifecycle;
