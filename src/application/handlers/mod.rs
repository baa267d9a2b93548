//! Command handlers. One file per use case, constructed over `Arc<dyn Port>`
//! trait objects so adapters can be swapped without touching the handlers.

pub mod features;
pub mod subscription;
