//! Access token values handed out by the cache.

pub mod access;
pub mod secret;
