//! Cache module - named typed caches built on Moka.
//!
//! A central `CacheRegistry` hands out `TypedCache` instances by name so
//! repositories and the gate can share or isolate caches without wiring
//! them through every constructor.

mod config;
mod registry;
mod typed;

pub use config::CacheConfig;
pub use registry::CacheRegistry;
pub use typed::TypedCache;
