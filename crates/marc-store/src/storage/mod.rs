//! Storage implementations.

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "json")]
pub mod json;

#[cfg(feature = "memory")]
pub use memory::MemoryStorage;

#[cfg(feature = "json")]
pub use json::JsonFileStorage;
