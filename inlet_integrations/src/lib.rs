//! Clients for external integration backends.

pub mod platform;

pub use platform::PlatformClient;
