//! Platform-specific permission implementations.

mod host;

pub use host::HostPermissions;
