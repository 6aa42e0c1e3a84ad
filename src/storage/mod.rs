//! Storage interfaces and backends

pub mod memory;
pub mod seed;
pub mod traits;

pub use memory::{MemoryCredentialStore, MemoryStudentStorage};
pub use traits::{CredentialStore, Identity, NewIdentity, StudentStorage};
