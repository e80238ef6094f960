//! Grindmode common library - shared types and the mode state machine
//!
//! The daemon and the CLI both depend on this crate. Everything that touches
//! the persisted configuration record lives here.

pub mod api;
pub mod clock;
pub mod error;
pub mod machine;
pub mod patch;
pub mod record;
pub mod store;
pub mod whitelist;

pub use api::{ErrorBody, HealthResponse};
pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "test-util"))]
pub use clock::ManualClock;
pub use error::StateError;
pub use machine::ModeStateMachine;
pub use patch::{ClientGrindRequest, ConfigPatch};
pub use record::{ConfigRecord, Mode, DEFAULT_WHITELIST};
pub use store::{ConfigStore, FileStore, MemoryStore};

/// Crate version, reported by the daemon health route
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
