//! Login abuse protection.
//!
//! Two independent mechanisms share one log of failed attempts:
//! - Account suspension: too many failures against one account in a short
//!   window lock that account for a fixed period after the latest failure.
//! - Origin blocking: too many failures from one network address across any
//!   accounts block that address while the count stays at the threshold.
//!
//! `LoginEngine` sequences both gates around credential verification. Storage
//! sits behind the `CredentialStore` and `AttemptLog` traits, with a Postgres
//! adapter for deployments and an in-memory one for tests.

pub mod attempt_log;
pub mod clock;
pub mod config;
pub mod credentials;
pub mod engine;
pub mod ip_block;
pub mod memory;
pub mod postgres;
pub mod suspension;

pub use attempt_log::{AttemptLog, AttemptStats, FailedAttempt};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ProtectionConfig;
pub use credentials::{CredentialStore, hash_password};
pub use engine::{LoginAttempt, LoginEngine, LoginOutcome, StorageFailure};
pub use ip_block::BlockDecision;
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use suspension::SuspensionDecision;
