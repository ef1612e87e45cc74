//! Escrow relay core.
//!
//! # Data Flow
//! ```text
//! intake.rs (validate payload) → service.rs (persist pending record)
//!
//! engine.rs, every tick and on manual trigger:
//!     verifier.rs (classify escrow hash)  → pending → verified
//!     forwarder.rs (broadcast net of fee) → verified → forwarding_pending
//!     verifier.rs (classify forward hash) → forwarding_pending → completed
//!     retention sweep                     → completed/failed → deleted
//! ```

pub mod amount;
pub mod engine;
pub mod error;
pub mod fee;
pub mod forwarder;
pub mod intake;
pub mod service;
pub mod types;
pub mod verifier;

pub use amount::Amount;
pub use engine::{LifecycleEngine, PassSummary, ProcessReport};
pub use error::{EngineError, ForwardError, SubmitError, ValidationError};
pub use fee::{FeeRate, FeeSplit};
pub use intake::IntakeRequest;
pub use service::{EscrowService, HealthReport};
pub use types::{NewTransaction, Transaction, TransactionStatus};
pub use verifier::{Classification, ConfirmationVerifier};
