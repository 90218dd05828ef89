pub mod worker;

pub use worker::{SettlementConfig, SettlementWorker, WorkOutcome};
