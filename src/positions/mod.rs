//! Position lifecycle: model, settlement rules, storage, request path and monitor

pub mod ledger;
pub mod monitor;
pub mod resolver;
pub mod service;
pub mod types;

pub use ledger::InMemoryLedger;
pub use monitor::{format_digest, CycleReport, PositionEvent, PositionMonitor};
pub use resolver::{Resolution, SettlementResolver};
pub use service::PositionService;
pub use types::{EntrySnapshot, NewPosition, PositionStatus, PositionUpdate, TrackedPosition};
