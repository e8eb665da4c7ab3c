//! Emergency evacuation roster and bulk evacuation.

pub mod service;

pub use service::{
    EvacuationOutcome, EvacuationReport, EvacuationRoster, EvacuationScope, EvacuationService,
    OutcomeStatus, RosterEntry,
};
