//! `ped-stages` — the strategic vocabulary: stages and journeys.
//!
//! A [`Stage`] is a point of interest with a completion predicate; a
//! [`Journey`] is a directed graph over stage ids with a transition rule per
//! node.  Both are closed sums dispatched by `match` — the set of stage and
//! rule variants is part of the engine contract, not an extension point.
//!
//! Stage interior state (waiting-set and queue occupancy) is mutated only in
//! the serial strategic phase; journeys are read-only after creation except
//! for their round-robin counters.

mod journey;
mod stage;

mod error;


pub use error::{StageError, StageResult};
pub use journey::{Journey, TransitionRule};
pub use stage::{Stage, StageDescription};
