//! Journeys: directed transition graphs over stage ids.

use std::collections::BTreeMap;

use ped_core::{JourneyId, StageId};

use crate::error::{StageError, StageResult};

// ── TransitionRule ────────────────────────────────────────────────────────────

/// What happens when an agent completes a stage.
#[derive(Clone, Debug)]
pub enum TransitionRule {
    /// Always continue with the given stage.
    Fixed(StageId),
    /// Distribute completing agents over several stages in weighted
    /// round-robin order (weights are positive integers).
    RoundRobin(Vec<(StageId, u64)>),
    /// Terminal stage: agents stay (or, for exits, are removed).
    NonTransition,
}

// ── Journey ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
struct RoundRobinState {
    arm: usize,
    remaining: u64,
}

/// A journey: `stage id → transition rule`, plus the round-robin counters.
///
/// Stage references are ids, not pointers; the simulation resolves them
/// through its stage registry.  [`Journey::new`] checks internal consistency;
/// the registry check against existing stages happens at `AddJourney`.
pub struct Journey {
    pub id: JourneyId,
    rules: BTreeMap<StageId, TransitionRule>,
    rr_state: BTreeMap<StageId, RoundRobinState>,
}

impl Journey {
    pub fn new(id: JourneyId, rules: BTreeMap<StageId, TransitionRule>) -> StageResult<Self> {
        for (stage, rule) in &rules {
            if let TransitionRule::RoundRobin(arms) = rule {
                if arms.is_empty() {
                    return Err(StageError::EmptyRoundRobin(*stage));
                }
                if arms.iter().any(|&(_, w)| w == 0) {
                    return Err(StageError::NonPositiveWeight(*stage));
                }
            }
        }
        Ok(Self {
            id,
            rules,
            rr_state: BTreeMap::new(),
        })
    }

    /// Every stage id this journey mentions (nodes and rule targets).
    pub fn referenced_stages(&self) -> impl Iterator<Item = StageId> + '_ {
        self.rules.iter().flat_map(|(&stage, rule)| {
            let targets: Vec<StageId> = match rule {
                TransitionRule::Fixed(next) => vec![*next],
                TransitionRule::RoundRobin(arms) => arms.iter().map(|&(s, _)| s).collect(),
                TransitionRule::NonTransition => vec![],
            };
            std::iter::once(stage).chain(targets)
        })
    }

    pub fn contains_stage(&self, stage: StageId) -> bool {
        self.rules.contains_key(&stage)
    }

    /// The next stage for an agent completing `current`, advancing the
    /// round-robin counter when the rule is weighted.
    ///
    /// Returns `None` for terminal stages and for stages this journey does
    /// not contain.
    pub fn next_stage(&mut self, current: StageId) -> Option<StageId> {
        match self.rules.get(&current)? {
            TransitionRule::Fixed(next) => Some(*next),
            TransitionRule::NonTransition => None,
            TransitionRule::RoundRobin(arms) => {
                let arms = arms.clone();
                let state = self
                    .rr_state
                    .entry(current)
                    .or_insert_with(|| RoundRobinState { arm: 0, remaining: arms[0].1 });
                if state.remaining == 0 {
                    state.arm = (state.arm + 1) % arms.len();
                    state.remaining = arms[state.arm].1;
                }
                state.remaining -= 1;
                Some(arms[state.arm].0)
            }
        }
    }
}
