//! Timed contests: a question, a timeout, and a judged completion racing it.
//!
//! Opening a contest schedules its timeout. The first correct answer
//! schedules a judged completion. Whichever of the two fires first settles
//! the contest and cancels the other's [`Reference`]; the loser, should it
//! still fire, finds the contest no longer open and does nothing.

use std::collections::BTreeMap;

use serde::Serialize;
use tempo_core::{Event, EventResult, Queue, Reference, Reschedule};
use tempo_types::{ActorId, ContestId, Tick};
use tracing::{debug, info};

use crate::error::ContestError;

/// Where a contest stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ContestStatus {
    /// Still accepting answers.
    Open,
    /// Settled in favour of an actor.
    Won {
        /// The winning actor.
        winner: ActorId,
        /// When the win was confirmed.
        at: Tick,
    },
    /// Nobody answered correctly in time.
    TimedOut {
        /// When the contest expired.
        at: Tick,
    },
}

impl ContestStatus {
    /// When the contest was settled, or `None` while it is open.
    pub const fn settled_at(self) -> Option<Tick> {
        match self {
            Self::Open => None,
            Self::Won { at, .. } | Self::TimedOut { at } => Some(at),
        }
    }
}

/// Which side of the race fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// The judged completion for a correct answer.
    Winner(ActorId),
    /// The contest's timeout.
    Timeout,
}

/// One contest.
#[derive(Debug, Clone)]
pub struct Contest {
    /// Identifier.
    pub id: ContestId,
    /// The question posed.
    pub question: String,
    answer: String,
    /// When the contest opened.
    pub opened_at: Tick,
    /// Current status.
    pub status: ContestStatus,
    timeout: Reference,
    completion: Option<Reference>,
}

impl Contest {
    fn accepts(&self, answer: &str) -> bool {
        self.answer.trim().eq_ignore_ascii_case(answer.trim())
    }
}

/// The world as contest events see it.
pub trait ContestHost {
    /// The board holding every contest.
    fn contests(&mut self) -> &mut ContestBoard;

    /// Announce text to everyone.
    fn announce(&mut self, text: String);
}

/// Every contest, open or settled.
#[derive(Debug, Default)]
pub struct ContestBoard {
    contests: BTreeMap<ContestId, Contest>,
}

impl ContestBoard {
    /// Create an empty board.
    pub const fn new() -> Self {
        Self {
            contests: BTreeMap::new(),
        }
    }

    /// Open a contest that times out after `timeout` milliseconds.
    ///
    /// # Errors
    ///
    /// Returns [`ContestError::Queue`] if the timeout cannot be scheduled.
    pub fn open<C: ContestHost>(
        &mut self,
        question: impl Into<String>,
        answer: impl Into<String>,
        timeout: Tick,
        queue: &mut Queue<C>,
    ) -> Result<ContestId, ContestError> {
        let id = ContestId::new();
        let timer = ContestTimer {
            contest: id,
            settlement: Settlement::Timeout,
        };
        let reference = queue.add(timer, timeout)?;
        let contest = Contest {
            id,
            question: question.into(),
            answer: answer.into(),
            opened_at: queue.now(),
            status: ContestStatus::Open,
            timeout: reference,
            completion: None,
        };
        info!(contest = %id, question = %contest.question, timeout, "contest opened");
        self.contests.insert(id, contest);
        Ok(id)
    }

    /// Submit an answer. A correct first answer schedules the judged
    /// completion after `judging` milliseconds and returns `true`; wrong or
    /// late answers return `false`.
    ///
    /// # Errors
    ///
    /// Returns [`ContestError::NotOpen`] if the contest is unknown or
    /// settled, and [`ContestError::Queue`] if scheduling fails.
    pub fn submit<C: ContestHost>(
        &mut self,
        id: ContestId,
        actor: ActorId,
        answer: &str,
        judging: Tick,
        queue: &mut Queue<C>,
    ) -> Result<bool, ContestError> {
        let contest = self
            .contests
            .get_mut(&id)
            .filter(|contest| contest.status == ContestStatus::Open)
            .ok_or(ContestError::NotOpen(id))?;
        if contest.completion.is_some() || !contest.accepts(answer) {
            debug!(contest = %id, actor = %actor, "answer not taken");
            return Ok(false);
        }
        let timer = ContestTimer {
            contest: id,
            settlement: Settlement::Winner(actor),
        };
        contest.completion = Some(queue.add(timer, judging)?);
        info!(contest = %id, actor = %actor, judging, "correct answer; judging");
        Ok(true)
    }

    /// Settle a contest from whichever side fired, cancelling the other.
    ///
    /// Returns the new status, or `None` if the contest was already settled
    /// (the losing side of the race) or is unknown.
    pub fn settle<C>(
        &mut self,
        id: ContestId,
        settlement: Settlement,
        queue: &mut Queue<C>,
    ) -> Option<ContestStatus> {
        let contest = self.contests.get_mut(&id)?;
        if contest.status != ContestStatus::Open {
            debug!(contest = %id, ?settlement, "contest already settled");
            return None;
        }
        let now = queue.now();
        contest.status = match settlement {
            Settlement::Winner(winner) => {
                queue.cancel(contest.timeout);
                ContestStatus::Won { winner, at: now }
            }
            Settlement::Timeout => {
                if let Some(completion) = contest.completion.take() {
                    queue.cancel(completion);
                }
                ContestStatus::TimedOut { at: now }
            }
        };
        info!(contest = %id, status = ?contest.status, "contest settled");
        Some(contest.status)
    }

    /// Look up a contest.
    pub fn get(&self, id: ContestId) -> Option<&Contest> {
        self.contests.get(&id)
    }

    /// Status of a contest.
    pub fn status(&self, id: ContestId) -> Option<ContestStatus> {
        self.contests.get(&id).map(|contest| contest.status)
    }

    /// Forget contests settled at or before `cutoff`. Open contests are
    /// never pruned. Returns how many were removed.
    pub fn prune_settled(&mut self, cutoff: Tick) -> usize {
        let before = self.contests.len();
        self.contests.retain(|_, contest| {
            contest
                .status
                .settled_at()
                .is_none_or(|settled| settled > cutoff)
        });
        let pruned = before.saturating_sub(self.contests.len());
        if pruned > 0 {
            debug!(pruned, cutoff, "settled contests pruned");
        }
        pruned
    }

    /// Number of contests held, open or settled.
    pub fn len(&self) -> usize {
        self.contests.len()
    }

    /// Whether the board holds no contests.
    pub fn is_empty(&self) -> bool {
        self.contests.is_empty()
    }

    /// Number of contests still open.
    pub fn open_count(&self) -> usize {
        self.contests
            .values()
            .filter(|contest| contest.status == ContestStatus::Open)
            .count()
    }
}

/// One side of a contest race.
#[derive(Debug, Clone, Copy)]
struct ContestTimer {
    contest: ContestId,
    settlement: Settlement,
}

impl<C: ContestHost> Event<C> for ContestTimer {
    fn fire(&mut self, host: &mut C, queue: &mut Queue<C>) -> EventResult {
        let Some(status) = host.contests().settle(self.contest, self.settlement, queue) else {
            return Ok(Reschedule::Done);
        };
        let question = host
            .contests()
            .get(self.contest)
            .map(|contest| contest.question.clone())
            .unwrap_or_default();
        let text = match status {
            ContestStatus::Won { .. } => format!("The contest \"{question}\" has been won!"),
            ContestStatus::TimedOut { .. } => {
                format!("Time is up! Nobody answered \"{question}\".")
            }
            ContestStatus::Open => return Ok(Reschedule::Done),
        };
        host.announce(text);
        Ok(Reschedule::Done)
    }

    fn label(&self) -> &str {
        match self.settlement {
            Settlement::Winner(_) => "contest completion",
            Settlement::Timeout => "contest timeout",
        }
    }
}
