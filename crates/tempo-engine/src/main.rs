//! Driver binary for the Tempo action scheduler.
//!
//! Wires the queue manager, the in-memory world, and the demo content
//! together and runs a paced tick loop over virtual time.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `tempo-config.yaml` (or `TEMPO_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Create the queue manager and world from config
//! 4. Spawn the demo cast and open the demo contest
//! 5. Register ambient events (weather, dusk, decay)
//! 6. Run the tick loop, dispatching the command plan as it comes due
//! 7. Clear every queue and print the run summary as JSON

mod ambient;
mod content;
mod error;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use tempo_actions::{
    ActionExecutor, ActionHost, ContestHost, Delivery, ExecuteError, Recipient, World,
};
use tempo_core::{QueueManager, SchedulerConfig, TickReport};
use tempo_types::{ActorId, ContestId, QueueName, Tick};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::content::{CONTEST, Operation, Scheduled, Step};
use crate::error::EngineError;

/// How long the demo contest stays open.
const CONTEST_TIMEOUT: Tick = 20_000;

/// How long a correct contest answer takes to judge.
const CONTEST_JUDGING: Tick = 5_000;

/// How long a settled contest stays on the board before it is pruned.
const CONTEST_RETENTION: Tick = 60_000;

/// Final state of one actor.
#[derive(Debug, Serialize)]
struct ActorSummary {
    name: String,
    stance: tempo_types::Stance,
    light: u8,
    inventory: BTreeMap<String, u32>,
    busy: bool,
}

/// What the run did, printed as JSON at shutdown.
#[derive(Debug, Default, Serialize)]
struct RunSummary {
    ended_at: Tick,
    ticks: u64,
    events_fired: usize,
    event_failures: usize,
    commands: usize,
    deliveries: usize,
    contest: Option<tempo_actions::ContestStatus>,
    dropped_at_shutdown: usize,
    actors: Vec<ActorSummary>,
}

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, setup, or a queue sweep fails.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!(
        start_ms = config.clock.start_ms,
        tick_interval_ms = config.clock.tick_interval_ms,
        pace_ms = config.clock.pace_ms,
        run_for_ms = config.engine.run_for_ms,
        "Configuration loaded"
    );

    // 3. Queue manager and world.
    let mut manager: QueueManager<World> = QueueManager::from_config(&config)?;
    let mut world = World::from_config(&config.skills);

    // 4. Cast and contest.
    for actor in content::cast() {
        world.roster_mut().spawn(actor)?;
    }
    let (question, answer) = CONTEST;
    let contest = world.contests().open(
        question,
        answer,
        CONTEST_TIMEOUT,
        manager.queue_mut(QueueName::Contests)?,
    )?;
    info!(actors = world.roster().len(), contest = %contest, "World populated");

    // 5. Ambient events.
    let baker = actor_id(&world, "Marit");
    ambient::register(&mut manager, baker)?;

    // 6. Tick loop.
    let summary = run(&config, &mut manager, &mut world, contest).await?;

    // 7. Shutdown.
    println!("{}", serde_json::to_string_pretty(&summary)?);
    info!(
        ended_at = summary.ended_at,
        ticks = summary.ticks,
        events_fired = summary.events_fired,
        "tempo-engine shutdown complete"
    );
    Ok(())
}

/// Drive virtual time forward until `engine.run_for_ms` has elapsed.
async fn run(
    config: &SchedulerConfig,
    manager: &mut QueueManager<World>,
    world: &mut World,
    contest: ContestId,
) -> Result<RunSummary, EngineError> {
    let executor = ActionExecutor::new();
    let start = manager.now();
    let end = start.saturating_add(config.engine.run_for_ms);
    let pace = Duration::from_millis(config.clock.pace_ms);
    let mut plan = content::script().into_iter().peekable();
    let mut summary = RunSummary::default();

    while manager.now() < end {
        // Commands due at the current time run before the sweep.
        while let Some(scheduled) = plan.next_if(|s| start.saturating_add(s.at) <= manager.now()) {
            dispatch(executor, manager, world, contest, scheduled)?;
            summary.commands = summary.commands.saturating_add(1);
        }

        let target = manager
            .now()
            .saturating_add(config.clock.tick_interval_ms)
            .min(end);
        let report = manager.advance(target, world)?;
        record(&mut summary, &report);
        if let Some(cutoff) = manager.now().checked_sub(CONTEST_RETENTION) {
            world.contests().prune_settled(cutoff);
        }
        let deliveries = world.drain_outbox();
        summary.deliveries = summary
            .deliveries
            .saturating_add(log_deliveries(world, deliveries));

        if !pace.is_zero() {
            tokio::time::sleep(pace).await;
        }
    }

    summary.ended_at = manager.now();
    summary.contest = world.contest_board().status(contest);
    summary.actors = world
        .roster()
        .iter()
        .map(|actor| ActorSummary {
            name: actor.state.name.clone(),
            stance: actor.state.stance,
            light: actor.state.light.value(),
            inventory: actor.state.inventory.clone(),
            busy: actor.induction.is_active(),
        })
        .collect();
    for id in world.roster().busy() {
        info!(actor = %name_of(world, id), "actor still busy at shutdown");
    }
    summary.dropped_at_shutdown = manager.clear();
    info!(dropped = summary.dropped_at_shutdown, "Queues cleared");
    Ok(summary)
}

/// Run one scripted step.
fn dispatch(
    executor: ActionExecutor,
    manager: &mut QueueManager<World>,
    world: &mut World,
    contest: ContestId,
    scheduled: Scheduled,
) -> Result<(), EngineError> {
    match scheduled.step {
        Step::Act {
            actor,
            operation,
            args,
        } => {
            let Some(id) = actor_id(world, actor) else {
                warn!(actor, "scripted actor not found");
                return Ok(());
            };
            let queue = manager.queue_mut(QueueName::Inductions)?;
            let outcome = match operation {
                Operation::Stop => executor.interrupt(world, queue, id),
                other => executor.execute(world, queue, id, &other, &args),
            };
            match outcome {
                Ok(response) => world.deliver(id, response),
                Err(ExecuteError::Queue { source }) => return Err(source.into()),
                Err(failure) => {
                    error!(actor, operation = ?operation, error = %failure, "command failed");
                }
            }
        }
        Step::Answer { actor, answer } => {
            let Some(id) = actor_id(world, actor) else {
                warn!(actor, "scripted actor not found");
                return Ok(());
            };
            let queue = manager.queue_mut(QueueName::Contests)?;
            match world.contests().submit(contest, id, answer, CONTEST_JUDGING, queue) {
                Ok(true) => world.post(
                    Recipient::Actor(id),
                    "Your answer is being judged.",
                    tempo_types::Outcome::Info,
                ),
                Ok(false) => world.post(
                    Recipient::Actor(id),
                    "That is not the answer.",
                    tempo_types::Outcome::Failure,
                ),
                Err(tempo_actions::ContestError::NotOpen(_)) => world.post(
                    Recipient::Actor(id),
                    "The contest is over.",
                    tempo_types::Outcome::Failure,
                ),
                Err(other) => return Err(other.into()),
            }
        }
    }
    Ok(())
}

fn actor_id(world: &World, name: &str) -> Option<ActorId> {
    world.roster().find_by_name(name).map(|actor| actor.state.id)
}

fn record(summary: &mut RunSummary, report: &TickReport) {
    summary.ticks = summary.ticks.saturating_add(1);
    summary.events_fired = summary.events_fired.saturating_add(report.fired());
    for failure in report.failures() {
        summary.event_failures = summary.event_failures.saturating_add(1);
        warn!(
            queue = ?failure.queue,
            label = %failure.label,
            fire_at = failure.fire_at,
            error = %failure.error,
            "event failure reported by sweep"
        );
    }
}

/// Log each delivery the way a session layer would show it.
fn log_deliveries(world: &World, deliveries: Vec<Delivery>) -> usize {
    let count = deliveries.len();
    for delivery in deliveries {
        let (to, name) = match delivery.recipient {
            Recipient::Actor(id) => ("actor", name_of(world, id)),
            Recipient::Observers(id) => ("observers of", name_of(world, id)),
            Recipient::Everyone => ("everyone", String::new()),
        };
        info!(to, name = %name, outcome = ?delivery.outcome, text = %delivery.text, "delivery");
    }
    count
}

fn name_of(world: &World, id: ActorId) -> String {
    world
        .roster()
        .get(id)
        .map_or_else(|| id.short(), |actor| actor.state.name.clone())
}

/// Load configuration from `TEMPO_CONFIG`, or `tempo-config.yaml` in the
/// working directory, falling back to defaults when the file is absent.
fn load_config() -> Result<SchedulerConfig, EngineError> {
    let path = std::env::var_os("TEMPO_CONFIG")
        .map_or_else(|| PathBuf::from("tempo-config.yaml"), PathBuf::from);
    if path.exists() {
        Ok(SchedulerConfig::from_file(&path)?)
    } else {
        Ok(SchedulerConfig::parse("")?)
    }
}
