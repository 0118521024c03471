//! Ambient world events: weather, dusk, and object decay.
//!
//! Each producer owns its queue and wraps its events with [`guarded`], so a
//! failure retires that one event and the rest of the tick carries on.

use rand::Rng;
use tempo_actions::{ContestHost, World};
use tempo_core::{EventError, EventResult, Queue, QueueManager, Reference, Reschedule, guarded};
use tempo_types::{ActorId, Percentile, QueueName, Terrain, Tick};
use tracing::{debug, info};

use crate::error::EngineError;

/// How often the weather may change.
const WEATHER_PERIOD: Tick = 20_000;

/// How often the light fades outdoors.
const DUSK_PERIOD: Tick = 5_000;

/// Light lost outdoors per dusk step.
const DUSK_STEP: i32 = 10;

/// When carried bread goes stale.
const BREAD_SHELF_LIFE: Tick = 15_000;

/// Sky conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Weather {
    Clear,
    Overcast,
    Rain,
    Fog,
}

impl Weather {
    const ALL: [Self; 4] = [Self::Clear, Self::Overcast, Self::Rain, Self::Fog];

    const fn describe(self) -> &'static str {
        match self {
            Self::Clear => "The clouds part and the sky clears.",
            Self::Overcast => "Grey clouds gather overhead.",
            Self::Rain => "It begins to rain.",
            Self::Fog => "A thick fog rolls in.",
        }
    }

    /// Outdoor light under this sky.
    const fn light(self) -> i32 {
        match self {
            Self::Clear => 100,
            Self::Overcast => 70,
            Self::Rain => 50,
            Self::Fog => 30,
        }
    }
}

const fn sheltered(terrain: Terrain) -> bool {
    matches!(terrain, Terrain::Indoors | Terrain::Underground)
}

/// Register every ambient producer on its own queue.
///
/// Returns the bread-rot reference for `owner`, if one was scheduled.
pub fn register(
    manager: &mut QueueManager<World>,
    owner: Option<ActorId>,
) -> Result<Option<Reference>, EngineError> {
    register_weather(manager.queue_mut(QueueName::Weather)?)?;
    register_dusk(manager.queue_mut(QueueName::Lights)?)?;
    let rot = match owner {
        Some(actor) => Some(register_bread_rot(
            manager.queue_mut(QueueName::Objects)?,
            actor,
        )?),
        None => None,
    };
    info!(pending = manager.total_pending(), "Ambient events registered");
    Ok(rot)
}

fn register_weather(queue: &mut Queue<World>) -> Result<Reference, EngineError> {
    let mut current = Weather::Clear;
    let event = guarded(
        "weather",
        move |world: &mut World, _queue: &mut Queue<World>| -> EventResult {
            let index = world.rng_mut().random_range(0..Weather::ALL.len());
            let next = Weather::ALL.get(index).copied().unwrap_or(Weather::Clear);
            if next == current {
                debug!(weather = ?current, "weather holds");
                return Ok(Reschedule::After(WEATHER_PERIOD));
            }
            current = next;
            let light = Percentile::saturating(next.light());
            for actor in world.roster_mut().iter_mut() {
                if !sheltered(actor.state.terrain) {
                    actor.state.light = light;
                }
            }
            world.announce(next.describe().to_owned());
            info!(weather = ?next, light = light.value(), "weather changed");
            Ok(Reschedule::After(WEATHER_PERIOD))
        },
    );
    Ok(queue.add(event, WEATHER_PERIOD)?)
}

fn register_dusk(queue: &mut Queue<World>) -> Result<Reference, EngineError> {
    let event = guarded(
        "dusk",
        |world: &mut World, _queue: &mut Queue<World>| -> EventResult {
            let mut darkened = 0_usize;
            for actor in world.roster_mut().iter_mut() {
                if sheltered(actor.state.terrain) {
                    continue;
                }
                let faded = i32::from(actor.state.light.value()).saturating_sub(DUSK_STEP);
                actor.state.light = Percentile::saturating(faded);
                darkened = darkened.saturating_add(1);
            }
            if darkened == 0 {
                return Err(EventError::failed("nobody outdoors to darken"));
            }
            debug!(darkened, "dusk deepens");
            Ok(Reschedule::After(DUSK_PERIOD))
        },
    );
    Ok(queue.add(event, DUSK_PERIOD)?)
}

fn register_bread_rot(queue: &mut Queue<World>, owner: ActorId) -> Result<Reference, EngineError> {
    let event = guarded(
        "bread rot",
        move |world: &mut World, _queue: &mut Queue<World>| -> EventResult {
            let Some(actor) = world.roster_mut().get_mut(owner) else {
                // Owner has left; nothing to spoil.
                return Ok(Reschedule::Done);
            };
            if !actor.state.take_one("bread") {
                return Err(EventError::failed("bread already gone"));
            }
            actor.state.give("stale bread", 1);
            info!(actor = %owner, "bread went stale");
            Ok(Reschedule::Done)
        },
    );
    Ok(queue.add(event, BREAD_SHELF_LIFE)?)
}
