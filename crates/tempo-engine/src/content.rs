//! Demo content: a closed set of operations, the cast, and a command plan.
//!
//! Each [`Operation`] variant carries its own requirements and behaviour,
//! selected by `match`. The scheduling core never looks inside.

use tempo_actions::{
    Action, ActionContext, ActionError, InductionDescriptor, InductionInstance, PerformError,
    Requirements, Response,
};
use tempo_types::{ActorState, Flag, Percentile, Stance, Terrain, Tick};

/// Finds after which a dig hole is exhausted.
const DIG_DEPTH: u32 = 3;

/// Every operation the demo can dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Describe the surroundings, or a named thing.
    Look,
    /// Sit down.
    Sit,
    /// Get up.
    Stand,
    /// Dig for stones. Repeating and primary; needs a shovel.
    Dig,
    /// Forage for berries once. Broadcast to onlookers.
    Forage,
    /// Wander about. Repeating but freely pre-empted.
    Wander,
    /// Stop whatever is in progress.
    Stop,
}

impl Action for Operation {
    fn name(&self) -> &str {
        match self {
            Self::Look => "look",
            Self::Sit => "sit",
            Self::Stand => "stand",
            Self::Dig => "dig",
            Self::Forage => "forage",
            Self::Wander => "wander",
            Self::Stop => "stop",
        }
    }

    fn requirements(&self) -> Requirements {
        match self {
            Self::Look => Requirements::new().any_stance().flag(Flag::Light).instant(),
            Self::Sit => Requirements::new(),
            Self::Stand | Self::Stop => Requirements::new().any_stance().instant(),
            Self::Dig => Requirements::new()
                .requires("shovel")
                .forbid_terrain(Terrain::Indoors)
                .forbid_terrain(Terrain::Urban)
                .forbid_terrain(Terrain::Water)
                .flag(Flag::Induction),
            Self::Forage => Requirements::new()
                .forbid_terrain(Terrain::Indoors)
                .forbid_terrain(Terrain::Urban)
                .flag(Flag::Light)
                .flag(Flag::Induction),
            Self::Wander => Requirements::new().flag(Flag::Induction),
        }
    }

    fn perform(
        &self,
        ctx: &mut ActionContext<'_>,
        args: &[String],
    ) -> Result<Response, PerformError> {
        match self {
            Self::Look => Ok(look(ctx, args)),
            Self::Sit => {
                ctx.actor.stance = Stance::Sitting;
                Ok(Response::success("You sit down."))
            }
            Self::Stand => {
                if ctx.actor.stance == Stance::Standing {
                    return Err(ActionError::Failed {
                        message: "You are already standing.".to_owned(),
                    }
                    .into());
                }
                ctx.actor.stance = Stance::Standing;
                Ok(Response::success("You stand up."))
            }
            Self::Dig => dig(),
            Self::Forage => forage(),
            Self::Wander => wander(),
            Self::Stop => Err(PerformError::bug(
                "stop is an interrupt and must not be performed",
            )),
        }
    }
}

fn look(ctx: &ActionContext<'_>, args: &[String]) -> Response {
    match args.first() {
        Some(thing) if ctx.actor.carries(thing) => {
            Response::info(format!("You look at your {thing}. It looks ordinary."))
        }
        Some(thing) => Response::info(format!("You see no {thing} here.")),
        None => Response::info(format!(
            "You are {}. The light is at {}.",
            ctx.actor.terrain.as_str(),
            ctx.actor.light
        )),
    }
}

fn dig() -> Result<Response, PerformError> {
    let descriptor = InductionDescriptor::builder("digging", 5_000)
        .repeating()
        .primary()
        .flag(Flag::Spinner)
        .build()?;
    let difficulty = Percentile::new(40).unwrap_or_default();
    let mut finds = 0_u32;
    let body = InductionInstance::new(descriptor, move |ctx: &mut ActionContext<'_>| {
        if !ctx.actor.carries("shovel") {
            return Err(ActionError::MissingObject {
                object: "shovel".to_owned(),
            }
            .into());
        }
        if finds >= DIG_DEPTH {
            return Err(ActionError::Failed {
                message: "The hole is as deep as it will go.".to_owned(),
            }
            .into());
        }
        if ctx.check("digging", difficulty).success {
            finds = finds.saturating_add(1);
            ctx.actor.give("stone", 1);
            Ok(Response::success("You unearth a stone."))
        } else {
            Ok(Response::info("You dig, but find only dirt."))
        }
    });
    Ok(Response::success("You start digging.").with_induction(body))
}

fn forage() -> Result<Response, PerformError> {
    let descriptor = InductionDescriptor::builder("foraging", 3_000)
        .flag(Flag::Broadcast)
        .build()?;
    let difficulty = Percentile::new(30).unwrap_or_default();
    let body = InductionInstance::new(descriptor, move |ctx: &mut ActionContext<'_>| {
        if ctx.check("foraging", difficulty).success {
            ctx.actor.give("berries", 1);
            Ok(Response::success("You gather a handful of berries."))
        } else {
            Ok(Response::info("You find nothing worth eating."))
        }
    });
    Ok(Response::info("You start searching the undergrowth.").with_induction(body))
}

fn wander() -> Result<Response, PerformError> {
    let descriptor = InductionDescriptor::builder("wandering", 4_000)
        .repeating()
        .build()?;
    let body = InductionInstance::new(descriptor, |_ctx: &mut ActionContext<'_>| {
        Ok(Response::info("You wander aimlessly."))
    });
    Ok(Response::info("You set off wandering.").with_induction(body))
}

/// One scripted command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// An actor runs an operation.
    Act {
        /// Actor name.
        actor: &'static str,
        /// What to do.
        operation: Operation,
        /// Operation arguments.
        args: Vec<String>,
    },
    /// An actor answers the open contest.
    Answer {
        /// Actor name.
        actor: &'static str,
        /// The answer given.
        answer: &'static str,
    },
}

/// A step due at a point in virtual time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scheduled {
    /// When the step runs.
    pub at: Tick,
    /// What runs.
    pub step: Step,
}

fn act(at: Tick, actor: &'static str, operation: Operation) -> Scheduled {
    Scheduled {
        at,
        step: Step::Act {
            actor,
            operation,
            args: Vec::new(),
        },
    }
}

/// The demo cast.
pub fn cast() -> Vec<ActorState> {
    let mut marit = ActorState::new("Marit");
    marit.give("shovel", 1);
    marit.give("bread", 1);
    marit.skills.insert(
        "digging".to_owned(),
        Percentile::new(60).unwrap_or_default(),
    );

    let mut oona = ActorState::new("Oona");
    oona.terrain = Terrain::Forest;
    oona.skills.insert(
        "foraging".to_owned(),
        Percentile::new(45).unwrap_or_default(),
    );

    let mut tomas = ActorState::new("Tomas");
    tomas.terrain = Terrain::Indoors;
    tomas.give("shovel", 1);

    vec![marit, oona, tomas]
}

/// Question and answer for the demo contest.
pub const CONTEST: (&str, &str) = ("What has roots nobody sees?", "a mountain");

/// The demo command plan, in time order.
pub fn script() -> Vec<Scheduled> {
    vec![
        act(0, "Marit", Operation::Wander),
        act(500, "Marit", Operation::Dig),
        act(750, "Oona", Operation::Sit),
        act(1_000, "Oona", Operation::Forage),
        act(1_250, "Oona", Operation::Stand),
        act(1_500, "Oona", Operation::Forage),
        act(2_000, "Tomas", Operation::Dig),
        Scheduled {
            at: 2_500,
            step: Step::Act {
                actor: "Tomas",
                operation: Operation::Look,
                args: vec!["shovel".to_owned()],
            },
        },
        act(3_000, "Tomas", Operation::Stop),
        act(6_000, "Marit", Operation::Forage),
        Scheduled {
            at: 8_000,
            step: Step::Answer {
                actor: "Tomas",
                answer: "a tree",
            },
        },
        Scheduled {
            at: 9_000,
            step: Step::Answer {
                actor: "Oona",
                answer: "a mountain",
            },
        },
        act(12_000, "Oona", Operation::Wander),
        act(14_000, "Oona", Operation::Stop),
        act(14_250, "Oona", Operation::Stop),
        act(27_000, "Marit", Operation::Look),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempo_actions::{ActionExecutor, InductionState, World};
    use tempo_core::Queue;
    use tempo_types::{Outcome, QueueName};

    use super::*;

    fn world_with_cast() -> World {
        let mut world = World::default();
        for actor in cast() {
            world.roster_mut().spawn(actor).unwrap();
        }
        world
    }

    fn id_of(world: &World, name: &str) -> tempo_types::ActorId {
        world.roster().find_by_name(name).unwrap().state.id
    }

    #[test]
    fn script_is_in_time_order() {
        let plan = script();
        assert!(plan.windows(2).all(|pair| match pair {
            [a, b] => a.at <= b.at,
            _ => true,
        }));
    }

    #[test]
    fn digging_indoors_is_refused() {
        let mut world = world_with_cast();
        let mut queue = Queue::new(QueueName::Inductions);
        let tomas = id_of(&world, "Tomas");
        let response = ActionExecutor::new()
            .execute(&mut world, &mut queue, tomas, &Operation::Dig, &[])
            .unwrap();
        assert_eq!(response.outcome, Outcome::Failure);
        assert_eq!(response.text, "You can't do that indoors.");
    }

    #[test]
    fn dig_pre_empts_wander_and_stops_when_exhausted() {
        let mut world = world_with_cast();
        let mut queue = Queue::new(QueueName::Inductions);
        let marit = id_of(&world, "Marit");
        let executor = ActionExecutor::new();
        executor
            .execute(&mut world, &mut queue, marit, &Operation::Wander, &[])
            .unwrap();
        executor
            .execute(&mut world, &mut queue, marit, &Operation::Dig, &[])
            .unwrap();
        assert_eq!(queue.size(), 1);

        // Give the body plenty of tries; it ends once three stones are found.
        let mut target: u64 = 0;
        while world.roster().get(marit).unwrap().induction.is_active() && target < 500_000 {
            target = target.saturating_add(5_000);
            queue.advance(target, &mut world).unwrap();
        }
        let actor = world.roster().get(marit).unwrap();
        assert_eq!(actor.induction.state(), InductionState::Idle);
        assert_eq!(actor.state.count_of("stone"), DIG_DEPTH);
        assert!(queue.is_empty());
    }

    #[test]
    fn stand_when_standing_is_a_failure_response() {
        let mut world = world_with_cast();
        let mut queue = Queue::new(QueueName::Inductions);
        let marit = id_of(&world, "Marit");
        let response = ActionExecutor::new()
            .execute(&mut world, &mut queue, marit, &Operation::Stand, &[])
            .unwrap();
        assert!(response.is_failure());
    }

    #[test]
    fn only_instant_operations_run_while_digging() {
        let mut world = world_with_cast();
        let mut queue = Queue::new(QueueName::Inductions);
        let marit = id_of(&world, "Marit");
        let executor = ActionExecutor::new();
        executor
            .execute(&mut world, &mut queue, marit, &Operation::Dig, &[])
            .unwrap();

        let sit = executor
            .execute(&mut world, &mut queue, marit, &Operation::Sit, &[])
            .unwrap();
        assert_eq!(sit.text, "You are busy digging.");
        assert_eq!(
            world.roster().get(marit).unwrap().state.stance,
            Stance::Standing
        );

        let look = executor
            .execute(&mut world, &mut queue, marit, &Operation::Look, &[])
            .unwrap();
        assert_eq!(look.outcome, Outcome::Info);
        assert_eq!(
            world.roster().get(marit).unwrap().induction.label(),
            Some("digging")
        );
    }

    #[test]
    fn look_takes_an_argument() {
        let mut world = world_with_cast();
        let mut queue = Queue::new(QueueName::Inductions);
        let tomas = id_of(&world, "Tomas");
        let args = vec!["shovel".to_owned()];
        let response = ActionExecutor::new()
            .execute(&mut world, &mut queue, tomas, &Operation::Look, &args)
            .unwrap();
        assert_eq!(response.text, "You look at your shovel. It looks ordinary.");
    }
}
