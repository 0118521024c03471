//! Contest timeouts racing judged completions on a shared queue manager.

#![allow(clippy::unwrap_used)]

use tempo_actions::{ContestHost, ContestStatus, Recipient, World};
use tempo_core::{QueueManager, SchedulerConfig};
use tempo_types::{ActorState, QueueName};

#[test]
fn completion_at_45s_beats_timeout_at_60s() {
    let mut world = World::default();
    let mut manager: QueueManager<World> =
        QueueManager::from_config(&SchedulerConfig::default()).unwrap();
    let solver = world.roster_mut().spawn(ActorState::new("Oona")).unwrap();

    let contests = manager.queue_mut(QueueName::Contests).unwrap();
    let id = world
        .contests()
        .open("What runs but never walks?", "a river", 60_000, contests)
        .unwrap();

    manager.advance(40_000, &mut world).unwrap();
    let contests = manager.queue_mut(QueueName::Contests).unwrap();
    assert!(world
        .contests()
        .submit(id, solver, "a river", 5_000, contests)
        .unwrap());
    assert_eq!(manager.total_pending(), 2);

    let report = manager.advance(45_000, &mut world).unwrap();
    assert_eq!(report.fired(), 1);
    assert_eq!(
        world.contest_board().status(id),
        Some(ContestStatus::Won {
            winner: solver,
            at: 45_000
        })
    );
    assert_eq!(manager.total_pending(), 0);

    let report = manager.advance(60_000, &mut world).unwrap();
    assert_eq!(report.fired(), 0);

    let announcements: Vec<_> = world
        .drain_outbox()
        .into_iter()
        .filter(|delivery| delivery.recipient == Recipient::Everyone)
        .collect();
    assert_eq!(announcements.len(), 1);
}

#[test]
fn unanswered_contest_times_out_once() {
    let mut world = World::default();
    let mut manager: QueueManager<World> =
        QueueManager::from_config(&SchedulerConfig::default()).unwrap();
    let contests = manager.queue_mut(QueueName::Contests).unwrap();
    let id = world
        .contests()
        .open("What has keys but no locks?", "a piano", 60_000, contests)
        .unwrap();

    manager.advance(59_999, &mut world).unwrap();
    assert_eq!(world.contest_board().status(id), Some(ContestStatus::Open));

    manager.advance(60_000, &mut world).unwrap();
    assert_eq!(
        world.contest_board().status(id),
        Some(ContestStatus::TimedOut { at: 60_000 })
    );
    assert_eq!(world.contest_board().open_count(), 0);
    assert_eq!(manager.advance(120_000, &mut world).unwrap().fired(), 0);
}
