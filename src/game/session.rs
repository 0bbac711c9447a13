//! Session Machine
//!
//! Host-authoritative match lifecycle. Every participant observes the
//! replicated stage and timer; only the host runs [`tick`] and
//! [`start_match`], which are the sole writers of session fields. Non-host
//! calls are silent no-ops so the embedding can call them unconditionally.

use tracing::{debug, info};

use crate::fabric::keys::HostWriter;
use crate::fabric::{AvatarView, SessionView, StateFabric};
use crate::game::events::{EventQueue, GameEvent};
use crate::game::state::{Profile, SpawnPoint, Stage};

/// Cadence of the host's session tick.
pub const SESSION_TICK_INTERVAL: std::time::Duration = std::time::Duration::from_millis(500);

/// Advance the session by one host tick.
///
/// In Active the elimination check runs before the timer so a decisive fall
/// ends the round on the same tick it is observed. The Active timer counts
/// up and never expires; Countdown and Winner count down and transition at
/// zero.
pub fn tick(fabric: &dyn StateFabric, events: &mut EventQueue) {
    if !fabric.is_host() {
        return;
    }

    let session = SessionView::new(fabric);
    let stage = session.stage();
    if stage == Stage::Lobby {
        return;
    }

    if stage == Stage::Active && check_elimination(fabric, events) {
        return;
    }

    let timer = session.timer();
    let new_time = if stage.counts_down() { timer - 1 } else { timer + 1 };

    let writer = HostWriter::new(fabric);
    if new_time == 0 && stage.counts_down() {
        let next = stage.next();
        if matches!(next, Stage::Lobby | Stage::Countdown) {
            reset_avatars(fabric, &writer);
        }
        writer.set_stage(next);
        writer.set_timer(next.initial_timer());
        info!(from = ?stage, to = ?next, "stage transition");
        events.push(GameEvent::StageChanged { from: stage, to: next });
    } else {
        writer.set_timer(new_time);
    }
}

/// Begin a round from the lobby. Host-only; ignored in any other stage so a
/// double press of the start button cannot restart a countdown.
pub fn start_match(fabric: &dyn StateFabric, events: &mut EventQueue) {
    if !fabric.is_host() {
        return;
    }

    let session = SessionView::new(fabric);
    if session.stage() != Stage::Lobby {
        debug!(stage = ?session.stage(), "start ignored outside lobby");
        return;
    }

    let solo = fabric.participants().len() == 1;
    let writer = HostWriter::new(fabric);
    writer.set_solo(solo);
    writer.set_stage(Stage::Countdown);
    writer.set_timer(Stage::Countdown.initial_timer());
    info!(solo, "match starting");
    events.push(GameEvent::StageChanged {
        from: Stage::Lobby,
        to: Stage::Countdown,
    });
}

/// End the round early if too few avatars remain standing.
///
/// Returns true when a transition to Winner happened. The survivor's profile
/// becomes the winner; a round where everyone fell ends with no winner.
fn check_elimination(fabric: &dyn StateFabric, events: &mut EventQueue) -> bool {
    let session = SessionView::new(fabric);
    let threshold = if session.solo() { 1 } else { 2 };

    let alive: Vec<Profile> = fabric
        .participants()
        .into_iter()
        .map(|id| AvatarView::new(fabric, id))
        .filter(|view| !view.is_dead())
        .map(|view| view.profile())
        .collect();

    if alive.len() >= threshold {
        return false;
    }

    let winner = alive.first().cloned();
    let writer = HostWriter::new(fabric);
    writer.set_winner(winner.as_ref());
    writer.set_stage(Stage::Winner);
    writer.set_timer(Stage::Winner.initial_timer());
    info!(winner = ?winner.as_ref().map(|p| p.name.as_str()), "round decided");
    events.push(GameEvent::StageChanged {
        from: Stage::Active,
        to: Stage::Winner,
    });
    events.push(GameEvent::WinnerDeclared { profile: winner });
    true
}

/// Clear per-avatar round state and deal fresh spawn points ahead of the
/// next round.
fn reset_avatars(fabric: &dyn StateFabric, writer: &HostWriter) {
    for id in fabric.participants() {
        writer.set_dead(id, false);
        writer.clear_transform(id);
        writer.set_starting_pos(id, SpawnPoint::random());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fabric::keys::{self, AvatarWriter};
    use crate::fabric::{FabricHub, LocalFabric};
    use glam::{Quat, Vec3};
    use proptest::prelude::*;
    use std::sync::Arc;

    fn two_player_session() -> (FabricHub, LocalFabric, LocalFabric) {
        let hub = FabricHub::new();
        let host = hub.join(Profile::new("Ayu", "#e63946"));
        let other = hub.join(Profile::new("Bima", "#457b9d"));
        (hub, host, other)
    }

    fn run_to_active(host: &LocalFabric, events: &mut EventQueue) {
        start_match(host, events);
        for _ in 0..3 {
            tick(host, events);
        }
        assert_eq!(SessionView::new(host).stage(), Stage::Active);
    }

    #[test]
    fn test_start_match_only_from_lobby() {
        let (_hub, host, _other) = two_player_session();
        let mut events = EventQueue::new();

        start_match(&host, &mut events);
        let session = SessionView::new(&host);
        assert_eq!(session.stage(), Stage::Countdown);
        assert_eq!(session.timer(), 3);
        assert!(!session.solo());
        assert_eq!(events.take().len(), 1);

        // A second press while counting down changes nothing.
        start_match(&host, &mut events);
        assert_eq!(SessionView::new(&host).timer(), 3);
        assert!(events.is_empty());
    }

    #[test]
    fn test_non_host_calls_are_noops() {
        let (_hub, host, other) = two_player_session();
        let mut events = EventQueue::new();

        start_match(&other, &mut events);
        assert_eq!(SessionView::new(&host).stage(), Stage::Lobby);

        start_match(&host, &mut events);
        tick(&other, &mut events);
        assert_eq!(SessionView::new(&host).timer(), 3);
    }

    #[test]
    fn test_countdown_reaches_active() {
        let (_hub, host, _other) = two_player_session();
        let mut events = EventQueue::new();
        start_match(&host, &mut events);

        tick(&host, &mut events);
        assert_eq!(SessionView::new(&host).timer(), 2);
        tick(&host, &mut events);
        assert_eq!(SessionView::new(&host).timer(), 1);
        tick(&host, &mut events);

        let session = SessionView::new(&host);
        assert_eq!(session.stage(), Stage::Active);
        assert_eq!(session.timer(), 0);
    }

    #[test]
    fn test_active_timer_counts_up_forever() {
        let (_hub, host, _other) = two_player_session();
        let mut events = EventQueue::new();
        run_to_active(&host, &mut events);

        for expected in 1..=20 {
            tick(&host, &mut events);
            assert_eq!(SessionView::new(&host).timer(), expected);
            assert_eq!(SessionView::new(&host).stage(), Stage::Active);
        }
    }

    #[test]
    fn test_elimination_preempts_timer() {
        let (_hub, host, other) = two_player_session();
        let mut events = EventQueue::new();
        run_to_active(&host, &mut events);
        events.take();

        let other_fabric: Arc<dyn StateFabric> = Arc::new(other);
        let writer = AvatarWriter::new(Arc::clone(&other_fabric), other_fabric.local_id());
        writer.set_dead();

        let timer_before = SessionView::new(&host).timer();
        tick(&host, &mut events);

        let session = SessionView::new(&host);
        assert_eq!(session.stage(), Stage::Winner);
        assert_eq!(session.timer(), 5);
        // The timer did not advance on the deciding tick.
        assert_ne!(session.timer(), timer_before + 1);
        assert_eq!(session.winner(), Some(Profile::new("Ayu", "#e63946")));

        let events = events.take();
        assert!(events.contains(&GameEvent::WinnerDeclared {
            profile: Some(Profile::new("Ayu", "#e63946")),
        }));
    }

    #[test]
    fn test_everyone_dead_means_no_winner() {
        let (_hub, host, other) = two_player_session();
        let mut events = EventQueue::new();
        run_to_active(&host, &mut events);

        let host_id = host.local_id();
        let other_id = other.local_id();
        let writer = HostWriter::new(&host);
        writer.set_dead(host_id, true);
        writer.set_dead(other_id, true);

        tick(&host, &mut events);
        let session = SessionView::new(&host);
        assert_eq!(session.stage(), Stage::Winner);
        assert_eq!(session.winner(), None);
    }

    #[test]
    fn test_solo_round_runs_until_the_fall() {
        let hub = FabricHub::new();
        let host = hub.join(Profile::new("Ayu", "#e63946"));
        let mut events = EventQueue::new();

        start_match(&host, &mut events);
        assert!(SessionView::new(&host).solo());
        for _ in 0..3 {
            tick(&host, &mut events);
        }
        assert_eq!(SessionView::new(&host).stage(), Stage::Active);

        // One avatar alive meets the solo threshold; the round keeps going.
        for _ in 0..10 {
            tick(&host, &mut events);
        }
        assert_eq!(SessionView::new(&host).stage(), Stage::Active);

        let writer = HostWriter::new(&host);
        writer.set_dead(host.local_id(), true);
        tick(&host, &mut events);
        assert_eq!(SessionView::new(&host).stage(), Stage::Winner);
        assert_eq!(SessionView::new(&host).winner(), None);
    }

    #[test]
    fn test_winner_countdown_resets_into_lobby() {
        let (_hub, host, other) = two_player_session();
        let mut events = EventQueue::new();
        run_to_active(&host, &mut events);

        let other_id = other.local_id();
        let other_fabric: Arc<dyn StateFabric> = Arc::new(other);
        let writer = AvatarWriter::new(Arc::clone(&other_fabric), other_id);
        writer.set_pos(Vec3::new(0.0, -30.0, 0.0));
        writer.set_rot(Quat::IDENTITY);
        writer.set_dead();

        tick(&host, &mut events);
        assert_eq!(SessionView::new(&host).stage(), Stage::Winner);

        let old_spawn = AvatarView::new(&host, other_id).starting_pos();
        for _ in 0..5 {
            tick(&host, &mut events);
        }

        let session = SessionView::new(&host);
        assert_eq!(session.stage(), Stage::Lobby);
        assert_eq!(session.timer(), -1);

        // Round state was wiped and a fresh spawn dealt.
        let view = AvatarView::new(&host, other_id);
        assert!(!view.is_dead());
        assert!(view.pos().is_none());
        assert!(view.rot().is_none());
        let new_spawn = view.starting_pos();
        assert!(new_spawn.is_some());
        assert_ne!(new_spawn, old_spawn);
    }

    #[test]
    fn test_lobby_tick_is_inert() {
        let (_hub, host, _other) = two_player_session();
        let mut events = EventQueue::new();

        for _ in 0..5 {
            tick(&host, &mut events);
        }
        let session = SessionView::new(&host);
        assert_eq!(session.stage(), Stage::Lobby);
        assert_eq!(session.timer(), -1);
        assert!(events.is_empty());
    }

    #[test]
    fn test_countdown_reset_deals_spawns_before_active() {
        let (_hub, host, other) = two_player_session();
        let other_id = other.local_id();
        let mut events = EventQueue::new();
        start_match(&host, &mut events);

        // Countdown→Active performs no reset; the reset ran on the way into
        // Countdown only for Winner→Lobby. Spawns for the first round come
        // from the roster join path, so none exist yet here.
        for _ in 0..3 {
            tick(&host, &mut events);
        }
        assert_eq!(SessionView::new(&host).stage(), Stage::Active);
        assert!(AvatarView::new(&host, other_id).starting_pos().is_none());
    }

    proptest! {
        // The stage graph is closed: from any stage, any number of ticks
        // (with deaths injected at arbitrary points) lands on a valid stage
        // with a timer consistent with that stage.
        #[test]
        fn prop_stage_cycle_is_closed(death_at in 0usize..40, ticks in 1usize..60) {
            let (_hub, host, other) = two_player_session();
            let other_id = other.local_id();
            let mut events = EventQueue::new();
            start_match(&host, &mut events);

            for i in 0..ticks {
                if i == death_at {
                    let writer = HostWriter::new(&host);
                    writer.set_dead(other_id, true);
                }
                tick(&host, &mut events);

                let session = SessionView::new(&host);
                let timer = session.timer();
                match session.stage() {
                    Stage::Lobby => prop_assert_eq!(timer, -1),
                    Stage::Countdown => prop_assert!((0..=3).contains(&timer)),
                    Stage::Active => prop_assert!(timer >= 0),
                    Stage::Winner => prop_assert!((0..=5).contains(&timer)),
                }
            }
        }

        // Countdown timers only ever step down by one; the Active timer only
        // ever steps up by one or resets at a stage boundary.
        #[test]
        fn prop_timer_steps_by_one(ticks in 1usize..40) {
            let (_hub, host, _other) = two_player_session();
            let mut events = EventQueue::new();
            start_match(&host, &mut events);

            let mut prev_stage = SessionView::new(&host).stage();
            let mut prev_timer = SessionView::new(&host).timer();
            for _ in 0..ticks {
                tick(&host, &mut events);
                let session = SessionView::new(&host);
                let (stage, timer) = (session.stage(), session.timer());
                if stage == prev_stage {
                    let delta = timer - prev_timer;
                    prop_assert_eq!(delta, if stage.counts_down() { -1 } else { 1 });
                } else {
                    prop_assert_eq!(stage, prev_stage.next());
                    prop_assert_eq!(timer, stage.initial_timer());
                }
                prev_stage = stage;
                prev_timer = timer;
            }
        }
    }

    #[test]
    fn test_reset_skips_departed_entities() {
        let (_hub, host, other) = two_player_session();
        let other_id = other.local_id();
        let mut events = EventQueue::new();
        run_to_active(&host, &mut events);

        let writer = HostWriter::new(&host);
        writer.set_dead(other_id, true);
        other.leave();

        // With the survivor alone and solo unset, the round decides at once.
        tick(&host, &mut events);
        assert_eq!(SessionView::new(&host).stage(), Stage::Winner);

        for _ in 0..5 {
            tick(&host, &mut events);
        }
        assert_eq!(SessionView::new(&host).stage(), Stage::Lobby);
        assert_eq!(host.read(other_id, keys::STARTING_POS), None);
    }
}
