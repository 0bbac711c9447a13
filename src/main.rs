//! Tumble Arena Demo
//!
//! Runs a complete scripted round between three in-process participants:
//! lobby, countdown, an active round where two avatars fall out, the winner
//! announcement and the reset back to the lobby. Frames run at a simulated
//! 60 Hz with the host session tick every 30 frames, so the whole round
//! plays out in milliseconds of wall time.

use std::sync::Arc;

use anyhow::Result;
use glam::Vec3;
use tracing::info;

use tumble_arena::game::physics::{BodyMode, KinematicBody};
use tumble_arena::game::roster::BodyFactory;
use tumble_arena::game::GameEvent;
use tumble_arena::{kill_plane_y, FabricHub, GameWorld, InputFrame, Profile, Stage};

const DT: f32 = 1.0 / 60.0;
const FRAMES_PER_SESSION_TICK: u32 = 30;

/// Dynamic bodies with no floor: avatars fall unless the script keeps the
/// round short.
fn open_bodies() -> BodyFactory {
    Box::new(|is_local| {
        let mode = if is_local {
            BodyMode::Dynamic
        } else {
            BodyMode::KinematicPosition
        };
        Box::new(KinematicBody::new(mode))
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("tumble-arena v{}", tumble_arena::VERSION);

    let hub = FabricHub::new();
    let mut worlds = vec![
        GameWorld::with_bodies(Arc::new(hub.join(Profile::new("Ayu", "#e63946"))), open_bodies()),
        GameWorld::with_bodies(Arc::new(hub.join(Profile::new("Bima", "#457b9d"))), open_bodies()),
        GameWorld::with_bodies(Arc::new(hub.join(Profile::new("Citra", "#2a9d8f"))), open_bodies()),
    ];

    // One lobby frame so every world sees the full roster, then start.
    for world in &mut worlds {
        world.frame(DT, &InputFrame::idle());
    }
    worlds[0].chat().send("ready when you are");
    worlds[0].start_match();

    let idle = InputFrame::idle();
    let mut forward = InputFrame::idle();
    forward.forward = true;

    let mut active_frames: u32 = 0;
    for frame in 0u32.. {
        if frame % FRAMES_PER_SESSION_TICK == 0 {
            worlds[0].session_tick();
        }

        let stage = worlds[0].stage();
        if stage == Stage::Active {
            active_frames += 1;
            // Two scripted fall-outs decide the round.
            for (index, at) in [(1usize, 10u32), (2, 20)] {
                if active_frames == at {
                    let id = worlds[index].local_id();
                    if let Some(avatar) = worlds[index].avatar_mut(id) {
                        avatar.body.set_translation(Vec3::new(0.0, kill_plane_y() - 1.0, 0.0));
                    }
                }
            }
        }

        for (index, world) in worlds.iter_mut().enumerate() {
            let input = if index == 0 && stage == Stage::Active {
                &forward
            } else {
                &idle
            };
            world.frame(DT, input);
        }

        for event in worlds[0].drain_events() {
            match event {
                GameEvent::StageChanged { from, to } => info!(?from, ?to, "stage changed"),
                GameEvent::WinnerDeclared { profile } => {
                    info!(winner = ?profile.map(|p| p.name), "round over")
                }
                GameEvent::AvatarJoined { id } => info!(id = %id.short(), "joined"),
                GameEvent::AvatarLeft { id } => info!(id = %id.short(), "left"),
                GameEvent::AvatarDied { profile, .. } => info!(name = %profile.name, "fell out"),
            }
        }
        for world in worlds.iter_mut().skip(1) {
            for event in world.drain_events() {
                if let GameEvent::AvatarDied { profile, .. } = event {
                    info!(name = %profile.name, "fell out");
                }
            }
        }

        // The round has fully cycled once the session is back in the lobby.
        if frame > FRAMES_PER_SESSION_TICK && worlds[0].stage() == Stage::Lobby {
            break;
        }
    }

    for message in worlds[1].chat().drain() {
        info!(from = %message.sender.short(), text = %message.text, "chat");
    }

    if let Some(winner) = worlds[0].winner() {
        info!(name = %winner.name, "last round's winner");
    }

    for world in &mut worlds {
        world.leave();
    }
    info!("session closed");
    Ok(())
}
