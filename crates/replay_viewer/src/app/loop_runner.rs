use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use replay_engine::{ReplayWorld, Standing};
use tracing::{error, info};

use super::bootstrap::{AppWiring, ViewerSettings, REPLAY_FILE_ENV_VAR};
use super::listener::LoggingListener;
use super::loader::{load_config, load_replay};
use super::ViewerError;

const MAX_FRAME_DELTA: Duration = Duration::from_millis(250);

pub(crate) fn run(app: AppWiring) -> ExitCode {
    if let Err(err) = run_viewer(&app.settings) {
        error!(error = %err, "startup_failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run_viewer(settings: &ViewerSettings) -> Result<(), ViewerError> {
    let path = settings
        .replay_path
        .as_deref()
        .ok_or(ViewerError::MissingReplayPath {
            var: REPLAY_FILE_ENV_VAR,
        })?;
    if !path.exists() {
        return Err(ViewerError::ReplayNotFound {
            path: path.to_path_buf(),
        });
    }

    let config = load_config(settings.config_path.as_deref())?;
    let loaded = load_replay(path)?;
    info!(
        path = %path.display(),
        bytes = loaded.byte_len,
        sha256 = %loaded.sha256_hex,
        "replay_loaded"
    );

    let mut world = ReplayWorld::init(loaded.replay, config)?;
    world.add_listener(LoggingListener::default());
    if let Some(id) = settings.follow {
        world.set_followed_entity(Some(id));
    }

    let frame_interval = settings.frame_interval;
    let mut last_frame = Instant::now();
    let ticks = play_to_end(&mut world, || {
        thread::sleep(frame_interval);
        let now = Instant::now();
        let frame_dt = now.duration_since(last_frame);
        last_frame = now;
        frame_dt
    });
    info!(ticks, packet_count = world.packet_count(), "replay_finished");
    log_standings(&world.standings());
    Ok(())
}

/// Drives `world` with host frame deltas until playback ends. Returns the
/// number of dispatched ticks.
fn play_to_end(world: &mut ReplayWorld, mut next_frame: impl FnMut() -> Duration) -> usize {
    if world.packet_count() == 0 {
        info!("replay_has_no_packets");
        return 0;
    }
    let mut ticks = 0;
    while !world.playback().ended {
        let frame_dt = clamp_frame_delta(next_frame(), MAX_FRAME_DELTA);
        if world.advance(frame_dt) {
            ticks += 1;
        }
    }
    ticks
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn log_standings(standings: &[Standing]) {
    for standing in standings {
        info!(
            rank = standing.rank,
            team = %standing.team,
            score = standing.score,
            alive = standing.alive_score,
            defeats = standing.defeat_score,
            gold = standing.gold,
            damage_taken = standing.damage_taken,
            is_final = standing.is_final,
            "team_standing"
        );
    }
}
