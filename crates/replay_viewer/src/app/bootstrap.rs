use std::path::PathBuf;
use std::time::Duration;

use replay_engine::EntityId;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

pub(crate) const REPLAY_FILE_ENV_VAR: &str = "REPLAY_VIEWER_FILE";
pub(crate) const CONFIG_FILE_ENV_VAR: &str = "REPLAY_VIEWER_CONFIG";
pub(crate) const FOLLOW_ENV_VAR: &str = "REPLAY_VIEWER_FOLLOW";
pub(crate) const FRAME_MS_ENV_VAR: &str = "REPLAY_VIEWER_FRAME_MS";

const DEFAULT_FRAME_MS: u64 = 16;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ViewerSettings {
    pub(crate) replay_path: Option<PathBuf>,
    pub(crate) config_path: Option<PathBuf>,
    pub(crate) follow: Option<EntityId>,
    pub(crate) frame_interval: Duration,
}

pub(crate) struct AppWiring {
    pub(crate) settings: ViewerSettings,
}

pub(crate) fn build_app() -> AppWiring {
    init_tracing();
    info!(version = env!("CARGO_PKG_VERSION"), "replay_viewer_startup");

    let settings = ViewerSettings {
        replay_path: read_env(REPLAY_FILE_ENV_VAR).map(PathBuf::from),
        config_path: read_env(CONFIG_FILE_ENV_VAR).map(PathBuf::from),
        follow: parse_follow(read_env(FOLLOW_ENV_VAR).as_deref()),
        frame_interval: parse_frame_interval(read_env(FRAME_MS_ENV_VAR).as_deref()),
    };
    AppWiring { settings }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn read_env(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}

fn parse_follow(raw: Option<&str>) -> Option<EntityId> {
    let raw = raw?;
    match raw.parse::<i64>() {
        Ok(id) => Some(EntityId(id)),
        Err(_) => {
            warn!(var = FOLLOW_ENV_VAR, value = raw, "invalid_follow_id_ignored");
            None
        }
    }
}

fn parse_frame_interval(raw: Option<&str>) -> Duration {
    let fallback = Duration::from_millis(DEFAULT_FRAME_MS);
    let Some(raw) = raw else {
        return fallback;
    };
    match raw.parse::<u64>() {
        Ok(ms) if ms > 0 => Duration::from_millis(ms),
        _ => {
            warn!(
                var = FRAME_MS_ENV_VAR,
                value = raw,
                fallback_ms = DEFAULT_FRAME_MS,
                "invalid_frame_interval; using fallback"
            );
            fallback
        }
    }
}
