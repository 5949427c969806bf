use std::path::PathBuf;

use replay_engine::InitError;
use thiserror::Error;

pub(crate) mod bootstrap;
pub(crate) mod listener;
pub(crate) mod loader;
pub(crate) mod loop_runner;

use loader::DecodeError;

#[derive(Debug, Error)]
pub(crate) enum ViewerError {
    #[error("no replay file given; set {var} to the path of a decoded replay")]
    MissingReplayPath { var: &'static str },
    #[error("replay file {path} does not exist")]
    ReplayNotFound { path: PathBuf },
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("failed to initialize replay: {0}")]
    Init(#[from] InitError),
}
