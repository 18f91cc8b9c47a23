use thiserror::Error;

use crate::config::ConfigError;
use crate::decoder::DecodeError;
use crate::gap_detector::GapError;
use crate::output::OutputError;
use crate::session::SessionError;

/// Errors that end a run. Rejected packets are not among them.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Gap(#[from] GapError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Output(#[from] OutputError),
}
