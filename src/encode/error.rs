//! Encode-handoff failure taxonomy.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("encoder failed to start: {0}")]
    CannotStart(String),
    #[error("encoder rejected a frame: {0}")]
    CannotAppend(String),
    #[error("muxer failed: {0}")]
    MuxerFailed(String),
    #[error("codec {0:?} is not supported by this backend")]
    CodecUnsupported(String),
    #[error("encoder did not accept a frame within the pacing timeout")]
    EncoderTimeout,
    #[error("bypass_color_conversion and an active dither policy are mutually exclusive")]
    ConflictingPipelineFlags,
}
