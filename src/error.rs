use std::fmt;

#[derive(Debug)]
pub enum SlowverbError {
    Decode(DecodeError),
    Render(RenderError),
    Playback(PlaybackError),
}

/// Failures while turning user-supplied bytes into a `SourceAudio`.
#[derive(Debug)]
pub enum DecodeError {
    UnsupportedFormat(String),
    Malformed(String),
    UnsupportedChannelCount(u16),
    UnsupportedSampleRate(u32),
    EmptySource,
    ChannelLengthMismatch,
}

/// Failures while constructing or running the offline render graph.
#[derive(Debug)]
pub enum RenderError {
    InvalidSpeed(f32),
    InvalidWetLevel(f32),
    InvalidDecay(f32),
    NoSourceLoaded,
    RenderInProgress,
}

/// Failures while starting live playback.
#[derive(Debug)]
pub enum PlaybackError {
    NoSourceLoaded,
    Graph(RenderError),
}

impl fmt::Display for SlowverbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlowverbError::Decode(e) => write!(f, "Decode error: {e}"),
            SlowverbError::Render(e) => write!(f, "Render error: {e}"),
            SlowverbError::Playback(e) => write!(f, "Playback error: {e}"),
        }
    }
}

impl std::error::Error for SlowverbError {}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::UnsupportedFormat(what) => write!(f, "Unsupported input format: {what}"),
            DecodeError::Malformed(what) => write!(f, "Malformed audio data: {what}"),
            DecodeError::UnsupportedChannelCount(n) => {
                write!(f, "Unsupported channel count {n} (expected 1 or 2)")
            }
            DecodeError::UnsupportedSampleRate(rate) => {
                write!(f, "Unsupported sample rate {rate} Hz")
            }
            DecodeError::EmptySource => write!(f, "Audio contains no samples"),
            DecodeError::ChannelLengthMismatch => {
                write!(f, "Channels have differing sample counts")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::InvalidSpeed(v) => write!(f, "Invalid speed {v} (must be > 0)"),
            RenderError::InvalidWetLevel(v) => {
                write!(f, "Invalid reverb wet level {v} (must be in [0, 1])")
            }
            RenderError::InvalidDecay(v) => {
                write!(f, "Invalid reverb decay {v}s (must be > 0)")
            }
            RenderError::NoSourceLoaded => write!(f, "No source audio loaded"),
            RenderError::RenderInProgress => write!(f, "A render is already in progress"),
        }
    }
}

impl std::error::Error for RenderError {}

impl fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackError::NoSourceLoaded => write!(f, "No source audio loaded"),
            PlaybackError::Graph(e) => write!(f, "Could not build playback graph: {e}"),
        }
    }
}

impl std::error::Error for PlaybackError {}

impl From<DecodeError> for SlowverbError {
    fn from(e: DecodeError) -> Self {
        SlowverbError::Decode(e)
    }
}

impl From<RenderError> for SlowverbError {
    fn from(e: RenderError) -> Self {
        SlowverbError::Render(e)
    }
}

impl From<PlaybackError> for SlowverbError {
    fn from(e: PlaybackError) -> Self {
        SlowverbError::Playback(e)
    }
}

impl From<RenderError> for PlaybackError {
    fn from(e: RenderError) -> Self {
        PlaybackError::Graph(e)
    }
}

impl From<hound::Error> for DecodeError {
    fn from(e: hound::Error) -> Self {
        match e {
            hound::Error::FormatError(what) => DecodeError::Malformed(what.to_string()),
            hound::Error::Unsupported => {
                DecodeError::UnsupportedFormat("WAV feature not supported".to_string())
            }
            other => DecodeError::Malformed(other.to_string()),
        }
    }
}
