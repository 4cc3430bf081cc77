use std::{error, fmt};

// -------------------------------------------------------------------------------------------------

/// Errors reported while configuring the engine or talking to it from a control thread.
///
/// The render path itself never fails: out-of-range values are clamped instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    NoVoices,
    InvalidSampleRate(f32),
    InvalidBlockSize(usize),
    InvalidQueueCapacity,
    InvalidDelayTime(f32),
    InvalidOperator(usize),
    UnknownParameter(String),
    Routing(String),
    QueueFull,
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoVoices => write!(f, "Voice pool must hold at least one voice"),
            Self::InvalidSampleRate(rate) => write!(f, "Invalid sample rate: {rate}"),
            Self::InvalidBlockSize(size) => write!(
                f,
                "Invalid block size {size} (expected 1..={})",
                crate::MAX_BLOCK_SIZE
            ),
            Self::InvalidQueueCapacity => write!(f, "Event queue capacity must be non-zero"),
            Self::InvalidDelayTime(seconds) => {
                write!(f, "Invalid delay memory length: {seconds} seconds")
            }
            Self::InvalidOperator(index) => write!(
                f,
                "Operator index {index} out of bounds ({} operators)",
                crate::OPERATOR_COUNT
            ),
            Self::UnknownParameter(name) => write!(f, "Unknown parameter: {name}"),
            Self::Routing(reason) => write!(f, "Invalid operator routing: {reason}"),
            Self::QueueFull => write!(f, "Event queue is full"),
        }
    }
}

impl<T> From<rtrb::PushError<T>> for Error {
    fn from(_err: rtrb::PushError<T>) -> Self {
        Error::QueueFull
    }
}
