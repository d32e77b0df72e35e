//! Error types for the optical link codec

use thiserror::Error;

/// Result type for link operations
pub type Result<T> = std::result::Result<T, LinkError>;

/// Errors reported by the codecs, the transceiver state machines and the
/// simulated link
///
/// Uncorrectable Hamming words are not errors: they are reported through the
/// `uncorrectable` flag of a decode result so the receiver keeps ticking.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// Value does not fit in four bits
    #[error("Invalid nibble: {0:#04x} exceeds 0x0F")]
    InvalidNibble(u8),

    /// Start or stop sentinel did not match at the given frame position
    #[error("Bad sentinel at frame bit {position}")]
    BadSentinel {
        /// Index of the first mismatching frame bit
        position: usize,
    },

    /// Chip pair outside `{(0,1), (1,0)}`
    #[error("Invalid Manchester chip pair {chips:?} at frame bit {position}")]
    InvalidChip {
        /// Index of the first chip of the pair
        position: usize,
        /// The received chips
        chips: (bool, bool),
    },

    /// A frame is already being sent
    #[error("Transmitter busy: frame in flight")]
    Busy,

    /// Textual frame could not be parsed
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// Configuration rejected by the builder
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No frame arrived within the caller's tick budget
    #[error("Timed out after {ticks} ticks")]
    Timeout {
        /// Ticks elapsed before giving up
        ticks: usize,
    },
}

impl LinkError {
    /// Create a new BadSentinel error
    pub fn bad_sentinel(position: usize) -> Self {
        LinkError::BadSentinel { position }
    }

    /// Create a new InvalidChip error
    pub fn invalid_chip(position: usize, first: bool, second: bool) -> Self {
        LinkError::InvalidChip {
            position,
            chips: (first, second),
        }
    }

    /// Create a new InvalidFrame error
    pub fn invalid_frame(msg: impl Into<String>) -> Self {
        LinkError::InvalidFrame(msg.into())
    }

    /// Create a new InvalidConfig error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        LinkError::InvalidConfig(msg.into())
    }

    /// True for errors caused by a damaged or unsynchronized frame
    pub fn is_frame_error(&self) -> bool {
        matches!(
            self,
            LinkError::BadSentinel { .. } | LinkError::InvalidChip { .. }
        )
    }
}
