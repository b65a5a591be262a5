/// Batch status definitions
///
/// A batch moves `Idle → Running → (Completed | PartiallyCompleted)`.
use std::fmt;

/// Represents the current state of a batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BatchStatus {
    /// No run started yet
    #[default]
    Idle,

    /// URLs are being processed
    Running,

    /// Every requested URL has been processed
    Completed,

    /// The run ended with failed URLs or was cancelled; a resumed run picks
    /// up the remaining URLs
    PartiallyCompleted,
}

impl BatchStatus {
    /// Returns true if the run has ended
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::PartiallyCompleted)
    }

    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::PartiallyCompleted => "partially_completed",
        }
    }

    /// Parses a status from its database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(Self::Idle),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "partially_completed" => Some(Self::PartiallyCompleted),
            _ => None,
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
