use std::fmt;

/// Outcome of matching one detected face against the database.
///
/// Also used as the per-detection hint produced by the tracker: either
/// the identity seen at an overlapping box last frame, or `Unknown`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Identity {
    Known(String),
    Unknown,
}

impl Identity {
    pub fn known(name: impl Into<String>) -> Self {
        Identity::Known(name.into())
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Identity::Known(name) => Some(name),
            Identity::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Identity::Known(_))
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Known(name) => f.write_str(name),
            Identity::Unknown => f.write_str("unknown"),
        }
    }
}
