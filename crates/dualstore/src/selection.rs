use std::str::FromStr;

/// Which repository implementation the use-case layer should receive,
/// selected via the `ORM` environment variable (spec.md §6). Out of scope:
/// actually constructing the chosen implementation — that is a concern of the
/// application's bootstrap code, which consumes this enum to decide whether
/// to wire up [`crate::DualDispatcher`] at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositorySelection {
    /// Use the primary (relational) store alone.
    Primary,
    /// Use the secondary (document) store alone.
    Secondary,
    /// Use both stores behind [`crate::DualDispatcher`].
    Dual,
}

/// Error returned when an `ORM` value doesn't match a known selection.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown repository selection {0:?}, expected one of \"primary\", \"secondary\", \"dual\"")]
pub struct UnknownSelection(pub String);

impl FromStr for RepositorySelection {
    type Err = UnknownSelection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "primary" => Ok(RepositorySelection::Primary),
            "secondary" => Ok(RepositorySelection::Secondary),
            "dual" => Ok(RepositorySelection::Dual),
            _ => Err(UnknownSelection(s.to_string())),
        }
    }
}

impl Default for RepositorySelection {
    /// Defaults to [`RepositorySelection::Primary`] when `ORM` is unset, the
    /// least surprising choice for a deployment that hasn't opted into the
    /// migration yet.
    fn default() -> Self {
        RepositorySelection::Primary
    }
}
