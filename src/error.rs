//! Errors returned by lookups.

use core::fmt;

use tzfind_provider::TableError;

use crate::zone::TzifError;

#[derive(Debug)]
pub enum LookupError {
    /// No zone name is within the accepted distance of the query.
    NotFound(String),
    /// The embedded table could not produce the zone's bytes.
    Table(TableError),
    /// The zone's bytes are not valid TZif.
    Tzif(TzifError),
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(query) => write!(f, "no time zone matches {query:?}"),
            Self::Table(e) => e.fmt(f),
            Self::Tzif(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for LookupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::Table(e) => Some(e),
            Self::Tzif(e) => Some(e),
        }
    }
}

impl From<TableError> for LookupError {
    fn from(value: TableError) -> Self {
        Self::Table(value)
    }
}

impl From<TzifError> for LookupError {
    fn from(value: TzifError) -> Self {
        Self::Tzif(value)
    }
}
