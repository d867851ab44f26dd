//! The `tzfind` crate resolves free-form, possibly misspelled location
//! strings to IANA time zones whose rules are compiled into the binary.
//!
//! ```rust
//! # #[cfg(feature = "compiled_data")]
//! # {
//! let found = tzfind::lookup("new york").unwrap();
//! assert_eq!(found.name, "America/New_York");
//!
//! // 2024-07-01T12:00:00Z
//! let local = found.zone.local_time(1_719_835_200).unwrap();
//! assert_eq!(local.to_string(), "2024-07-01 08:00:00 -04:00");
//! # }
//! ```
//!
//! Names are matched with a weighted edit distance that treats missing
//! letters in the query as cheap and extra or wrong letters as expensive,
//! against both the full key (`America/New_York`) and its location
//! (`New York`). Matched names are followed through the alias table to the
//! zone that stores their data, which is decompressed and parsed as
//! [TZif][rfc8536].
//!
//! The zone data itself lives in the `tzfind_provider` crate and is
//! regenerated from a zoneinfo directory with the `bakeddata` tool.
//!
//! [rfc8536]: https://datatracker.ietf.org/doc/html/rfc8536
#![cfg_attr(not(test), forbid(clippy::unwrap_used))]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

mod catalog;
mod error;
pub mod matcher;
pub mod zone;
pub(crate) mod utils;

pub use catalog::{ResolvedZone, ZoneCatalog};
pub use error::LookupError;
pub use matcher::Match;
pub use zone::{Tzif, TzifError, UtcOffsetSeconds, ZonedTime};

/// Resolves `query` against the zones compiled into this crate.
#[cfg(feature = "compiled_data")]
pub fn lookup(query: &str) -> Result<ResolvedZone, LookupError> {
    ZoneCatalog::global().lookup(query)
}
