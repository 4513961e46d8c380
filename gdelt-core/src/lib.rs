//! GDELT Article Cache - Core Data Types
//!
//! Pure data structures with no I/O. Every other crate in this workspace
//! depends on this one.

mod clock;
mod entities;
mod error;
mod identity;

pub use clock::{datetime_to_int, int_to_datetime, Calendar, Clock, FixedClock, SystemClock};
pub use entities::{
    ArticleProjection, ArticleRow, CoverageVerdict, FreshnessVerdict, QueryKind, UsageByKind,
    UsageRecord, UsageStats, UsageWarningLevel,
};
pub use error::{CoreError, CoreResult};
pub use identity::{CountryCode, CountryCodeParseError, DayKey};
