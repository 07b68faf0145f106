//! Date helper functions

use chrono::{DateTime, Locale, Utc};
use chrono_tz::Tz;

/// Display pattern for publication dates (`19 abr 2021`)
pub const PUBLICATION_FORMAT: &str = "%d %b %Y";

/// Format a publication date as `day month-abbrev year` in the given
/// locale and time zone.
///
/// # Examples
/// ```ignore
/// format_publication_date(&date, Locale::pt_BR, chrono_tz::UTC) // -> "19 abr 2021"
/// ```
pub fn format_publication_date(date: &DateTime<Utc>, locale: Locale, tz: Tz) -> String {
    date.with_timezone(&tz)
        .format_localized(PUBLICATION_FORMAT, locale)
        .to_string()
}

/// Format in ISO 8601, for `<time datetime>` attributes
pub fn date_xml(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}
