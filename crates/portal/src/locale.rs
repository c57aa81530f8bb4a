//! Locale negotiation and locale-aware formatting.
//!
//! The CMS stores one page per language. The default locale uses the bare slug
//! (`about`); every other supported locale uses a suffixed slug (`about-id`).

use chrono::{Datelike, NaiveDateTime};

use crate::{LocaleTag, PortalError};

/// The set of locales the portal serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locales {
    default: LocaleTag,
    supported: Vec<LocaleTag>,
}

impl Locales {
    /// Creates the locale set, adding `default` to `supported` if absent.
    pub fn new(default: &str, supported: &[String]) -> Result<Self, PortalError> {
        let default = LocaleTag::new(default.to_ascii_lowercase()).ok_or_else(|| {
            PortalError::Configuration {
                message: "site locale must not be empty".to_string(),
            }
        })?;
        let mut tags: Vec<LocaleTag> = supported
            .iter()
            .filter_map(|s| LocaleTag::new(s.trim().to_ascii_lowercase()))
            .collect();
        if !tags.contains(&default) {
            tags.insert(0, default.clone());
        }
        Ok(Self {
            default,
            supported: tags,
        })
    }

    /// The site's default locale.
    pub fn default_locale(&self) -> &LocaleTag {
        &self.default
    }

    /// Every supported locale, default included.
    pub fn supported(&self) -> &[LocaleTag] {
        &self.supported
    }

    /// Returns the supported tag matching `tag` exactly or by primary subtag
    /// (`en-GB` matches `en`).
    pub fn find(&self, tag: &str) -> Option<&LocaleTag> {
        let tag = tag.trim().to_ascii_lowercase();
        if tag.is_empty() {
            return None;
        }
        let primary = tag.split(['-', '_']).next().unwrap_or(&tag);
        self.supported
            .iter()
            .find(|t| t.as_str() == tag)
            .or_else(|| self.supported.iter().find(|t| t.as_str() == primary))
    }

    /// Picks the locale for a request.
    ///
    /// An explicit choice (the `lang` query parameter or cookie) wins when it is
    /// supported; then the highest-weighted supported `Accept-Language` entry;
    /// then the default.
    pub fn negotiate(&self, explicit: Option<&str>, accept_language: Option<&str>) -> LocaleTag {
        if let Some(tag) = explicit.and_then(|e| self.find(e)) {
            return tag.clone();
        }
        if let Some(header) = accept_language {
            let mut candidates: Vec<(&str, f32)> = header
                .split(',')
                .filter_map(|entry| {
                    let mut parts = entry.split(';');
                    let tag = parts.next()?.trim();
                    let weight = parts
                        .find_map(|p| p.trim().strip_prefix("q="))
                        .and_then(|q| q.trim().parse::<f32>().ok())
                        .unwrap_or(1.0);
                    Some((tag, weight))
                })
                .filter(|(tag, weight)| !tag.is_empty() && *weight > 0.0)
                .collect();
            // Stable sort keeps header order among equal weights.
            candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
            if let Some(tag) = candidates.iter().find_map(|(tag, _)| self.find(tag)) {
                return tag.clone();
            }
        }
        self.default.clone()
    }

    /// Returns the CMS slug for `page` in `locale`.
    pub fn localized_slug(&self, page: &str, locale: &LocaleTag) -> String {
        if locale == &self.default || !self.supported.contains(locale) {
            page.to_string()
        } else {
            format!("{page}-{locale}")
        }
    }
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

const MONTHS_EN: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const MONTHS_ID: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

fn english_ordinal(day: u32) -> String {
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{day}{suffix}")
}

/// Formats a post date as day-of-month, month name, year (`2nd May 2019`).
///
/// Indonesian (`id`) uses plain day numbers and Indonesian month names; other
/// locales use English.
pub fn format_post_date(date: NaiveDateTime, locale: &LocaleTag) -> String {
    let month = date.month0() as usize;
    if locale.as_str() == "id" {
        format!("{} {} {}", date.day(), MONTHS_ID[month], date.year())
    } else {
        format!(
            "{} {} {}",
            english_ordinal(date.day()),
            MONTHS_EN[month],
            date.year()
        )
    }
}

/// Month and year an organization joined the portal (`March 2019`).
pub fn join_date(created: NaiveDateTime) -> String {
    format!("{} {}", MONTHS_EN[created.month0() as usize], created.year())
}
