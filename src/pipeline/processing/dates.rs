use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// How much trust a parsed date deserves.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DateUncertainty {
    /// Fully specified day, month and year
    Exact,
    /// Incomplete but derivable (e.g. year only, pinned to January 1)
    Estimated,
    /// Explicitly marked as approximate ("circa", "ca.", "~")
    Approximate,
    /// Nothing parseable; only the raw text survives
    Unknown,
}

/// A date as humans actually wrote it down: the verbatim input, an optional
/// resolved calendar date, and an uncertainty tag.
///
/// Invariant: `uncertainty == Unknown` exactly when `resolved` is `None`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FuzzyDate {
    /// Original user input, preserved verbatim for auditing
    pub raw_text: String,
    /// The derived calendar date, when one could be derived
    pub resolved: Option<NaiveDate>,
    /// Uncertainty classification of the resolution
    pub uncertainty: DateUncertainty,
    /// True when the input only carried a year, independent of the
    /// uncertainty tag. A circa-marked year is `Approximate` yet still
    /// year-precision, and date proximity must compare it by year.
    #[serde(default)]
    pub year_only: bool,
}

impl FuzzyDate {
    fn unknown(raw: &str) -> Self {
        Self {
            raw_text: raw.to_string(),
            resolved: None,
            uncertainty: DateUncertainty::Unknown,
            year_only: false,
        }
    }

    /// True when both dates resolved and `self` lies strictly after `other`.
    /// Used by the import pipeline for start/end range validation; unresolved
    /// dates never fail the range check.
    pub fn resolved_after(&self, other: &FuzzyDate) -> bool {
        match (self.resolved, other.resolved) {
            (Some(a), Some(b)) => a > b,
            _ => false,
        }
    }

    /// True when this date only carries year precision.
    pub fn is_year_only(&self) -> bool {
        self.year_only
    }
}

/// One strategy in the ordered date-format grammar. Matchers are evaluated in
/// priority order; the first one that produces a date wins. Adding a new
/// format means adding a matcher, not rewriting the cascade.
pub trait DateMatcher: Send + Sync {
    fn try_parse(&self, input: &str) -> Option<FuzzyDate>;
}

/// Full calendar dates: ISO `YYYY-MM-DD` plus the localized `DD.MM.YYYY` and
/// `DD/MM/YYYY` forms commonly found in source material.
pub struct CalendarDateMatcher;

const CALENDAR_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"];

impl DateMatcher for CalendarDateMatcher {
    fn try_parse(&self, input: &str) -> Option<FuzzyDate> {
        for format in CALENDAR_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(input, format) {
                return Some(FuzzyDate {
                    raw_text: input.to_string(),
                    resolved: Some(date),
                    uncertainty: DateUncertainty::Exact,
                    year_only: false,
                });
            }
        }
        None
    }
}

/// Bare 4-digit years, resolved to January 1 with `Estimated` uncertainty.
pub struct YearOnlyMatcher;

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}$").unwrap());

impl DateMatcher for YearOnlyMatcher {
    fn try_parse(&self, input: &str) -> Option<FuzzyDate> {
        if !YEAR_RE.is_match(input) {
            return None;
        }
        let year: i32 = input.parse().ok()?;
        NaiveDate::from_ymd_opt(year, 1, 1).map(|date| FuzzyDate {
            raw_text: input.to_string(),
            resolved: Some(date),
            uncertainty: DateUncertainty::Estimated,
            year_only: true,
        })
    }
}

// Approximation markers that may prefix an otherwise parseable date.
// Longest alternatives first so "ca." is not consumed as "c." + garbage.
static CIRCA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(circa|approx\.?|ca\.?|c\.|~)\s*").unwrap());

/// Parses imprecise, human-entered date strings into [`FuzzyDate`]s.
///
/// Never fails: anything unparseable comes back as `Unknown` with the raw
/// text preserved.
pub struct DateInterpreter {
    matchers: Vec<Box<dyn DateMatcher>>,
}

impl Default for DateInterpreter {
    fn default() -> Self {
        Self {
            matchers: vec![Box::new(CalendarDateMatcher), Box::new(YearOnlyMatcher)],
        }
    }
}

impl DateInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interpreter with a custom matcher cascade, evaluated in order.
    pub fn with_matchers(matchers: Vec<Box<dyn DateMatcher>>) -> Self {
        Self { matchers }
    }

    pub fn interpret(&self, raw: &str) -> FuzzyDate {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return FuzzyDate::unknown(raw);
        }

        // An explicit approximation marker is stripped before the cascade and
        // forces the result to Approximate if the remainder parses at all.
        let (input, approximate) = match CIRCA_RE.find(trimmed) {
            Some(marker) => (trimmed[marker.end()..].trim(), true),
            None => (trimmed, false),
        };

        for matcher in &self.matchers {
            if let Some(mut parsed) = matcher.try_parse(input) {
                parsed.raw_text = raw.to_string();
                if approximate {
                    parsed.uncertainty = DateUncertainty::Approximate;
                }
                return parsed;
            }
        }

        FuzzyDate::unknown(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interpret(raw: &str) -> FuzzyDate {
        DateInterpreter::new().interpret(raw)
    }

    #[test]
    fn iso_date_is_exact() {
        let parsed = interpret("1815-12-10");
        assert_eq!(parsed.resolved, NaiveDate::from_ymd_opt(1815, 12, 10));
        assert_eq!(parsed.uncertainty, DateUncertainty::Exact);
        assert_eq!(parsed.raw_text, "1815-12-10");
    }

    #[test]
    fn localized_formats_parse() {
        let dotted = interpret("10.12.1815");
        assert_eq!(dotted.resolved, NaiveDate::from_ymd_opt(1815, 12, 10));
        assert_eq!(dotted.uncertainty, DateUncertainty::Exact);

        let slashed = interpret("10/12/1815");
        assert_eq!(slashed.resolved, NaiveDate::from_ymd_opt(1815, 12, 10));
    }

    #[test]
    fn bare_year_resolves_to_january_first_estimated() {
        let parsed = interpret("1815");
        assert_eq!(parsed.resolved, NaiveDate::from_ymd_opt(1815, 1, 1));
        assert_eq!(parsed.uncertainty, DateUncertainty::Estimated);
    }

    #[test]
    fn circa_year_is_approximate() {
        for raw in ["c. 1815", "ca. 1815", "circa 1815", "~1815", "approx 1815"] {
            let parsed = interpret(raw);
            assert_eq!(parsed.resolved, NaiveDate::from_ymd_opt(1815, 1, 1), "{raw}");
            assert_eq!(parsed.uncertainty, DateUncertainty::Approximate, "{raw}");
            assert_eq!(parsed.raw_text, raw);
        }
    }

    #[test]
    fn circa_full_date_keeps_the_day() {
        let parsed = interpret("ca. 1815-12-10");
        assert_eq!(parsed.resolved, NaiveDate::from_ymd_opt(1815, 12, 10));
        assert_eq!(parsed.uncertainty, DateUncertainty::Approximate);
        assert!(!parsed.is_year_only());
    }

    #[test]
    fn circa_year_keeps_year_precision() {
        // The approximation marker changes the uncertainty tag but must not
        // hide that the input only carried a year
        let parsed = interpret("c. 1815");
        assert_eq!(parsed.uncertainty, DateUncertainty::Approximate);
        assert!(parsed.is_year_only());

        assert!(interpret("1815").is_year_only());
        assert!(!interpret("1815-12-10").is_year_only());
        assert!(!interpret("junk").is_year_only());
    }

    #[test]
    fn unparseable_input_is_unknown_with_raw_preserved() {
        for raw in ["not-a-date", "c. maybe 1800s?", "", "   ", "18155"] {
            let parsed = interpret(raw);
            assert_eq!(parsed.resolved, None, "{raw:?}");
            assert_eq!(parsed.uncertainty, DateUncertainty::Unknown, "{raw:?}");
            assert_eq!(parsed.raw_text, raw);
        }
    }

    #[test]
    fn unknown_iff_unresolved() {
        for raw in ["1815", "c. 1815", "1815-12-10", "junk", "", "~nope"] {
            let parsed = interpret(raw);
            assert_eq!(
                parsed.uncertainty == DateUncertainty::Unknown,
                parsed.resolved.is_none(),
                "{raw:?}"
            );
        }
    }

    #[test]
    fn range_check_only_fires_when_both_resolve() {
        let interpreter = DateInterpreter::new();
        let born = interpreter.interpret("1900-05-01");
        let died = interpreter.interpret("1899-01-01");
        assert!(born.resolved_after(&died));
        assert!(!died.resolved_after(&born));

        let unknown = interpreter.interpret("sometime");
        assert!(!born.resolved_after(&unknown));
        assert!(!unknown.resolved_after(&born));
    }

    #[test]
    fn invalid_calendar_day_falls_through_to_unknown() {
        let parsed = interpret("1815-02-30");
        assert_eq!(parsed.uncertainty, DateUncertainty::Unknown);
    }
}
