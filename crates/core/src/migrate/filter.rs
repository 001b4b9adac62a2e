//! Local eligibility rules for source objects.

use chrono::{DateTime, NaiveDate, Utc};

use super::config::{MigrationConfig, UndatedPolicy};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Decision for a single listed object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    /// Copy it. `from_path` is false when the date came from last-modified.
    Eligible { date: NaiveDate, from_path: bool },
    /// Extension is not in the allow-list (directory markers land here too).
    WrongExtension,
    /// Dated before the cutoff.
    BeforeCutoff(NaiveDate),
    /// No parseable date in the path and the policy excludes such objects.
    Undated,
}

/// Extension and date filter applied during enumeration.
#[derive(Debug, Clone)]
pub struct EligibilityFilter {
    extensions: Vec<String>,
    cutoff: NaiveDate,
    date_segment: usize,
    undated: UndatedPolicy,
}

impl EligibilityFilter {
    pub fn new(
        extensions: &[String],
        cutoff: NaiveDate,
        date_segment: usize,
        undated: UndatedPolicy,
    ) -> Self {
        let extensions = extensions
            .iter()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .map(|e| if e.starts_with('.') { e } else { format!(".{}", e) })
            .collect();

        Self {
            extensions,
            cutoff,
            date_segment,
            undated,
        }
    }

    pub fn from_config(config: &MigrationConfig, cutoff: NaiveDate) -> Self {
        Self::new(
            &config.extensions,
            cutoff,
            config.date_segment,
            config.undated,
        )
    }

    pub fn cutoff(&self) -> NaiveDate {
        self.cutoff
    }

    /// Whether the last path segment ends with an allowed extension.
    pub fn has_allowed_extension(&self, key: &str) -> bool {
        if key.ends_with('/') {
            return false;
        }
        match extension_of(key) {
            Some(ext) => self.extensions.iter().any(|allowed| *allowed == ext),
            None => false,
        }
    }

    /// Classifies an object key.
    pub fn classify(&self, key: &str, last_modified: DateTime<Utc>) -> Eligibility {
        if !self.has_allowed_extension(key) {
            return Eligibility::WrongExtension;
        }

        let (date, from_path) = match date_from_path(key, self.date_segment) {
            Some(date) => (date, true),
            None => match self.undated {
                UndatedPolicy::Exclude => return Eligibility::Undated,
                UndatedPolicy::LastModified => (last_modified.date_naive(), false),
            },
        };

        if date < self.cutoff {
            Eligibility::BeforeCutoff(date)
        } else {
            Eligibility::Eligible { date, from_path }
        }
    }
}

/// Parses `YYYY-MM-DD` from the `segment`-th `/`-separated part of `key`.
pub fn date_from_path(key: &str, segment: usize) -> Option<NaiveDate> {
    let part = key.split('/').nth(segment)?;
    if part.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(part, DATE_FORMAT).ok()
}

/// Lowercased extension of the last path segment, dot included.
fn extension_of(key: &str) -> Option<String> {
    let name = key.rsplit('/').next()?;
    let dot = name.rfind('.')?;
    Some(name[dot..].to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn filter(undated: UndatedPolicy) -> EligibilityFilter {
        EligibilityFilter::new(
            &["mp4".to_string(), ".MKV".to_string()],
            date(2025, 9, 7),
            1,
            undated,
        )
    }

    fn modified() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_date_from_path() {
        assert_eq!(
            date_from_path("port1/2025-07-15/recording_1.mp4", 1),
            Some(date(2025, 7, 15))
        );
        assert_eq!(date_from_path("port1/latest/recording.mp4", 1), None);
        assert_eq!(date_from_path("recording.mp4", 1), None);
        assert_eq!(date_from_path("port1/2025-7-5/recording.mp4", 1), None);
        assert_eq!(date_from_path("port1/2025-02-30/recording.mp4", 1), None);
        assert_eq!(
            date_from_path("2025-07-15/recording.mp4", 0),
            Some(date(2025, 7, 15))
        );
    }

    #[test]
    fn test_extension_matching() {
        let f = filter(UndatedPolicy::Exclude);
        assert!(f.has_allowed_extension("port1/2025-09-07/a.mp4"));
        assert!(f.has_allowed_extension("port1/2025-09-07/a.MP4"));
        assert!(f.has_allowed_extension("port1/2025-09-07/a.mkv"));
        assert!(!f.has_allowed_extension("port1/2025-09-07/a.mp4.json"));
        assert!(!f.has_allowed_extension("port1/2025-09-07/"));
        assert!(!f.has_allowed_extension("port1.mp4/2025-09-07/readme"));
    }

    #[test]
    fn test_cutoff_is_inclusive() {
        let f = filter(UndatedPolicy::Exclude);
        assert_eq!(
            f.classify("port1/2025-09-07/a.mp4", modified()),
            Eligibility::Eligible {
                date: date(2025, 9, 7),
                from_path: true
            }
        );
        assert_eq!(
            f.classify("port1/2025-09-06/a.mp4", modified()),
            Eligibility::BeforeCutoff(date(2025, 9, 6))
        );
        assert_eq!(
            f.classify("port1/2025-09-06/a.txt", modified()),
            Eligibility::WrongExtension
        );
    }

    #[test]
    fn test_undated_exclude() {
        let f = filter(UndatedPolicy::Exclude);
        assert_eq!(
            f.classify("port1/misc/a.mp4", modified()),
            Eligibility::Undated
        );
    }

    #[test]
    fn test_undated_last_modified() {
        let f = filter(UndatedPolicy::LastModified);
        assert_eq!(
            f.classify("port1/misc/a.mp4", modified()),
            Eligibility::Eligible {
                date: date(2025, 10, 1),
                from_path: false
            }
        );

        let old = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            f.classify("port1/misc/a.mp4", old),
            Eligibility::BeforeCutoff(date(2024, 1, 1))
        );
    }
}
