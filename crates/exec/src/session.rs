use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;

use common::config::SessionConfig;
use common::{Error, Result};

/// One trading window, local to the session timezone. Windows where
/// `start > end` wrap past midnight (e.g. 22:00-02:00).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionWindow {
    pub name: String,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// Timezone plus parsed windows; answers "may we trade right now".
#[derive(Debug, Clone)]
pub struct SessionClock {
    tz: Tz,
    windows: Vec<SessionWindow>,
}

impl SessionClock {
    /// An empty window list means no session restriction.
    pub fn is_in_session(&self, now: DateTime<Utc>) -> bool {
        if self.windows.is_empty() {
            return true;
        }
        let current = now.with_timezone(&self.tz).time();
        self.windows.iter().any(|w| {
            if w.start <= w.end {
                w.start <= current && current <= w.end
            } else {
                current >= w.start || current <= w.end
            }
        })
    }
}

/// Parse the session config into a clock. Bad timezone names and
/// malformed "HH:MM" strings are startup-fatal config errors.
pub fn parse_sessions(cfg: &SessionConfig) -> Result<SessionClock> {
    let tz: Tz = cfg
        .timezone
        .parse()
        .map_err(|_| Error::Config(format!("unknown timezone '{}'", cfg.timezone)))?;

    let mut windows = Vec::with_capacity(cfg.windows.len());
    for w in &cfg.windows {
        windows.push(SessionWindow {
            name: w.name.clone(),
            start: parse_hhmm(&w.start)?,
            end: parse_hhmm(&w.end)?,
        });
    }
    Ok(SessionClock { tz, windows })
}

fn parse_hhmm(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| Error::Config(format!("bad session time '{value}', expected HH:MM")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use common::config::SessionWindowConfig;

    fn clock(tz: &str, windows: &[(&str, &str)]) -> SessionClock {
        let cfg = SessionConfig {
            timezone: tz.to_string(),
            windows: windows
                .iter()
                .map(|(s, e)| SessionWindowConfig {
                    name: "session".to_string(),
                    start: s.to_string(),
                    end: e.to_string(),
                })
                .collect(),
        };
        parse_sessions(&cfg).unwrap()
    }

    fn utc(h: u32, m: u32) -> DateTime<Utc> {
        // Mid-January, so London == UTC (no DST).
        Utc.with_ymd_and_hms(2024, 1, 15, h, m, 0).unwrap()
    }

    #[test]
    fn inside_simple_window() {
        let clock = clock("Europe/London", &[("08:00", "17:00")]);
        assert!(clock.is_in_session(utc(10, 30)));
        assert!(!clock.is_in_session(utc(7, 59)));
        assert!(!clock.is_in_session(utc(17, 1)));
    }

    #[test]
    fn window_wrapping_midnight() {
        let clock = clock("Europe/London", &[("22:00", "02:00")]);
        assert!(clock.is_in_session(utc(23, 0)));
        assert!(clock.is_in_session(utc(1, 0)));
        assert!(!clock.is_in_session(utc(12, 0)));
    }

    #[test]
    fn timezone_offset_is_applied() {
        // 09:00 Tokyo == 00:00 UTC.
        let clock = clock("Asia/Tokyo", &[("09:00", "11:00")]);
        assert!(clock.is_in_session(utc(0, 30)));
        assert!(!clock.is_in_session(utc(9, 30)));
    }

    #[test]
    fn no_windows_means_always_open() {
        let clock = clock("UTC", &[]);
        assert!(clock.is_in_session(utc(3, 0)));
    }

    #[test]
    fn unknown_timezone_is_a_config_error() {
        let cfg = SessionConfig {
            timezone: "Mars/Olympus".to_string(),
            windows: vec![],
        };
        assert!(parse_sessions(&cfg).is_err());
    }
}
