use crate::error::{LedgerError, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Largest accepted count or yen amount. Keeps store-wide totals within i64.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

/// A single recorded play session on one machine by one employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    #[serde(deserialize_with = "de::date")]
    pub date: DateTime<Utc>,
    pub player_id: String,
    pub machine_id: String,
    #[serde(default, deserialize_with = "de::count")]
    pub starting_count: i64,
    #[serde(default, deserialize_with = "de::count")]
    pub investment: i64,
    #[serde(default, deserialize_with = "de::count")]
    pub ending_count: i64,
    #[serde(default, deserialize_with = "de::count")]
    pub payout: i64,
    #[serde(default)]
    pub notes: String,
}

impl Session {
    /// Payout minus investment. Negative for a losing session.
    pub fn profit(&self) -> i64 {
        self.payout - self.investment
    }

    pub fn is_win(&self) -> bool {
        self.profit() > 0
    }

    /// Calendar date of the session as seen from `offset`.
    pub fn local_date(&self, offset: FixedOffset) -> NaiveDate {
        self.date.with_timezone(&offset).date_naive()
    }

    /// Check the field-level invariants a stored session must satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.player_id.trim().is_empty() {
            return Err(LedgerError::Validation("player_id must not be empty".into()));
        }
        if self.machine_id.trim().is_empty() {
            return Err(LedgerError::Validation("machine_id must not be empty".into()));
        }
        for (field, value) in [
            ("starting_count", self.starting_count),
            ("investment", self.investment),
            ("payout", self.payout),
        ] {
            if value < 0 {
                return Err(LedgerError::Validation(format!(
                    "{} must not be negative (got {})",
                    field, value
                )));
            }
            if value > MAX_AMOUNT {
                return Err(LedgerError::Validation(format!(
                    "{} must not exceed {} (got {})",
                    field, MAX_AMOUNT, value
                )));
            }
        }
        Ok(())
    }
}

/// Fields submitted when creating a session. The id is assigned by the store.
///
/// Numeric fields that are missing, `null`, or empty strings default to 0.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewSession {
    #[serde(default, deserialize_with = "de::opt_date")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub player_id: String,
    #[serde(default)]
    pub machine_id: String,
    #[serde(default, deserialize_with = "de::count")]
    pub starting_count: i64,
    #[serde(default, deserialize_with = "de::count")]
    pub investment: i64,
    #[serde(default, deserialize_with = "de::count")]
    pub ending_count: i64,
    #[serde(default, deserialize_with = "de::count")]
    pub payout: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewSession {
    /// Build a validated session with the given id. A missing date becomes `now`.
    pub fn into_session(self, id: String, now: DateTime<Utc>) -> Result<Session> {
        let session = Session {
            id,
            date: self.date.unwrap_or(now),
            player_id: self.player_id,
            machine_id: self.machine_id,
            starting_count: self.starting_count,
            investment: self.investment,
            ending_count: self.ending_count,
            payout: self.payout,
            notes: self.notes.unwrap_or_default(),
        };
        session.validate()?;
        Ok(session)
    }
}

/// Partial update. Absent (or `null`) fields leave the stored value untouched;
/// an `id` in the payload is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionPatch {
    #[serde(default, deserialize_with = "de::opt_date")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub player_id: Option<String>,
    #[serde(default)]
    pub machine_id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_count")]
    pub starting_count: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_count")]
    pub investment: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_count")]
    pub ending_count: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_count")]
    pub payout: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl SessionPatch {
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.player_id.is_none()
            && self.machine_id.is_none()
            && self.starting_count.is_none()
            && self.investment.is_none()
            && self.ending_count.is_none()
            && self.payout.is_none()
            && self.notes.is_none()
    }

    /// Merge this patch over `current`, returning the candidate record.
    /// The caller validates it before replacing the stored copy.
    pub fn merged_with(&self, current: &Session) -> Session {
        let mut next = current.clone();
        if let Some(date) = self.date {
            next.date = date;
        }
        if let Some(player_id) = &self.player_id {
            next.player_id = player_id.clone();
        }
        if let Some(machine_id) = &self.machine_id {
            next.machine_id = machine_id.clone();
        }
        if let Some(v) = self.starting_count {
            next.starting_count = v;
        }
        if let Some(v) = self.investment {
            next.investment = v;
        }
        if let Some(v) = self.ending_count {
            next.ending_count = v;
        }
        if let Some(v) = self.payout {
            next.payout = v;
        }
        if let Some(notes) = &self.notes {
            next.notes = notes.clone();
        }
        next
    }
}

/// An id/name pair from one of the static lookup lists (employees, machines).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupEntry {
    pub id: String,
    pub name: String,
}

impl LookupEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

pub type Employee = LookupEntry;
pub type Machine = LookupEntry;

/// Lenient deserializers for form-style input.
mod de {
    use chrono::{DateTime, NaiveDate, Utc};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawCount {
        Int(i64),
        Float(f64),
        Text(String),
    }

    fn parse_count<E: Error>(raw: Option<RawCount>) -> Result<Option<i64>, E> {
        match raw {
            None => Ok(None),
            Some(RawCount::Int(n)) => Ok(Some(n)),
            Some(RawCount::Float(f)) if f.is_finite() => Ok(Some(f.trunc() as i64)),
            Some(RawCount::Float(f)) => Err(E::custom(format!("expected an integer, got {}", f))),
            Some(RawCount::Text(s)) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                trimmed
                    .parse::<i64>()
                    .map(Some)
                    .map_err(|_| E::custom(format!("expected an integer, got {:?}", s)))
            }
        }
    }

    /// Integer that may arrive as a number, a numeric string, `null`, or `""` (→ 0).
    pub fn count<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        let raw = Option::<RawCount>::deserialize(d)?;
        Ok(parse_count(raw)?.unwrap_or(0))
    }

    pub fn opt_count<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        let raw = Option::<RawCount>::deserialize(d)?;
        parse_count(raw)
    }

    fn parse_date<E: Error>(s: &str) -> Result<DateTime<Utc>, E> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(dt.with_timezone(&Utc));
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
            .ok_or_else(|| E::custom(format!("invalid date {:?}, expected RFC 3339 or YYYY-MM-DD", s)))
    }

    /// RFC 3339 timestamp or a bare `YYYY-MM-DD` (midnight UTC).
    pub fn date<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(d)?;
        parse_date(s.trim())
    }

    pub fn opt_date<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(d)? {
            Some(s) if !s.trim().is_empty() => parse_date(s.trim()).map(Some),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Session {
        Session {
            id: "1".into(),
            date: Utc.with_ymd_and_hms(2025, 5, 15, 10, 0, 0).unwrap(),
            player_id: "1".into(),
            machine_id: "1".into(),
            starting_count: 150,
            investment: 20000,
            ending_count: 350,
            payout: 35000,
            notes: "AT x3".into(),
        }
    }

    #[test]
    fn test_profit_and_win() {
        let mut s = sample();
        assert_eq!(s.profit(), 15000);
        assert!(s.is_win());

        s.payout = 20000;
        assert_eq!(s.profit(), 0);
        assert!(!s.is_win());
    }

    #[test]
    fn test_missing_counts_default_to_zero() {
        let json = r#"{"player_id":"2","machine_id":"3","investment":15000,"payout":10000}"#;
        let new: NewSession = serde_json::from_str(json).unwrap();
        assert_eq!(new.ending_count, 0);
        assert_eq!(new.starting_count, 0);
        assert_eq!(new.investment, 15000);
    }

    #[test]
    fn test_counts_accept_strings_and_null() {
        let json = r#"{"player_id":"1","machine_id":"1","investment":"2000","payout":null,"ending_count":""}"#;
        let new: NewSession = serde_json::from_str(json).unwrap();
        assert_eq!(new.investment, 2000);
        assert_eq!(new.payout, 0);
        assert_eq!(new.ending_count, 0);
    }

    #[test]
    fn test_non_numeric_count_rejected() {
        let json = r#"{"player_id":"1","machine_id":"1","investment":"lots"}"#;
        assert!(serde_json::from_str::<NewSession>(json).is_err());
    }

    #[test]
    fn test_date_only_accepted() {
        let json = r#"{"date":"2025-05-16","player_id":"1","machine_id":"1"}"#;
        let new: NewSession = serde_json::from_str(json).unwrap();
        assert_eq!(
            new.date,
            Some(Utc.with_ymd_and_hms(2025, 5, 16, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_into_session_fills_defaults() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let new = NewSession {
            player_id: "1".into(),
            machine_id: "2".into(),
            ..Default::default()
        };
        let s = new.into_session("7".into(), now).unwrap();
        assert_eq!(s.id, "7");
        assert_eq!(s.date, now);
        assert_eq!(s.notes, "");
    }

    #[test]
    fn test_validation_rejects_negative_investment() {
        let mut s = sample();
        s.investment = -1;
        assert!(matches!(s.validate(), Err(LedgerError::Validation(_))));
    }

    #[test]
    fn test_validation_rejects_oversized_amounts() {
        let mut s = sample();
        s.payout = i64::MAX;
        assert!(matches!(s.validate(), Err(LedgerError::Validation(_))));

        let mut s = sample();
        s.investment = MAX_AMOUNT + 1;
        assert!(matches!(s.validate(), Err(LedgerError::Validation(_))));

        let mut s = sample();
        s.payout = MAX_AMOUNT;
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_blank_machine() {
        let mut s = sample();
        s.machine_id = "  ".into();
        assert!(matches!(s.validate(), Err(LedgerError::Validation(_))));
    }

    #[test]
    fn test_empty_patch_is_noop() {
        let patch: SessionPatch = serde_json::from_str("{}").unwrap();
        assert!(patch.is_empty());
        let s = sample();
        assert_eq!(patch.merged_with(&s), s);
    }

    #[test]
    fn test_patch_ignores_id_and_merges() {
        let patch: SessionPatch =
            serde_json::from_str(r#"{"id":"99","payout":"40000","notes":"re-check"}"#).unwrap();
        let merged = patch.merged_with(&sample());
        assert_eq!(merged.id, "1");
        assert_eq!(merged.payout, 40000);
        assert_eq!(merged.notes, "re-check");
        assert_eq!(merged.investment, 20000);
    }

    #[test]
    fn test_local_date_uses_offset() {
        let mut s = sample();
        s.date = Utc.with_ymd_and_hms(2025, 5, 15, 20, 0, 0).unwrap();
        let jst = FixedOffset::east_opt(9 * 3600).unwrap();
        assert_eq!(s.local_date(jst), NaiveDate::from_ymd_opt(2025, 5, 16).unwrap());
        let utc = FixedOffset::east_opt(0).unwrap();
        assert_eq!(s.local_date(utc), NaiveDate::from_ymd_opt(2025, 5, 15).unwrap());
    }

    #[test]
    fn test_session_serializes_snake_case() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["starting_count"], 150);
        assert_eq!(json["player_id"], "1");
        assert_eq!(json["date"], "2025-05-15T10:00:00Z");
    }
}
