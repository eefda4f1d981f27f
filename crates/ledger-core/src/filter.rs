//! Session list filtering.
//!
//! Filters are built from query parameters (`player_id`, `machine_id`,
//! `from`, `to`) and applied after reading from the store. Date bounds are
//! inclusive and compared against the session's local calendar date.

use crate::types::Session;
use chrono::{FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFilter {
    #[serde(default)]
    pub player_id: Option<String>,
    #[serde(default)]
    pub machine_id: Option<String>,
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

impl SessionFilter {
    pub fn is_empty(&self) -> bool {
        self.player_id.is_none() && self.machine_id.is_none() && self.from.is_none() && self.to.is_none()
    }

    pub fn matches(&self, session: &Session, offset: FixedOffset) -> bool {
        if let Some(player_id) = &self.player_id {
            if &session.player_id != player_id {
                return false;
            }
        }
        if let Some(machine_id) = &self.machine_id {
            if &session.machine_id != machine_id {
                return false;
            }
        }
        let date = session.local_date(offset);
        if self.from.is_some_and(|from| date < from) {
            return false;
        }
        if self.to.is_some_and(|to| date > to) {
            return false;
        }
        true
    }

    pub fn apply(&self, sessions: Vec<Session>, offset: FixedOffset) -> Vec<Session> {
        if self.is_empty() {
            return sessions;
        }
        sessions
            .into_iter()
            .filter(|s| self.matches(s, offset))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn session(id: &str, player: &str, machine: &str, day: u32) -> Session {
        Session {
            id: id.into(),
            date: Utc.with_ymd_and_hms(2025, 5, day, 10, 0, 0).unwrap(),
            player_id: player.into(),
            machine_id: machine.into(),
            starting_count: 0,
            investment: 100,
            ending_count: 0,
            payout: 50,
            notes: String::new(),
        }
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        let sessions = vec![session("1", "1", "1", 15), session("2", "2", "3", 16)];
        let out = SessionFilter::default().apply(sessions.clone(), utc());
        assert_eq!(out, sessions);
    }

    #[test]
    fn test_filter_by_player_and_machine() {
        let sessions = vec![
            session("1", "1", "1", 15),
            session("2", "2", "3", 16),
            session("3", "1", "2", 17),
        ];
        let by_player = SessionFilter {
            player_id: Some("1".into()),
            ..Default::default()
        };
        let out = by_player.apply(sessions.clone(), utc());
        assert_eq!(out.len(), 2);

        let by_machine = SessionFilter {
            machine_id: Some("3".into()),
            ..Default::default()
        };
        let out = by_machine.apply(sessions, utc());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "2");
    }

    #[test]
    fn test_date_bounds_are_inclusive() {
        let sessions = vec![
            session("1", "1", "1", 15),
            session("2", "1", "1", 16),
            session("3", "1", "1", 17),
        ];
        let filter = SessionFilter {
            from: NaiveDate::from_ymd_opt(2025, 5, 16),
            to: NaiveDate::from_ymd_opt(2025, 5, 17),
            ..Default::default()
        };
        let ids: Vec<_> = filter
            .apply(sessions, utc())
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["2", "3"]);
    }
}
