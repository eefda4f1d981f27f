use crate::config::LookupConfig;
use crate::types::{Employee, LookupEntry, Machine, Session};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Static employee and machine name lookups.
#[derive(Debug, Clone)]
pub struct LookupTables {
    employees: Vec<Employee>,
    machines: Vec<Machine>,
    unknown_label: String,
}

/// A session joined with display names, as shown in the session table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub id: String,
    pub date: DateTime<Utc>,
    pub player_id: String,
    pub player: String,
    pub machine_id: String,
    pub machine: String,
    pub starting_count: i64,
    pub investment: i64,
    pub ending_count: i64,
    pub payout: i64,
    pub profit: i64,
    pub notes: String,
}

impl LookupTables {
    pub fn new(
        employees: Vec<Employee>,
        machines: Vec<Machine>,
        unknown_label: impl Into<String>,
    ) -> Self {
        Self {
            employees,
            machines,
            unknown_label: unknown_label.into(),
        }
    }

    pub fn from_config(config: &LookupConfig, unknown_label: &str) -> Self {
        Self::new(
            config.employees.clone(),
            config.machines.clone(),
            unknown_label,
        )
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn machines(&self) -> &[Machine] {
        &self.machines
    }

    /// Employee name for `id`, or the placeholder label.
    pub fn employee_name(&self, id: &str) -> &str {
        find_name(&self.employees, id).unwrap_or(self.unknown_label.as_str())
    }

    /// Machine name for `id`, or the placeholder label.
    pub fn machine_name(&self, id: &str) -> &str {
        find_name(&self.machines, id).unwrap_or(self.unknown_label.as_str())
    }

    pub fn resolve(&self, session: &Session) -> SessionView {
        SessionView {
            id: session.id.clone(),
            date: session.date,
            player_id: session.player_id.clone(),
            player: self.employee_name(&session.player_id).to_string(),
            machine_id: session.machine_id.clone(),
            machine: self.machine_name(&session.machine_id).to_string(),
            starting_count: session.starting_count,
            investment: session.investment,
            ending_count: session.ending_count,
            payout: session.payout,
            profit: session.profit(),
            notes: session.notes.clone(),
        }
    }

    pub fn resolve_all(&self, sessions: &[Session]) -> Vec<SessionView> {
        sessions.iter().map(|s| self.resolve(s)).collect()
    }
}

impl Default for LookupTables {
    fn default() -> Self {
        Self::from_config(&LookupConfig::default(), "unknown")
    }
}

fn find_name<'a>(entries: &'a [LookupEntry], id: &str) -> Option<&'a str> {
    entries
        .iter()
        .find(|e| e.id == id)
        .map(|e| e.name.as_str())
}
