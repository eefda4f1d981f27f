//! Profit aggregations over session lists.
//!
//! Everything here is a pure function of its inputs: the same sessions,
//! lookups and reference date always produce the same statistics. Calendar
//! days and months are derived in the aggregator's UTC offset.

use chrono::{Days, FixedOffset, NaiveDate, Offset, Utc};
use ledger_core::lookup::LookupTables;
use ledger_core::types::Session;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Headline numbers for a set of sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub total_sessions: usize,
    pub win_count: usize,
    /// Percentage of sessions with positive profit (0..=100).
    pub win_rate: f64,
    pub total_investment: i64,
    pub total_payout: i64,
    pub total_profit: i64,
    pub avg_investment: f64,
    pub avg_payout: f64,
    /// 0 when there are no sessions.
    pub max_profit: i64,
    /// 0 when there are no sessions.
    pub min_profit: i64,
    /// Profit per "YYYY-MM" month.
    pub monthly_profit: BTreeMap<String, i64>,
}

/// Rollup for one employee or one machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub id: String,
    pub name: String,
    pub sessions: u32,
    pub total_investment: i64,
    pub total_payout: i64,
    pub profit: i64,
    pub win_count: u32,
    pub win_rate: f64,
    pub avg_investment: f64,
    pub avg_payout: f64,
    pub avg_profit: f64,
}

impl GroupStats {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            sessions: 0,
            total_investment: 0,
            total_payout: 0,
            profit: 0,
            win_count: 0,
            win_rate: 0.0,
            avg_investment: 0.0,
            avg_payout: 0.0,
            avg_profit: 0.0,
        }
    }

    fn record(&mut self, session: &Session) {
        self.sessions += 1;
        self.total_investment += session.investment;
        self.total_payout += session.payout;
        self.profit += session.profit();
        if session.is_win() {
            self.win_count += 1;
        }
    }

    /// Compute the rate and per-session averages from the running totals.
    fn finalize(&mut self) {
        let n = self.sessions as f64;
        self.win_rate = percentage(self.win_count as usize, self.sessions as usize);
        self.avg_investment = ratio(self.total_investment as f64, n);
        self.avg_payout = ratio(self.total_payout as f64, n);
        self.avg_profit = ratio(self.profit as f64, n);
    }
}

/// Ordering applied to grouped stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupSort {
    /// Highest total profit first.
    Profit,
    /// Most sessions first.
    Sessions,
    /// Highest win rate first.
    WinRate,
    /// Display name, ascending.
    Name,
    /// Order in which each key first appears in the session list.
    FirstSeen,
}

impl FromStr for GroupSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "profit" => Ok(Self::Profit),
            "sessions" => Ok(Self::Sessions),
            "win_rate" => Ok(Self::WinRate),
            "name" => Ok(Self::Name),
            "first_seen" => Ok(Self::FirstSeen),
            other => Err(format!(
                "unknown sort key {:?} (expected profit, sessions, win_rate, name or first_seen)",
                other
            )),
        }
    }
}

/// Profit for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyProfit {
    pub date: NaiveDate,
    pub profit: i64,
}

/// Profit for one calendar month ("YYYY-MM").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyProfit {
    pub month: String,
    pub profit: i64,
}

/// Longest accepted daily window, roughly a century.
pub const MAX_WINDOW_DAYS: u32 = 36_500;

/// Historical window for the daily series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DailyWindow {
    /// The last N calendar days, including the reference day.
    Days(u32),
    #[default]
    All,
}

impl DailyWindow {
    /// First day inside the window, or None for all-time.
    pub fn start(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Days(n) => Some(
                today
                    .checked_sub_days(Days::new(u64::from(n.saturating_sub(1))))
                    .unwrap_or(NaiveDate::MIN),
            ),
            Self::All => None,
        }
    }
}

impl FromStr for DailyWindow {
    type Err = String;

    /// Accepts "all" or "<N>days" (e.g. "7days", "30days", "90days").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(Self::All);
        }
        s.strip_suffix("days")
            .and_then(|n| n.parse::<u32>().ok())
            .filter(|n| (1..=MAX_WINDOW_DAYS).contains(n))
            .map(Self::Days)
            .ok_or_else(|| {
                format!(
                    "invalid range {:?} (expected \"all\" or 1 to {} days, e.g. \"30days\")",
                    s, MAX_WINDOW_DAYS
                )
            })
    }
}

impl fmt::Display for DailyWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Days(n) => write!(f, "{}days", n),
            Self::All => write!(f, "all"),
        }
    }
}

/// Stateless statistics engine.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    offset: FixedOffset,
}

impl Aggregator {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn overview(&self, sessions: &[Session]) -> Overview {
        let total_sessions = sessions.len();
        let win_count = sessions.iter().filter(|s| s.is_win()).count();
        let total_investment: i64 = sessions.iter().map(|s| s.investment).sum();
        let total_payout: i64 = sessions.iter().map(|s| s.payout).sum();
        let total_profit: i64 = sessions.iter().map(|s| s.profit()).sum();
        let n = total_sessions as f64;

        Overview {
            total_sessions,
            win_count,
            win_rate: percentage(win_count, total_sessions),
            total_investment,
            total_payout,
            total_profit,
            avg_investment: ratio(total_investment as f64, n),
            avg_payout: ratio(total_payout as f64, n),
            max_profit: sessions.iter().map(|s| s.profit()).max().unwrap_or(0),
            min_profit: sessions.iter().map(|s| s.profit()).min().unwrap_or(0),
            monthly_profit: self.monthly_profit(sessions),
        }
    }

    /// Per-employee rollups.
    pub fn by_employee(
        &self,
        sessions: &[Session],
        lookups: &LookupTables,
        sort: GroupSort,
    ) -> Vec<GroupStats> {
        group_by(
            sessions,
            |s| s.player_id.as_str(),
            |id| lookups.employee_name(id).to_string(),
            sort,
        )
    }

    /// Per-machine rollups.
    pub fn by_machine(
        &self,
        sessions: &[Session],
        lookups: &LookupTables,
        sort: GroupSort,
    ) -> Vec<GroupStats> {
        group_by(
            sessions,
            |s| s.machine_id.as_str(),
            |id| lookups.machine_name(id).to_string(),
            sort,
        )
    }

    /// Profit summed per "YYYY-MM" month.
    pub fn monthly_profit(&self, sessions: &[Session]) -> BTreeMap<String, i64> {
        let mut months = BTreeMap::new();
        for session in sessions {
            let key = session.local_date(self.offset).format("%Y-%m").to_string();
            *months.entry(key).or_insert(0) += session.profit();
        }
        months
    }

    /// Monthly profit as a list sorted by month, oldest first.
    pub fn monthly_series(&self, sessions: &[Session]) -> Vec<MonthlyProfit> {
        self.monthly_profit(sessions)
            .into_iter()
            .map(|(month, profit)| MonthlyProfit { month, profit })
            .collect()
    }

    /// Profit per day that has sessions, oldest first, restricted to `window`
    /// relative to `today`.
    pub fn daily_profit(
        &self,
        sessions: &[Session],
        window: DailyWindow,
        today: NaiveDate,
    ) -> Vec<DailyProfit> {
        let start = window.start(today);
        let mut days: BTreeMap<NaiveDate, i64> = BTreeMap::new();
        for session in sessions {
            let date = session.local_date(self.offset);
            if start.is_some_and(|start| date < start) {
                continue;
            }
            *days.entry(date).or_insert(0) += session.profit();
        }
        days.into_iter()
            .map(|(date, profit)| DailyProfit { date, profit })
            .collect()
    }

    /// Like `daily_profit`, but every calendar day from the window start
    /// through `today` (or the last session day, if later) is present.
    /// Days without sessions carry zero profit.
    pub fn daily_profit_filled(
        &self,
        sessions: &[Session],
        window: DailyWindow,
        today: NaiveDate,
    ) -> Vec<DailyProfit> {
        let sparse = self.daily_profit(sessions, window, today);
        let start = match window.start(today) {
            Some(start) => start,
            None => match sparse.first() {
                Some(first) => first.date,
                None => return Vec::new(),
            },
        };
        let end = sparse.last().map_or(today, |last| last.date.max(today));
        fill_gaps(&sparse, start, end)
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(Utc.fix())
    }
}

fn group_by<'a, K, N>(
    sessions: &'a [Session],
    key_of: K,
    name_of: N,
    sort: GroupSort,
) -> Vec<GroupStats>
where
    K: Fn(&'a Session) -> &'a str,
    N: Fn(&str) -> String,
{
    let mut groups: Vec<GroupStats> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for session in sessions {
        let key = key_of(session);
        let idx = *index.entry(key).or_insert_with(|| {
            groups.push(GroupStats::new(key, name_of(key)));
            groups.len() - 1
        });
        groups[idx].record(session);
    }

    for group in &mut groups {
        group.finalize();
    }
    sort_groups(&mut groups, sort);
    groups
}

/// Stable sort, so ties keep first-seen order.
pub fn sort_groups(groups: &mut [GroupStats], sort: GroupSort) {
    match sort {
        GroupSort::Profit => groups.sort_by(|a, b| b.profit.cmp(&a.profit)),
        GroupSort::Sessions => groups.sort_by(|a, b| b.sessions.cmp(&a.sessions)),
        GroupSort::WinRate => groups.sort_by(|a, b| b.win_rate.total_cmp(&a.win_rate)),
        GroupSort::Name => groups.sort_by(|a, b| a.name.cmp(&b.name)),
        GroupSort::FirstSeen => {}
    }
}

/// Running total over a daily series. The last entry equals the series sum.
pub fn cumulative(daily: &[DailyProfit]) -> Vec<DailyProfit> {
    let mut running = 0i64;
    daily
        .iter()
        .map(|day| {
            running += day.profit;
            DailyProfit {
                date: day.date,
                profit: running,
            }
        })
        .collect()
}

/// Expand a sparse ascending series to every day in `start..=end`,
/// inserting zero-profit days. Entries outside the range are dropped.
pub fn fill_gaps(sparse: &[DailyProfit], start: NaiveDate, end: NaiveDate) -> Vec<DailyProfit> {
    let known: HashMap<NaiveDate, i64> = sparse.iter().map(|d| (d.date, d.profit)).collect();
    let mut out = Vec::new();
    let mut date = start;
    while date <= end {
        out.push(DailyProfit {
            date,
            profit: known.get(&date).copied().unwrap_or(0),
        });
        match date.succ_opt() {
            Some(next) => date = next,
            None => break,
        }
    }
    out
}

/// Percentage of `part` in `whole`; 0 for an empty whole.
fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn ratio(total: f64, n: f64) -> f64 {
    if n == 0.0 {
        0.0
    } else {
        total / n
    }
}

/// Format an amount with thousands separators, e.g. `-12,345`.
pub fn format_amount(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
