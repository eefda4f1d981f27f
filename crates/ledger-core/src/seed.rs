//! Built-in sample sessions for demos and local development.

use crate::types::Session;
use chrono::{TimeZone, Utc};

struct Sample {
    id: &'static str,
    ymd_hm: (i32, u32, u32, u32, u32),
    player_id: &'static str,
    machine_id: &'static str,
    starting_count: i64,
    investment: i64,
    ending_count: i64,
    payout: i64,
    notes: &'static str,
}

const SAMPLES: [Sample; 5] = [
    Sample {
        id: "1",
        ymd_hm: (2025, 5, 15, 10, 0),
        player_id: "1",
        machine_id: "1",
        starting_count: 150,
        investment: 20000,
        ending_count: 350,
        payout: 35000,
        notes: "AT 3回、設定6の可能性あり",
    },
    Sample {
        id: "2",
        ymd_hm: (2025, 5, 16, 9, 30),
        player_id: "2",
        machine_id: "3",
        starting_count: 0,
        investment: 15000,
        ending_count: 500,
        payout: 10000,
        notes: "ボーナス1回のみ",
    },
    Sample {
        id: "3",
        ymd_hm: (2025, 5, 16, 14, 0),
        player_id: "3",
        machine_id: "5",
        starting_count: 200,
        investment: 30000,
        ending_count: 400,
        payout: 50000,
        notes: "大当たり2回",
    },
    Sample {
        id: "4",
        ymd_hm: (2025, 5, 17, 11, 0),
        player_id: "1",
        machine_id: "2",
        starting_count: 50,
        investment: 25000,
        ending_count: 300,
        payout: 20000,
        notes: "",
    },
    Sample {
        id: "5",
        ymd_hm: (2025, 5, 17, 16, 30),
        player_id: "4",
        machine_id: "4",
        starting_count: 100,
        investment: 18000,
        ending_count: 250,
        payout: 15000,
        notes: "閉店間際に打ち始め",
    },
];

pub fn demo_sessions() -> Vec<Session> {
    SAMPLES
        .iter()
        .filter_map(|s| {
            let (y, mo, d, h, mi) = s.ymd_hm;
            let date = Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).single()?;
            Some(Session {
                id: s.id.into(),
                date,
                player_id: s.player_id.into(),
                machine_id: s.machine_id.into(),
                starting_count: s.starting_count,
                investment: s.investment,
                ending_count: s.ending_count,
                payout: s.payout,
                notes: s.notes.into(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_sessions_valid() {
        let sessions = demo_sessions();
        assert_eq!(sessions.len(), 5);
        assert!(sessions.iter().all(|s| s.validate().is_ok()));
        let total: i64 = sessions.iter().map(|s| s.profit()).sum();
        assert_eq!(total, 22000);
    }
}
