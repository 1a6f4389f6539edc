use std::path::Path;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use crate::dataset::TransferDataset;

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub probability: Option<f64>,
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS transfer_odds (
            date TEXT NOT NULL,
            player TEXT NOT NULL,
            destination TEXT NOT NULL,
            probability REAL NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (date, player, destination)
        );
        CREATE INDEX IF NOT EXISTS idx_transfer_odds_player ON transfer_odds(player);
        CREATE INDEX IF NOT EXISTS idx_transfer_odds_destination ON transfer_odds(destination);
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

/// Upsert a run's rows. Re-running on the same day replaces that day's values.
pub fn record_dataset(conn: &mut Connection, dataset: &TransferDataset) -> Result<usize> {
    let now = Utc::now().to_rfc3339();
    let tx = conn.transaction().context("begin history transaction")?;
    let mut written = 0usize;
    {
        let mut stmt = tx
            .prepare(
                r#"
                INSERT INTO transfer_odds (date, player, destination, probability, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(date, player, destination) DO UPDATE SET
                    probability = excluded.probability,
                    updated_at = excluded.updated_at
                "#,
            )
            .context("prepare history upsert")?;
        for row in dataset.rows() {
            written += stmt
                .execute(params![
                    row.date.format("%Y-%m-%d").to_string(),
                    row.player,
                    row.destination,
                    row.probability,
                    now,
                ])
                .with_context(|| format!("upsert {} -> {}", row.player, row.destination))?;
        }
    }
    tx.commit().context("commit history")?;
    Ok(written)
}

pub fn load_series(conn: &Connection, player: &str, destination: &str) -> Result<Vec<HistoryPoint>> {
    let mut stmt = conn
        .prepare(
            "SELECT date, probability FROM transfer_odds
             WHERE player = ?1 AND destination = ?2
             ORDER BY date ASC",
        )
        .context("prepare series query")?;
    let rows = stmt
        .query_map(params![player, destination], |r| {
            Ok((r.get::<_, String>(0)?, r.get::<_, Option<f64>>(1)?))
        })
        .context("query series")?;

    let mut out = Vec::new();
    for row in rows {
        let (date, probability) = row.context("read series row")?;
        let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .with_context(|| format!("bad date in history: {date}"))?;
        out.push(HistoryPoint { date, probability });
    }
    Ok(out)
}

pub fn latest_date(conn: &Connection) -> Result<Option<NaiveDate>> {
    let raw: Option<String> = conn
        .query_row("SELECT MAX(date) FROM transfer_odds", [], |r| r.get(0))
        .optional()
        .context("query latest date")?
        .flatten();
    raw.map(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").context("bad latest date"))
        .transpose()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rusqlite::Connection;

    use super::{init_schema, latest_date, load_series, record_dataset};
    use crate::dataset::{OutcomeRow, TransferDataset};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, d).unwrap()
    }

    fn dataset(date: NaiveDate, arsenal: Option<f64>) -> TransferDataset {
        vec![
            OutcomeRow {
                destination: "Arsenal".to_string(),
                probability: arsenal,
                player: "Declan Rice".to_string(),
                date,
            },
            OutcomeRow {
                destination: "Chelsea".to_string(),
                probability: Some(0.1),
                player: "Declan Rice".to_string(),
                date,
            },
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn runs_accumulate_into_a_series() {
        let mut conn = Connection::open_in_memory().expect("db");
        init_schema(&conn).expect("schema");
        assert_eq!(latest_date(&conn).expect("query"), None);

        record_dataset(&mut conn, &dataset(day(2), Some(0.5))).expect("day 2");
        record_dataset(&mut conn, &dataset(day(1), None)).expect("day 1");
        record_dataset(&mut conn, &dataset(day(2), Some(0.6))).expect("day 2 rerun");

        let series = load_series(&conn, "Declan Rice", "Arsenal").expect("series");
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date, day(1));
        assert_eq!(series[0].probability, None);
        assert_eq!(series[1].probability, Some(0.6));
        assert_eq!(latest_date(&conn).expect("query"), Some(day(2)));
    }
}
