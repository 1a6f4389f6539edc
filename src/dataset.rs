use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const CSV_HEADER: &str = "destination,probability,player,date";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRow {
    pub destination: String,
    /// `None` when no bookmaker quote for this outcome could be parsed.
    pub probability: Option<f64>,
    pub player: String,
    pub date: NaiveDate,
}

impl OutcomeRow {
    pub fn has_positive_probability(&self) -> bool {
        self.probability.is_some_and(|p| p > 0.0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransferDataset {
    rows: Vec<OutcomeRow>,
}

impl TransferDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, rows: impl IntoIterator<Item = OutcomeRow>) {
        self.rows.extend(rows);
    }

    pub fn rows(&self) -> &[OutcomeRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn players(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for row in &self.rows {
            if !out.contains(&row.player.as_str()) {
                out.push(&row.player);
            }
        }
        out
    }

    pub fn destinations(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for row in &self.rows {
            if !out.contains(&row.destination.as_str()) {
                out.push(&row.destination);
            }
        }
        out
    }

    pub fn to_csv(&self) -> String {
        let mut csv = String::from(CSV_HEADER);
        csv.push('\n');
        for row in &self.rows {
            let probability = row
                .probability
                .map(|p| p.to_string())
                .unwrap_or_default();
            csv.push_str(&format!(
                "{},{},{},{}\n",
                csv_field(&row.destination),
                probability,
                csv_field(&row.player),
                row.date.format("%Y-%m-%d")
            ));
        }
        csv
    }
}

impl FromIterator<OutcomeRow> for TransferDataset {
    fn from_iter<I: IntoIterator<Item = OutcomeRow>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{OutcomeRow, TransferDataset};

    fn row(destination: &str, probability: Option<f64>, player: &str) -> OutcomeRow {
        OutcomeRow {
            destination: destination.to_string(),
            probability,
            player: player.to_string(),
            date: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
        }
    }

    #[test]
    fn csv_export_blanks_missing_and_quotes_commas() {
        let ds: TransferDataset = vec![
            row("Arsenal", Some(0.25), "Harry Kane"),
            row("Inter Milan, Italy", None, "Harry Kane"),
        ]
        .into_iter()
        .collect();

        let csv = ds.to_csv();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "destination,probability,player,date");
        assert_eq!(lines[1], "Arsenal,0.25,Harry Kane,2026-07-01");
        assert_eq!(lines[2], "\"Inter Milan, Italy\",,Harry Kane,2026-07-01");
    }

    #[test]
    fn distinct_names_keep_first_seen_order() {
        let mut ds = TransferDataset::new();
        ds.extend([row("Chelsea", None, "B"), row("Arsenal", None, "A")]);
        ds.extend([row("Chelsea", None, "A")]);
        assert_eq!(ds.players(), vec!["B", "A"]);
        assert_eq!(ds.destinations(), vec!["Chelsea", "Arsenal"]);
        assert_eq!(ds.len(), 3);
    }
}
