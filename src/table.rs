use chrono::NaiveDate;

use crate::dataset::OutcomeRow;
use crate::odds::parse_odds;

/// Which axis of a raw odds grid carries the outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableLayout {
    /// Row 0 holds outcome labels, column 0 holds bookmaker names.
    BookmakerRows,
    /// Row 0 holds bookmaker names, column 0 holds outcome labels.
    OutcomeRows,
}

/// Rectangular grid of text cells lifted from an odds page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    cells: Vec<Vec<String>>,
    layout: TableLayout,
}

impl RawTable {
    /// Ragged input is padded with empty cells so every row has the same width.
    pub fn new(rows: Vec<Vec<String>>, layout: TableLayout) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let cells = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { cells, layout }
    }

    pub fn from_strs(rows: &[&[&str]], layout: TableLayout) -> Self {
        Self::new(
            rows.iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
            layout,
        )
    }

    pub fn layout(&self) -> TableLayout {
        self.layout
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.cells
    }

    pub fn height(&self) -> usize {
        self.cells.len()
    }

    pub fn width(&self) -> usize {
        self.cells.first().map(Vec::len).unwrap_or(0)
    }

    pub fn transpose(&self) -> Self {
        let mut out = vec![Vec::with_capacity(self.height()); self.width()];
        for row in &self.cells {
            for (col, cell) in row.iter().enumerate() {
                out[col].push(cell.clone());
            }
        }
        let layout = match self.layout {
            TableLayout::BookmakerRows => TableLayout::OutcomeRows,
            TableLayout::OutcomeRows => TableLayout::BookmakerRows,
        };
        Self { cells: out, layout }
    }

    fn into_outcome_rows(self) -> Self {
        match self.layout {
            TableLayout::OutcomeRows => self,
            TableLayout::BookmakerRows => self.transpose(),
        }
    }
}

/// Reduce one market's odds grid to a row per outcome holding the best implied
/// probability on offer.
///
/// The best quote is the shortest odds-against, i.e. the largest probability.
/// An outcome where no bookmaker quote parses keeps a `None` probability rather
/// than being dropped; rows without an outcome label are skipped.
pub fn normalize(table: &RawTable, player: &str, date: NaiveDate) -> Vec<OutcomeRow> {
    let table = table.clone().into_outcome_rows();

    table
        .cells
        .iter()
        .skip(1)
        .filter_map(|row| {
            let (label, quotes) = row.split_first()?;
            let destination = label.trim();
            if destination.is_empty() {
                return None;
            }
            Some(OutcomeRow {
                destination: destination.to_string(),
                probability: best_probability(quotes),
                player: player.to_string(),
                date,
            })
        })
        .collect()
}

fn best_probability(quotes: &[String]) -> Option<f64> {
    quotes
        .iter()
        .filter_map(|q| parse_odds(q))
        .fold(None, |best, p| match best {
            Some(b) if b >= p => Some(b),
            _ => Some(p),
        })
}
