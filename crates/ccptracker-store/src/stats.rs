use serde::Serialize;

use crate::turns::TurnRow;

/// Aggregate view of the turn log.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TurnStats {
    pub total_turns: usize,
    pub rated_turns: usize,
    /// Mean of every `star` that parses as a number.
    pub average_rating: Option<f64>,
    pub last_request_dtm: Option<String>,
}

impl TurnStats {
    pub fn from_rows(rows: &[TurnRow]) -> Self {
        let ratings: Vec<f64> = rows
            .iter()
            .filter_map(|r| r.star.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .collect();

        let average_rating = if ratings.is_empty() {
            None
        } else {
            Some(ratings.iter().sum::<f64>() / ratings.len() as f64)
        };

        Self {
            total_turns: rows.len(),
            rated_turns: ratings.len(),
            average_rating,
            last_request_dtm: rows
                .last()
                .map(|r| r.request_dtm.clone())
                .filter(|dtm| !dtm.is_empty()),
        }
    }
}
