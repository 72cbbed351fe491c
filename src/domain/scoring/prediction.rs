//! Layer 2: accuracy of each author's guess at the crowd score.
//!
//! Two closeness measures coexist and are kept separate: a linear score for
//! the combined blend, and an inverse-distance weight for the prediction pool.

use super::{CrowdScore, INVERSE_DISTANCE_NUMERATOR};
use crate::domain::Opinion;

/// `|prediction - crowd|` in hundredths of a point.
#[must_use]
pub fn prediction_distance(market_prediction: u8, crowd: CrowdScore) -> u32 {
    (i32::from(market_prediction) * 100 - i32::from(crowd.hundredths())).unsigned_abs()
}

/// `max(0, 100 - round(|prediction - crowd|))` per opinion, in input order.
///
/// `crowd` is the stored score, already rounded to hundredths, so a distance
/// is rounded twice: once to hundredths by the crowd score and once here to
/// whole points. A crowd of 56.496 is stored as 56.50, which puts a
/// prediction of 55 at 1.50 points and a score of 98 rather than 99. The
/// ledger and every replay see the same stored value, so the scores agree.
#[must_use]
pub fn calculate_prediction_scores(opinions: &[Opinion], crowd: CrowdScore) -> Vec<u8> {
    opinions
        .iter()
        .map(|op| {
            let distance = (prediction_distance(op.market_prediction, crowd) + 50) / 100;
            100u32.saturating_sub(distance) as u8
        })
        .collect()
}

/// Inverse-distance weight `1_000_000 / (|prediction - crowd| + 1)`.
#[must_use]
pub fn prediction_pool_weight(market_prediction: u8, crowd: CrowdScore) -> u128 {
    let distance = u128::from(prediction_distance(market_prediction, crowd));
    INVERSE_DISTANCE_NUMERATOR * 100 / (distance + 100)
}
