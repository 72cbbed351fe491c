//! Layer 1: net peer backing, normalized across the opinion set.

use super::{div_round, WEIGHT_SCORE_CEILING, WEIGHT_SCORE_FLOOR};
use crate::domain::Opinion;

/// Rescale each opinion's net backing into `5..=100` relative to the set.
///
/// `score = max(5, round((net - min) / range * 95) + 5)` with
/// `range = max(max - min, 1)`. Scores are returned in input order.
#[must_use]
pub fn calculate_weight_scores(opinions: &[Opinion]) -> Vec<u8> {
    let nets: Vec<i128> = opinions.iter().map(Opinion::net_backing).collect();
    let (Some(&min), Some(&max)) = (nets.iter().min(), nets.iter().max()) else {
        return Vec::new();
    };
    let range = (max - min).max(1);
    let span = i128::from(WEIGHT_SCORE_CEILING - WEIGHT_SCORE_FLOOR);

    nets.iter()
        .map(|&net| {
            let scaled = div_round((net - min) * span, range) + i128::from(WEIGHT_SCORE_FLOOR);
            scaled.clamp(
                i128::from(WEIGHT_SCORE_FLOOR),
                i128::from(WEIGHT_SCORE_CEILING),
            ) as u8
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backed(id: &str, backing: u64, slashing: u64) -> Opinion {
        Opinion::new(id, "s", 1, "t", 50, 50).with_peer_totals(backing, slashing)
    }

    #[test]
    fn empty_set_has_no_scores() {
        assert!(calculate_weight_scores(&[]).is_empty());
    }

    #[test]
    fn extremes_map_to_floor_and_ceiling() {
        let ops = [backed("a", 10, 0), backed("b", 60, 0), backed("c", 110, 0)];
        // middle: 50/100 * 95 = 47.5 -> 48, + 5
        assert_eq!(calculate_weight_scores(&ops), vec![5, 53, 100]);
    }

    #[test]
    fn identical_backing_gets_the_floor() {
        let ops = [backed("a", 10, 0), backed("b", 10, 0)];
        assert_eq!(calculate_weight_scores(&ops), vec![5, 5]);
    }

    #[test]
    fn single_opinion_gets_the_floor() {
        assert_eq!(calculate_weight_scores(&[backed("a", 999, 0)]), vec![5]);
    }

    #[test]
    fn negative_net_backing_is_rescaled_not_zeroed() {
        let ops = [backed("a", 0, 100), backed("b", 100, 0)];
        assert_eq!(calculate_weight_scores(&ops), vec![5, 100]);
    }

    #[test]
    fn scores_stay_within_bounds() {
        let ops: Vec<Opinion> = (0..50)
            .map(|i| backed(&format!("o{i}"), (i * i * 7919) % 10_007, (i * 31) % 97))
            .collect();
        let scores = calculate_weight_scores(&ops);
        assert!(scores.iter().all(|&s| (5..=100).contains(&s)));
        assert_eq!(*scores.iter().max().unwrap(), 100);
        assert_eq!(*scores.iter().min().unwrap(), 5);
    }
}
