use serde::Serialize;

use crate::config::ScoringSettings;
use crate::domain::Seed;

/// Everything the Cinderella bonus was computed from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CinderellaInputs {
    pub seed: Seed,
    /// Worst rank inside the player's final score group
    pub group_floor: usize,
    pub tolerance: u32,
    /// Places finished above seed expectation, after tolerance
    pub places: i64,
    /// 0 for the strongest quarter of the field, 3 for the weakest
    pub quartile: usize,
    pub multiplier: f64,
    pub bonus: f64,
}

/// Seed quarter of the field, strongest first
pub fn seed_quartile(seed: Seed, field_size: usize) -> usize {
    if field_size == 0 {
        return 0;
    }
    ((seed.saturating_sub(1) as usize * 4) / field_size).min(3)
}

/// Bonus for finishing well above seed. Grows faster than linearly in the
/// number of places gained and weighs weaker seeds more.
pub fn cinderella_bonus(
    seed: Seed,
    group_floor: usize,
    field_size: usize,
    settings: &ScoringSettings,
) -> CinderellaInputs {
    let places = seed as i64 - group_floor as i64 - settings.cinderella_tolerance as i64;
    let quartile = seed_quartile(seed, field_size);
    let multiplier = settings.cinderella_multipliers[quartile];

    let bonus = if places > 0 {
        let p = places as f64;
        multiplier * (settings.cinderella_per_place * p + settings.cinderella_acceleration * p * p)
    } else {
        0.0
    };

    CinderellaInputs {
        seed,
        group_floor,
        tolerance: settings.cinderella_tolerance,
        places,
        quartile,
        multiplier,
        bonus,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quartiles() {
        assert_eq!(seed_quartile(1, 32), 0);
        assert_eq!(seed_quartile(8, 32), 0);
        assert_eq!(seed_quartile(9, 32), 1);
        assert_eq!(seed_quartile(32, 32), 3);
        assert_eq!(seed_quartile(5, 5), 3);
    }

    #[test]
    fn test_no_bonus_at_or_below_expectation() {
        let settings = ScoringSettings::default();
        assert_eq!(cinderella_bonus(10, 10, 32, &settings).bonus, 0.0);
        assert_eq!(cinderella_bonus(10, 14, 32, &settings).bonus, 0.0);
    }

    #[test]
    fn test_bonus_grows_with_overperformance() {
        let settings = ScoringSettings::default();
        let small = cinderella_bonus(28, 24, 32, &settings);
        let large = cinderella_bonus(28, 8, 32, &settings);

        assert_eq!(small.places, 4);
        // 2.0 * (4 + 0.25 * 16)
        assert_eq!(small.bonus, 16.0);
        assert!(large.bonus > small.bonus);
    }

    #[test]
    fn test_tolerance_absorbs_small_gains() {
        let settings = ScoringSettings {
            cinderella_tolerance: 2,
            ..ScoringSettings::default()
        };
        assert_eq!(cinderella_bonus(12, 10, 32, &settings).bonus, 0.0);
        assert!(cinderella_bonus(12, 9, 32, &settings).bonus > 0.0);
    }
}
