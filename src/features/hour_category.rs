use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse traffic period of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HourCategory {
    MorningRush,
    MidDay,
    EveningRush,
    NightLate,
}

impl HourCategory {
    /// Presentation order of the categories.
    pub const ALL: [HourCategory; 4] = [
        HourCategory::MorningRush,
        HourCategory::MidDay,
        HourCategory::EveningRush,
        HourCategory::NightLate,
    ];

    pub fn label(self) -> &'static str {
        match self {
            HourCategory::MorningRush => "Morning Rush",
            HourCategory::MidDay => "Mid-Day",
            HourCategory::EveningRush => "Evening Rush",
            HourCategory::NightLate => "Night/Late",
        }
    }
}

impl fmt::Display for HourCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Buckets an hour of the day into a [`HourCategory`].
///
/// | Hours        | Category    |
/// |--------------|-------------|
/// | [5, 10)      | MorningRush |
/// | [10, 15)     | MidDay      |
/// | [15, 19)     | EveningRush |
/// | otherwise    | NightLate   |
pub fn hour_category(hour: u32) -> HourCategory {
    match hour {
        5..=9 => HourCategory::MorningRush,
        10..=14 => HourCategory::MidDay,
        15..=18 => HourCategory::EveningRush,
        _ => HourCategory::NightLate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hour_category_boundaries() {
        assert_eq!(hour_category(0), HourCategory::NightLate);
        assert_eq!(hour_category(4), HourCategory::NightLate);
        assert_eq!(hour_category(5), HourCategory::MorningRush);
        assert_eq!(hour_category(9), HourCategory::MorningRush);
        assert_eq!(hour_category(10), HourCategory::MidDay);
        assert_eq!(hour_category(14), HourCategory::MidDay);
        assert_eq!(hour_category(15), HourCategory::EveningRush);
        assert_eq!(hour_category(18), HourCategory::EveningRush);
        assert_eq!(hour_category(19), HourCategory::NightLate);
        assert_eq!(hour_category(23), HourCategory::NightLate);
    }

    #[test]
    fn test_hour_category_is_total() {
        let counts = (0..24).fold([0usize; 4], |mut acc, h| {
            let idx = HourCategory::ALL
                .iter()
                .position(|c| *c == hour_category(h))
                .unwrap();
            acc[idx] += 1;
            acc
        });
        assert_eq!(counts, [5, 5, 4, 10]);
        assert_eq!(hour_category(99), HourCategory::NightLate);
    }

    #[test]
    fn test_labels() {
        assert_eq!(HourCategory::MidDay.to_string(), "Mid-Day");
        assert_eq!(HourCategory::NightLate.label(), "Night/Late");
    }
}
