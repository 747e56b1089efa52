//! Review star ratings and their aggregate.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("rating must be between {min} and {max}, got {got}", min = Rating::MIN, max = Rating::MAX)]
pub struct RatingError {
    pub got: i64,
}

/// A star rating in `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i16")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// # Errors
    ///
    /// Returns [`RatingError`] when `stars` is outside `1..=5`.
    pub fn new(stars: i64) -> Result<Self, RatingError> {
        u8::try_from(stars)
            .ok()
            .filter(|s| (Self::MIN..=Self::MAX).contains(s))
            .map(Self)
            .ok_or(RatingError { got: stars })
    }

    #[must_use]
    pub const fn stars(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn as_i16(self) -> i16 {
        i16::from(self.0)
    }
}

impl TryFrom<i64> for Rating {
    type Error = RatingError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for i16 {
    fn from(rating: Rating) -> Self {
        rating.as_i16()
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Average and count of a product's reviews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RatingStats {
    /// Mean stars rounded to one decimal; zero when there are no reviews.
    pub average_rating: Decimal,
    pub review_count: i64,
}

impl RatingStats {
    /// Build from `SUM(stars)` and `COUNT(*)`.
    #[must_use]
    pub fn from_totals(star_sum: i64, review_count: i64) -> Self {
        if review_count <= 0 {
            return Self::default();
        }
        let average = (Decimal::from(star_sum) / Decimal::from(review_count))
            .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
        Self {
            average_rating: average,
            review_count,
        }
    }

    /// Number of filled stars to draw.
    #[must_use]
    pub fn filled_stars(&self) -> u8 {
        let rounded = self
            .average_rating
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        (1..=Rating::MAX)
            .rev()
            .find(|s| Decimal::from(*s) <= rounded)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_one_through_five() {
        for stars in 1..=5 {
            assert!(Rating::new(stars).is_ok());
        }
    }

    #[test]
    fn rejects_out_of_range() {
        assert_eq!(Rating::new(0), Err(RatingError { got: 0 }));
        assert_eq!(Rating::new(6), Err(RatingError { got: 6 }));
        assert!(Rating::new(-3).is_err());
        assert!(Rating::new(300).is_err());
    }

    #[test]
    fn average_rounds_to_one_decimal() {
        // 4 + 4 + 5 = 13 / 3 = 4.333...
        let stats = RatingStats::from_totals(13, 3);
        assert_eq!(stats.average_rating, Decimal::new(43, 1));
        assert_eq!(stats.review_count, 3);

        // 9 / 2 = 4.5 exactly
        assert_eq!(RatingStats::from_totals(9, 2).average_rating, Decimal::new(45, 1));

        // 11 / 4 = 2.75 rounds up
        assert_eq!(RatingStats::from_totals(11, 4).average_rating, Decimal::new(28, 1));
    }

    #[test]
    fn no_reviews_is_zero() {
        let stats = RatingStats::from_totals(0, 0);
        assert!(stats.average_rating.is_zero());
        assert_eq!(stats.review_count, 0);
        assert_eq!(stats.filled_stars(), 0);
    }

    #[test]
    fn filled_stars_rounds_average() {
        assert_eq!(RatingStats::from_totals(13, 3).filled_stars(), 4);
        assert_eq!(RatingStats::from_totals(9, 2).filled_stars(), 5);
    }

    #[test]
    fn deserialize_validates_range() {
        assert!(serde_json::from_str::<Rating>("4").is_ok());
        assert!(serde_json::from_str::<Rating>("9").is_err());
    }
}
