//! Star ratings and their aggregate.

use serde::{Deserialize, Serialize};

/// Error returned when a value is outside the 1-5 star range.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("rating must be between {min} and {max}, got {value}", min = RatingValue::MIN, max = RatingValue::MAX)]
pub struct RatingValueError {
    /// The rejected value.
    pub value: i64,
}

/// A single star rating in the inclusive range `1..=5`.
///
/// ```
/// use storerate_core::RatingValue;
///
/// assert_eq!(RatingValue::new(4).unwrap().get(), 4);
/// assert!(RatingValue::new(0).is_err());
/// assert!(RatingValue::new(6).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct RatingValue(u8);

impl RatingValue {
    /// Lowest allowed rating.
    pub const MIN: u8 = 1;
    /// Highest allowed rating.
    pub const MAX: u8 = 5;

    /// Create a rating, rejecting values outside `1..=5`.
    ///
    /// # Errors
    ///
    /// Returns `RatingValueError` when the value is out of range.
    pub fn new(value: i64) -> Result<Self, RatingValueError> {
        u8::try_from(value)
            .ok()
            .filter(|v| (Self::MIN..=Self::MAX).contains(v))
            .map(Self)
            .ok_or(RatingValueError { value })
    }

    /// The number of stars.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// The value as stored in a `SMALLINT` column.
    #[must_use]
    pub fn as_i16(self) -> i16 {
        i16::from(self.0)
    }
}

impl TryFrom<i64> for RatingValue {
    type Error = RatingValueError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<i16> for RatingValue {
    type Error = RatingValueError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        Self::new(i64::from(value))
    }
}

impl From<RatingValue> for u8 {
    fn from(value: RatingValue) -> Self {
        value.0
    }
}

impl std::fmt::Display for RatingValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for RatingValue {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i16 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i16 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for RatingValue {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let raw = <i16 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::try_from(raw)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for RatingValue {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i16 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.as_i16(), buf)
    }
}

/// Mean and count of a store's current ratings.
///
/// Always derived from the full set of ratings; an empty set yields
/// `average == 0.0` and `count == 0`. The average is rounded to one decimal.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RatingSummary {
    /// Mean rating rounded to one decimal place.
    pub average: f64,
    /// Number of ratings.
    pub count: i64,
}

impl RatingSummary {
    /// Summary of a store nobody has rated.
    pub const EMPTY: Self = Self {
        average: 0.0,
        count: 0,
    };

    /// Build a summary from a precomputed sum and count (e.g., `SUM`/`COUNT` in SQL).
    #[must_use]
    pub fn from_sum_and_count(sum: i64, count: i64) -> Self {
        if count <= 0 {
            return Self::EMPTY;
        }

        #[allow(clippy::cast_precision_loss)] // Rating sums stay far below 2^52
        let mean = sum as f64 / count as f64;

        Self {
            average: round_one_decimal(mean),
            count,
        }
    }

    /// Build a summary by scanning every rating value.
    #[must_use]
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = RatingValue>,
    {
        let (sum, count) = values
            .into_iter()
            .fold((0_i64, 0_i64), |(sum, count), v| {
                (sum + i64::from(v.get()), count + 1)
            });
        Self::from_sum_and_count(sum, count)
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn values(raw: &[i64]) -> Vec<RatingValue> {
        raw.iter().map(|v| RatingValue::new(*v).unwrap()).collect()
    }

    #[test]
    fn test_rating_value_bounds() {
        for v in 1..=5 {
            assert_eq!(i64::from(RatingValue::new(v).unwrap().get()), v);
        }
        assert_eq!(RatingValue::new(0), Err(RatingValueError { value: 0 }));
        assert_eq!(RatingValue::new(6), Err(RatingValueError { value: 6 }));
        assert!(RatingValue::new(-1).is_err());
        assert!(RatingValue::new(i64::MAX).is_err());
    }

    #[test]
    fn test_rating_value_serde() {
        let v: RatingValue = serde_json::from_str("3").unwrap();
        assert_eq!(v.get(), 3);
        assert_eq!(serde_json::to_string(&v).unwrap(), "3");
        assert!(serde_json::from_str::<RatingValue>("9").is_err());
        assert!(serde_json::from_str::<RatingValue>("2.5").is_err());
    }

    #[test]
    fn test_rating_value_error_message() {
        let err = RatingValue::new(7).unwrap_err();
        assert_eq!(err.to_string(), "rating must be between 1 and 5, got 7");
    }

    #[test]
    fn test_summary_empty() {
        let summary = RatingSummary::from_values(Vec::new());
        assert_eq!(summary, RatingSummary::EMPTY);
        assert_eq!(RatingSummary::from_sum_and_count(0, 0).count, 0);
    }

    #[test]
    fn test_summary_mean() {
        let summary = RatingSummary::from_values(values(&[3, 5]));
        assert!((summary.average - 4.0).abs() < f64::EPSILON);
        assert_eq!(summary.count, 2);
    }

    #[test]
    fn test_summary_rounds_to_one_decimal() {
        // 4 + 4 + 5 = 13 / 3 = 4.333..
        let summary = RatingSummary::from_values(values(&[4, 4, 5]));
        assert!((summary.average - 4.3).abs() < 1e-9);

        // 1 + 2 + 2 = 5 / 3 = 1.666..
        let summary = RatingSummary::from_values(values(&[1, 2, 2]));
        assert!((summary.average - 1.7).abs() < 1e-9);
    }

    #[test]
    fn test_summary_sum_and_count_matches_scan() {
        let raw = [1, 5, 3, 4, 2, 5];
        let scanned = RatingSummary::from_values(values(&raw));
        let summed = RatingSummary::from_sum_and_count(raw.iter().sum(), 6);
        assert_eq!(scanned, summed);
    }
}
