//! Prices in Canadian dollars.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::Locale;

/// A CAD amount stored as `NUMERIC(10,2)`.
///
/// The shop sells in one currency, so there is no currency field; the
/// locale only changes how the amount is written.
///
/// ```
/// use aunclic_core::{Locale, Price};
/// use rust_decimal::Decimal;
///
/// let price = Price::new(Decimal::new(1250, 2));
/// assert_eq!(price.display(Locale::En), "$12.50");
/// assert_eq!(price.display(Locale::Fr), "12,50 $");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    #[must_use]
    pub fn from_dollars(dollars: u32) -> Self {
        Self(Decimal::from(dollars))
    }

    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }

    /// Format for a given UI language.
    ///
    /// English puts the sign first (`$1,234.50`); French and Spanish
    /// (Canada) put it last with a comma decimal separator (`1 234,50 $`).
    #[must_use]
    pub fn display(self, locale: Locale) -> String {
        let rounded = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let negative = rounded.is_sign_negative() && !rounded.is_zero();
        let text = format!("{:.2}", rounded.abs());
        let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

        let (group_sep, decimal_sep) = match locale {
            Locale::En => (',', '.'),
            Locale::Es | Locale::Fr => ('\u{a0}', ','),
        };
        let grouped = group_thousands(whole, group_sep);
        let sign = if negative { "-" } else { "" };

        match locale {
            Locale::En => format!("{sign}${grouped}{decimal_sep}{cents}"),
            Locale::Es | Locale::Fr => format!("{sign}{grouped}{decimal_sep}{cents}\u{a0}$"),
        }
    }
}

fn group_thousands(digits: &str, sep: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(ch);
    }
    out
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value).map(Self)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_format_groups_with_commas() {
        let price = Price::new(Decimal::new(123_450, 2));
        assert_eq!(price.display(Locale::En), "$1,234.50");
    }

    #[test]
    fn french_and_spanish_put_sign_last() {
        let price = Price::new(Decimal::new(123_450, 2));
        assert_eq!(price.display(Locale::Fr), "1\u{a0}234,50\u{a0}$");
        assert_eq!(price.display(Locale::Es), "1\u{a0}234,50\u{a0}$");
    }

    #[test]
    fn rounds_half_away_from_zero() {
        let price = Price::new(Decimal::new(19_995, 3));
        assert_eq!(price.display(Locale::En), "$20.00");
    }

    #[test]
    fn whole_dollars_get_cents() {
        assert_eq!(Price::from_dollars(7).display(Locale::En), "$7.00");
        assert_eq!(Price::from_dollars(7).to_string(), "7.00");
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&Price::new(Decimal::new(999, 2))).unwrap_or_default();
        assert_eq!(json, "\"9.99\"");
    }
}
