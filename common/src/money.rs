//! [`Money`]-related definitions.

use std::{fmt, iter::Sum, ops, str::FromStr};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Amount of money in units of the operating currency.
///
/// Charges are settled in whole units, so every derived amount (tax, discount)
/// is [`round`]ed before being summed up.
///
/// [`round`]: Money::round
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero [`Money`].
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates a new [`Money`] of the provided `amount`.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Returns the amount of this [`Money`].
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }

    /// Rounds this [`Money`] to the nearest whole unit, with midpoints rounded
    /// away from zero.
    #[must_use]
    pub fn round(self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Adds the provided [`Money`] to this one, returning [`None`] on
    /// overflow.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Multiplies this [`Money`] by the provided `factor`, returning [`None`]
    /// on overflow.
    #[must_use]
    pub fn checked_mul(self, factor: Decimal) -> Option<Self> {
        self.0.checked_mul(factor).map(Self)
    }

    /// Indicates whether this [`Money`] is zero.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Indicates whether this [`Money`] is below zero.
    #[must_use]
    pub fn is_negative(self) -> bool {
        self.0 < Decimal::ZERO
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<u32> for Money {
    fn from(amount: u32) -> Self {
        Self(amount.into())
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self(amount) = self;
        write!(f, "{}", amount.normalize())
    }
}

impl FromStr for Money {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())
            .map(Self)
            .map_err(|_| "invalid amount")
    }
}

impl ops::Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl ops::Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl ops::SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl ops::Mul<Decimal> for Money {
    type Output = Self;

    fn mul(self, rhs: Decimal) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, ops::Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::Money;

    #[test]
    fn from_str() {
        assert_eq!(Money::from_str("123.45").unwrap(), Money::new(dec!(123.45)));
        assert_eq!(Money::from_str("2000").unwrap(), Money::new(dec!(2000)));
        assert_eq!(Money::from_str(" 15 ").unwrap(), Money::new(dec!(15)));

        assert!(Money::from_str("").is_err());
        assert!(Money::from_str("12,5").is_err());
        assert!(Money::from_str("INR").is_err());
    }

    #[test]
    fn to_string() {
        assert_eq!(Money::new(dec!(123.45)).to_string(), "123.45");
        assert_eq!(Money::new(dec!(123.40)).to_string(), "123.4");
        assert_eq!(Money::new(dec!(123.00)).to_string(), "123");
        assert_eq!(Money::new(dec!(2744)).to_string(), "2744");
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(Money::new(dec!(294.0)).round(), Money::new(dec!(294)));
        assert_eq!(Money::new(dec!(264.6)).round(), Money::new(dec!(265)));
        assert_eq!(Money::new(dec!(264.4)).round(), Money::new(dec!(264)));
        assert_eq!(Money::new(dec!(0.5)).round(), Money::new(dec!(1)));
        assert_eq!(Money::new(dec!(-0.5)).round(), Money::new(dec!(-1)));
    }

    #[test]
    fn sums() {
        let amounts = [Money::from(200), Money::new(dec!(50.5)), Money::ZERO];

        assert_eq!(amounts.iter().sum::<Money>(), Money::new(dec!(250.5)));
        assert_eq!(
            Money::from(10) - Money::from(25),
            Money::new(dec!(-15)),
        );
        assert!((Money::from(10) - Money::from(25)).is_negative());
    }

    #[test]
    fn detects_overflow() {
        let max = Money::new(Decimal::MAX);

        assert_eq!(max.checked_add(Money::from(1)), None);
        assert_eq!(max.checked_mul(dec!(15)), None);
        assert_eq!(
            Money::from(2000).checked_add(Money::from(450)),
            Some(Money::from(2450)),
        );
        assert_eq!(
            Money::from(10).checked_mul(dec!(15)),
            Some(Money::from(150)),
        );
    }

    #[test]
    fn serializes_transparently() {
        let money: Money = serde_json::from_str("2000").unwrap();
        assert_eq!(money, Money::from(2000));

        let money: Money = serde_json::from_str("\"12.5\"").unwrap();
        assert_eq!(money, Money::new(dec!(12.5)));
    }
}
