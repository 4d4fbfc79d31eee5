use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

/// Fixed-point decimal with 4 decimal places, stored as a scaled integer.
///
/// Arithmetic keeps the full internal precision. Rounding to cents only
/// happens in [`Amount::round_cents`] and in the `Display` impl.
/// Every operation saturates at [`Amount::MIN`] / [`Amount::MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Amount(i64);

impl Amount {
    const SCALE: i64 = 10_000;
    const CENT: i64 = Self::SCALE / 100;

    pub const ZERO: Amount = Amount(0);
    pub const HUNDRED: Amount = Amount(100 * Self::SCALE);
    pub const MAX: Amount = Amount(i64::MAX);
    pub const MIN: Amount = Amount(i64::MIN);

    /// Largest magnitude accepted from input, in whole units.
    pub const INPUT_LIMIT: f64 = 1_000_000_000.0;

    /// Saturating conversion, `NaN` becomes zero.
    pub fn from_float(value: f64) -> Self {
        Amount((value * Self::SCALE as f64).round() as i64)
    }

    /// Convert an input value, rejecting non-finite values and magnitudes
    /// above [`Amount::INPUT_LIMIT`].
    pub fn checked_from_float(value: f64) -> Option<Self> {
        (value.is_finite() && value.abs() <= Self::INPUT_LIMIT).then(|| Self::from_float(value))
    }

    pub fn from_scaled(value: i64) -> Self {
        Amount(value)
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Parse raw user input into an amount.
    ///
    /// Anything that is not a non-negative number within
    /// [`Amount::INPUT_LIMIT`] becomes zero.
    pub fn sanitize(input: &str) -> Self {
        match input.trim().parse::<f64>() {
            Ok(value) if value >= 0.0 => Self::checked_from_float(value).unwrap_or(Self::ZERO),
            _ => Self::ZERO,
        }
    }

    /// `self * rate / 100`, rounded half away from zero at internal precision.
    pub fn percent(self, rate: Amount) -> Self {
        let product = self.0 as i128 * rate.0 as i128;
        Amount::saturate(div_round(product, Self::HUNDRED.0 as i128))
    }

    /// Round to whole cents, half away from zero.
    pub fn round_cents(self) -> Self {
        Amount::saturate(div_round(self.0 as i128, Self::CENT as i128) * Self::CENT as i128)
    }

    fn saturate(value: i128) -> Self {
        Amount(i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX }))
    }
}

fn div_round(value: i128, divisor: i128) -> i128 {
    let half = divisor / 2;
    if value >= 0 {
        (value + half) / divisor
    } else {
        (value - half) / divisor
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cents = self.round_cents().0 / Self::CENT;
        let sign = if cents < 0 { "-" } else { "" };
        let abs = cents.abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sub for Amount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Amount(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_sub(rhs.0);
    }
}

/// Scale by a unit count.
impl Mul<u32> for Amount {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self::Output {
        Amount(self.0.saturating_mul(rhs as i64))
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}
