//! Coercion of caller-supplied salary values.
//!
//! Salaries reach the resolver as typed decimals, plain integers, floats, or
//! raw form strings. Anything that is not a finite, non-negative number
//! coerces to `None`, which the resolver reports as "no match".
//!
//! The representable ceiling is [`Decimal::MAX`] (about 7.9e28). Float and
//! string salaries beyond it do not convert and also coerce to `None`, so an
//! open-ended top tier covers every salary up to that ceiling but not past it.

use std::str::FromStr;

use rust_decimal::Decimal;

/// A value that may be read as a non-negative salary.
pub trait SalaryInput {
    /// Returns the salary, or `None` when the value is negative, not numeric,
    /// or absent.
    fn to_salary(&self) -> Option<Decimal>;
}

fn non_negative(value: Decimal) -> Option<Decimal> {
    (value >= Decimal::ZERO).then_some(value)
}

impl SalaryInput for Decimal {
    fn to_salary(&self) -> Option<Decimal> {
        non_negative(*self)
    }
}

macro_rules! impl_salary_input_for_int {
    ($($ty:ty),*) => {
        $(
            impl SalaryInput for $ty {
                fn to_salary(&self) -> Option<Decimal> {
                    non_negative(Decimal::from(*self))
                }
            }
        )*
    };
}

impl_salary_input_for_int!(i32, i64, u32, u64);

impl SalaryInput for f64 {
    fn to_salary(&self) -> Option<Decimal> {
        // NaN and infinities fail the conversion.
        Decimal::try_from(*self).ok().and_then(non_negative)
    }
}

impl SalaryInput for str {
    fn to_salary(&self) -> Option<Decimal> {
        Decimal::from_str(self.trim()).ok().and_then(non_negative)
    }
}

impl SalaryInput for String {
    fn to_salary(&self) -> Option<Decimal> {
        self.as_str().to_salary()
    }
}

impl<T: SalaryInput + ?Sized> SalaryInput for &T {
    fn to_salary(&self) -> Option<Decimal> {
        (**self).to_salary()
    }
}

impl<T: SalaryInput> SalaryInput for Option<T> {
    fn to_salary(&self) -> Option<Decimal> {
        self.as_ref().and_then(SalaryInput::to_salary)
    }
}
