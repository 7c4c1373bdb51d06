use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::FundamentalsError;
use crate::types::Percent;
use crate::FundamentalsResult;

/// Divide, reporting a zero denominator instead of panicking.
pub fn safe_divide(num: Decimal, den: Decimal, context: &str) -> FundamentalsResult<Decimal> {
    if den.is_zero() {
        return Err(FundamentalsError::DivisionByZero {
            context: context.to_string(),
        });
    }
    num.checked_div(den).ok_or_else(|| overflow(context))
}

fn overflow(context: &str) -> FundamentalsError {
    FundamentalsError::FinancialImpossibility(format!("{context} overflows decimal precision"))
}

/// Multiply, reporting overflow instead of panicking.
pub fn mul(a: Decimal, b: Decimal, context: &str) -> FundamentalsResult<Decimal> {
    a.checked_mul(b).ok_or_else(|| overflow(context))
}

/// Add, reporting overflow instead of panicking.
pub fn add(a: Decimal, b: Decimal, context: &str) -> FundamentalsResult<Decimal> {
    a.checked_add(b).ok_or_else(|| overflow(context))
}

/// Subtract, reporting overflow instead of panicking.
pub fn sub(a: Decimal, b: Decimal, context: &str) -> FundamentalsResult<Decimal> {
    a.checked_sub(b).ok_or_else(|| overflow(context))
}

/// Sum a sequence with overflow checking.
pub fn sum<I: IntoIterator<Item = Decimal>>(values: I, context: &str) -> FundamentalsResult<Decimal> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| add(acc, v, context))
}

/// `part / whole * 100`
pub fn percent_of(part: Decimal, whole: Decimal, context: &str) -> FundamentalsResult<Percent> {
    mul(safe_divide(part, whole, context)?, dec!(100), context)
}

/// `(current - previous) / previous * 100`
pub fn percent_change(
    current: Decimal,
    previous: Decimal,
    context: &str,
) -> FundamentalsResult<Percent> {
    percent_of(sub(current, previous, context)?, previous, context)
}
