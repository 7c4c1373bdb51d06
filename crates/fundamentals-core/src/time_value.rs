use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::FundamentalsError;
use crate::math::{add, safe_divide};
use crate::types::{Money, Rate};
use crate::FundamentalsResult;

/// Compounding factor (1 + rate)^periods
pub fn growth_factor(rate: Rate, periods: u32) -> FundamentalsResult<Decimal> {
    add(Decimal::ONE, rate, "1 + rate")?
        .checked_powu(u64::from(periods))
        .ok_or_else(|| {
            FundamentalsError::FinancialImpossibility(format!(
                "(1 + {rate})^{periods} overflows decimal precision"
            ))
        })
}

/// Discount factor 1 / (1 + rate)^period
pub fn discount_factor(rate: Rate, period: u32) -> FundamentalsResult<Decimal> {
    if rate <= dec!(-1) {
        return Err(FundamentalsError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let compounded = growth_factor(rate, period)?;
    safe_divide(
        Decimal::ONE,
        compounded,
        &format!("discount factor at period {period}"),
    )
}

/// Value of `amount` grown at `rate` for `periods` years
pub fn future_value(amount: Money, rate: Rate, periods: u32) -> FundamentalsResult<Money> {
    let factor = growth_factor(rate, periods)?;
    amount.checked_mul(factor).ok_or_else(|| {
        FundamentalsError::FinancialImpossibility(format!(
            "{amount} grown at {rate} for {periods} periods overflows"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_growth_factor_exact() {
        assert_eq!(growth_factor(dec!(0.05), 2).unwrap(), dec!(1.1025));
        assert_eq!(growth_factor(dec!(0.10), 0).unwrap(), Decimal::ONE);
    }

    #[test]
    fn test_discount_factor_basic() {
        // 121 in two years at 10% is worth 100 today
        let df = discount_factor(dec!(0.10), 2).unwrap();
        assert!((df * dec!(121) - dec!(100)).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_rate_at_minus_one_rejected() {
        assert!(discount_factor(dec!(-1), 1).is_err());
        assert!(discount_factor(dec!(-1.5), 1).is_err());
    }

    #[test]
    fn test_future_value_basic() {
        assert_eq!(future_value(dec!(120), dec!(0.05), 1).unwrap(), dec!(126));
    }

    #[test]
    fn test_rate_overflow_is_an_error() {
        let err = growth_factor(Decimal::MAX, 1).unwrap_err();
        assert!(matches!(err, FundamentalsError::FinancialImpossibility(_)));
    }
}
