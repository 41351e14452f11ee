//! Central moments about a supplied mean, and the shape statistics built on them

use super::{
    checked, finite, round_half_up, to_decimal, to_f64, ValueFrequencyTable, DECIMAL_PLACES,
};
use crate::errors::{FgError, Result};
use rust_decimal::{Decimal, MathematicalOps};

/// `moment_k = Σ count(v) * (v - mean)^k / n` for k = 1..=4, plus the number of
/// distinct values strictly below and strictly above the mean
#[derive(Debug, Clone, PartialEq)]
pub struct Moments {
    pub n: u64,
    pub moment1: Decimal,
    pub moment2: Decimal,
    pub moment3: Decimal,
    pub moment4: Decimal,
    pub below_mean: u64,
    pub above_mean: u64,
}

pub struct MomentCalculator;

impl MomentCalculator {
    /// Accumulate the four moments over `table` about `mean`.
    ///
    /// `mean` is normally `table.mean()`; passing it in keeps the moments tied
    /// to exactly the rounded mean that is reported.
    pub fn compute(table: &ValueFrequencyTable, mean: Decimal) -> Result<Moments> {
        let n = table.n();
        if n == 0 {
            return Err(FgError::undefined("moments", "no values"));
        }

        let mut sums = [Decimal::ZERO; 4];
        let mut below_mean = 0u64;
        let mut above_mean = 0u64;
        for (value, count) in table.iter() {
            let value = to_decimal(value, "moments")?;
            match value.cmp(&mean) {
                std::cmp::Ordering::Less => below_mean += 1,
                std::cmp::Ordering::Greater => above_mean += 1,
                std::cmp::Ordering::Equal => {}
            }
            let difference = checked(value.checked_sub(mean), "moments")?;
            let count = Decimal::from(count);
            let mut power = Decimal::ONE;
            for sum in sums.iter_mut() {
                power = checked(power.checked_mul(difference), "moments")?;
                let weighted = checked(power.checked_mul(count), "moments")?;
                *sum = checked(sum.checked_add(weighted), "moments")?;
            }
        }

        let n_decimal = Decimal::from(n);
        let mut moments = [Decimal::ZERO; 4];
        for (moment_slot, sum) in moments.iter_mut().zip(sums) {
            let moment = checked(sum.checked_div(n_decimal), "moments")?;
            *moment_slot = round_half_up(moment, DECIMAL_PLACES);
        }
        let [moment1, moment2, moment3, moment4] = moments;

        Ok(Moments {
            n,
            moment1,
            moment2,
            moment3,
            moment4,
            below_mean,
            above_mean,
        })
    }
}

impl Moments {
    /// Cyhelsky's skewness coefficient: `(below - above) / n`, where `below`
    /// and `above` count distinct values and `n` counts observations.
    pub fn skewness_cyhelsky(&self) -> Result<f64> {
        if self.n == 0 {
            return Err(FgError::undefined("skewnessCyhelsky", "no values"));
        }
        Ok((self.below_mean as f64 - self.above_mean as f64) / self.n as f64)
    }

    /// `moment3 / moment2^1.5`
    pub fn skewness(&self) -> Result<f64> {
        self.require_spread("skewness")?;
        let root = self
            .moment2
            .sqrt()
            .ok_or_else(|| FgError::undefined("skewness", "square root of moment2 failed"))?;
        let denominator = checked(root.checked_mul(self.moment2), "skewness")?;
        if denominator.is_zero() {
            return Err(FgError::undefined("skewness", "moment2^1.5 rounds to zero"));
        }
        let skewness = checked(self.moment3.checked_div(denominator), "skewness")?;
        finite(to_f64(skewness, "skewness")?, "skewness")
    }

    /// Excess kurtosis: `moment4 / moment2^2 - 3`
    pub fn kurtosis(&self) -> Result<f64> {
        self.require_spread("kurtosis")?;
        let denominator = checked(self.moment2.checked_mul(self.moment2), "kurtosis")?;
        if denominator.is_zero() {
            return Err(FgError::undefined("kurtosis", "moment2^2 rounds to zero"));
        }
        let ratio = checked(self.moment4.checked_div(denominator), "kurtosis")?;
        let kurtosis = checked(ratio.checked_sub(Decimal::from(3)), "kurtosis")?;
        finite(to_f64(kurtosis, "kurtosis")?, "kurtosis")
    }

    fn require_spread(&self, statistic: &'static str) -> Result<()> {
        if self.moment2.is_zero() {
            return Err(FgError::undefined(statistic, "moment2 is zero (constant data)"));
        }
        Ok(())
    }
}
