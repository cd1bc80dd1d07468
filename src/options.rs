//! The crate's entire configuration surface (§6): no file-based config, no
//! env vars — there is nothing to configure besides the knobs the
//! specification's own CLI table names.

/// Knobs for one [`crate::run`] invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalOptions {
    /// Evaluate every random draw at its expected value instead of sampling.
    pub average: bool,
    /// Seeds the default `RandomSource`; `None` seeds from OS entropy.
    pub seed: Option<u64>,
    /// Formatting precision for calculator reports.
    pub digits: u32,
    /// Scales reported probabilities, e.g. to percentages.
    pub multiplier: f64,
}

impl Default for EvalOptions {
    fn default() -> Self {
        EvalOptions {
            average: false,
            seed: None,
            digits: 4,
            multiplier: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_random_mode_four_digits_unit_multiplier() {
        let opts = EvalOptions::default();
        assert!(!opts.average);
        assert_eq!(opts.seed, None);
        assert_eq!(opts.digits, 4);
        assert_eq!(opts.multiplier, 1.0);
    }
}
