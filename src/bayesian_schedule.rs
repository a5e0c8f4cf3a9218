/// Sampler settings declared by the source type.
/// They are not used by the forward model itself, only passed on to the inversion driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BayesianSchedule {
    pub steps: usize,
    pub burnin: usize,
    pub thin: usize,
}

impl BayesianSchedule {
    pub fn new(steps: Option<usize>, burnin: Option<usize>, thin: Option<usize>) -> Self {
        let default: BayesianSchedule = BayesianSchedule::default();
        return BayesianSchedule {
            steps: steps.unwrap_or(default.steps),
            burnin: burnin.unwrap_or(default.burnin),
            thin: thin.unwrap_or(default.thin),
        };
    }
}

impl Default for BayesianSchedule {
    fn default() -> Self {
        return BayesianSchedule {
            steps: 1_010_000,
            burnin: 10_000,
            thin: 1_000,
        };
    }
}

#[test]
fn test_bayesian_schedule_defaults_and_overrides() {
    let default: BayesianSchedule = BayesianSchedule::new(None, None, None);
    assert_eq!(default, BayesianSchedule { steps: 1_010_000, burnin: 10_000, thin: 1_000 });

    let short: BayesianSchedule = BayesianSchedule::new(Some(5_000), None, Some(10));
    assert_eq!(short, BayesianSchedule { steps: 5_000, burnin: 10_000, thin: 10 });
}
