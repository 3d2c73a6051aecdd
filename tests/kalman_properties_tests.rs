use kalman_pairs::estimator::{KalmanConfig, KalmanHedgeEstimator};
use kalman_pairs::model::series::TimeSeriesPair;
use proptest::prelude::*;

fn price_series() -> impl Strategy<Value = Vec<(f64, f64)>> {
    prop::collection::vec((1.0f64..1000.0, 1.0f64..1000.0), 2..150)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn covariance_stays_positive_semidefinite(
        prices in price_series(),
        delta in 1e-6f64..0.5,
        observation_var in 1e-6f64..10.0,
    ) {
        let xs: Vec<f64> = prices.iter().map(|p| p.0).collect();
        let ys: Vec<f64> = prices.iter().map(|p| p.1).collect();
        let pair = TimeSeriesPair::from_prices(&xs, &ys).unwrap();
        let est = KalmanHedgeEstimator::new(KalmanConfig { delta, observation_var }).unwrap();
        let run = est.run(&pair).unwrap();

        for state in run.states() {
            let scale = state.p.iter().flatten().fold(1.0f64, |m, v| m.max(v.abs()));
            prop_assert!(
                state.min_eigenvalue() >= -1e-9 * scale,
                "min eigenvalue {} for P={:?}", state.min_eigenvalue(), state.p
            );
        }
        for out in run.outputs() {
            prop_assert!(out.forecast_var.is_finite());
            prop_assert!(out.forecast_var >= observation_var * (1.0 - 1e-9));
            prop_assert!(out.hedge.is_finite() && out.intercept.is_finite());
        }
    }

    #[test]
    fn identical_inputs_give_identical_runs(prices in price_series()) {
        let xs: Vec<f64> = prices.iter().map(|p| p.0).collect();
        let ys: Vec<f64> = prices.iter().map(|p| p.1).collect();
        let pair = TimeSeriesPair::from_prices(&xs, &ys).unwrap();
        let est = KalmanHedgeEstimator::new(KalmanConfig::default()).unwrap();
        prop_assert_eq!(est.run(&pair).unwrap(), est.run(&pair).unwrap());
    }
}
