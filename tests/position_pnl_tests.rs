use kalman_pairs::backtest::{PnlAccumulator, PositionSimulator};
use kalman_pairs::model::position::LegPosition;
use kalman_pairs::model::series::TimeSeriesPair;
use kalman_pairs::model::signal::Signal;
use proptest::prelude::*;

#[test]
/// Long spread: short `hedge * notional` of X, long `notional` of Y, entered
/// on the step after the signal and sized with that step's hedge.
fn long_spread_sizing_uses_lagged_step_hedge() {
    let sim = PositionSimulator::new(1000.0).unwrap();
    let signals = [
        Signal::NoEvent,
        Signal::EnterLongSpread,
        Signal::NoEvent,
        Signal::NoEvent,
    ];
    let hedges = [1.0, 1.1, 1.2, 1.3];
    let pos = sim.simulate(&signals, &hedges).unwrap();

    assert!(pos[0].is_flat() && pos[1].is_flat());
    assert!((pos[2].pos_x + 1200.0).abs() < 1e-9);
    assert!((pos[2].pos_y - 1000.0).abs() < 1e-9);
    // Held, not re-sized with the newer hedge.
    assert_eq!(pos[3], pos[2]);
}

#[test]
fn flip_resizes_both_legs() {
    let sim = PositionSimulator::default();
    let signals = [
        Signal::EnterShortSpread,
        Signal::NoEvent,
        Signal::EnterLongSpread,
        Signal::NoEvent,
    ];
    let hedges = [2.0, 2.0, 2.5, 3.0];
    let pos = sim.simulate(&signals, &hedges).unwrap();
    assert!(pos[0].is_flat());
    assert_eq!(
        pos[1],
        LegPosition {
            pos_x: 2000.0,
            pos_y: -1000.0
        }
    );
    assert_eq!(pos[2], pos[1]);
    assert_eq!(
        pos[3],
        LegPosition {
            pos_x: -3000.0,
            pos_y: 1000.0
        }
    );
}

#[test]
fn mismatched_inputs_are_rejected() {
    let sim = PositionSimulator::default();
    let err = sim.simulate(&[Signal::NoEvent; 3], &[1.0; 2]).unwrap_err();
    assert!(err.is_malformed_input());
}

#[test]
fn daily_pnl_marks_both_legs() {
    let pair = TimeSeriesPair::from_prices(&[10.0, 11.0, 12.0], &[20.0, 21.0, 25.0]).unwrap();
    let pos = [
        LegPosition::default(),
        LegPosition {
            pos_x: -2000.0,
            pos_y: 1000.0,
        },
        LegPosition {
            pos_x: -2000.0,
            pos_y: 1000.0,
        },
    ];
    let pnl = PnlAccumulator.accumulate(&pair, &pos).unwrap();
    assert_eq!(pnl[0].daily_pnl, None);
    assert_eq!(pnl[0].cumulative_pnl, None);
    // -2000 * 1 + 1000 * 1
    assert!((pnl[1].daily_pnl.unwrap() + 1000.0).abs() < 1e-9);
    // -2000 * 1 + 1000 * 4
    assert!((pnl[2].daily_pnl.unwrap() - 2000.0).abs() < 1e-9);
    assert!((pnl[2].cumulative_pnl.unwrap() - 1000.0).abs() < 1e-9);
}

#[test]
fn held_position_with_flat_prices_earns_nothing() {
    let pair = TimeSeriesPair::from_prices(&[5.0, 5.0, 5.0], &[7.0, 7.0, 7.0]).unwrap();
    let held = LegPosition {
        pos_x: -1500.0,
        pos_y: 1000.0,
    };
    let pnl = PnlAccumulator.accumulate(&pair, &[held; 3]).unwrap();
    assert_eq!(pnl[1].daily_pnl, Some(0.0));
    assert_eq!(pnl[2].daily_pnl, Some(0.0));
    assert_eq!(pnl[2].cumulative_pnl, Some(0.0));
}

proptest! {
    #[test]
    fn cumulative_equals_sum_of_daily(
        legs in prop::collection::vec((1.0f64..500.0, 1.0f64..500.0, -3000.0f64..3000.0, -1000.0f64..1000.0), 2..120),
    ) {
        let xs: Vec<f64> = legs.iter().map(|l| l.0).collect();
        let ys: Vec<f64> = legs.iter().map(|l| l.1).collect();
        let pos: Vec<LegPosition> = legs
            .iter()
            .map(|l| LegPosition { pos_x: l.2, pos_y: l.3 })
            .collect();
        let pair = TimeSeriesPair::from_prices(&xs, &ys).unwrap();
        let pnl = PnlAccumulator.accumulate(&pair, &pos).unwrap();

        let sum: f64 = pnl.iter().filter_map(|r| r.daily_pnl).sum();
        let last = pnl.last().and_then(|r| r.cumulative_pnl).unwrap();
        prop_assert!((sum - last).abs() <= 1e-6 * (1.0 + sum.abs()));
        prop_assert_eq!(pnl.iter().filter(|r| r.daily_pnl.is_none()).count(), 1);
    }
}
