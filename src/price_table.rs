use std::collections::{BTreeMap, HashMap};

use crate::error::{PairsError, PairsResult};
use crate::model::series::{PricePoint, TimeSeriesPair};

/// Close prices for every asset of a run, keyed by symbol.
///
/// Built once by the data layer and then shared read-only (behind an `Arc`)
/// by every pair task.
#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    series: HashMap<String, BTreeMap<u64, f64>>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(symbol, timestamp_ms, close)` rows in any order. A later
    /// row for the same symbol and timestamp replaces the earlier one.
    pub fn from_rows<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = (S, u64, f64)>,
        S: AsRef<str>,
    {
        let mut table = Self::new();
        for (symbol, ts, close) in rows {
            table
                .series
                .entry(normalize_symbol(symbol.as_ref()))
                .or_default()
                .insert(ts, close);
        }
        table
    }

    pub fn with_series(mut self, symbol: &str, closes: &[(u64, f64)]) -> Self {
        let entry = self.series.entry(normalize_symbol(symbol)).or_default();
        for &(ts, close) in closes {
            entry.insert(ts, close);
        }
        self
    }

    pub fn symbols(&self) -> Vec<String> {
        let mut out: Vec<String> = self.series.keys().cloned().collect();
        out.sort();
        out
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.series.contains_key(&normalize_symbol(symbol))
    }

    pub fn len_of(&self, symbol: &str) -> Option<usize> {
        self.series.get(&normalize_symbol(symbol)).map(BTreeMap::len)
    }

    fn get(&self, symbol: &str) -> PairsResult<&BTreeMap<u64, f64>> {
        self.series
            .get(&normalize_symbol(symbol))
            .ok_or_else(|| PairsError::UnknownAsset(symbol.to_string()))
    }

    /// Align two assets on the union of their timestamps, forward-filling
    /// each leg, starting from the first timestamp where both have a price.
    pub fn pair(&self, symbol_x: &str, symbol_y: &str) -> PairsResult<TimeSeriesPair> {
        let xs = self.get(symbol_x)?;
        let ys = self.get(symbol_y)?;

        let mut timestamps: Vec<u64> = xs.keys().chain(ys.keys()).copied().collect();
        timestamps.sort_unstable();
        timestamps.dedup();

        let mut points = Vec::with_capacity(timestamps.len());
        let mut last_x: Option<f64> = None;
        let mut last_y: Option<f64> = None;
        for ts in timestamps {
            if let Some(&px) = xs.get(&ts) {
                last_x = Some(px);
            }
            if let Some(&py) = ys.get(&ts) {
                last_y = Some(py);
            }
            if let (Some(price_x), Some(price_y)) = (last_x, last_y) {
                points.push(PricePoint {
                    timestamp_ms: ts,
                    price_x,
                    price_y,
                });
            }
        }

        TimeSeriesPair::new(
            normalize_symbol(symbol_x),
            normalize_symbol(symbol_y),
            points,
        )
    }
}

fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_forward_fills_gaps_on_either_leg() {
        let table = PriceTable::new()
            .with_series("gld", &[(1, 10.0), (2, 11.0), (4, 13.0)])
            .with_series("GDX", &[(1, 20.0), (3, 23.0), (4, 24.0)]);
        let pair = table.pair("GLD", "gdx").unwrap();
        assert_eq!(pair.leg_x(), "GLD");
        assert_eq!(pair.leg_y(), "GDX");
        let ts: Vec<u64> = pair.timestamps_ms().collect();
        assert_eq!(ts, vec![1, 2, 3, 4]);
        let xs: Vec<f64> = pair.prices_x().collect();
        let ys: Vec<f64> = pair.prices_y().collect();
        assert_eq!(xs, vec![10.0, 11.0, 11.0, 13.0]);
        assert_eq!(ys, vec![20.0, 20.0, 23.0, 24.0]);
    }

    #[test]
    fn leading_one_sided_rows_are_dropped() {
        let table = PriceTable::new()
            .with_series("A", &[(1, 1.0), (2, 2.0), (3, 3.0)])
            .with_series("B", &[(2, 5.0), (3, 6.0)]);
        let pair = table.pair("A", "B").unwrap();
        assert_eq!(pair.len(), 2);
        assert_eq!(pair.points()[0].timestamp_ms, 2);
    }

    #[test]
    fn unknown_symbol_is_reported() {
        let table = PriceTable::new().with_series("A", &[(1, 1.0), (2, 2.0)]);
        assert_eq!(
            table.pair("A", "ZZZ").unwrap_err(),
            PairsError::UnknownAsset("ZZZ".to_string())
        );
    }

    #[test]
    fn from_rows_groups_by_symbol() {
        let table = PriceTable::from_rows(vec![
            ("a", 2u64, 2.0),
            ("b", 1u64, 1.0),
            ("a", 1u64, 1.0),
        ]);
        assert_eq!(table.symbols(), vec!["A".to_string(), "B".to_string()]);
        assert_eq!(table.len_of("A"), Some(2));
    }
}
