use chrono::{Datelike, NaiveDate, Weekday};
use rand::Rng;
use rand_distr::StandardNormal;
use thiserror::Error;

/// Largest fraction by which a candle's shadow may extend past its body.
pub const MAX_SHADOW_PCT: f64 = 0.02;

#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    #[error("invalid simulation parameter: {0}")]
    InvalidParameter(String),
}

/// A single daily candlestick (OHLC).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candle {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Precomputed geometric Brownian motion price path for one symbol.
///
/// The full series is generated eagerly at construction and never changes
/// afterwards. The day cursor only moves forward and clamps at the last day,
/// so `visible()` always ends at the current day and never leaks future
/// candles.
#[derive(Clone, Debug)]
pub struct PricePath {
    symbol: String,
    drift: f64,
    volatility: f64,
    current_day: usize,
    series: Vec<Candle>,
}

impl PricePath {
    /// Generates the whole path up front.
    ///
    /// Closes follow `close[t] = close[t-1] * exp((mu - sigma^2/2) + sigma*Z)`
    /// with standard normal `Z`; each day opens at the previous close, and the
    /// high/low shadows extend the body by up to `MAX_SHADOW_PCT`.
    pub fn generate<R: Rng>(
        symbol: &str,
        start_date: NaiveDate,
        start_price: f64,
        drift: f64,
        volatility: f64,
        horizon_days: usize,
        rng: &mut R,
    ) -> Result<Self, SimError> {
        if horizon_days < 1 {
            return Err(SimError::InvalidParameter(format!(
                "horizon must be at least 1 day, got {horizon_days}"
            )));
        }
        if !start_price.is_finite() || start_price <= 0.0 {
            return Err(SimError::InvalidParameter(format!(
                "start price must be positive, got {start_price}"
            )));
        }
        if !drift.is_finite() || !volatility.is_finite() || volatility < 0.0 {
            return Err(SimError::InvalidParameter(format!(
                "drift {drift} / volatility {volatility} out of range"
            )));
        }

        let dates = business_days(start_date, horizon_days);

        let mut closes = Vec::with_capacity(horizon_days);
        closes.push(start_price);
        for t in 1..horizon_days {
            let z: f64 = rng.sample(StandardNormal);
            let log_return = (drift - 0.5 * volatility * volatility) + volatility * z;
            closes.push(closes[t - 1] * log_return.exp());
        }

        let mut series = Vec::with_capacity(horizon_days);
        for t in 0..horizon_days {
            let open = if t == 0 { start_price } else { closes[t - 1] };
            let close = closes[t];
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..MAX_SHADOW_PCT));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..MAX_SHADOW_PCT));
            series.push(Candle {
                date: dates[t],
                open,
                high,
                low,
                close,
            });
        }

        Ok(Self {
            symbol: symbol.to_string(),
            drift,
            volatility,
            current_day: 0,
            series,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn drift(&self) -> f64 {
        self.drift
    }

    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    pub fn horizon_days(&self) -> usize {
        self.series.len()
    }

    pub fn current_day(&self) -> usize {
        self.current_day
    }

    /// Moves the cursor one day forward; a no-op once the last day is reached.
    pub fn advance(&mut self) {
        if self.current_day < self.series.len() - 1 {
            self.current_day += 1;
        }
    }

    pub fn current_price(&self) -> f64 {
        self.series[self.current_day].close
    }

    /// The candles revealed so far, oldest first.
    pub fn visible(&self) -> &[Candle] {
        &self.series[..=self.current_day]
    }

    /// The full precomputed series, including days not yet revealed.
    /// Used by the JSON dump mode; interactive surfaces render `visible()`.
    pub fn series(&self) -> &[Candle] {
        &self.series
    }
}

/// Consecutive weekdays starting at `start` (rolled forward if it lands on a
/// weekend).
fn business_days(start: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(count);
    let mut day = start;
    while dates.len() < count {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(day);
        }
        day = day.succ_opt().expect("calendar overflow");
    }
    dates
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn start_date() -> NaiveDate {
        // A Tuesday.
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    }

    fn path_with_seed(horizon_days: usize, seed: u64) -> PricePath {
        let mut rng = StdRng::seed_from_u64(seed);
        PricePath::generate("TEST", start_date(), 100.0, 0.0005, 0.02, horizon_days, &mut rng)
            .unwrap()
    }

    #[test]
    fn candles_respect_high_low_envelope() {
        let path = path_with_seed(120, 7);
        for candle in path.series() {
            let body_top = candle.open.max(candle.close);
            let body_bottom = candle.open.min(candle.close);
            assert!(
                candle.high >= body_top,
                "high {} below body top {} on {}",
                candle.high,
                body_top,
                candle.date
            );
            assert!(
                candle.low <= body_bottom,
                "low {} above body bottom {} on {}",
                candle.low,
                body_bottom,
                candle.date
            );
            assert!(candle.low > 0.0);
        }
    }

    #[test]
    fn each_day_opens_at_previous_close() {
        let path = path_with_seed(60, 11);
        let series = path.series();
        assert_eq!(series[0].open, 100.0);
        assert_eq!(series[0].close, 100.0);
        for t in 1..series.len() {
            assert_eq!(series[t].open, series[t - 1].close);
        }
    }

    #[test]
    fn advance_clamps_at_last_day() {
        let mut path = path_with_seed(5, 3);
        for _ in 0..12 {
            path.advance();
        }
        assert_eq!(path.current_day(), 4);
        let last_close = path.series()[4].close;
        assert_eq!(path.current_price(), last_close);

        // Idempotent at the ceiling.
        path.advance();
        assert_eq!(path.current_day(), 4);
    }

    #[test]
    fn visible_length_tracks_cursor() {
        let mut path = path_with_seed(10, 5);
        assert_eq!(path.visible().len(), 1);
        for expected in 2..=10 {
            path.advance();
            assert_eq!(path.visible().len(), path.current_day() + 1);
            assert_eq!(path.visible().len(), expected.min(10));
        }
    }

    #[test]
    fn same_seed_reproduces_series() {
        let a = path_with_seed(120, 42);
        let b = path_with_seed(120, 42);
        assert_eq!(a.series(), b.series());

        let c = path_with_seed(120, 43);
        assert_ne!(a.series(), c.series());
    }

    #[test]
    fn single_day_path_is_valid() {
        let mut path = path_with_seed(1, 9);
        assert_eq!(path.visible().len(), 1);
        path.advance();
        assert_eq!(path.current_day(), 0);
        assert_eq!(path.current_price(), 100.0);
    }

    #[test]
    fn rejects_zero_horizon() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = PricePath::generate("TEST", start_date(), 100.0, 0.0, 0.02, 0, &mut rng)
            .unwrap_err();
        assert!(matches!(err, SimError::InvalidParameter(_)));
    }

    #[test]
    fn rejects_non_positive_start_price() {
        let mut rng = StdRng::seed_from_u64(1);
        for bad in [0.0, -5.0, f64::NAN] {
            let result =
                PricePath::generate("TEST", start_date(), bad, 0.0, 0.02, 10, &mut rng);
            assert!(matches!(result, Err(SimError::InvalidParameter(_))));
        }
    }

    #[test]
    fn rejects_negative_volatility() {
        let mut rng = StdRng::seed_from_u64(1);
        let result = PricePath::generate("TEST", start_date(), 100.0, 0.0, -0.1, 10, &mut rng);
        assert!(matches!(result, Err(SimError::InvalidParameter(_))));
    }

    #[test]
    fn dates_skip_weekends() {
        let path = path_with_seed(30, 2);
        for candle in path.series() {
            assert!(
                !matches!(candle.date.weekday(), Weekday::Sat | Weekday::Sun),
                "candle dated on a weekend: {}",
                candle.date
            );
        }
        // 2024-01-02 is a Tuesday; the 4th business day lands on Monday the 8th.
        assert_eq!(path.series()[4].date, NaiveDate::from_ymd_opt(2024, 1, 8).unwrap());
    }
}
