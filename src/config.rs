use anyhow::{Result, anyhow};

pub const DEFAULT_STARTING_CASH: f64 = 10_000.0;
pub const DEFAULT_HORIZON_DAYS: usize = 120;
/// Per-day drift of the GBM close-price recurrence.
pub const DEFAULT_DRIFT: f64 = 0.0005;
/// Per-day volatility of the GBM close-price recurrence.
pub const DEFAULT_VOLATILITY: f64 = 0.02;
/// Each symbol starts at a price drawn uniformly from this range.
pub const START_PRICE_MIN: f64 = 50.0;
pub const START_PRICE_MAX: f64 = 150.0;

pub const DEFAULT_SYMBOLS: &[&str] = &[
    "AAPL", "MSFT", "GOOG", "AMZN", "TSLA", "NFLX", "META", "NVDA", "BABA", "JPM",
];

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub symbols: Vec<String>,
    pub starting_cash: f64,
    pub horizon_days: usize,
    pub drift: f64,
    pub volatility: f64,
    pub seed: Option<u64>,
}

impl SessionConfig {
    pub fn with_defaults() -> Self {
        Self {
            symbols: DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            starting_cash: DEFAULT_STARTING_CASH,
            horizon_days: DEFAULT_HORIZON_DAYS,
            drift: DEFAULT_DRIFT,
            volatility: DEFAULT_VOLATILITY,
            seed: None,
        }
    }
}

/// Validates the CLI inputs into a `SessionConfig`. The symbol list is
/// comma-separated, case-insensitive, and deduplicated in first-seen order.
pub fn build_config(
    symbols_input: Option<&str>,
    starting_cash: f64,
    horizon_days: usize,
    drift: f64,
    volatility: f64,
    seed: Option<u64>,
) -> Result<SessionConfig> {
    let mut cfg = SessionConfig::with_defaults();

    if let Some(raw) = symbols_input {
        let symbols = parse_symbol_list(raw);
        if symbols.is_empty() {
            return Err(anyhow!("No symbols in '{}'; expected e.g. AAPL,MSFT,NVDA", raw));
        }
        cfg.symbols = symbols;
    }

    if !starting_cash.is_finite() || starting_cash <= 0.0 {
        return Err(anyhow!("Starting cash must be > 0, got {}", starting_cash));
    }
    if horizon_days < 1 {
        return Err(anyhow!("Horizon must be at least 1 day"));
    }
    if !drift.is_finite() {
        return Err(anyhow!("Drift must be finite, got {}", drift));
    }
    if !volatility.is_finite() || volatility < 0.0 {
        return Err(anyhow!("Volatility must be >= 0, got {}", volatility));
    }

    cfg.starting_cash = starting_cash;
    cfg.horizon_days = horizon_days;
    cfg.drift = drift;
    cfg.volatility = volatility;
    cfg.seed = seed;
    Ok(cfg)
}

fn parse_symbol_list(raw: &str) -> Vec<String> {
    let mut symbols: Vec<String> = Vec::new();
    for symbol in raw.split(',').map(|s| s.trim().to_uppercase()) {
        if !symbol.is_empty() && !symbols.contains(&symbol) {
            symbols.push(symbol);
        }
    }
    symbols
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        let cfg = build_config(
            None,
            DEFAULT_STARTING_CASH,
            DEFAULT_HORIZON_DAYS,
            DEFAULT_DRIFT,
            DEFAULT_VOLATILITY,
            None,
        )
        .unwrap();
        assert_eq!(cfg.symbols.len(), DEFAULT_SYMBOLS.len());
        assert_eq!(cfg.starting_cash, 10_000.0);
        assert_eq!(cfg.horizon_days, 120);
    }

    #[test]
    fn symbol_list_is_uppercased_and_deduplicated() {
        let cfg = build_config(Some("aapl, msft,AAPL ,nvda,"), 1_000.0, 10, 0.0, 0.02, None)
            .unwrap();
        assert_eq!(cfg.symbols, vec!["AAPL", "MSFT", "NVDA"]);
    }

    #[test]
    fn empty_symbol_list_is_rejected() {
        assert!(build_config(Some(" , ,"), 1_000.0, 10, 0.0, 0.02, None).is_err());
    }

    #[test]
    fn bad_session_parameters_are_rejected() {
        assert!(build_config(None, 0.0, 10, 0.0, 0.02, None).is_err());
        assert!(build_config(None, -50.0, 10, 0.0, 0.02, None).is_err());
        assert!(build_config(None, 1_000.0, 0, 0.0, 0.02, None).is_err());
        assert!(build_config(None, 1_000.0, 10, f64::NAN, 0.02, None).is_err());
        assert!(build_config(None, 1_000.0, 10, 0.0, -0.02, None).is_err());
    }
}
