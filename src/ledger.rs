use std::collections::HashMap;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, PartialEq)]
pub enum TradeError {
    #[error("trade quantity must be positive, got {0}")]
    InvalidQuantity(i64),
    #[error("order costs {cost:.2} but only {cash:.2} cash is available")]
    InsufficientFunds { cost: f64, cash: f64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

/// One position closed by `liquidate_all`.
#[derive(Clone, Debug, PartialEq)]
pub struct Settlement {
    pub symbol: String,
    pub side: Side,
    /// Shares closed, always positive; `side` says which way the close went.
    pub quantity: i64,
    pub price: f64,
}

/// Cash balance plus signed share counts over the session's symbol set.
///
/// Negative counts are short positions. Prices are always supplied by the
/// caller; the ledger knows nothing about where they come from. Every
/// operation either applies both the cash and position updates or leaves the
/// ledger untouched.
#[derive(Clone, Debug)]
pub struct Ledger {
    cash: f64,
    positions: HashMap<String, i64>,
}

impl Ledger {
    pub fn new(starting_cash: f64, symbols: &[String]) -> Self {
        let positions = symbols.iter().map(|s| (s.clone(), 0)).collect();
        Self {
            cash: starting_cash,
            positions,
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn position(&self, symbol: &str) -> i64 {
        self.positions.get(symbol).copied().unwrap_or(0)
    }

    /// Buys `quantity` shares at `price`, spending cash.
    pub fn buy(&mut self, symbol: &str, quantity: i64, price: f64) -> Result<(), TradeError> {
        if quantity <= 0 {
            return Err(TradeError::InvalidQuantity(quantity));
        }
        let cost = quantity as f64 * price;
        if cost > self.cash {
            return Err(TradeError::InsufficientFunds {
                cost,
                cash: self.cash,
            });
        }
        self.cash -= cost;
        *self.positions.entry(symbol.to_string()).or_insert(0) += quantity;
        Ok(())
    }

    /// Sells `quantity` shares at `price`, collecting cash. There is no upper
    /// bound on quantity: selling past zero holdings opens or extends a short
    /// position.
    pub fn sell(&mut self, symbol: &str, quantity: i64, price: f64) -> Result<(), TradeError> {
        if quantity <= 0 {
            return Err(TradeError::InvalidQuantity(quantity));
        }
        self.cash += quantity as f64 * price;
        *self.positions.entry(symbol.to_string()).or_insert(0) -= quantity;
        Ok(())
    }

    /// Closes every nonzero position at the supplied price: longs are sold,
    /// shorts are covered. Returns the settlements applied, in symbol order.
    /// Never fails; zero positions are skipped.
    pub fn liquidate_all(&mut self, prices: &HashMap<String, f64>) -> Vec<Settlement> {
        let mut open: Vec<String> = self
            .positions
            .iter()
            .filter(|&(_, &quantity)| quantity != 0)
            .map(|(symbol, _)| symbol.clone())
            .collect();
        open.sort();

        let mut settlements = Vec::with_capacity(open.len());
        for symbol in open {
            let quantity = self.position(&symbol);
            let Some(&price) = prices.get(&symbol) else {
                warn!("no price supplied for {}; position left open", symbol);
                continue;
            };
            // Signed quantity settles both directions: covering a short
            // subtracts cash.
            self.cash += quantity as f64 * price;
            self.positions.insert(symbol.clone(), 0);
            settlements.push(Settlement {
                symbol,
                side: if quantity > 0 { Side::Sell } else { Side::Buy },
                quantity: quantity.abs(),
                price,
            });
        }
        settlements
    }

    /// Cash plus the market value of every position at the supplied prices.
    pub fn net_worth(&self, prices: &HashMap<String, f64>) -> f64 {
        let mut total = self.cash;
        for (symbol, &quantity) in &self.positions {
            if quantity == 0 {
                continue;
            }
            if let Some(&price) = prices.get(symbol) {
                total += quantity as f64 * price;
            }
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols() -> Vec<String> {
        vec!["AAPL".to_string(), "MSFT".to_string()]
    }

    fn prices(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs
            .iter()
            .map(|(symbol, price)| (symbol.to_string(), *price))
            .collect()
    }

    #[test]
    fn buy_moves_cash_and_position_together() {
        let mut ledger = Ledger::new(10_000.0, &symbols());
        ledger.buy("AAPL", 10, 50.0).unwrap();
        assert_eq!(ledger.cash(), 9_500.0);
        assert_eq!(ledger.position("AAPL"), 10);
        assert_eq!(ledger.position("MSFT"), 0);
    }

    #[test]
    fn buy_fails_on_insufficient_funds_without_side_effects() {
        let mut ledger = Ledger::new(10_000.0, &symbols());
        let err = ledger.buy("AAPL", 10, 2_000.0).unwrap_err();
        assert_eq!(
            err,
            TradeError::InsufficientFunds {
                cost: 20_000.0,
                cash: 10_000.0
            }
        );
        assert_eq!(ledger.cash(), 10_000.0);
        assert_eq!(ledger.position("AAPL"), 0);
    }

    #[test]
    fn non_positive_quantities_are_rejected() {
        let mut ledger = Ledger::new(10_000.0, &symbols());
        assert_eq!(ledger.buy("AAPL", 0, 50.0), Err(TradeError::InvalidQuantity(0)));
        assert_eq!(ledger.buy("AAPL", -3, 50.0), Err(TradeError::InvalidQuantity(-3)));
        assert_eq!(ledger.sell("AAPL", 0, 50.0), Err(TradeError::InvalidQuantity(0)));
        assert_eq!(ledger.sell("AAPL", -3, 50.0), Err(TradeError::InvalidQuantity(-3)));
        assert_eq!(ledger.cash(), 10_000.0);
    }

    #[test]
    fn buy_then_sell_at_same_price_round_trips() {
        let mut ledger = Ledger::new(10_000.0, &symbols());
        ledger.buy("AAPL", 7, 83.25).unwrap();
        ledger.sell("AAPL", 7, 83.25).unwrap();
        assert_eq!(ledger.cash(), 10_000.0);
        assert_eq!(ledger.position("AAPL"), 0);
    }

    #[test]
    fn selling_from_flat_opens_a_short() {
        let mut ledger = Ledger::new(10_000.0, &symbols());
        ledger.sell("AAPL", 5, 60.0).unwrap();
        assert_eq!(ledger.position("AAPL"), -5);
        assert_eq!(ledger.cash(), 10_300.0);
    }

    #[test]
    fn liquidate_covers_shorts_and_sells_longs() {
        let mut ledger = Ledger::new(10_000.0, &symbols());
        ledger.sell("AAPL", 5, 60.0).unwrap();
        ledger.buy("MSFT", 4, 100.0).unwrap();
        let cash_before = ledger.cash();

        let settlements = ledger.liquidate_all(&prices(&[("AAPL", 55.0), ("MSFT", 110.0)]));

        assert_eq!(settlements.len(), 2);
        assert_eq!(
            settlements[0],
            Settlement {
                symbol: "AAPL".to_string(),
                side: Side::Buy,
                quantity: 5,
                price: 55.0
            }
        );
        assert_eq!(
            settlements[1],
            Settlement {
                symbol: "MSFT".to_string(),
                side: Side::Sell,
                quantity: 4,
                price: 110.0
            }
        );
        assert_eq!(ledger.position("AAPL"), 0);
        assert_eq!(ledger.position("MSFT"), 0);
        assert_eq!(ledger.cash(), cash_before - 275.0 + 440.0);
    }

    #[test]
    fn liquidate_skips_flat_books() {
        let mut ledger = Ledger::new(10_000.0, &symbols());
        let settlements = ledger.liquidate_all(&prices(&[("AAPL", 55.0), ("MSFT", 110.0)]));
        assert!(settlements.is_empty());
        assert_eq!(ledger.cash(), 10_000.0);
    }

    #[test]
    fn net_worth_is_invariant_under_trades_at_fixed_prices() {
        let mut ledger = Ledger::new(10_000.0, &symbols());
        let quotes = prices(&[("AAPL", 50.0), ("MSFT", 120.0)]);
        let before = ledger.net_worth(&quotes);

        ledger.buy("AAPL", 10, 50.0).unwrap();
        ledger.sell("MSFT", 3, 120.0).unwrap();
        ledger.sell("AAPL", 2, 50.0).unwrap();
        ledger.buy("MSFT", 1, 120.0).unwrap();

        let after = ledger.net_worth(&quotes);
        assert!(
            (before - after).abs() < 1e-9,
            "net worth moved from {before} to {after} with prices fixed"
        );
    }

    #[test]
    fn net_worth_marks_positions_to_market() {
        let mut ledger = Ledger::new(10_000.0, &symbols());
        ledger.buy("AAPL", 10, 50.0).unwrap();
        // Price doubles: worth = 9500 cash + 10 * 100.
        assert_eq!(ledger.net_worth(&prices(&[("AAPL", 100.0)])), 10_500.0);
        // Short positions subtract.
        ledger.sell("MSFT", 5, 100.0).unwrap();
        let worth = ledger.net_worth(&prices(&[("AAPL", 100.0), ("MSFT", 120.0)]));
        assert_eq!(worth, 10_500.0 + 500.0 - 600.0);
    }
}
