use crate::config::{self, SessionConfig};
use crate::ledger::{Ledger, Side, TradeError};
use crate::market::{PricePath, SimError};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("unknown symbol {0}")]
    UnknownSymbol(String),
    #[error(transparent)]
    Trade(#[from] TradeError),
}

/// One executed trade or liquidation settlement, as shown in the log panels.
#[derive(Clone, Debug)]
pub struct TradeRecord {
    /// Day index of the traded symbol's path when the trade executed.
    pub day: usize,
    pub symbol: String,
    pub side: Side,
    pub quantity: i64,
    pub price: f64,
    pub notional: f64,
}

/// The whole interactive session: one precomputed price path per symbol, the
/// cash/position ledger, the currently selected symbol, and the log of every
/// executed trade.
///
/// All mutation goes through the command methods below; the driving surfaces
/// (TUI and GUI) hold no business state of their own.
pub struct Session {
    symbols: Vec<String>,
    paths: HashMap<String, PricePath>,
    ledger: Ledger,
    selected: String,
    trades: Vec<TradeRecord>,
}

impl Session {
    pub fn new(cfg: &SessionConfig) -> Result<Self, SimError> {
        let mut rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let start_date = chrono::Local::now().date_naive();
        Self::with_rng(cfg, start_date, &mut rng)
    }

    /// Construction seam with a caller-owned RNG and start date, so tests can
    /// pin both.
    pub fn with_rng<R: Rng>(
        cfg: &SessionConfig,
        start_date: NaiveDate,
        rng: &mut R,
    ) -> Result<Self, SimError> {
        let mut paths = HashMap::new();
        for symbol in &cfg.symbols {
            let start_price = rng.gen_range(config::START_PRICE_MIN..config::START_PRICE_MAX);
            let path = PricePath::generate(
                symbol,
                start_date,
                start_price,
                cfg.drift,
                cfg.volatility,
                cfg.horizon_days,
                rng,
            )?;
            paths.insert(symbol.clone(), path);
        }

        let selected = cfg.symbols[0].clone();
        info!(
            "Session ready: {} symbols, {} days each, {:.2} starting cash",
            cfg.symbols.len(),
            cfg.horizon_days,
            cfg.starting_cash
        );

        Ok(Self {
            symbols: cfg.symbols.clone(),
            paths,
            ledger: Ledger::new(cfg.starting_cash, &cfg.symbols),
            selected,
            trades: Vec::new(),
        })
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn selected(&self) -> &str {
        &self.selected
    }

    pub fn selected_path(&self) -> &PricePath {
        &self.paths[&self.selected]
    }

    pub fn path(&self, symbol: &str) -> Result<&PricePath, SessionError> {
        self.paths
            .get(symbol)
            .ok_or_else(|| SessionError::UnknownSymbol(symbol.to_string()))
    }

    pub fn current_price(&self, symbol: &str) -> Result<f64, SessionError> {
        self.path(symbol).map(|path| path.current_price())
    }

    pub fn select(&mut self, symbol: &str) -> Result<(), SessionError> {
        if !self.paths.contains_key(symbol) {
            return Err(SessionError::UnknownSymbol(symbol.to_string()));
        }
        self.selected = symbol.to_string();
        Ok(())
    }

    /// Cycles the selection forward or backward through the symbol list.
    pub fn select_offset(&mut self, offset: isize) {
        let len = self.symbols.len() as isize;
        let index = self
            .symbols
            .iter()
            .position(|symbol| *symbol == self.selected)
            .unwrap_or(0) as isize;
        let next = (index + offset).rem_euclid(len) as usize;
        self.selected = self.symbols[next].clone();
    }

    /// Advances the selected symbol's path by one day.
    pub fn advance_selected(&mut self) {
        if let Some(path) = self.paths.get_mut(&self.selected) {
            path.advance();
        }
    }

    /// Advances every symbol's path by one day.
    pub fn advance_all(&mut self) {
        for path in self.paths.values_mut() {
            path.advance();
        }
    }

    /// Buys at the symbol's current price.
    pub fn buy(&mut self, symbol: &str, quantity: i64) -> Result<TradeRecord, SessionError> {
        let price = self.current_price(symbol)?;
        self.ledger.buy(symbol, quantity, price)?;
        Ok(self.record_trade(symbol, Side::Buy, quantity, price))
    }

    /// Sells at the symbol's current price; selling past zero holdings opens
    /// a short position.
    pub fn sell(&mut self, symbol: &str, quantity: i64) -> Result<TradeRecord, SessionError> {
        let price = self.current_price(symbol)?;
        self.ledger.sell(symbol, quantity, price)?;
        Ok(self.record_trade(symbol, Side::Sell, quantity, price))
    }

    /// Closes every open position at current prices and logs the settlements.
    pub fn liquidate_all(&mut self) -> Vec<TradeRecord> {
        let prices = self.current_prices();
        let settlements = self.ledger.liquidate_all(&prices);
        let mut records = Vec::with_capacity(settlements.len());
        for settlement in settlements {
            let day = self.paths[&settlement.symbol].current_day();
            let record = TradeRecord {
                day,
                symbol: settlement.symbol,
                side: settlement.side,
                quantity: settlement.quantity,
                price: settlement.price,
                notional: settlement.quantity as f64 * settlement.price,
            };
            self.trades.push(record.clone());
            records.push(record);
        }
        records
    }

    pub fn cash(&self) -> f64 {
        self.ledger.cash()
    }

    pub fn position(&self, symbol: &str) -> i64 {
        self.ledger.position(symbol)
    }

    /// Symbols with a nonzero position, in symbol list order.
    pub fn open_positions(&self) -> Vec<(String, i64)> {
        self.symbols
            .iter()
            .filter_map(|symbol| {
                let quantity = self.ledger.position(symbol);
                (quantity != 0).then(|| (symbol.clone(), quantity))
            })
            .collect()
    }

    pub fn net_worth(&self) -> f64 {
        self.ledger.net_worth(&self.current_prices())
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    fn current_prices(&self) -> HashMap<String, f64> {
        self.paths
            .iter()
            .map(|(symbol, path)| (symbol.clone(), path.current_price()))
            .collect()
    }

    fn record_trade(&mut self, symbol: &str, side: Side, quantity: i64, price: f64) -> TradeRecord {
        let record = TradeRecord {
            day: self.paths[symbol].current_day(),
            symbol: symbol.to_string(),
            side,
            quantity,
            price,
            notional: quantity as f64 * price,
        };
        debug!(
            "{} {} {} @ {:.2}",
            record.side.as_str(),
            record.quantity,
            record.symbol,
            record.price
        );
        self.trades.push(record.clone());
        record
    }
}
