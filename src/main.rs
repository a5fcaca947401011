mod app;
mod config;
mod gui;
mod ledger;
mod market;
mod session;
mod tui;
mod ui;

use anyhow::{Result, anyhow};
use app::App;
use clap::Parser;
use serde::Serialize;
use session::Session;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "StockSim-TUI: Paper-trade synthetic GBM price paths from the terminal",
    after_help = "EXAMPLES:
    # Default terminal session with ten symbols
    cargo run --release

    # Reproducible two-symbol session with more cash
    cargo run --release -- --symbols AAPL,NVDA --cash 25000 --seed 42

    # Launch the desktop GUI
    cargo run --release -- --gui

    # Inspect the generated price paths without trading
    cargo run --release -- --seed 42 --dump-paths"
)]
struct Args {
    /// Comma-separated symbols to simulate (e.g. AAPL,MSFT,NVDA)
    #[arg(long)]
    symbols: Option<String>,

    /// Starting cash balance
    #[arg(long, default_value_t = config::DEFAULT_STARTING_CASH)]
    cash: f64,

    /// Simulated trading days per symbol
    #[arg(long, default_value_t = config::DEFAULT_HORIZON_DAYS)]
    days: usize,

    /// Per-day drift (mu) of the price process
    #[arg(long, default_value_t = config::DEFAULT_DRIFT)]
    drift: f64,

    /// Per-day volatility (sigma) of the price process
    #[arg(long, default_value_t = config::DEFAULT_VOLATILITY)]
    volatility: f64,

    /// RNG seed for reproducible price paths
    #[arg(long)]
    seed: Option<u64>,

    /// Launch the desktop GUI instead of the terminal UI
    #[arg(long)]
    gui: bool,

    /// Print the generated OHLC series as JSON to stdout and exit
    #[arg(long)]
    dump_paths: bool,
}

fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("stocksim_tui=info,wgpu_core=error,wgpu_hal=error"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args = Args::parse();

    let cfg = config::build_config(
        args.symbols.as_deref(),
        args.cash,
        args.days,
        args.drift,
        args.volatility,
        args.seed,
    )?;
    let session = Session::new(&cfg)?;

    if args.dump_paths {
        println!("{}", dump_paths_json(&session)?);
        return Ok(());
    }

    if args.gui {
        info!("Launching GUI");
        let options = eframe::NativeOptions::default();
        eframe::run_native(
            "StockSim",
            options,
            Box::new(|_cc| Ok(Box::new(gui::GuiApp::new(session)))),
        )
        .map_err(|e| anyhow!("GUI failed: {e}"))?;
        return Ok(());
    }

    let mut terminal = tui::init()?;
    let mut app = App::new(session);
    let res = app.run(&mut terminal);

    tui::restore()?;

    if let Err(e) = res {
        error!("Error: {:?}", e);
    }

    Ok(())
}

#[derive(Serialize)]
struct CandleDump {
    date: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
}

#[derive(Serialize)]
struct PathDump {
    symbol: String,
    days: Vec<CandleDump>,
}

fn dump_paths_json(session: &Session) -> Result<String> {
    let mut dumps = Vec::new();
    for symbol in session.symbols() {
        let path = session
            .path(symbol)
            .map_err(|e| anyhow!("missing path for {symbol}: {e}"))?;
        dumps.push(PathDump {
            symbol: symbol.clone(),
            days: path
                .series()
                .iter()
                .map(|candle| CandleDump {
                    date: candle.date.format("%Y-%m-%d").to_string(),
                    open: candle.open,
                    high: candle.high,
                    low: candle.low,
                    close: candle.close,
                })
                .collect(),
        });
    }
    Ok(serde_json::to_string_pretty(&dumps)?)
}
