use crate::app::{App, Status};
use crate::market::Candle;
use ratatui::{
    Frame,
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

pub fn render(f: &mut Frame, app: &App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, app, layout[0]);
    render_main(f, app, layout[1]);
    render_footer(f, app, layout[2]);
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let path = app.session.selected_path();
    let price = path.current_price();

    let mut spans = vec![
        Span::styled(
            " Trading Simulator ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | "),
        Span::styled(
            format!("{} ${:.2}", app.session.selected(), price),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
    ];

    let visible = path.visible();
    if visible.len() >= 2 {
        let prev = visible[visible.len() - 2].close;
        let delta = price - prev;
        let pct = delta / prev * 100.0;
        let color = if delta >= 0.0 { Color::Green } else { Color::Red };
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            format!("({:+.2}, {:+.2}%)", delta, pct),
            Style::default().fg(color),
        ));
    }

    spans.push(Span::raw(" | "));
    spans.push(Span::styled(
        format!("Day {}/{}", path.current_day() + 1, path.horizon_days()),
        Style::default().fg(Color::Yellow),
    ));

    let header = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    f.render_widget(header, area);
}

fn render_main(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(75), Constraint::Percentage(25)])
        .split(area);

    render_chart(f, app, chunks[0]);
    render_account(f, app, chunks[1]);
}

fn render_chart(f: &mut Frame, app: &App, area: Rect) {
    let path = app.session.selected_path();
    let candles = path.visible();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(" {} — Day {} ", path.symbol(), path.current_day() + 1),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let y_min = candles.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
    let y_max = candles.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);

    f.render_widget(CandleChart::new(candles, y_min * 0.99, y_max * 1.01), inner);
}

fn render_account(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(0)])
        .split(area);

    let path = app.session.selected_path();
    let mut account = vec![
        Line::from(Span::styled(
            "Account",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Line::from(format!("Cash:      {:>10.2}", app.session.cash())),
        Line::from(format!("Net worth: {:>10.2}", app.session.net_worth())),
        Line::from(""),
        Line::from(Span::styled(
            format!("mu={:+.4}  sigma={:.3}", path.drift(), path.volatility()),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Positions",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
    ];

    let open = app.session.open_positions();
    if open.is_empty() {
        account.push(Line::from(Span::styled(
            "None",
            Style::default().fg(Color::DarkGray),
        )));
    } else {
        for (symbol, quantity) in open {
            let color = if quantity > 0 { Color::Green } else { Color::Red };
            account.push(Line::from(Span::styled(
                format!("{symbol}: {quantity:+}"),
                Style::default().fg(color),
            )));
        }
    }

    let account_block = Paragraph::new(account)
        .block(Block::default().borders(Borders::ALL).title(" Portfolio "));
    f.render_widget(account_block, chunks[0]);

    // Most recent trades on top.
    let rows = chunks[1].height.saturating_sub(2) as usize;
    let trades: Vec<Line> = app
        .session
        .trades()
        .iter()
        .rev()
        .take(rows)
        .map(|trade| {
            let color = match trade.side {
                crate::ledger::Side::Buy => Color::Green,
                crate::ledger::Side::Sell => Color::Red,
            };
            Line::from(vec![
                Span::styled(format!("d{:<3}", trade.day + 1), Style::default().fg(Color::DarkGray)),
                Span::styled(format!("{:<4}", trade.side.as_str()), Style::default().fg(color)),
                Span::raw(format!(
                    " {:>4} {:<5} @ {:>8.2}",
                    trade.quantity, trade.symbol, trade.price
                )),
            ])
        })
        .collect();

    let trades_block =
        Paragraph::new(trades).block(Block::default().borders(Borders::ALL).title(" Trades "));
    f.render_widget(trades_block, chunks[1]);
}

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![
        Span::styled(" Qty: ", Style::default().fg(Color::Gray)),
        Span::styled(
            format!("[{}]", app.qty_input),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
    ];

    match &app.status {
        Some(Status::Info(text)) => {
            spans.push(Span::styled(text.clone(), Style::default().fg(Color::Green)));
            spans.push(Span::raw("  |  "));
        }
        Some(Status::Error(text)) => {
            spans.push(Span::styled(text.clone(), Style::default().fg(Color::Red)));
            spans.push(Span::raw("  |  "));
        }
        None => {}
    }

    spans.push(Span::styled(
        "b: buy | s: sell/short | n: next day | a: advance all | x: liquidate | Tab: symbol | q: quit",
        Style::default().fg(Color::White),
    ));

    let footer = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, area);
}

/// Candlestick chart: one column per candle, wick plus body, green up / red
/// down, with faint horizontal grid lines behind.
struct CandleChart<'a> {
    candles: &'a [Candle],
    y_min: f64,
    y_max: f64,
}

impl<'a> CandleChart<'a> {
    fn new(candles: &'a [Candle], y_min: f64, y_max: f64) -> Self {
        Self { candles, y_min, y_max }
    }
}

impl Widget for CandleChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.candles.is_empty() || area.width == 0 || area.height == 0 {
            return;
        }

        let height = area.height as i32;
        let width = area.width as usize;
        // When the path is longer than the pane, show the latest window.
        let n = self.candles.len().min(width);
        let start = self.candles.len() - n;

        let span = (self.y_max - self.y_min).max(1e-6);
        let map_price_to_row = |price: f64| -> i32 {
            let ratio = ((price - self.y_min) / span).clamp(0.0, 1.0);
            let rel = (ratio * (height as f64 - 1.0)).round() as i32;
            (area.y as i32 + (height - 1)) - rel
        };

        let row_min = area.y as i32;
        let row_max = area.y as i32 + height - 1;

        let grid_lines = 4;
        for i in 0..=grid_lines {
            let price = self.y_min + span * i as f64 / grid_lines as f64;
            let row = map_price_to_row(price).clamp(row_min, row_max);
            for x in area.x..(area.x + area.width) {
                if let Some(cell) = buf.cell_mut((x, row as u16)) {
                    if cell.symbol() == " " {
                        cell.set_symbol("─").set_fg(Color::DarkGray);
                    }
                }
            }
        }

        for (i, candle) in self.candles[start..].iter().enumerate() {
            let x = area.x + i as u16;
            let color = if candle.close >= candle.open {
                Color::Green
            } else {
                Color::Red
            };

            let high_row = map_price_to_row(candle.high);
            let low_row = map_price_to_row(candle.low);
            let open_row = map_price_to_row(candle.open);
            let close_row = map_price_to_row(candle.close);

            let wick_start = high_row.min(low_row).max(row_min);
            let wick_end = high_row.max(low_row).min(row_max);
            for y in wick_start..=wick_end {
                if let Some(cell) = buf.cell_mut((x, y as u16)) {
                    cell.set_symbol("│").set_fg(color);
                }
            }

            let body_start = open_row.min(close_row).max(row_min);
            let body_end = open_row.max(close_row).min(row_max);
            for y in body_start..=body_end {
                if let Some(cell) = buf.cell_mut((x, y as u16)) {
                    cell.set_symbol("█").set_fg(color);
                }
            }
        }
    }
}
