use crate::session::Session;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use std::io;
use std::time::Duration;

const MAX_QTY_DIGITS: usize = 9;

/// Outcome of the last command, shown in the status bar.
#[derive(Clone, Debug)]
pub enum Status {
    Info(String),
    Error(String),
}

pub struct App {
    pub session: Session,
    pub qty_input: String,
    pub status: Option<Status>,
    pub should_quit: bool,
}

impl App {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            qty_input: String::new(),
            status: None,
            should_quit: false,
        }
    }

    pub fn run(&mut self, terminal: &mut crate::tui::Tui) -> io::Result<()> {
        while !self.should_quit {
            terminal.draw(|f| crate::ui::render(f, self))?;

            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab | KeyCode::Right => {
                self.session.select_offset(1);
                self.status = None;
            }
            KeyCode::BackTab | KeyCode::Left => {
                self.session.select_offset(-1);
                self.status = None;
            }
            KeyCode::Char(c @ '0'..='9') => {
                if self.qty_input.len() < MAX_QTY_DIGITS {
                    self.qty_input.push(c);
                }
            }
            KeyCode::Backspace => {
                self.qty_input.pop();
            }
            KeyCode::Char('b') => self.trade(Trade::Buy),
            KeyCode::Char('s') => self.trade(Trade::Sell),
            KeyCode::Char('n') => {
                self.session.advance_selected();
                self.status = None;
            }
            KeyCode::Char('a') => {
                self.session.advance_all();
                self.status = Some(Status::Info("Advanced all symbols one day".to_string()));
            }
            KeyCode::Char('x') => {
                let closed = self.session.liquidate_all();
                self.status = Some(if closed.is_empty() {
                    Status::Info("No open positions to close".to_string())
                } else {
                    Status::Info(format!("Closed {} position(s)", closed.len()))
                });
            }
            _ => {}
        }
    }

    fn trade(&mut self, trade: Trade) {
        let quantity = match self.qty_input.parse::<i64>() {
            Ok(quantity) => quantity,
            Err(_) => {
                self.status = Some(Status::Error(
                    "Quantity must be a positive whole number".to_string(),
                ));
                return;
            }
        };

        let symbol = self.session.selected().to_string();
        let result = match trade {
            Trade::Buy => self.session.buy(&symbol, quantity),
            Trade::Sell => self.session.sell(&symbol, quantity),
        };

        self.status = Some(match result {
            Ok(record) => Status::Info(format!(
                "{} {} {} @ {:.2} ({:.2})",
                record.side.as_str(),
                record.quantity,
                record.symbol,
                record.price,
                record.notional
            )),
            Err(error) => Status::Error(error.to_string()),
        });
    }
}

enum Trade {
    Buy,
    Sell,
}
