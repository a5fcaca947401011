use crate::ledger::Side;
use crate::session::Session;
use eframe::egui;
use egui_plot::{BoxElem, BoxPlot, BoxSpread, Plot};

// ────────────────────────────────────────────────────────────────────────────
// Color Palette — dark financial terminal
// ────────────────────────────────────────────────────────────────────────────

const ACCENT_BLUE: egui::Color32 = egui::Color32::from_rgb(59, 130, 246);
const ACCENT_GREEN: egui::Color32 = egui::Color32::from_rgb(34, 197, 94);
const ACCENT_RED: egui::Color32 = egui::Color32::from_rgb(239, 68, 68);
const ACCENT_YELLOW: egui::Color32 = egui::Color32::from_rgb(250, 204, 21);
const ACCENT_ORANGE: egui::Color32 = egui::Color32::from_rgb(251, 146, 60);
const ACCENT_PURPLE: egui::Color32 = egui::Color32::from_rgb(168, 85, 247);

const BG_DARK: egui::Color32 = egui::Color32::from_rgb(15, 15, 20);
const BG_CARD: egui::Color32 = egui::Color32::from_rgb(24, 24, 32);
const BG_ELEVATED: egui::Color32 = egui::Color32::from_rgb(32, 32, 44);
const TEXT_PRIMARY: egui::Color32 = egui::Color32::from_rgb(226, 232, 240);
const TEXT_SECONDARY: egui::Color32 = egui::Color32::from_rgb(148, 163, 184);
const BORDER_SUBTLE: egui::Color32 = egui::Color32::from_rgb(51, 51, 68);

pub struct GuiApp {
    session: Session,
    qty_input: String,
    /// Last command outcome: `(message, is_error)`.
    status: Option<(String, bool)>,
}

impl GuiApp {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            qty_input: String::new(),
            status: None,
        }
    }

    fn apply_theme(ctx: &egui::Context) {
        let mut style = (*ctx.style()).clone();

        style.visuals.window_rounding = egui::Rounding::same(8.0);
        style.visuals.widgets.noninteractive.rounding = egui::Rounding::same(6.0);
        style.visuals.widgets.inactive.rounding = egui::Rounding::same(6.0);
        style.visuals.widgets.active.rounding = egui::Rounding::same(6.0);
        style.visuals.widgets.hovered.rounding = egui::Rounding::same(6.0);

        style.visuals.dark_mode = true;
        style.visuals.panel_fill = BG_DARK;
        style.visuals.window_fill = BG_CARD;
        style.visuals.faint_bg_color = BG_ELEVATED;

        style.visuals.widgets.noninteractive.bg_fill = BG_CARD;
        style.visuals.widgets.noninteractive.fg_stroke = egui::Stroke::new(1.0, TEXT_SECONDARY);
        style.visuals.widgets.inactive.bg_fill = BG_ELEVATED;
        style.visuals.widgets.inactive.fg_stroke = egui::Stroke::new(1.0, TEXT_PRIMARY);
        style.visuals.widgets.hovered.bg_fill = egui::Color32::from_rgb(45, 45, 60);
        style.visuals.widgets.hovered.fg_stroke = egui::Stroke::new(1.0, egui::Color32::WHITE);
        style.visuals.widgets.active.bg_fill = ACCENT_BLUE;
        style.visuals.widgets.active.fg_stroke = egui::Stroke::new(1.0, egui::Color32::WHITE);

        style.visuals.selection.bg_fill = ACCENT_BLUE.linear_multiply(0.4);
        style.visuals.selection.stroke = egui::Stroke::new(1.0, ACCENT_BLUE);

        style.spacing.item_spacing = egui::vec2(8.0, 6.0);

        ctx.set_style(style);
    }

    fn action_button(
        ui: &mut egui::Ui,
        label: &str,
        fill: egui::Color32,
    ) -> egui::Response {
        ui.add(
            egui::Button::new(
                egui::RichText::new(label)
                    .size(13.0)
                    .strong()
                    .color(egui::Color32::WHITE),
            )
            .fill(fill)
            .rounding(egui::Rounding::same(6.0)),
        )
    }

    fn parsed_quantity(&mut self) -> Option<i64> {
        match self.qty_input.trim().parse::<i64>() {
            Ok(quantity) => Some(quantity),
            Err(_) => {
                self.status =
                    Some(("Quantity must be a positive whole number".to_string(), true));
                None
            }
        }
    }

    fn execute_buy(&mut self) {
        let Some(quantity) = self.parsed_quantity() else {
            return;
        };
        let symbol = self.session.selected().to_string();
        self.status = Some(match self.session.buy(&symbol, quantity) {
            Ok(record) => (
                format!(
                    "BUY {} {} @ {:.2} ({:.2})",
                    record.quantity, record.symbol, record.price, record.notional
                ),
                false,
            ),
            Err(error) => (error.to_string(), true),
        });
    }

    fn execute_sell(&mut self) {
        let Some(quantity) = self.parsed_quantity() else {
            return;
        };
        let symbol = self.session.selected().to_string();
        self.status = Some(match self.session.sell(&symbol, quantity) {
            Ok(record) => (
                format!(
                    "SELL {} {} @ {:.2} ({:.2})",
                    record.quantity, record.symbol, record.price, record.notional
                ),
                false,
            ),
            Err(error) => (error.to_string(), true),
        });
    }

    // ── Top control bar ─────────────────────────────────────────────────────

    fn render_controls(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.add_space(4.0);
        ui.horizontal(|ui| {
            ui.add_space(8.0);
            ui.label(
                egui::RichText::new("StockSim")
                    .size(18.0)
                    .strong()
                    .color(ACCENT_BLUE),
            );
            ui.add_space(12.0);

            let mut selected = self.session.selected().to_string();
            egui::ComboBox::from_id_salt("symbol_select")
                .selected_text(selected.clone())
                .show_ui(ui, |ui| {
                    for symbol in self.session.symbols().to_vec() {
                        ui.selectable_value(&mut selected, symbol.clone(), symbol);
                    }
                });
            if selected != self.session.selected() {
                // Selection comes from the session's own symbol list.
                let _ = self.session.select(&selected);
                self.status = None;
            }

            let path = self.session.selected_path();
            ui.label(
                egui::RichText::new(format!("${:.2}", path.current_price()))
                    .size(16.0)
                    .strong()
                    .color(TEXT_PRIMARY),
            );
            ui.label(
                egui::RichText::new(format!(
                    "Day {}/{}",
                    path.current_day() + 1,
                    path.horizon_days()
                ))
                .size(12.0)
                .color(ACCENT_YELLOW),
            );

            ui.add_space(16.0);
            ui.label(egui::RichText::new("Qty:").size(13.0).color(TEXT_SECONDARY));
            ui.add(
                egui::TextEdit::singleline(&mut self.qty_input)
                    .desired_width(64.0)
                    .hint_text("0"),
            );

            if Self::action_button(ui, "Buy", ACCENT_GREEN).clicked() {
                self.execute_buy();
            }
            if Self::action_button(ui, "Sell/Short", ACCENT_RED).clicked() {
                self.execute_sell();
            }
            if Self::action_button(ui, "Next Day ▶", ACCENT_ORANGE).clicked() {
                self.session.advance_selected();
                self.status = None;
            }
            if Self::action_button(ui, "Liquidate", ACCENT_PURPLE).clicked() {
                let closed = self.session.liquidate_all();
                self.status = Some(if closed.is_empty() {
                    ("No open positions to close".to_string(), false)
                } else {
                    (format!("Closed {} position(s)", closed.len()), false)
                });
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.add_space(8.0);
                if Self::action_button(ui, "Exit", egui::Color32::from_rgb(100, 106, 115))
                    .clicked()
                {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });
        });
        ui.add_space(4.0);
    }

    // ── Candlestick chart ───────────────────────────────────────────────────

    fn render_chart(&self, ui: &mut egui::Ui) {
        let path = self.session.selected_path();
        let candles = path.visible().to_vec();
        let dates: Vec<String> = candles
            .iter()
            .map(|c| c.date.format("%b %d").to_string())
            .collect();

        egui::Frame::none()
            .fill(BG_CARD)
            .rounding(egui::Rounding::same(8.0))
            .stroke(egui::Stroke::new(1.0, BORDER_SUBTLE))
            .inner_margin(egui::Margin::same(8.0))
            .show(ui, |ui| {
                let boxes: Vec<BoxElem> = candles
                    .iter()
                    .enumerate()
                    .map(|(i, candle)| {
                        let up = candle.close >= candle.open;
                        let color = if up { ACCENT_GREEN } else { ACCENT_RED };
                        BoxElem::new(
                            i as f64,
                            BoxSpread::new(
                                candle.low,
                                candle.open.min(candle.close),
                                (candle.open + candle.close) / 2.0,
                                candle.open.max(candle.close),
                                candle.high,
                            ),
                        )
                        .box_width(0.7)
                        .whisker_width(0.4)
                        .fill(color.linear_multiply(0.6))
                        .stroke(egui::Stroke::new(1.0, color))
                    })
                    .collect();

                let plot = Plot::new("candle_chart")
                    .x_axis_formatter(move |x, _range| {
                        let index = x.value.round();
                        if index < 0.0 || x.value.fract().abs() > 1e-6 {
                            return String::new();
                        }
                        dates.get(index as usize).cloned().unwrap_or_default()
                    })
                    .label_formatter(|_name, value| format!("${:.2}", value.y))
                    .allow_drag(true)
                    .allow_zoom(true);

                plot.show(ui, |plot_ui| {
                    plot_ui.box_plot(BoxPlot::new(boxes).name(path.symbol()));
                });
            });
    }

    // ── Side panel: positions and trade log ─────────────────────────────────

    fn render_side_panel(&self, ui: &mut egui::Ui) {
        egui::Frame::none()
            .fill(BG_CARD)
            .rounding(egui::Rounding::same(8.0))
            .stroke(egui::Stroke::new(1.0, BORDER_SUBTLE))
            .inner_margin(egui::Margin::same(12.0))
            .show(ui, |ui| {
                ui.label(
                    egui::RichText::new("Positions")
                        .size(14.0)
                        .strong()
                        .color(ACCENT_YELLOW),
                );
                let open = self.session.open_positions();
                if open.is_empty() {
                    ui.label(egui::RichText::new("None").size(12.0).color(TEXT_SECONDARY));
                } else {
                    for (symbol, quantity) in open {
                        let color = if quantity > 0 { ACCENT_GREEN } else { ACCENT_RED };
                        ui.label(
                            egui::RichText::new(format!("{symbol}: {quantity:+}"))
                                .size(12.0)
                                .color(color),
                        );
                    }
                }

                ui.add_space(12.0);
                ui.label(
                    egui::RichText::new("Trades")
                        .size(14.0)
                        .strong()
                        .color(ACCENT_YELLOW),
                );
                egui::ScrollArea::vertical().show(ui, |ui| {
                    for trade in self.session.trades().iter().rev() {
                        let color = match trade.side {
                            Side::Buy => ACCENT_GREEN,
                            Side::Sell => ACCENT_RED,
                        };
                        ui.label(
                            egui::RichText::new(format!(
                                "d{:<3} {:<4} {:>4} {:<5} @ {:.2}",
                                trade.day + 1,
                                trade.side.as_str(),
                                trade.quantity,
                                trade.symbol,
                                trade.price
                            ))
                            .size(11.0)
                            .monospace()
                            .color(color),
                        );
                    }
                });
            });
    }

    // ── Bottom status bar ───────────────────────────────────────────────────

    fn render_status_bar(&self, ui: &mut egui::Ui) {
        ui.add_space(4.0);
        ui.horizontal(|ui| {
            ui.add_space(8.0);
            ui.label(
                egui::RichText::new(format!("Cash: {:.2}", self.session.cash()))
                    .size(13.0)
                    .color(TEXT_PRIMARY),
            );
            ui.add_space(12.0);
            ui.label(
                egui::RichText::new(format!("Net Worth: {:.2}", self.session.net_worth()))
                    .size(13.0)
                    .strong()
                    .color(ACCENT_BLUE),
            );

            if let Some((message, is_error)) = &self.status {
                ui.add_space(16.0);
                let color = if *is_error { ACCENT_RED } else { ACCENT_GREEN };
                ui.label(egui::RichText::new(message).size(13.0).color(color));
            }
        });
        ui.add_space(4.0);
    }
}

impl eframe::App for GuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        Self::apply_theme(ctx);

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            self.render_controls(ui, ctx);
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            self.render_status_bar(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let side_panel_width = 220.0;
            ui.horizontal_top(|ui| {
                ui.vertical(|ui| {
                    ui.set_width(ui.available_width() - side_panel_width - 12.0);
                    self.render_chart(ui);
                });
                ui.vertical(|ui| {
                    ui.set_width(side_panel_width);
                    self.render_side_panel(ui);
                });
            });
        });
    }
}
