//! Console notification side-channel.
//!
//! Successor of the mock e-mail notifier: trades get a boxed
//! notification block, lifecycle events a one-line colored notice, and
//! everything is optionally mirrored as plain text into a
//! notification log. Delivery problems on the log file are reported
//! via `tracing` and never fail the engine; the console is
//! best-effort by nature.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use crossterm::style::{style, Color, Stylize};
use tracing::warn;

use matchbook_core::price::format_price;
use matchbook_core::{EngineEvent, EventSink, Order, SinkError, Trade};

/// Console + log-file notifier.
pub struct Notifier {
    log_path: Option<PathBuf>,
    colored: bool,
}

impl Notifier {
    pub fn new() -> Self {
        Notifier {
            log_path: None,
            colored: true,
        }
    }

    /// Mirror every notification into `path` as plain text.
    pub fn with_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Disable ANSI colors (for dumb terminals and piped output).
    pub fn plain(mut self) -> Self {
        self.colored = false;
        self
    }

    /// One-line plain-text description of an event.
    pub fn describe(event: &EngineEvent) -> String {
        match event {
            EngineEvent::OrderAccepted { order, .. } => {
                format!("order placed: {}", order_summary(order))
            }
            EngineEvent::OrderAmended { order, .. } => {
                format!("order amended: {}", order_summary(order))
            }
            EngineEvent::OrderCancelled { order, .. } => {
                format!("order cancelled: {}", order_summary(order))
            }
            EngineEvent::OrderRejected {
                request, reason, ..
            } => format!("order rejected: {} ({})", request.order_id, reason.as_str()),
            EngineEvent::TradeExecuted { trade, .. } => {
                format!("trade executed: {}", trade_summary(trade))
            }
        }
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.colored {
            style(text).with(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn print(&self, event: &EngineEvent) {
        match event {
            EngineEvent::TradeExecuted { trade, .. } => {
                println!("{}", self.paint("--- trade notification ---", Color::Cyan));
                println!("{}", trade_summary(trade));
                println!("{}", self.paint("--------------------------", Color::Cyan));
            }
            EngineEvent::OrderAccepted { order, .. } => {
                println!(
                    "{} {}",
                    self.paint("[order placed]", Color::Green),
                    order_summary(order)
                );
            }
            EngineEvent::OrderAmended { order, .. } => {
                println!(
                    "{} {}",
                    self.paint("[order amended]", Color::Blue),
                    order_summary(order)
                );
            }
            EngineEvent::OrderCancelled { order, .. } => {
                println!(
                    "{} {}",
                    self.paint("[order cancelled]", Color::Red),
                    order_summary(order)
                );
            }
            EngineEvent::OrderRejected {
                request, reason, ..
            } => {
                println!(
                    "{} {} ({})",
                    self.paint("[order rejected]", Color::Red),
                    request.order_id,
                    reason.as_str()
                );
            }
        }
    }

    fn append_log(&self, event: &EngineEvent) {
        let Some(path) = &self.log_path else {
            return;
        };
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| writeln!(file, "{}", Self::describe(event)));
        if let Err(e) = result {
            warn!(path = %path.display(), error = %e, "notification log write failed");
        }
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Notifier::new()
    }
}

impl EventSink for Notifier {
    fn publish(&mut self, event: &EngineEvent) -> Result<(), SinkError> {
        self.print(event);
        self.append_log(event);
        Ok(())
    }
}

fn order_summary(order: &Order) -> String {
    format!(
        "{} {} {} {} @ {}",
        order.order_id,
        order.side.as_str(),
        order.remaining,
        order.symbol,
        format_price(order.price)
    )
}

fn trade_summary(trade: &Trade) -> String {
    format!(
        "{}: {} @ {} (buy {} / sell {}, trade id {})",
        trade.symbol,
        trade.quantity,
        format_price(trade.price),
        trade.buy_order_id,
        trade.sell_order_id,
        trade.trade_id
    )
}
