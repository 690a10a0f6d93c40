//! CSV audit tape.
//!
//! Three append-only files, headers written once when a file is
//! created empty:
//!
//! - `orders.csv`     `orderId,symbol,type,price,quantity,timestamp`
//! - `trades.csv`     `tradeId,buyOrderId,sellOrderId,symbol,price,quantity,timestamp`
//! - `cancelled.csv`  same schema as orders
//!
//! `type` is the `BUY`/`SELL` token, `price` the decimal form shared
//! through `matchbook_core::price`, `timestamp` milliseconds since the
//! Unix epoch. Rows append as events arrive; `save_all_orders`
//! rewrites the orders file from a live snapshot on export.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

use matchbook_core::price::format_price;
use matchbook_core::{EngineEvent, EventSink, Order, SinkError, Trade};

pub const ORDERS_HEADER: &str = "orderId,symbol,type,price,quantity,timestamp";
pub const TRADES_HEADER: &str = "tradeId,buyOrderId,sellOrderId,symbol,price,quantity,timestamp";

/// Failures while writing tape files.
#[derive(Debug, Error)]
pub enum TapeError {
    #[error("tape io: {0}")]
    Io(#[from] std::io::Error),
}

struct TapeFiles {
    orders: PathBuf,
    trades: PathBuf,
    cancelled: PathBuf,
}

/// CSV audit logger. Cloneable: clones share the same files and write
/// lock, so one clone can sit inside the engine's sink stack while
/// another serves the export flow.
#[derive(Clone)]
pub struct Tape {
    files: Arc<Mutex<TapeFiles>>,
}

impl Tape {
    /// Open (or create) the three tape files inside `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, TapeError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        Self::with_paths(
            dir.join("orders.csv"),
            dir.join("trades.csv"),
            dir.join("cancelled.csv"),
        )
    }

    /// Open explicit file paths instead of a directory.
    pub fn with_paths(
        orders: impl Into<PathBuf>,
        trades: impl Into<PathBuf>,
        cancelled: impl Into<PathBuf>,
    ) -> Result<Self, TapeError> {
        let files = TapeFiles {
            orders: orders.into(),
            trades: trades.into(),
            cancelled: cancelled.into(),
        };
        ensure_header(&files.orders, ORDERS_HEADER)?;
        ensure_header(&files.trades, TRADES_HEADER)?;
        ensure_header(&files.cancelled, ORDERS_HEADER)?;
        Ok(Tape {
            files: Arc::new(Mutex::new(files)),
        })
    }

    /// Append an accepted (or amended) order row.
    pub fn record_order(&self, order: &Order) -> Result<(), TapeError> {
        let files = self.files.lock();
        append_line(&files.orders, &order_row(order))?;
        debug!(order_id = %order.order_id, "recorded order");
        Ok(())
    }

    /// Append a trade row.
    pub fn record_trade(&self, trade: &Trade) -> Result<(), TapeError> {
        let files = self.files.lock();
        append_line(&files.trades, &trade_row(trade))?;
        debug!(trade_id = trade.trade_id, "recorded trade");
        Ok(())
    }

    /// Append a cancelled-order row.
    pub fn record_cancelled(&self, order: &Order) -> Result<(), TapeError> {
        let files = self.files.lock();
        append_line(&files.cancelled, &order_row(order))?;
        debug!(order_id = %order.order_id, "recorded cancellation");
        Ok(())
    }

    /// Rewrite the orders file from a snapshot of the live book (the
    /// export-and-exit flow). Rows are written in the order given.
    pub fn save_all_orders(&self, orders: &[Order]) -> Result<(), TapeError> {
        let files = self.files.lock();
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&files.orders)?;
        writeln!(file, "{ORDERS_HEADER}")?;
        for order in orders {
            writeln!(file, "{}", order_row(order))?;
        }
        debug!(count = orders.len(), "saved live orders");
        Ok(())
    }
}

impl EventSink for Tape {
    fn publish(&mut self, event: &EngineEvent) -> Result<(), SinkError> {
        let result = match event {
            EngineEvent::OrderAccepted { order, .. } | EngineEvent::OrderAmended { order, .. } => {
                self.record_order(order)
            }
            EngineEvent::TradeExecuted { trade, .. } => self.record_trade(trade),
            EngineEvent::OrderCancelled { order, .. } => self.record_cancelled(order),
            EngineEvent::OrderRejected {
                request, reason, ..
            } => {
                debug!(order_id = %request.order_id, reason = reason.as_str(), "rejection not taped");
                Ok(())
            }
        };
        result.map_err(|e| Box::new(e) as SinkError)
    }
}

fn order_row(order: &Order) -> String {
    format!(
        "{},{},{},{},{},{}",
        order.order_id,
        order.symbol,
        order.side.as_str(),
        format_price(order.price),
        order.remaining,
        order.accepted_at_ms
    )
}

fn trade_row(trade: &Trade) -> String {
    format!(
        "{},{},{},{},{},{},{}",
        trade.trade_id,
        trade.buy_order_id,
        trade.sell_order_id,
        trade.symbol,
        format_price(trade.price),
        trade.quantity,
        trade.executed_at_ms
    )
}

/// Write `header` if the file does not exist yet or is empty.
fn ensure_header(path: &Path, header: &str) -> Result<(), TapeError> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if file.metadata()?.len() == 0 {
        writeln!(file, "{header}")?;
    }
    Ok(())
}

fn append_line(path: &Path, line: &str) -> Result<(), TapeError> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use matchbook_core::{BufferSink, Engine, FanoutSink, OrderRequest, Side};

    fn read_lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn headers_are_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let _tape = Tape::open(dir.path()).unwrap();
        // Reopening must not duplicate headers.
        let _tape = Tape::open(dir.path()).unwrap();

        let lines = read_lines(&dir.path().join("orders.csv"));
        assert_eq!(lines, vec![ORDERS_HEADER.to_string()]);
        let lines = read_lines(&dir.path().join("trades.csv"));
        assert_eq!(lines, vec![TRADES_HEADER.to_string()]);
    }

    #[test]
    fn engine_events_land_in_the_right_files() {
        let dir = tempfile::tempdir().unwrap();
        let tape = Tape::open(dir.path()).unwrap();
        let mut engine = Engine::with_sink(FanoutSink::new().with(tape.clone()));

        engine
            .place(OrderRequest::new("A", "AAPL", Side::Buy, 1_002_500, 10))
            .unwrap();
        engine
            .place(OrderRequest::new("B", "AAPL", Side::Sell, 1_000_000, 4))
            .unwrap();
        engine
            .cancel(&matchbook_core::OrderId::new("A"))
            .unwrap();

        let orders = read_lines(&dir.path().join("orders.csv"));
        assert_eq!(orders.len(), 3, "header plus two accepted orders");
        assert!(orders[1].starts_with("A,AAPL,BUY,100.25,10,"));
        assert!(orders[2].starts_with("B,AAPL,SELL,100,4,"));

        let trades = read_lines(&dir.path().join("trades.csv"));
        assert_eq!(trades.len(), 2, "header plus one trade");
        assert!(trades[1].starts_with("1,A,B,AAPL,100.25,4,"));

        let cancelled = read_lines(&dir.path().join("cancelled.csv"));
        assert_eq!(cancelled.len(), 2);
        assert!(cancelled[1].starts_with("A,AAPL,BUY,100.25,6,"));
    }

    #[test]
    fn save_all_orders_rewrites_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let tape = Tape::open(dir.path()).unwrap();
        let buffer = BufferSink::new();
        let mut engine =
            Engine::with_sink(FanoutSink::new().with(tape.clone()).with(buffer.clone()));

        engine
            .place(OrderRequest::new("A", "AAPL", Side::Buy, 1_000_000, 10))
            .unwrap();
        engine
            .place(OrderRequest::new("B", "AAPL", Side::Buy, 990_000, 5))
            .unwrap();

        let mut live = engine.all_orders();
        live.sort_by_key(|o| o.arrival_sequence);
        tape.save_all_orders(&live).unwrap();

        let orders = read_lines(&dir.path().join("orders.csv"));
        assert_eq!(orders.len(), 3);
        assert_eq!(orders[0], ORDERS_HEADER);
        assert!(orders[1].starts_with("A,AAPL,BUY,100,10,"));
        assert!(orders[2].starts_with("B,AAPL,BUY,99,5,"));
    }

    #[test]
    fn rejections_are_not_taped() {
        let dir = tempfile::tempdir().unwrap();
        let tape = Tape::open(dir.path()).unwrap();
        let mut engine = Engine::with_sink(FanoutSink::new().with(tape.clone()));

        engine
            .place(OrderRequest::new("A", "AAPL", Side::Buy, 1_000_000, 10))
            .unwrap();
        let _ = engine.place(OrderRequest::new("A", "AAPL", Side::Buy, 1_000_000, 10));

        let orders = read_lines(&dir.path().join("orders.csv"));
        assert_eq!(orders.len(), 2, "only the accepted order was taped");
    }
}
