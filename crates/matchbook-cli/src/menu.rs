//! Interactive menu loop.
//!
//! All input validation (positive price and quantity, recognized side
//! token, non-empty symbol) happens here before anything reaches the
//! engine; the engine still rejects violations defensively. Lifecycle
//! and trade notifications come out of the sink stack — this module
//! only prints prompts, confirmations, and the book view.

use std::fmt::Write as _;

use anyhow::Result;
use tracing::{info, warn};

use matchbook_core::price::{format_price, parse_price};
use matchbook_core::{
    BookDepth, Engine, EngineError, OrderId, OrderRequest, Price, Quantity, Side, Trade,
};
use matchbook_tape::Tape;

use crate::term::Term;

/// How many times we retry generating a fresh order id when the
/// engine reports a collision.
const MAX_ID_ATTEMPTS: u32 = 5;

/// Run the menu until exit or end-of-input. Errors are unrecoverable
/// engine faults; everything user-recoverable is handled in place.
pub fn run(engine: &mut Engine, tape: &Tape, colored: bool) -> Result<()> {
    let term = Term::new(colored);

    loop {
        term.heading("\n--- matchbook terminal ---");
        term.heading("1. Place order");
        term.heading("2. Amend order");
        term.heading("3. Cancel order");
        term.heading("4. View book");
        term.heading("5. Export and exit");

        let Some(choice) = term.prompt("Enter your choice: ")? else {
            // stdin closed; leave the same way option 5 does.
            export(engine, tape, &term)?;
            break;
        };

        match choice.as_str() {
            "1" => place(engine, &term)?,
            "2" => amend(engine, &term)?,
            "3" => cancel(engine, &term)?,
            "4" => view(engine, &term)?,
            "5" => {
                export(engine, tape, &term)?;
                break;
            }
            _ => term.warn("Invalid choice."),
        }
    }

    Ok(())
}

// -------------------------------------------------------------------------
// Menu handlers
// -------------------------------------------------------------------------

fn place(engine: &mut Engine, term: &Term) -> Result<()> {
    let Some(symbol) = read_symbol(term)? else {
        return Ok(());
    };
    let Some(side) = read_side(term)? else {
        return Ok(());
    };
    let Some(price) = read_price(term, "Enter price: ")? else {
        return Ok(());
    };
    let Some(quantity) = read_quantity(term, "Enter quantity: ")? else {
        return Ok(());
    };

    for attempt in 1..=MAX_ID_ATTEMPTS {
        let order_id = next_order_id();
        let request = OrderRequest::new(order_id.clone(), symbol.clone(), side, price, quantity);
        match engine.place(request) {
            Ok(trades) => {
                info!(%order_id, %symbol, "order placed");
                term.notice(&format!("Order placed with ID: {order_id}"));
                report_trades(term, &trades);
                return Ok(());
            }
            Err(EngineError::DuplicateOrderId(_)) if attempt < MAX_ID_ATTEMPTS => {
                warn!(%order_id, "generated id collided, retrying");
            }
            Err(e) => return surface(term, e),
        }
    }

    term.warn("Could not generate a unique order id. Try again.");
    Ok(())
}

fn amend(engine: &mut Engine, term: &Term) -> Result<()> {
    let Some(id) = term.prompt("Enter order ID to amend: ")? else {
        return Ok(());
    };
    if id.is_empty() {
        term.warn("Order id must not be empty.");
        return Ok(());
    }
    let Some(price) = read_price(term, "Enter new price: ")? else {
        return Ok(());
    };
    let Some(quantity) = read_quantity(term, "Enter new quantity: ")? else {
        return Ok(());
    };

    match engine.amend(&OrderId::new(id.clone()), price, quantity) {
        Ok(trades) => {
            info!(order_id = %id, "order amended");
            term.notice("Order amended.");
            report_trades(term, &trades);
            Ok(())
        }
        Err(e) => surface(term, e),
    }
}

fn cancel(engine: &mut Engine, term: &Term) -> Result<()> {
    let Some(id) = term.prompt("Enter order ID to cancel: ")? else {
        return Ok(());
    };
    if id.is_empty() {
        term.warn("Order id must not be empty.");
        return Ok(());
    }

    match engine.cancel(&OrderId::new(id.clone())) {
        Ok(true) => {
            info!(order_id = %id, "order cancelled");
            term.notice(&format!("Order {id} cancelled."));
            Ok(())
        }
        Ok(false) => {
            term.warn(&format!("Order {id} not found or already matched."));
            Ok(())
        }
        Err(e) => surface(term, e),
    }
}

fn view(engine: &Engine, term: &Term) -> Result<()> {
    let Some(symbol) = read_symbol(term)? else {
        return Ok(());
    };
    match engine.snapshot(&symbol) {
        None => term.warn(&format!("No book for {symbol}.")),
        Some(depth) => print!("{}", render_depth(&depth)),
    }
    Ok(())
}

fn export(engine: &mut Engine, tape: &Tape, term: &Term) -> Result<()> {
    let mut live = engine.all_orders();
    live.sort_by_key(|o| o.arrival_sequence);
    tape.save_all_orders(&live)?;
    info!(count = live.len(), "exported live orders");
    term.notice(&format!("Exported {} live orders. Goodbye.", live.len()));
    Ok(())
}

// -------------------------------------------------------------------------
// Input readers
// -------------------------------------------------------------------------

fn read_symbol(term: &Term) -> Result<Option<String>> {
    let Some(symbol) = term.prompt("Enter symbol (e.g. AAPL): ")? else {
        return Ok(None);
    };
    if symbol.is_empty() {
        term.warn("Symbol must not be empty.");
        return Ok(None);
    }
    Ok(Some(symbol.to_uppercase()))
}

fn read_side(term: &Term) -> Result<Option<Side>> {
    let Some(token) = term.prompt("Enter side (BUY/SELL): ")? else {
        return Ok(None);
    };
    match Side::parse(&token) {
        Some(side) => Ok(Some(side)),
        None => {
            term.warn("Invalid side. Must be BUY or SELL.");
            Ok(None)
        }
    }
}

fn read_price(term: &Term, label: &str) -> Result<Option<Price>> {
    let Some(text) = term.prompt(label)? else {
        return Ok(None);
    };
    match parse_price(&text) {
        Ok(ticks) if ticks > 0 => Ok(Some(ticks)),
        Ok(_) => {
            term.warn("Price must be positive.");
            Ok(None)
        }
        Err(e) => {
            term.warn(&format!("Invalid price: {e}."));
            Ok(None)
        }
    }
}

fn read_quantity(term: &Term, label: &str) -> Result<Option<Quantity>> {
    let Some(text) = term.prompt(label)? else {
        return Ok(None);
    };
    match parse_quantity(&text) {
        Some(qty) => Ok(Some(qty)),
        None => {
            term.warn("Invalid quantity. Enter a positive integer.");
            Ok(None)
        }
    }
}

fn parse_quantity(text: &str) -> Option<Quantity> {
    match text.trim().parse::<Quantity>() {
        Ok(qty) if qty > 0 => Some(qty),
        _ => None,
    }
}

fn next_order_id() -> String {
    format!("ORD-{}", rand::random::<u64>())
}

// -------------------------------------------------------------------------
// Output
// -------------------------------------------------------------------------

fn report_trades(term: &Term, trades: &[Trade]) {
    if !trades.is_empty() {
        let filled: Quantity = trades.iter().map(|t| t.quantity).sum();
        term.notice(&format!("{} trade(s), {} filled.", trades.len(), filled));
    }
}

/// Recoverable errors become a red line; a sink fault aborts the
/// session so the exit code reflects the broken observation pipeline.
fn surface(term: &Term, err: EngineError) -> Result<()> {
    match err {
        EngineError::Sink(_) => Err(anyhow::Error::new(err).context("event pipeline failure")),
        other => {
            term.warn(&format!("{other}."));
            Ok(())
        }
    }
}

/// Render both sides as a ladder: asks worst-to-best on top, bids
/// best-to-worst below, so the spread sits in the middle.
fn render_depth(depth: &BookDepth) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "--- {} ---", depth.symbol);
    if depth.is_empty() {
        let _ = writeln!(out, "(empty book)");
        return out;
    }

    for level in depth.asks.iter().rev() {
        let _ = writeln!(
            out,
            "  ask {:>12} | {:>10} | {} order(s)",
            format_price(level.price),
            level.total_quantity,
            level.order_count
        );
    }
    let _ = writeln!(out, "  {:-<44}", "");
    for level in &depth.bids {
        let _ = writeln!(
            out,
            "  bid {:>12} | {:>10} | {} order(s)",
            format_price(level.price),
            level.total_quantity,
            level.order_count
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use matchbook_core::DepthLevel;

    #[test]
    fn quantities_must_be_positive_integers() {
        assert_eq!(parse_quantity("10"), Some(10));
        assert_eq!(parse_quantity(" 3 "), Some(3));
        assert_eq!(parse_quantity("0"), None);
        assert_eq!(parse_quantity("-5"), None);
        assert_eq!(parse_quantity("1.5"), None);
        assert_eq!(parse_quantity("many"), None);
    }

    #[test]
    fn generated_ids_carry_the_ord_prefix() {
        let id = next_order_id();
        assert!(id.starts_with("ORD-"));
        assert!(id.len() > 4);
    }

    #[test]
    fn ladder_renders_asks_above_bids() {
        let depth = BookDepth {
            symbol: "AAPL".to_string(),
            bids: vec![DepthLevel {
                price: 1_000_000,
                total_quantity: 10,
                order_count: 1,
            }],
            asks: vec![
                DepthLevel {
                    price: 1_010_000,
                    total_quantity: 5,
                    order_count: 1,
                },
                DepthLevel {
                    price: 1_020_000,
                    total_quantity: 7,
                    order_count: 2,
                },
            ],
        };

        let text = render_depth(&depth);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "--- AAPL ---");
        assert!(lines[1].contains("ask") && lines[1].contains("102"));
        assert!(lines[2].contains("ask") && lines[2].contains("101"));
        assert!(lines[4].contains("bid") && lines[4].contains("100"));
    }

    #[test]
    fn empty_books_render_a_placeholder() {
        let depth = BookDepth {
            symbol: "MSFT".to_string(),
            bids: vec![],
            asks: vec![],
        };
        assert!(render_depth(&depth).contains("(empty book)"));
    }
}
