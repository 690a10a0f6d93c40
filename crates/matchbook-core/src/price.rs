//! Integer tick representation for prices and quantities.
//!
//! The engine works exclusively in integer ticks so that ordered maps
//! and arithmetic stay exact. The venue's tick policy is fixed at four
//! decimal places; [`parse_price`] and [`format_price`] are the single
//! conversion point shared by the terminal front-end and the audit
//! tape, so every collaborator renders the same decimal form.

use thiserror::Error;

/// Price in ticks. One unit of currency is [`PRICE_SCALE`] ticks.
pub type Price = u64;

/// Quantity in whole units.
pub type Quantity = u64;

/// Ticks per unit of currency (four decimal places).
pub const PRICE_SCALE: u64 = 10_000;

/// Errors from [`parse_price`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParsePriceError {
    #[error("malformed price")]
    Malformed,
    #[error("price has more than four decimal places")]
    TooPrecise,
    #[error("price out of range")]
    OutOfRange,
}

/// Parse a non-negative decimal price string (e.g. `"101.25"`) into ticks.
///
/// At most four fractional digits are accepted; zero is a valid parse
/// (rejecting zero prices is the engine's job, not the parser's).
pub fn parse_price(text: &str) -> Result<Price, ParsePriceError> {
    let text = text.trim();
    if text.is_empty() || text.starts_with('+') || text.starts_with('-') {
        return Err(ParsePriceError::Malformed);
    }

    let (units_part, frac_part) = match text.split_once('.') {
        Some((u, f)) => (u, f),
        None => (text, ""),
    };
    if units_part.is_empty() && frac_part.is_empty() {
        return Err(ParsePriceError::Malformed);
    }
    if frac_part.len() > 4 {
        return Err(ParsePriceError::TooPrecise);
    }

    let units: u64 = if units_part.is_empty() {
        0
    } else {
        units_part.parse().map_err(|_| ParsePriceError::Malformed)?
    };

    let mut frac: u64 = 0;
    if !frac_part.is_empty() {
        frac = frac_part.parse().map_err(|_| ParsePriceError::Malformed)?;
        for _ in frac_part.len()..4 {
            frac *= 10;
        }
    }

    units
        .checked_mul(PRICE_SCALE)
        .and_then(|t| t.checked_add(frac))
        .ok_or(ParsePriceError::OutOfRange)
}

/// Render ticks as a decimal string, trimming trailing fractional zeros.
pub fn format_price(ticks: Price) -> String {
    let units = ticks / PRICE_SCALE;
    let frac = ticks % PRICE_SCALE;
    if frac == 0 {
        return units.to_string();
    }
    let mut text = format!("{units}.{frac:04}");
    while text.ends_with('0') {
        text.pop();
    }
    text
}
