//! Raw/display amount conversion for fungible assets
//!
//! On the ledger every balance is an integer count of the smallest unit
//! (`u64`); the number of decimals lives on the asset's mint. Conversion to
//! and from display units uses rust_decimal so the arithmetic is
//! deterministic and lossless, never floating point.

use rust_decimal::Decimal;

/// Largest decimals value a mint may carry.
///
/// `u64::MAX` has 20 digits; capping at 19 keeps every raw amount exactly
/// representable as a `Decimal` scaled value.
pub const MAX_DECIMALS: u8 = 19;

/// Convert a raw base-unit amount into display units.
///
/// `ui_amount(1_000_000, 6)` is `1.000000`.
pub fn ui_amount(raw: u64, decimals: u8) -> Decimal {
    let decimals = decimals.min(MAX_DECIMALS);
    Decimal::from_i128_with_scale(raw as i128, decimals as u32)
}

/// Convert a display amount back into raw base units.
///
/// Returns `None` when the value is negative, carries more fractional
/// digits than the mint allows, or overflows `u64`.
pub fn raw_amount(ui: Decimal, decimals: u8) -> Option<u64> {
    if ui.is_sign_negative() {
        return None;
    }
    let decimals = decimals.min(MAX_DECIMALS);
    let mut scaled = ui;
    scaled.rescale(decimals as u32);
    // rescale rounds; a changed value means the input had dust digits
    if scaled != ui {
        return None;
    }
    let mantissa = scaled.mantissa();
    u64::try_from(mantissa).ok()
}
