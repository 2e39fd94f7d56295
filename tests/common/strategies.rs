use proptest::prelude::*;

use super::builders::TradeLine;

/// Tickers shaped like B3 codes, e.g. `PETR4`
pub fn ticker_strategy() -> impl Strategy<Value = String> {
    "[A-Z]{4}[0-9]{1,2}"
}

/// Valid trade lines with comma decimals and optional thousands separators
pub fn trade_line_strategy() -> impl Strategy<Value = TradeLine> {
    (
        ticker_strategy(),
        1u32..100_000,
        0u32..100,
        1i64..1_000_000,
        0u32..24,
        0u32..60,
        0u32..60,
        1u32..29,
    )
        .prop_map(|(ticker, units, cents, quantity, h, m, s, day)| {
            TradeLine::new(&ticker)
                .price(&format!("{units},{cents:02}"))
                .quantity(&quantity.to_string())
                .closing_time(&format!("{h:02}{m:02}{s:02}000"))
                .trade_date(&format!("2024-02-{day:02}"))
        })
}
