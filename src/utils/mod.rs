pub mod time;

use crate::orderbook::Price;

/// Convert price from ticks to human-readable format
pub fn format_price(price_ticks: Price, tick_size: f64) -> String {
    format!("{:.2}", price_ticks as f64 * tick_size)
}

/// Convert human price to ticks
pub fn price_to_ticks(price: f64, tick_size: f64) -> Price {
    (price / tick_size).round() as Price
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(10000, 0.01), "100.00");
        assert_eq!(format_price(12550, 0.01), "125.50");
    }

    #[test]
    fn test_price_to_ticks() {
        assert_eq!(price_to_ticks(100.0, 0.01), 10000);
        assert_eq!(price_to_ticks(125.50, 0.01), 12550);
    }
}
