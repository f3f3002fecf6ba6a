//! Order-book depth snapshots.
//!
//! A [`Depth`] is one observed state of the top of an order book: an ask
//! ladder and a bid ladder of [`Level`]s, each ordered best price first. The
//! snapshot carries its identity in an embedded [`Mark`] and implements
//! [`Event`] by delegating to it, so depth snapshots can be replayed directly
//! by a [`ReplayStream`](crate::stream::ReplayStream).
//!
//! Derived quantities ([`Depth::mid_price`], [`Depth::spread`]) read the best
//! level on both sides. A snapshot with an empty side yields
//! [`DepthError::EmptySide`] instead of a value.
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{DepthError, Side};
use crate::event::{Event, Mark};

/// One price level. Deserializes from a `[price, amount]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub price: f64,
    pub amount: f64,
}

impl Level {
    pub fn new(price: f64, amount: f64) -> Self {
        Self { price, amount }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Depth {
    pub mark: Mark,
    /// Sell side, best price at index 0.
    pub asks: Vec<Level>,
    /// Buy side, best price at index 0.
    pub bids: Vec<Level>,
}

impl Depth {
    pub fn new(mark: Mark, asks: Vec<Level>, bids: Vec<Level>) -> Self {
        Self { mark, asks, bids }
    }

    pub fn best_ask(&self) -> Option<&Level> {
        self.asks.first()
    }

    pub fn best_bid(&self) -> Option<&Level> {
        self.bids.first()
    }

    fn best_prices(&self) -> Result<(f64, f64), DepthError> {
        let ask = self.best_ask().ok_or(DepthError::EmptySide(Side::Ask))?;
        let bid = self.best_bid().ok_or(DepthError::EmptySide(Side::Bid))?;
        Ok((ask.price, bid.price))
    }

    /// Average of best ask and best bid.
    pub fn mid_price(&self) -> Result<f64, DepthError> {
        let (ask, bid) = self.best_prices()?;
        Ok((ask + bid) / 2.0)
    }

    /// Best ask minus best bid.
    pub fn spread(&self) -> Result<f64, DepthError> {
        let (ask, bid) = self.best_prices()?;
        Ok(ask - bid)
    }
}

impl Event for Depth {
    fn timestamp(&self) -> OffsetDateTime { self.mark.timestamp }
    fn set_timestamp(&mut self, ts: OffsetDateTime) { self.mark.timestamp = ts; }
    fn symbol(&self) -> &str { &self.mark.symbol }
    fn set_symbol(&mut self, symbol: String) { self.mark.symbol = symbol; }
    fn exchange(&self) -> &str { &self.mark.exchange }
    fn set_exchange(&mut self, exchange: String) { self.mark.exchange = exchange; }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn depth(asks: Vec<Level>, bids: Vec<Level>) -> Depth {
        let mark = Mark::new(datetime!(2020-01-21 08:00 UTC), "BTC_USDT", "BINANCE.COM");
        Depth::new(mark, asks, bids)
    }

    #[test]
    fn mid_and_spread_from_best_levels() {
        let d = depth(
            vec![Level::new(101.0, 1.0), Level::new(102.0, 5.0)],
            vec![Level::new(99.0, 2.0), Level::new(98.5, 4.0)],
        );
        assert!((d.mid_price().unwrap() - 100.0).abs() < 1e-9);
        assert!((d.spread().unwrap() - 2.0).abs() < 1e-9);
        assert_eq!(d.best_ask(), Some(&Level::new(101.0, 1.0)));
        assert_eq!(d.best_bid(), Some(&Level::new(99.0, 2.0)));
    }

    #[test]
    fn empty_side_is_an_error_not_a_panic() {
        let no_asks = depth(vec![], vec![Level::new(99.0, 2.0)]);
        assert_eq!(no_asks.mid_price(), Err(DepthError::EmptySide(Side::Ask)));
        assert_eq!(no_asks.spread(), Err(DepthError::EmptySide(Side::Ask)));

        let no_bids = depth(vec![Level::new(101.0, 1.0)], vec![]);
        assert_eq!(no_bids.mid_price(), Err(DepthError::EmptySide(Side::Bid)));

        let empty = depth(vec![], vec![]);
        assert!(empty.spread().is_err());
        assert!(empty.best_ask().is_none());
    }

    #[test]
    fn level_from_json_pair() {
        let levels: Vec<Level> = serde_json::from_str("[[101.5, 0.25], [102, 3]]").unwrap();
        assert_eq!(levels, vec![Level::new(101.5, 0.25), Level::new(102.0, 3.0)]);
        assert!(serde_json::from_str::<Vec<Level>>("[[101.5]]").is_err());
    }

    #[test]
    fn identity_accessors_go_through_mark() {
        let mut d = depth(vec![], vec![]);
        assert_eq!(d.symbol(), "BTC_USDT");
        assert_eq!(d.exchange(), "BINANCE.COM");
        d.set_symbol("ETH_USDT".into());
        assert_eq!(d.mark.symbol, "ETH_USDT");
    }
}
