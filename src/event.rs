//! Market observation identity and replay ordering.
use std::cmp::Ordering;
use time::OffsetDateTime;

/// Capability set shared by every replayable observation.
///
/// The identity triple is assigned by the loader when the event is built; the
/// replay stream only reads it.
pub trait Event {
    fn timestamp(&self) -> OffsetDateTime;
    fn set_timestamp(&mut self, ts: OffsetDateTime);
    fn symbol(&self) -> &str;
    fn set_symbol(&mut self, symbol: String);
    fn exchange(&self) -> &str;
    fn set_exchange(&mut self, exchange: String);
}

impl<T: Event + ?Sized> Event for Box<T> {
    fn timestamp(&self) -> OffsetDateTime { (**self).timestamp() }
    fn set_timestamp(&mut self, ts: OffsetDateTime) { (**self).set_timestamp(ts) }
    fn symbol(&self) -> &str { (**self).symbol() }
    fn set_symbol(&mut self, symbol: String) { (**self).set_symbol(symbol) }
    fn exchange(&self) -> &str { (**self).exchange() }
    fn set_exchange(&mut self, exchange: String) { (**self).set_exchange(exchange) }
}

/// Plain identity triple. Payload types embed one and delegate to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mark {
    pub timestamp: OffsetDateTime,
    pub symbol: String,
    pub exchange: String,
}

impl Mark {
    pub fn new(timestamp: OffsetDateTime, symbol: impl Into<String>, exchange: impl Into<String>) -> Self {
        Self { timestamp, symbol: symbol.into(), exchange: exchange.into() }
    }
}

impl Event for Mark {
    fn timestamp(&self) -> OffsetDateTime { self.timestamp }
    fn set_timestamp(&mut self, ts: OffsetDateTime) { self.timestamp = ts; }
    fn symbol(&self) -> &str { &self.symbol }
    fn set_symbol(&mut self, symbol: String) { self.symbol = symbol; }
    fn exchange(&self) -> &str { &self.exchange }
    fn set_exchange(&mut self, exchange: String) { self.exchange = exchange; }
}

/// Replay order: ascending timestamp, equal timestamps by symbol.
///
/// The symbol tie-break keeps replay independent of the order in which
/// per-symbol files were concatenated into the backlog.
pub fn replay_order<A, B>(a: &A, b: &B) -> Ordering
where
    A: Event + ?Sized,
    B: Event + ?Sized,
{
    a.timestamp()
        .cmp(&b.timestamp())
        .then_with(|| a.symbol().cmp(b.symbol()))
}
