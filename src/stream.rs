//! Time-ordered replay of market events.
//!
//! [`ReplayStream`] owns a backlog of events not yet delivered and moves them,
//! one [`advance`](ReplayStream::advance) at a time, into an append-only
//! history. Each advance also updates two per-symbol indices: the latest
//! delivered event and the ordered list of everything delivered so far. Those
//! indices are the only view a consumer has of market state, so nothing from
//! the backlog can leak into them ahead of time.
//!
//! Events are held behind `Arc` so history and both indices share one
//! allocation per event.
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tracing::debug;

use crate::event::{Event, replay_order};

#[derive(Debug)]
pub struct ReplayStream<E> {
    backlog: VecDeque<Arc<E>>,
    history: Vec<Arc<E>>,
    latest: HashMap<String, Arc<E>>,
    by_symbol: HashMap<String, Vec<Arc<E>>>,
}

impl<E> Default for ReplayStream<E> {
    fn default() -> Self {
        Self {
            backlog: VecDeque::new(),
            history: Vec::new(),
            latest: HashMap::new(),
            by_symbol: HashMap::new(),
        }
    }
}

impl<E: Event> ReplayStream<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the backlog wholesale. No ordering is imposed; call [`sort`](Self::sort).
    pub fn set_backlog<I>(&mut self, events: I)
    where
        I: IntoIterator<Item = E>,
    {
        self.backlog = events.into_iter().map(Arc::new).collect();
    }

    /// Append to the backlog without reordering.
    pub fn extend_backlog<I>(&mut self, events: I)
    where
        I: IntoIterator<Item = E>,
    {
        self.backlog.extend(events.into_iter().map(Arc::new));
    }

    /// Order the backlog by timestamp, equal timestamps by symbol.
    pub fn sort(&mut self) {
        self.backlog
            .make_contiguous()
            .sort_by(|a, b| replay_order(&**a, &**b));
        debug!(backlog = self.backlog.len(), "sorted backlog");
    }

    /// Deliver the earliest backlog event, or `None` once the backlog is drained.
    pub fn advance(&mut self) -> Option<Arc<E>> {
        let event = self.backlog.pop_front()?;
        self.history.push(Arc::clone(&event));
        self.latest.insert(event.symbol().to_owned(), Arc::clone(&event));
        self.by_symbol
            .entry(event.symbol().to_owned())
            .or_default()
            .push(Arc::clone(&event));
        Some(event)
    }

    /// Last delivered event for `symbol`; `None` means no observation yet.
    pub fn latest(&self, symbol: &str) -> Option<&Arc<E>> {
        self.latest.get(symbol)
    }

    /// Every delivered event for `symbol`, in delivery order.
    pub fn history_for(&self, symbol: &str) -> &[Arc<E>] {
        self.by_symbol.get(symbol).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every delivered event, in delivery order.
    pub fn full_history(&self) -> &[Arc<E>] {
        &self.history
    }

    /// Undelivered events, front first.
    pub fn backlog(&self) -> impl Iterator<Item = &Arc<E>> {
        self.backlog.iter()
    }

    pub fn len_backlog(&self) -> usize {
        self.backlog.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.backlog.is_empty()
    }

    /// Symbols delivered so far, in no particular order.
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.latest.keys().map(String::as_str)
    }

    /// Return to the pre-consumption state without reloading.
    ///
    /// History becomes the backlog again, ahead of anything still undelivered.
    /// The backlog is not re-sorted: history is already in delivery order.
    pub fn reset(&mut self) {
        let mut backlog: VecDeque<Arc<E>> = std::mem::take(&mut self.history).into();
        backlog.append(&mut self.backlog);
        self.backlog = backlog;
        self.latest.clear();
        self.by_symbol.clear();
        debug!(backlog = self.backlog.len(), "reset stream");
    }
}
