//! Strategy lifecycle hooks and the backtest driver loop.
use std::sync::Arc;

use tracing::info;

use crate::event::Event;
use crate::stream::ReplayStream;

/// Hooks invoked by [`run`]. All of them default to doing nothing.
///
/// `on_event` receives the event just delivered together with a read-only view
/// of the stream, whose per-symbol state already includes that event.
pub trait Strategy<E> {
    fn init(&mut self, _stream: &ReplayStream<E>) {}
    fn on_event(&mut self, _event: &Arc<E>, _stream: &ReplayStream<E>) {}
    fn exit(&mut self, _stream: &ReplayStream<E>) {}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Events delivered during this run.
    pub events: usize,
    /// Distinct symbols in the stream's state at exit.
    pub symbols: usize,
}

/// Drain `stream`, feeding every delivered event to `strategy`.
pub fn run<E, S>(stream: &mut ReplayStream<E>, strategy: &mut S) -> RunSummary
where
    E: Event,
    S: Strategy<E> + ?Sized,
{
    strategy.init(stream);
    let mut events = 0;
    while let Some(event) = stream.advance() {
        events += 1;
        strategy.on_event(&event, stream);
    }
    strategy.exit(stream);
    let summary = RunSummary { events, symbols: stream.symbols().count() };
    info!(events = summary.events, symbols = summary.symbols, "replay finished");
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Mark;
    use time::Duration;
    use time::macros::datetime;

    #[derive(Default)]
    struct Recorder {
        init_backlog: usize,
        seen: Vec<(String, usize)>,
        exited: bool,
    }

    impl Strategy<Mark> for Recorder {
        fn init(&mut self, stream: &ReplayStream<Mark>) {
            self.init_backlog = stream.len_backlog();
        }

        fn on_event(&mut self, event: &Arc<Mark>, stream: &ReplayStream<Mark>) {
            assert!(Arc::ptr_eq(stream.latest(&event.symbol).unwrap(), event));
            self.seen.push((event.symbol.clone(), stream.history_for(&event.symbol).len()));
        }

        fn exit(&mut self, stream: &ReplayStream<Mark>) {
            assert!(stream.is_exhausted());
            self.exited = true;
        }
    }

    #[test]
    fn hooks_run_in_lifecycle_order() {
        let t0 = datetime!(2020-01-21 00:00 UTC);
        let mut stream = ReplayStream::new();
        stream.set_backlog(vec![
            Mark::new(t0 + Duration::seconds(2), "X", "E"),
            Mark::new(t0, "X", "E"),
            Mark::new(t0 + Duration::seconds(1), "Y", "E"),
        ]);
        stream.sort();

        let mut recorder = Recorder::default();
        let summary = run(&mut stream, &mut recorder);

        assert_eq!(summary, RunSummary { events: 3, symbols: 2 });
        assert_eq!(recorder.init_backlog, 3);
        assert_eq!(recorder.seen, vec![("X".to_string(), 1), ("Y".to_string(), 1), ("X".to_string(), 2)]);
        assert!(recorder.exited);
    }

    #[test]
    fn default_hooks_drain_the_stream() {
        struct Idle;
        impl Strategy<Mark> for Idle {}

        let mut stream = ReplayStream::new();
        stream.set_backlog(vec![Mark::new(datetime!(2020-01-21 00:00 UTC), "X", "E")]);
        assert_eq!(run(&mut stream, &mut Idle).events, 1);
        assert_eq!(run(&mut stream, &mut Idle).events, 0);
    }
}
