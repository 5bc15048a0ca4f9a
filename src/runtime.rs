use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// How long the background pump waits on the terminal before re-checking
/// its cancellation flag.
pub const PUMP_POLL_MS: u64 = 20;

/// Unified event type consumed by the round runners
#[derive(Clone, Debug)]
pub enum InputEvent {
    Key(KeyEvent),
    Resize,
    Other,
}

/// What travels from the pump to a timed round
pub type Pumped = io::Result<InputEvent>;

/// Source of terminal events (keyboard, resize, etc.)
pub trait EventSource: Send + Sync + 'static {
    /// Wait up to `timeout` for an event to become readable.
    fn poll(&self, timeout: Duration) -> io::Result<bool>;

    /// Block until the next event arrives.
    fn read(&self) -> io::Result<InputEvent>;
}

/// Production event source using crossterm
#[derive(Debug, Default)]
pub struct CrosstermEventSource;

impl CrosstermEventSource {
    pub fn new() -> Self {
        Self
    }
}

impl EventSource for CrosstermEventSource {
    fn poll(&self, timeout: Duration) -> io::Result<bool> {
        event::poll(timeout)
    }

    fn read(&self) -> io::Result<InputEvent> {
        Ok(match event::read()? {
            // some platforms report releases and repeats as well
            CtEvent::Key(key) if key.kind == KeyEventKind::Press => InputEvent::Key(key),
            CtEvent::Resize(_, _) => InputEvent::Resize,
            _ => InputEvent::Other,
        })
    }
}

/// Event source fed from a channel, for headless runs and tests.
///
/// A script whose sender has been dropped polls as silence and reads as a
/// broken transport.
pub struct ScriptedEventSource {
    rx: Receiver<Pumped>,
    peeked: Mutex<Option<Pumped>>,
}

/// Sending half of a [`ScriptedEventSource`]
#[derive(Clone)]
pub struct EventScript {
    tx: Sender<Pumped>,
}

impl ScriptedEventSource {
    pub fn new() -> (EventScript, Self) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (
            EventScript { tx },
            Self {
                rx,
                peeked: Mutex::new(None),
            },
        )
    }

    fn peeked(&self) -> MutexGuard<'_, Option<Pumped>> {
        self.peeked.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl EventSource for ScriptedEventSource {
    fn poll(&self, timeout: Duration) -> io::Result<bool> {
        let mut peeked = self.peeked();
        if peeked.is_some() {
            return Ok(true);
        }
        match self.rx.recv_timeout(timeout) {
            Ok(ev) => {
                *peeked = Some(ev);
                Ok(true)
            }
            Err(RecvTimeoutError::Timeout) => Ok(false),
            Err(RecvTimeoutError::Disconnected) => {
                drop(peeked);
                thread::sleep(timeout);
                Ok(false)
            }
        }
    }

    fn read(&self) -> io::Result<InputEvent> {
        if let Some(ev) = self.peeked().take() {
            return ev;
        }
        self.rx.recv().unwrap_or_else(|_| {
            Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "event script exhausted",
            ))
        })
    }
}

impl EventScript {
    pub fn send(&self, ev: InputEvent) {
        let _ = self.tx.send(Ok(ev));
    }

    pub fn key(&self, code: KeyCode) {
        self.send(InputEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    pub fn keys(&self, codes: &[KeyCode]) {
        for code in codes {
            self.key(*code);
        }
    }

    /// Queue arrow presses for a code string such as "UDLR"
    pub fn combo(&self, codes: &str) {
        for symbol in crate::symbol::Sequence::from_codes(codes).symbols() {
            self.key(symbol.key_code());
        }
    }

    pub fn fail(&self, msg: &str) {
        let _ = self
            .tx
            .send(Err(io::Error::new(io::ErrorKind::BrokenPipe, msg.to_string())));
    }
}

/// Shared handle to the terminal input with a replay buffer in front of it.
///
/// Events a timed round pulled off the source but never consumed are pushed
/// back here, so the next round sees them in arrival order.
pub struct Input {
    source: Box<dyn EventSource>,
    replay: Mutex<VecDeque<Pumped>>,
}

impl Input {
    pub fn new<E: EventSource>(source: E) -> Arc<Self> {
        Arc::new(Self {
            source: Box::new(source),
            replay: Mutex::new(VecDeque::new()),
        })
    }

    fn replay(&self) -> MutexGuard<'_, VecDeque<Pumped>> {
        self.replay.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn poll(&self, timeout: Duration) -> io::Result<bool> {
        if !self.replay().is_empty() {
            return Ok(true);
        }
        self.source.poll(timeout)
    }

    pub fn read(&self) -> io::Result<InputEvent> {
        if let Some(ev) = self.replay().pop_front() {
            return ev;
        }
        self.source.read()
    }

    /// Put events back in front of anything not yet read.
    pub fn unread(&self, events: Vec<Pumped>) {
        let mut replay = self.replay();
        for ev in events.into_iter().rev() {
            replay.push_front(ev);
        }
    }
}

/// Background producer republishing input events on a channel so they can
/// be selected against a tick. Stopped and joined by [`EventPump::shutdown`]
/// or on drop.
pub struct EventPump {
    input: Arc<Input>,
    rx: Receiver<Pumped>,
    cancel: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl EventPump {
    pub fn spawn(input: Arc<Input>) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        let cancel = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&cancel);
        let source = Arc::clone(&input);
        let handle = thread::spawn(move || {
            let interval = Duration::from_millis(PUMP_POLL_MS);
            loop {
                let next = match source.poll(interval) {
                    Ok(false) => {
                        if flag.load(Ordering::Acquire) {
                            break;
                        }
                        continue;
                    }
                    // leave the event in the source for whoever reads next
                    Ok(true) if flag.load(Ordering::Acquire) => break,
                    Ok(true) => source.read(),
                    Err(e) => Err(e),
                };
                let failed = next.is_err();
                if tx.send(next).is_err() || failed {
                    break;
                }
            }
        });

        Self {
            input,
            rx,
            cancel,
            handle: Some(handle),
        }
    }

    pub fn events(&self) -> &Receiver<Pumped> {
        &self.rx
    }

    /// Stop the producer and hand every undelivered event, preceded by
    /// `held`, back to the input.
    pub fn shutdown(mut self, held: Option<Pumped>) {
        self.stop();
        let leftovers: Vec<Pumped> = held.into_iter().chain(self.rx.try_iter()).collect();
        if !leftovers.is_empty() {
            tracing::debug!(count = leftovers.len(), "returning unconsumed input events");
            self.input.unread(leftovers);
        }
    }

    fn stop(&mut self) {
        self.cancel.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for EventPump {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;

    /// Start a fresh tick stream; it stops when the receiver is dropped.
    fn start(&self) -> Receiver<Instant> {
        crossbeam_channel::tick(self.interval())
    }
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn key_code(ev: Pumped) -> KeyCode {
        match ev {
            Ok(InputEvent::Key(key)) => key.code,
            other => panic!("expected key event, got {other:?}"),
        }
    }

    #[test]
    fn scripted_source_polls_false_when_idle() {
        let (_script, source) = ScriptedEventSource::new();
        assert!(!source.poll(Duration::from_millis(1)).unwrap());
    }

    #[test]
    fn scripted_source_peeks_without_consuming() {
        let (script, source) = ScriptedEventSource::new();
        script.key(KeyCode::Up);
        assert!(source.poll(Duration::from_millis(10)).unwrap());
        assert!(source.poll(Duration::from_millis(10)).unwrap());
        assert_eq!(key_code(source.read()), KeyCode::Up);
        assert!(!source.poll(Duration::from_millis(1)).unwrap());
    }

    #[test]
    fn exhausted_script_reads_as_transport_error() {
        let (script, source) = ScriptedEventSource::new();
        drop(script);
        assert!(!source.poll(Duration::from_millis(1)).unwrap());
        let err = source.read().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn input_replays_unread_events_first() {
        let (script, source) = ScriptedEventSource::new();
        script.key(KeyCode::Right);
        let input = Input::new(source);

        input.unread(vec![
            Ok(InputEvent::Key(KeyEvent::new(KeyCode::Up, KeyModifiers::NONE))),
            Ok(InputEvent::Resize),
        ]);

        assert!(input.poll(Duration::ZERO).unwrap());
        assert_eq!(key_code(input.read()), KeyCode::Up);
        assert_matches!(input.read(), Ok(InputEvent::Resize));
        assert_eq!(key_code(input.read()), KeyCode::Right);
    }

    #[test]
    fn pump_forwards_events_in_order() {
        let (script, source) = ScriptedEventSource::new();
        script.combo("UDL");
        let input = Input::new(source);
        let pump = EventPump::spawn(Arc::clone(&input));

        let timeout = Duration::from_secs(1);
        assert_eq!(key_code(pump.events().recv_timeout(timeout).unwrap()), KeyCode::Up);
        assert_eq!(key_code(pump.events().recv_timeout(timeout).unwrap()), KeyCode::Down);
        assert_eq!(key_code(pump.events().recv_timeout(timeout).unwrap()), KeyCode::Left);
        pump.shutdown(None);
    }

    #[test]
    fn pump_shutdown_returns_unconsumed_events() {
        let (script, source) = ScriptedEventSource::new();
        script.combo("UD");
        let input = Input::new(source);
        let pump = EventPump::spawn(Arc::clone(&input));

        let first = pump.events().recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(key_code(first), KeyCode::Up);
        pump.shutdown(None);

        // the Down press must survive the pump going away
        assert_eq!(key_code(input.read()), KeyCode::Down);
    }

    #[test]
    fn pump_shutdown_puts_held_event_first() {
        let (script, source) = ScriptedEventSource::new();
        script.key(KeyCode::Left);
        let input = Input::new(source);
        let pump = EventPump::spawn(Arc::clone(&input));

        let held = pump.events().recv_timeout(Duration::from_secs(1)).unwrap();
        script.key(KeyCode::Right);
        pump.shutdown(Some(held));

        assert_eq!(key_code(input.read()), KeyCode::Left);
        assert_eq!(key_code(input.read()), KeyCode::Right);
    }

    #[test]
    fn pump_stops_after_transport_error() {
        let (script, source) = ScriptedEventSource::new();
        script.fail("gone");
        let input = Input::new(source);
        let pump = EventPump::spawn(Arc::clone(&input));

        let ev = pump.events().recv_timeout(Duration::from_secs(1)).unwrap();
        assert!(ev.is_err());
        // producer exits, so the channel disconnects
        assert_matches!(
            pump.events().recv_timeout(Duration::from_secs(1)),
            Err(RecvTimeoutError::Disconnected)
        );
    }

    #[test]
    fn ticker_yields_ticks() {
        let ticker = FixedTicker::new(Duration::from_millis(1));
        let ticks = ticker.start();
        assert!(ticks.recv_timeout(Duration::from_secs(1)).is_ok());
    }
}
