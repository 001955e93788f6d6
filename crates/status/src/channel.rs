//! Context-affinity dispatcher with latest-wins coalescing.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

/// Callback that schedules one iteration of the UI loop (e.g. a repaint).
pub type WakeFn = Box<dyn Fn() + Send + Sync + 'static>;

/// A status message tagged with its publish order.
#[derive(Debug, Clone, Default)]
struct Stamped {
    seq: u64,
    text: String,
}

struct Inner {
    owner: ThreadId,
    label: Mutex<Stamped>,
    pending: Mutex<Option<Stamped>>,
    next_seq: AtomicU64,
    closed: AtomicBool,
    wake: WakeFn,
}

/// Thread-safe conduit for the latest status string.
///
/// Cloning is cheap; all clones share the same label and pending slot.
#[derive(Clone)]
pub struct StatusChannel {
    inner: Arc<Inner>,
}

impl StatusChannel {
    /// Creates a channel owned by the calling thread.
    ///
    /// Must be called on the UI thread. `wake` runs after every update
    /// published from another thread.
    pub fn new(wake: WakeFn) -> Self {
        Self {
            inner: Arc::new(Inner {
                owner: thread::current().id(),
                label: Mutex::new(Stamped::default()),
                pending: Mutex::new(None),
                next_seq: AtomicU64::new(0),
                closed: AtomicBool::new(false),
                wake,
            }),
        }
    }

    /// Publishes a new status from any thread.
    ///
    /// Never blocks beyond a short critical section. After [`close`] the
    /// message is dropped.
    ///
    /// [`close`]: StatusChannel::close
    pub fn publish(&self, text: impl Into<String>) {
        self.render(text.into());
    }

    /// Sets the label to `text`, marshaling onto the UI thread if needed.
    pub fn render(&self, text: String) {
        if self.is_closed() {
            tracing::debug!(status = %text, "status dropped: UI is shutting down");
            return;
        }

        let msg = Stamped {
            seq: self.inner.next_seq.fetch_add(1, Ordering::Relaxed) + 1,
            text,
        };

        if self.is_ui_context() {
            self.apply(msg);
        } else {
            self.post(msg);
        }
    }

    /// Applies the pending foreign update, if any.
    ///
    /// Call once per UI loop iteration. Returns `true` if the label
    /// changed. Does nothing when called off the UI thread.
    pub fn pump(&self) -> bool {
        if !self.is_ui_context() || self.is_closed() {
            return false;
        }
        let pending = lock(&self.inner.pending).take();
        match pending {
            Some(msg) => self.apply(msg),
            None => false,
        }
    }

    /// Returns the text currently shown on the label.
    pub fn text(&self) -> String {
        lock(&self.inner.label).text.clone()
    }

    /// Returns `true` if the calling thread owns the label.
    pub fn is_ui_context(&self) -> bool {
        thread::current().id() == self.inner.owner
    }

    /// Returns `true` once the UI has started shutting down.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Stops accepting updates and discards anything still pending.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        lock(&self.inner.pending).take();
        tracing::debug!("status channel closed");
    }

    fn apply(&self, msg: Stamped) -> bool {
        let mut label = lock(&self.inner.label);
        // Concurrent publishers may land out of order; keep the newest.
        if msg.seq <= label.seq {
            return false;
        }
        *label = msg;
        true
    }

    fn post(&self, msg: Stamped) {
        {
            let mut pending = lock(&self.inner.pending);
            let newer = pending.as_ref().is_none_or(|p| p.seq < msg.seq);
            if newer {
                *pending = Some(msg);
            }
        }
        (self.inner.wake)();
    }
}

impl std::fmt::Debug for StatusChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusChannel")
            .field("owner", &self.inner.owner)
            .field("text", &self.text())
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;

    fn counting_channel() -> (StatusChannel, Arc<AtomicUsize>) {
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&wakes);
        let channel = StatusChannel::new(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        (channel, wakes)
    }

    fn publish_from_worker(channel: &StatusChannel, texts: &[&str]) {
        let channel = channel.clone();
        let texts: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
        thread::spawn(move || {
            for t in texts {
                channel.publish(t);
            }
        })
        .join()
        .unwrap();
    }

    #[test]
    fn ui_thread_publish_applies_immediately() {
        let (channel, wakes) = counting_channel();
        assert!(channel.is_ui_context());

        channel.publish("Connecting on port 5757");
        assert_eq!(channel.text(), "Connecting on port 5757");
        assert_eq!(wakes.load(Ordering::SeqCst), 0);
        assert!(!channel.pump());
    }

    #[test]
    fn foreign_publish_is_deferred_until_pump() {
        let (channel, wakes) = counting_channel();
        channel.publish("initial");

        publish_from_worker(&channel, &["fan 1: 1200 rpm"]);

        // The label is untouched until the UI thread runs an iteration.
        assert_eq!(channel.text(), "initial");
        assert_eq!(wakes.load(Ordering::SeqCst), 1);

        assert!(channel.pump());
        assert_eq!(channel.text(), "fan 1: 1200 rpm");
        assert!(!channel.pump());
    }

    #[test]
    fn text_is_delivered_verbatim() {
        let (channel, _) = counting_channel();
        let text = "  Temp: 41.5°C\tPWM: 87%  ".to_string() + &"x".repeat(4096);

        let sent = text.clone();
        let worker = channel.clone();
        thread::spawn(move || worker.publish(sent)).join().unwrap();

        channel.pump();
        assert_eq!(channel.text(), text);
    }

    #[test]
    fn burst_of_foreign_updates_ends_on_the_last() {
        let (channel, wakes) = counting_channel();
        let texts: Vec<String> = (0..500).map(|i| format!("sample {i}")).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();

        publish_from_worker(&channel, &refs);

        assert_eq!(wakes.load(Ordering::SeqCst), 500);
        assert!(channel.pump());
        assert_eq!(channel.text(), "sample 499");
    }

    #[test]
    fn older_foreign_update_never_overwrites_newer_ui_update() {
        let (channel, _) = counting_channel();

        publish_from_worker(&channel, &["stale from worker"]);
        channel.publish("fresh from ui");

        assert!(!channel.pump());
        assert_eq!(channel.text(), "fresh from ui");
    }

    #[test]
    fn pump_off_the_ui_thread_is_a_noop() {
        let (channel, _) = counting_channel();
        publish_from_worker(&channel, &["pending"]);

        let worker = channel.clone();
        let pumped = thread::spawn(move || worker.pump()).join().unwrap();
        assert!(!pumped);
        assert_eq!(channel.text(), "");

        assert!(channel.pump());
        assert_eq!(channel.text(), "pending");
    }

    #[test]
    fn publish_after_close_is_silently_dropped() {
        let (channel, wakes) = counting_channel();
        channel.publish("before close");
        publish_from_worker(&channel, &["pending at close"]);

        channel.close();
        publish_from_worker(&channel, &["after close"]);
        channel.publish("ui after close");

        assert!(channel.is_closed());
        assert!(!channel.pump());
        assert_eq!(channel.text(), "before close");
        assert_eq!(wakes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn wake_drives_a_message_loop() {
        let (tx, rx) = mpsc::channel::<()>();
        let tx = Mutex::new(tx);
        let channel = StatusChannel::new(Box::new(move || {
            let _ = lock(&tx).send(());
        }));

        let worker = channel.clone();
        let handle = thread::spawn(move || worker.publish("Connected"));

        // One loop iteration: wait for a wake-up, then pump.
        rx.recv().unwrap();
        assert!(channel.pump());
        assert_eq!(channel.text(), "Connected");
        handle.join().unwrap();
    }

    #[test]
    fn concurrent_publishers_settle_on_a_published_value() {
        let (channel, _) = counting_channel();
        let workers: Vec<_> = (0..4)
            .map(|w| {
                let c = channel.clone();
                thread::spawn(move || {
                    for i in 0..100 {
                        c.publish(format!("worker {w} sample {i}"));
                    }
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }

        assert!(channel.pump());
        let text = channel.text();
        assert!(text.ends_with("sample 99"), "unexpected final text: {text}");
    }
}
