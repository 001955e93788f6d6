//! Status channel between the monitoring engine and the UI thread.
//!
//! The engine reports status text from its own worker threads, but the
//! label that displays it may only be touched from the UI thread. A
//! [`StatusChannel`] is created on the UI thread and remembers it as its
//! owner:
//! - calls made on the owner thread update the label immediately
//! - calls made anywhere else are parked in a single pending slot and the
//!   UI is woken up so it can [`pump`](StatusChannel::pump) them in
//!
//! Only the most recent message matters, so a burst of foreign updates
//! collapses into one UI-side update.

mod channel;

pub use channel::{StatusChannel, WakeFn};
