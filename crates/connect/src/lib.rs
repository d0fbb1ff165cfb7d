//! Connection establishment for a WhatsApp session: status polling, QR
//! image loading and pairing-code requests, each with its own retry rules.

pub mod backend;
pub mod controller;
pub mod events;
pub mod latch;
pub mod pairing;
pub mod qr;
pub mod retry;
pub mod status;

#[cfg(test)]
mod testing;

pub use backend::{ConnectBackend, StatusSource};
pub use controller::{start, ConnectHandle, ConnectPage, ConnectTimings};
pub use events::{ConnectCommand, ConnectEvent};
pub use latch::ConnectionLatch;
pub use retry::{Outcome, RetryPolicy, RetryState, RetryStep};
