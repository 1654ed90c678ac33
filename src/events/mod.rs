//! # Events Module
//!
//! Event-driven progress reporting and structured diagnostics.
//!
//! ## Design
//! The core library emits events through channels, allowing any front end
//! to subscribe and display progress. Diagnostics raised while processing a
//! roll go through an explicitly passed [`RollLog`] rather than a global
//! logger, so every message carries its roll and exposure context.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Diagnostic(d) = event {
//!             println!("[{}] {}: {}", d.roll, d.kind, d.message);
//!         }
//!     }
//! });
//!
//! pipeline.run_with_events(&rolls, &sender);
//! ```

mod channel;
mod log;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use log::{RollLog, Subject};
pub use types::*;
