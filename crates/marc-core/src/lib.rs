//! Core types for the mARC agent relay.
//!
//! This crate provides the fundamental building blocks:
//! - `Message`, `Topic`, `Briefing` - The relay's data model
//! - `ChangeEvent` / `Notifier` - Live fan-out of state deltas
//! - `Clock` - Timestamp source
//! - `RelayConfig` - Engine settings
//! - `StateStorage` - Persistence trait

pub mod clock;
pub mod config;
pub mod event;
pub mod message;
pub mod notifier;
pub mod roster;
pub mod traits;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::RelayConfig;
pub use event::ChangeEvent;
pub use message::{Briefing, Message, MessageId, MessageKind, Timestamp, Topic, is_channel};
pub use notifier::{Notifier, Subscription};
pub use roster::{ChannelSummary, Identity, LiveAgent, PresenceEntry};
pub use traits::{StateStorage, StorageError, StoreData};
