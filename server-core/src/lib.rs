//! The real-time authoritative room engine shared by every game mode: connection and
//! session management (C7), reconnect (C9), message dispatch (C8), room lifecycle
//! helpers (C4), the tick scheduler (C5), broadcast fan-out (C11), lobby orchestration
//! and matchmaking (C10), the optional persistence adapter (C14), and admin/metrics
//! shapes (C15). Mode crates (`mode-board`, `mode-warfront`, ...) depend on this crate
//! for everything that is common across modes and own only their simulation-specific
//! state and tick pipeline.

pub mod admin;
pub mod broadcast;
pub mod config;
pub mod connection;
pub mod dispatcher;
pub mod lobby;
pub mod persistence;
pub mod reconnect;
pub mod room;
pub mod tick;
pub mod watchdog;

pub use broadcast::Broadcaster;
pub use config::Config;
pub use connection::{ConnectionRegistry, SharedConnectionRegistry};
pub use dispatcher::{Dispatcher, ModeRouter};
pub use lobby::{CountdownHandle, MatchmakingQueue, QueuedPlayer};
pub use persistence::{InMemoryPersistenceAdapter, NoopPersistenceAdapter, PersistenceAdapter, RoomSummary};
pub use reconnect::ReconnectBroker;
pub use room::{ModePlayer, RoomCore, RoomStatus};
pub use tick::TickScheduler;
pub use watchdog::Watchdog;
