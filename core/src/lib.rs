//! Deterministic discrete-event core of a Dyson-swarm production game.
//!
//! Processors exchange typed events over a bus; the engine settles every
//! stimulus to a fixed point while stamping each effect with the logical
//! tick it belongs to.

pub mod clock;
pub mod collector_processor;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod event_log;
pub mod fabricator_processor;
pub mod manager_processor;
pub mod planet_processor;
pub mod power_grid_processor;
pub mod probe_processor;
pub mod processor;
pub mod production;
pub mod replay;
pub mod snapshot;
pub mod star_processor;
pub mod storage_processor;
pub mod store;
pub mod subscription;
pub mod summary;
pub mod swarm_processor;
pub mod types;

pub use engine::{SettleReport, Simulation};
pub use error::{SimError, SimResult};
pub use event::{BuildOrder, Event, EventTag};
