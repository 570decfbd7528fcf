use crate::event::{BuildOrder, Event};
use crate::types::{Construct, Count, Tick, TimeStamp};
use serde::{Deserialize, Serialize};

/// All player-issued commands. Each becomes exactly one `command-*` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum PlayerCommand {
    // ── Clock control ─────────────────────────────
    Play,
    Pause,
    IndirectPause,
    IndirectResume,
    StartEditingSpeed,
    SetSpeed { speed: f64 },

    // ── Constructs ────────────────────────────────
    SetWorkingCount { construct: Construct, count: Count },

    // ── Power grid ────────────────────────────────
    TripCircuitBreaker,
    ResetCircuitBreaker,

    // ── Fabricator ────────────────────────────────
    SetFabricatorQueue { queue: Vec<BuildOrder> },
    TurnOnFabricator,
    TurnOffFabricator,
    ClearFabricatorJob,
}

impl PlayerCommand {
    /// The command event, issued after `after_tick`. Only clock commands
    /// carry the wall-clock stamp.
    pub fn into_event(self, after_tick: Tick, time_stamp: Option<TimeStamp>) -> Event {
        match self {
            PlayerCommand::Play => Event::CommandSimulationClockPlay { after_tick, time_stamp },
            PlayerCommand::Pause => Event::CommandSimulationClockPause { after_tick, time_stamp },
            PlayerCommand::IndirectPause => {
                Event::CommandSimulationClockIndirectPause { after_tick, time_stamp }
            }
            PlayerCommand::IndirectResume => {
                Event::CommandSimulationClockIndirectResume { after_tick, time_stamp }
            }
            PlayerCommand::StartEditingSpeed => {
                Event::CommandSimulationClockStartEditingSpeed { after_tick, time_stamp }
            }
            PlayerCommand::SetSpeed { speed } => {
                Event::CommandSimulationClockSetSpeed { speed, after_tick, time_stamp }
            }
            PlayerCommand::SetWorkingCount { construct, count } => {
                Event::CommandSetWorkingCount { construct, count, after_tick }
            }
            PlayerCommand::TripCircuitBreaker => Event::CommandTripCircuitBreaker { after_tick },
            PlayerCommand::ResetCircuitBreaker => Event::CommandResetCircuitBreaker { after_tick },
            PlayerCommand::SetFabricatorQueue { queue } => {
                Event::CommandSetFabricatorQueue { queue, after_tick }
            }
            PlayerCommand::TurnOnFabricator => Event::CommandTurnOnFabricator { after_tick },
            PlayerCommand::TurnOffFabricator => Event::CommandTurnOffFabricator { after_tick },
            PlayerCommand::ClearFabricatorJob => Event::CommandClearFabricatorJob { after_tick },
        }
    }
}
