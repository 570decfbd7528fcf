//! Save format: the event log plus every non-log processor.
//!
//! `{ "eventLog": {...}, "processors": [ {...}, ... ] }`
//!
//! Loading is lenient per processor: an entry with an unknown tag or a
//! malformed state is logged and skipped so that one bad record cannot
//! make a whole save unreadable.

use crate::{
    error::{SimError, SimResult},
    event_log::EventLog,
    processor::Processor,
    subscription::ProcessorTag,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveState {
    pub event_log:  EventLog,
    pub processors: Vec<Processor>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSave {
    event_log:  EventLog,
    processors: Vec<serde_json::Value>,
}

impl SaveState {
    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> SimResult<Self> {
        let raw: RawSave = serde_json::from_str(json).map_err(|e| SimError::InvalidSave {
            reason: e.to_string(),
        })?;

        let mut processors = Vec::with_capacity(raw.processors.len());
        for value in raw.processors {
            let id = value
                .get("id")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("<no id>")
                .to_string();
            match serde_json::from_value::<Processor>(value) {
                Ok(p) if p.tag() == ProcessorTag::EventLog => {
                    log::warn!("Save lists event log {id} among processors; ignored");
                }
                Ok(p) => processors.push(p),
                Err(e) => log::error!("Skipping processor {id} from save: {e}"),
            }
        }
        Ok(Self { event_log: raw.event_log, processors })
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> SimResult<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?)
            .map_err(|e| anyhow::anyhow!("Cannot write {}: {e}", path.display()))?;
        Ok(())
    }

    pub fn read_from(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
        Self::from_json(&content)
    }
}
