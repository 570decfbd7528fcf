//! Objective probe: a passive observer that turns player-visible milestones
//! into triggers for the walkthrough tracker. Emits nothing.

use crate::event::Event;
use crate::processor::{Process, StepContext};
use crate::types::Construct;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "trigger", content = "construct", rename_all = "kebab-case")]
pub enum ObjectiveTrigger {
    EditedFabricatorQueue,
    Fabricated(Construct),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveProbe {
    #[serde(default)]
    pub triggers: Vec<ObjectiveTrigger>,
}

impl ObjectiveProbe {
    pub fn drain(&mut self) -> Vec<ObjectiveTrigger> {
        std::mem::take(&mut self.triggers)
    }
}

impl Process for ObjectiveProbe {
    fn process(&mut self, _ctx: &StepContext<'_>, inbox: Vec<Event>) -> Vec<Event> {
        for event in inbox {
            match event {
                Event::CommandSetFabricatorQueue { .. } => {
                    self.triggers.push(ObjectiveTrigger::EditedFabricatorQueue)
                }
                Event::ConstructFabricated { construct, .. } => {
                    self.triggers.push(ObjectiveTrigger::Fabricated(construct))
                }
                _ => {}
            }
        }
        Vec::new()
    }
}
