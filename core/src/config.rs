//! Game rules and engine tuning.
//!
//! `SimConfig::default()` carries the built-in game constants.
//! `SimConfig::load(path)` overlays a JSON file on top of them; any section
//! the file omits keeps its default.

use crate::types::{Construct, Count, Quantity, Resource, Tick};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Amount per resource. Missing entries read as zero.
pub type ResourceBundle = BTreeMap<Resource, Quantity>;

fn bundle<const N: usize>(entries: [(Resource, u64); N]) -> ResourceBundle {
    entries
        .into_iter()
        .map(|(resource, amount)| (resource, Quantity::from(amount)))
        .collect()
}

// ── Game rules ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRules {
    /// What one working unit consumes per tick.
    pub tick_consumption:   BTreeMap<Construct, ResourceBundle>,
    /// What one working unit produces per tick.
    pub tick_production:    BTreeMap<Construct, ResourceBundle>,
    pub construction_costs: BTreeMap<Construct, ResourceBundle>,
    pub star_flux_per_tick: Quantity,
    /// Flux reflected onto the collectors by each satellite in the swarm.
    pub reflection_per_satellite: Quantity,
}

impl Default for GameRules {
    fn default() -> Self {
        use Construct::*;
        use Resource::*;

        let tick_consumption = BTreeMap::from([
            (Miner, bundle([(Electricity, 3)])),
            (Refiner, bundle([(Electricity, 5), (Ore, 5)])),
            (Factory, bundle([(Electricity, 25), (Metal, 7)])),
            (Launcher, bundle([(Electricity, 1400), (PackagedSatellite, 1)])),
        ]);
        let tick_production = BTreeMap::from([
            (Collector, bundle([(Electricity, 1)])),
            (Miner, bundle([(Ore, 1)])),
            (Refiner, bundle([(Metal, 3)])),
            (Factory, bundle([(PackagedSatellite, 1)])),
        ]);
        let construction_costs = BTreeMap::from([
            (Collector, bundle([(Electricity, 100), (Metal, 10)])),
            (Miner, bundle([(Electricity, 150), (Metal, 30)])),
            (Refiner, bundle([(Electricity, 500), (Metal, 45)])),
            (Launcher, bundle([(Electricity, 2_000), (Metal, 170)])),
            (Factory, bundle([(Electricity, 10_000), (Metal, 1_300)])),
        ]);

        Self {
            tick_consumption,
            tick_production,
            construction_costs,
            star_flux_per_tick: Quantity::from(1),
            reflection_per_satellite: Quantity::from(1),
        }
    }
}

impl GameRules {
    /// Per-tick need of `working` units of `construct`.
    pub fn consumption(&self, construct: Construct, working: Count) -> ResourceBundle {
        scale(self.tick_consumption.get(&construct), working)
    }

    /// Per-tick output of `working` units of `construct` in `resource`.
    pub fn production(&self, construct: Construct, resource: Resource, working: Count) -> Quantity {
        self.tick_production
            .get(&construct)
            .and_then(|b| b.get(&resource))
            .map(|per_unit| per_unit * working)
            .unwrap_or_default()
    }

    pub fn construction_cost(&self, construct: Construct) -> ResourceBundle {
        self.construction_costs
            .get(&construct)
            .cloned()
            .unwrap_or_default()
    }
}

fn scale(per_unit: Option<&ResourceBundle>, count: Count) -> ResourceBundle {
    per_unit
        .map(|b| b.iter().map(|(r, q)| (*r, q * count)).collect())
        .unwrap_or_default()
}

// ── Engine tuning ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Hard cap on passes of one settle loop.
    pub max_settle_passes: usize,
    /// Ticks between processor snapshots. 0 disables snapshots.
    pub snapshot_interval: Tick,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_settle_passes: 10_000,
            snapshot_interval: 100,
        }
    }
}

// ── Fresh game ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreshGameConfig {
    pub grid_charge:     Quantity,
    pub metal_stock:     Quantity,
    pub collector_count: Count,
    pub star_mass:       Quantity,
    pub planet_mass:     Quantity,
}

impl Default for FreshGameConfig {
    fn default() -> Self {
        Self {
            grid_charge:     Quantity::from(22 * 22),
            metal_stock:     Quantity::from(200),
            collector_count: 15,
            star_mass:       Quantity::scientific(1_988_500, 24),
            planet_mass:     Quantity::scientific(3_301, 20),
        }
    }
}

// ── Top level ──────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub rules:      GameRules,
    pub engine:     EngineConfig,
    pub fresh_game: FreshGameConfig,
}

impl SimConfig {
    /// Load from a JSON file. Missing sections keep their defaults.
    /// In tests, use SimConfig::default().
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
        let config: SimConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {}: {e}", path.display()))?;
        log::info!(
            "Loaded config from {} (max_settle_passes={}, snapshot_interval={})",
            path.display(),
            config.engine.max_settle_passes,
            config.engine.snapshot_interval,
        );
        Ok(config)
    }
}
