//! Configuration types for the simulation.

use crate::error::{Error, Result};
use crate::random::RandomSource;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Burst sizes at or above this value mean "no fixed burst size".
pub const UNLIMITED_BURST_SIZE: u64 = 999_999_999;

/// Offset window applied to starting burst timers when staggering is enabled.
pub const BURST_STAGGER_WINDOW: (i32, i32) = (-5, 5);

/// How an injected agent's starting interaction value is chosen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "InteractionRepr")]
pub enum InitialInteraction {
    /// Every injected agent starts with this value
    Fixed(f64),
    /// Each injected agent draws uniformly from [-1, 1)
    Random,
}

impl InitialInteraction {
    /// Resolve to a concrete interaction value, drawing if needed
    pub fn sample(&self, random: &mut RandomSource) -> f64 {
        match self {
            InitialInteraction::Fixed(value) => *value,
            InitialInteraction::Random => random.get_double(-1.0, 1.0),
        }
    }
}

impl Default for InitialInteraction {
    fn default() -> Self {
        InitialInteraction::Fixed(0.0)
    }
}

// Accepts `{"fixed": 0.5}`, `"random"`, or a bare number where -2 is the legacy
// spelling of "random".
#[derive(Deserialize)]
#[serde(untagged)]
enum InteractionRepr {
    Number(f64),
    Tagged(TaggedInteraction),
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum TaggedInteraction {
    Fixed(f64),
    Random,
}

impl From<InteractionRepr> for InitialInteraction {
    fn from(repr: InteractionRepr) -> Self {
        match repr {
            InteractionRepr::Number(value) if value == -2.0 => InitialInteraction::Random,
            InteractionRepr::Number(value) => InitialInteraction::Fixed(value),
            InteractionRepr::Tagged(TaggedInteraction::Fixed(value)) => {
                InitialInteraction::Fixed(value)
            }
            InteractionRepr::Tagged(TaggedInteraction::Random) => InitialInteraction::Random,
        }
    }
}

/// Number of offspring a lysis burst may release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BurstSize {
    Count(u64),
    Unlimited,
}

impl BurstSize {
    pub fn from_raw(raw: u64) -> Self {
        if raw >= UNLIMITED_BURST_SIZE {
            BurstSize::Unlimited
        } else {
            BurstSize::Count(raw)
        }
    }
}

/// Parameters the world consults during every update. Immutable after setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldParams {
    /// Standard deviation of the Gaussian mutation applied to offspring
    pub mutation_rate: f64,
    /// Multiplier on resources a cooperative symbiont returns to its host
    pub synergy: f64,
    /// Probability each resident symbiont is copied into a host's offspring
    pub vertical_transmission: f64,
    /// Maximum residents per host
    pub sym_limit: usize,
    pub lysis: bool,
    pub horiz_trans: bool,
    pub burst_size: BurstSize,
    /// Ticks between lysis evaluations
    pub burst_time: u32,
    /// Resources a host needs (and spends) to reproduce
    pub host_repro_res: f64,
    /// Resources a symbiont spends on a lysis burst
    pub sym_lysis_res: f64,
    /// Resources a symbiont needs (and spends) for horizontal transmission
    pub sym_horiz_trans_res: f64,
    /// Probability an eligible symbiont actually transmits horizontally
    pub horiz_trans_prob: f64,
    /// Resources injected into every host each update
    pub res_per_update: f64,
}

impl Default for WorldParams {
    fn default() -> Self {
        Self {
            mutation_rate: 0.002,
            synergy: 5.0,
            vertical_transmission: 1.0,
            sym_limit: 1,
            lysis: false,
            horiz_trans: false,
            burst_size: BurstSize::Count(10),
            burst_time: 10,
            host_repro_res: 1000.0,
            sym_lysis_res: 1.0,
            sym_horiz_trans_res: 100.0,
            horiz_trans_prob: 1.0,
            res_per_update: 100.0,
        }
    }
}

impl WorldParams {
    /// Offspring released by one burst when the burst size is fixed
    pub fn offspring_per_burst(&self) -> Option<u64> {
        match self.burst_size {
            BurstSize::Count(size) => Some(size / u64::from(self.burst_time.max(1))),
            BurstSize::Unlimited => None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.burst_time == 0 {
            return Err(Error::Validation("BURST_TIME must be at least 1".to_string()));
        }
        if let BurstSize::Count(size) = self.burst_size {
            if size % u64::from(self.burst_time) != 0 {
                return Err(Error::Validation(
                    "BURST_SIZE must be an integer multiple of BURST_TIME".to_string(),
                ));
            }
        } else if self.sym_lysis_res <= 0.0 {
            return Err(Error::Validation(
                "SYM_LYSIS_RES must be positive when BURST_SIZE is unlimited".to_string(),
            ));
        }

        check_probability("VERTICAL_TRANSMISSION", self.vertical_transmission)?;
        check_probability("HORIZ_TRANS_PROB", self.horiz_trans_prob)?;
        check_non_negative("MUTATION_RATE", self.mutation_rate)?;
        check_non_negative("SYNERGY", self.synergy)?;
        check_non_negative("HOST_REPRO_RES", self.host_repro_res)?;
        check_non_negative("SYM_LYSIS_RES", self.sym_lysis_res)?;
        check_non_negative("SYM_HORIZ_TRANS_RES", self.sym_horiz_trans_res)?;
        check_non_negative("RES_PER_UPDATE", self.res_per_update)?;
        Ok(())
    }
}

/// Full experiment configuration, keyed by the classic option names
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default, deny_unknown_fields)]
pub struct SymConfig {
    /// Random seed; values <= 0 pick a seed from OS entropy
    pub seed: i64,
    /// Updates between data samples
    pub data_int: u64,
    pub mutation_rate: f64,
    pub synergy: f64,
    pub vertical_transmission: f64,
    pub host_int: InitialInteraction,
    pub sym_int: InitialInteraction,
    pub grid_x: u32,
    pub grid_y: u32,
    /// Number of updates to run
    pub updates: u64,
    pub sym_limit: usize,
    pub lysis: bool,
    pub horiz_trans: bool,
    pub burst_size: u64,
    pub burst_time: u32,
    pub host_repro_res: f64,
    pub sym_lysis_res: f64,
    pub sym_horiz_trans_res: f64,
    /// Symbionts injected per starting host
    pub start_moi: u32,
    /// Spatial grid when true, well-mixed population otherwise
    pub grid: bool,
    pub res_per_update: f64,
    pub horiz_trans_prob: f64,
    pub stagger_burst_timers: bool,
    /// Output directory prefix for data files
    pub file_path: String,
    /// Root output file name; empty disables file output
    pub file_name: String,
}

impl Default for SymConfig {
    fn default() -> Self {
        let params = WorldParams::default();
        Self {
            seed: 10,
            data_int: 100,
            mutation_rate: params.mutation_rate,
            synergy: params.synergy,
            vertical_transmission: params.vertical_transmission,
            host_int: InitialInteraction::default(),
            sym_int: InitialInteraction::default(),
            grid_x: 5,
            grid_y: 5,
            updates: 1,
            sym_limit: params.sym_limit,
            lysis: params.lysis,
            horiz_trans: params.horiz_trans,
            burst_size: 10,
            burst_time: params.burst_time,
            host_repro_res: params.host_repro_res,
            sym_lysis_res: params.sym_lysis_res,
            sym_horiz_trans_res: params.sym_horiz_trans_res,
            start_moi: 1,
            grid: false,
            res_per_update: params.res_per_update,
            horiz_trans_prob: params.horiz_trans_prob,
            stagger_burst_timers: true,
            file_path: String::new(),
            file_name: "_data_".to_string(),
        }
    }
}

/// Options whose values are kept as plain text on the command line
const STRING_OPTIONS: &[&str] = &["FILE_PATH", "FILE_NAME"];

impl SymConfig {
    /// Read and validate a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: SymConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Override a single option by its configuration key, e.g. `("SEED", "4")`.
    ///
    /// The value is parsed as JSON, falling back to a plain string. Unknown keys are rejected.
    pub fn set_option(&mut self, key: &str, raw_value: &str) -> Result<()> {
        let mut tree = serde_json::to_value(&*self)?;
        let fields = tree
            .as_object_mut()
            .ok_or_else(|| Error::InvalidState("configuration is not an object".to_string()))?;
        if !fields.contains_key(key) {
            return Err(Error::Validation(format!("unknown configuration option: {}", key)));
        }
        let value = match serde_json::from_str::<serde_json::Value>(raw_value) {
            Ok(serde_json::Value::String(text)) => serde_json::Value::String(text),
            _ if STRING_OPTIONS.contains(&key) => serde_json::Value::String(raw_value.to_string()),
            Ok(parsed) => parsed,
            Err(_) => serde_json::Value::String(raw_value.to_string()),
        };
        fields.insert(key.to_string(), value);
        *self = serde_json::from_value(tree)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.world_params().validate()?;

        if self.grid_x == 0 || self.grid_y == 0 {
            return Err(Error::Validation("GRID_X and GRID_Y must be positive".to_string()));
        }
        if self.data_int == 0 {
            return Err(Error::Validation("DATA_INT must be positive".to_string()));
        }
        for (name, initial) in [("HOST_INT", self.host_int), ("SYM_INT", self.sym_int)] {
            if let InitialInteraction::Fixed(value) = initial {
                if !(-1.0..=1.0).contains(&value) {
                    return Err(Error::Validation(format!(
                        "{} must lie in [-1, 1] (or be random), got {}",
                        name, value
                    )));
                }
            }
        }
        Ok(())
    }

    /// Number of hosts injected at setup
    pub fn pop_size(&self) -> usize {
        self.grid_x as usize * self.grid_y as usize
    }

    pub fn world_params(&self) -> WorldParams {
        WorldParams {
            mutation_rate: self.mutation_rate,
            synergy: self.synergy,
            vertical_transmission: self.vertical_transmission,
            sym_limit: self.sym_limit,
            lysis: self.lysis,
            horiz_trans: self.horiz_trans,
            burst_size: BurstSize::from_raw(self.burst_size),
            burst_time: self.burst_time,
            host_repro_res: self.host_repro_res,
            sym_lysis_res: self.sym_lysis_res,
            sym_horiz_trans_res: self.sym_horiz_trans_res,
            horiz_trans_prob: self.horiz_trans_prob,
            res_per_update: self.res_per_update,
        }
    }

    /// Build the random source for this run, re-choosing the seed if asked to
    pub fn random_source(&self) -> RandomSource {
        if self.seed <= 0 {
            let random = RandomSource::from_entropy();
            tracing::info!(seed = random.seed(), "Seed re-chosen from entropy");
            random
        } else {
            RandomSource::from_seed(self.seed as u64)
        }
    }
}

fn check_probability(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::Validation(format!("{} must lie in [0, 1], got {}", name, value)))
    }
}

fn check_non_negative(name: &str, value: f64) -> Result<()> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(Error::Validation(format!("{} must not be negative, got {}", name, value)))
    }
}
