//! Experiment wrapper: builds a world from a configuration and runs it.

use crate::host::Host;
use crate::symbiont::Symbiont;
use crate::world::{UpdateReport, World};
use serde::{Deserialize, Serialize};
use symbio_core::{PopulationStats, Result, RunId, SymConfig};
use tracing::{info, instrument};

/// A configured world, populated and ready to run
pub struct Experiment {
    run_id: RunId,
    config: SymConfig,
    seed: u64,
    world: World,
}

impl Experiment {
    pub fn new(config: SymConfig) -> Result<Self> {
        config.validate()?;

        let random = config.random_source();
        let seed = random.seed();
        let mut world = World::new(config.world_params(), random)?;
        if config.grid {
            world.set_pop_struct_grid(config.grid_x, config.grid_y)?;
        } else {
            world.set_pop_struct_mixed()?;
        }

        let mut experiment = Self {
            run_id: RunId::new(),
            config,
            seed,
            world,
        };
        experiment.populate();
        Ok(experiment)
    }

    /// Inject the starting hosts, each followed by its share of symbionts
    fn populate(&mut self) {
        let config = &self.config;
        let world = &mut self.world;

        for _ in 0..config.pop_size() {
            let host_int = config.host_int.sample(world.random_mut());
            world.inject(Host::new(host_int));

            for _ in 0..config.start_moi {
                let sym_int = config.sym_int.sample(world.random_mut());
                let mut symbiont = Symbiont::new(sym_int, config.burst_time);
                if config.stagger_burst_timers {
                    symbiont.stagger_burst_timer(world.random_mut());
                }
                world.inject_symbiont(symbiont);
            }
        }

        let stats = world.stats();
        info!(
            event = "population_injected",
            hosts = stats.host_count,
            symbionts = stats.symbiont_count,
            grid = config.grid,
            "Starting population injected"
        );
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn config(&self) -> &SymConfig {
        &self.config
    }

    /// Seed actually in use (differs from the configured one when it was re-chosen)
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Run the remaining configured updates, handing a snapshot to `on_sample`
    /// every `DATA_INT` updates.
    #[instrument(skip(self, on_sample), fields(run_id = %self.run_id, seed = self.seed, updates = self.config.updates))]
    pub fn run_with<F>(&mut self, mut on_sample: F) -> Result<()>
    where
        F: FnMut(&PopulationStats) -> Result<()>,
    {
        info!("Starting experiment for {} updates", self.config.updates);

        while self.world.update_count() < self.config.updates {
            self.world.update();

            if self.world.update_count() % self.config.data_int == 0 {
                let stats = self.world.stats();
                info!(
                    event = "population_sample",
                    update = stats.update,
                    hosts = stats.host_count,
                    symbionts = stats.symbiont_count,
                    mean_host_interaction = stats.mean_host_interaction,
                    mean_symbiont_interaction = stats.mean_symbiont_interaction,
                    "Population snapshot"
                );
                on_sample(&stats)?;
            }
        }

        Ok(())
    }

    /// Run to completion, keeping every sample
    pub fn execute(mut self) -> Result<ExperimentResult> {
        let mut samples = Vec::new();
        self.run_with(|stats| {
            samples.push(stats.clone());
            Ok(())
        })?;
        let mut result = self.finish();
        result.samples = samples;
        Ok(result)
    }

    /// Summarise the run so far
    pub fn finish(self) -> ExperimentResult {
        let final_stats = self.world.stats();
        let totals = *self.world.totals();

        info!(
            event = "run_summary",
            run_id = %self.run_id,
            seed = self.seed,
            updates = final_stats.update,
            hosts = final_stats.host_count,
            symbionts = final_stats.symbiont_count,
            host_births = totals.host_births,
            lysis_events = totals.lysis_events,
            horizontal_transmissions = totals.horizontal_transmissions,
            symbionts_dropped = totals.symbionts_dropped,
            "Experiment complete"
        );

        ExperimentResult {
            run_id: self.run_id,
            seed: self.seed,
            samples: Vec::new(),
            final_stats,
            totals,
        }
    }
}

/// Outcome of an experiment run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentResult {
    pub run_id: RunId,
    pub seed: u64,
    /// Snapshots taken every `DATA_INT` updates
    pub samples: Vec<PopulationStats>,
    pub final_stats: PopulationStats,
    pub totals: UpdateReport,
}
