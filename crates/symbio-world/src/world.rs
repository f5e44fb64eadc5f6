//! World driver: owns the population and advances it one update at a time.

use crate::host::Host;
use crate::interaction::{DonationExchange, InteractionPolicy};
use crate::population::{Population, PopulationStructure};
use crate::symbiont::Symbiont;
use serde::{Deserialize, Serialize};
use symbio_core::{Error, PopulationStats, RandomSource, Result, WorldParams};
use tracing::{debug, trace};

/// Counts of what happened during one update (or, accumulated, a whole run)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateReport {
    pub host_births: u64,
    /// Hosts displaced by an offspring landing in their slot
    pub hosts_evicted: u64,
    pub lysis_events: u64,
    pub burst_offspring: u64,
    pub horizontal_transmissions: u64,
    pub vertical_transmissions: u64,
    /// Free symbionts that found a host this update
    pub symbionts_placed: u64,
    /// Free symbionts discarded for lack of a host with room
    pub symbionts_dropped: u64,
}

impl UpdateReport {
    pub fn accumulate(&mut self, other: &UpdateReport) {
        self.host_births += other.host_births;
        self.hosts_evicted += other.hosts_evicted;
        self.lysis_events += other.lysis_events;
        self.burst_offspring += other.burst_offspring;
        self.horizontal_transmissions += other.horizontal_transmissions;
        self.vertical_transmissions += other.vertical_transmissions;
        self.symbionts_placed += other.symbionts_placed;
        self.symbionts_dropped += other.symbionts_dropped;
    }
}

/// Read-only view of one occupied slot, for presentation layers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlotView {
    pub index: usize,
    pub interaction_value: f64,
    pub symbiont_count: usize,
}

/// Symbiont in transit, remembering which slot released it
#[derive(Debug, Clone)]
struct FreeSymbiont {
    symbiont: Symbiont,
    origin: usize,
}

/// Host offspring waiting to be placed once every scheduled host has been visited
#[derive(Debug, Clone)]
struct PendingBirth {
    parent_slot: usize,
    host: Host,
}

pub struct World {
    params: WorldParams,
    population: Population,
    free_symbionts: Vec<FreeSymbiont>,
    policy: Box<dyn InteractionPolicy>,
    random: RandomSource,
    update: u64,
    last_injected: Option<usize>,
    totals: UpdateReport,
}

impl World {
    /// Empty well-mixed world using the default donation exchange
    pub fn new(params: WorldParams, random: RandomSource) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            population: Population::new(PopulationStructure::Mixed),
            free_symbionts: Vec::new(),
            policy: Box::new(DonationExchange),
            random,
            update: 0,
            last_injected: None,
            totals: UpdateReport::default(),
        })
    }

    /// Swap in a different resource exchange strategy
    pub fn with_policy(mut self, policy: impl InteractionPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn set_pop_struct_grid(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(Error::Validation(format!(
                "grid dimensions must be positive, got {}x{}",
                width, height
            )));
        }
        self.set_structure(PopulationStructure::Grid { width, height })
    }

    pub fn set_pop_struct_mixed(&mut self) -> Result<()> {
        self.set_structure(PopulationStructure::Mixed)
    }

    fn set_structure(&mut self, structure: PopulationStructure) -> Result<()> {
        if self.population.occupied_count() > 0 {
            return Err(Error::InvalidState(
                "population structure must be chosen before any host is injected".to_string(),
            ));
        }
        self.population = Population::new(structure);
        self.last_injected = None;
        Ok(())
    }

    /// Place a host in the next open slot. Returns the slot, or `None` if the
    /// structure is full and the host was dropped.
    pub fn inject(&mut self, host: Host) -> Option<usize> {
        let Some(slot) = self.population.next_open_slot() else {
            trace!(event = "host_dropped", "Injection failed: population full");
            return None;
        };
        self.population.place(slot, host);
        self.last_injected = Some(slot);
        Some(slot)
    }

    /// Place a symbiont into a host chosen by the active structure.
    ///
    /// On a grid the most recently injected host is tried first, then one of its
    /// neighbours; a mixed population picks a random host. Returns false when the
    /// symbiont was dropped.
    pub fn inject_symbiont(&mut self, symbiont: Symbiont) -> bool {
        let target = match (self.population.structure(), self.last_injected) {
            (PopulationStructure::Grid { .. }, Some(slot)) if self.population.is_occupied(slot) => {
                let has_room = self
                    .population
                    .get(slot)
                    .map_or(false, |host| host.has_capacity(self.params.sym_limit));
                if has_room {
                    Some(slot)
                } else {
                    self.population.neighbor_of(slot, &mut self.random)
                }
            }
            _ => self.population.random_occupied_slot(&mut self.random),
        };
        self.place_symbiont(target, symbiont)
    }

    fn place_symbiont(&mut self, target: Option<usize>, symbiont: Symbiont) -> bool {
        let sym_limit = self.params.sym_limit;
        target
            .and_then(|slot| self.population.get_mut(slot))
            .map_or(false, |host| host.add_symbiont(symbiont, sym_limit))
    }

    /// Advance the whole population by one update
    pub fn update(&mut self) -> UpdateReport {
        let mut report = UpdateReport::default();
        let mut births = Vec::new();

        // Offspring are staged, so this list is exactly who gets visited
        for slot in self.population.occupied_slots() {
            self.process_host(slot, &mut births, &mut report);
        }

        for birth in births {
            self.place_offspring(birth, &mut report);
        }

        self.drain_free_symbionts(&mut report);

        self.update += 1;
        self.totals.accumulate(&report);

        debug!(
            event = "update_complete",
            update = self.update,
            hosts = self.population.occupied_count(),
            host_births = report.host_births,
            hosts_evicted = report.hosts_evicted,
            lysis_events = report.lysis_events,
            burst_offspring = report.burst_offspring,
            horizontal_transmissions = report.horizontal_transmissions,
            vertical_transmissions = report.vertical_transmissions,
            symbionts_placed = report.symbionts_placed,
            symbionts_dropped = report.symbionts_dropped,
            "Update complete"
        );

        report
    }

    fn process_host(&mut self, slot: usize, births: &mut Vec<PendingBirth>, report: &mut UpdateReport) {
        // The host is held outside the population while it is processed and put
        // back afterwards unless it lysed.
        let Some(mut host) = self.population.take(slot) else {
            return;
        };
        // no burst can release more symbionts than the population could hold
        let burst_cap = self.population.len().saturating_mul(self.params.sym_limit);
        let params = &self.params;
        let random = &mut self.random;

        host.distribute_resources(params.res_per_update, params.synergy, self.policy.as_ref());
        let host_interaction = host.interaction_value();

        for symbiont in host.symbionts_mut() {
            if symbiont.tick_burst_timer() && params.lysis {
                if let Some(offspring) = symbiont.try_burst(params, burst_cap, random) {
                    report.lysis_events += 1;
                    report.burst_offspring += offspring.len() as u64;
                    debug!(
                        event = "lysis",
                        update = self.update,
                        slot = slot,
                        offspring = offspring.len(),
                        host_interaction = host_interaction,
                        "Symbiont lysed its host"
                    );
                    self.free_symbionts.extend(
                        offspring
                            .into_iter()
                            .map(|symbiont| FreeSymbiont { symbiont, origin: slot }),
                    );
                    // host and remaining residents die with the slot left empty
                    return;
                }
            }

            if params.horiz_trans
                && symbiont.resources() >= params.sym_horiz_trans_res
                && random.p(params.horiz_trans_prob)
            {
                symbiont.spend_resources(params.sym_horiz_trans_res);
                let offspring = symbiont.reproduce(random, params.mutation_rate, params.burst_time);
                self.free_symbionts.push(FreeSymbiont {
                    symbiont: offspring,
                    origin: slot,
                });
                report.horizontal_transmissions += 1;
            }
        }

        if host.can_reproduce(params.host_repro_res) {
            host.spend_resources(params.host_repro_res);
            let mut offspring = host.reproduce(random, params.mutation_rate);
            for symbiont in host.symbionts() {
                if random.p(params.vertical_transmission) {
                    let child = symbiont.reproduce(random, params.mutation_rate, params.burst_time);
                    if offspring.add_symbiont(child, params.sym_limit) {
                        report.vertical_transmissions += 1;
                    }
                }
            }
            trace!(
                event = "host_reproduced",
                update = self.update,
                parent_slot = slot,
                parent_interaction = host.interaction_value(),
                offspring_interaction = offspring.interaction_value(),
                offspring_symbionts = offspring.symbiont_count(),
                "Host reproduced"
            );
            births.push(PendingBirth {
                parent_slot: slot,
                host: offspring,
            });
        }

        self.population.place(slot, host);
    }

    fn place_offspring(&mut self, birth: PendingBirth, report: &mut UpdateReport) {
        let Some(target) = self.population.neighbor_of(birth.parent_slot, &mut self.random) else {
            return;
        };
        if let Some(evicted) = self.population.place(target, birth.host) {
            report.hosts_evicted += 1;
            trace!(
                event = "host_evicted",
                update = self.update,
                slot = target,
                lost_symbionts = evicted.symbiont_count(),
                "Offspring displaced a host"
            );
        }
        report.host_births += 1;
    }

    fn drain_free_symbionts(&mut self, report: &mut UpdateReport) {
        for free in std::mem::take(&mut self.free_symbionts) {
            let target = match self.population.structure() {
                PopulationStructure::Grid { .. } => {
                    self.population.neighbor_of(free.origin, &mut self.random)
                }
                PopulationStructure::Mixed => self.population.random_occupied_slot(&mut self.random),
            };
            if self.place_symbiont(target, free.symbiont) {
                report.symbionts_placed += 1;
            } else {
                report.symbionts_dropped += 1;
            }
        }
    }

    pub fn params(&self) -> &WorldParams {
        &self.params
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn host(&self, slot: usize) -> Option<&Host> {
        self.population.get(slot)
    }

    /// Number of living hosts
    pub fn size(&self) -> usize {
        self.population.occupied_count()
    }

    /// Updates completed so far
    pub fn update_count(&self) -> u64 {
        self.update
    }

    /// Counts accumulated over every update so far
    pub fn totals(&self) -> &UpdateReport {
        &self.totals
    }

    pub fn random_mut(&mut self) -> &mut RandomSource {
        &mut self.random
    }

    /// Per-slot view of the population, `None` for empty slots
    pub fn slots(&self) -> impl Iterator<Item = Option<SlotView>> + '_ {
        self.population.iter().map(|(index, host)| {
            host.map(|host| SlotView {
                index,
                interaction_value: host.interaction_value(),
                symbiont_count: host.symbiont_count(),
            })
        })
    }

    pub fn stats(&self) -> PopulationStats {
        let mut stats = PopulationStats::new(self.update);
        for (_, host) in self.population.iter() {
            let Some(host) = host else { continue };
            stats.record_host(host.interaction_value(), host.resources(), host.symbiont_count());
            for symbiont in host.symbionts() {
                stats.record_symbiont(symbiont.interaction_value());
            }
        }
        stats
    }
}
