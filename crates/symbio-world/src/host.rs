//! Host state and management.

use crate::interaction::InteractionPolicy;
use crate::symbiont::Symbiont;
use serde::{Deserialize, Serialize};
use symbio_core::{clamp_interaction, RandomSource};

/// A host occupying one population slot, together with its resident symbionts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Host {
    interaction_value: f64,
    resources: f64,
    symbionts: Vec<Symbiont>,
}

impl Host {
    pub fn new(interaction_value: f64) -> Self {
        Self {
            interaction_value: clamp_interaction(interaction_value),
            resources: 0.0,
            symbionts: Vec::new(),
        }
    }

    pub fn interaction_value(&self) -> f64 {
        self.interaction_value
    }

    pub fn resources(&self) -> f64 {
        self.resources
    }

    pub fn symbionts(&self) -> &[Symbiont] {
        &self.symbionts
    }

    pub fn symbionts_mut(&mut self) -> &mut [Symbiont] {
        &mut self.symbionts
    }

    pub fn symbiont_count(&self) -> usize {
        self.symbionts.len()
    }

    pub fn has_capacity(&self, sym_limit: usize) -> bool {
        self.symbionts.len() < sym_limit
    }

    /// Take in a symbiont if there is room; otherwise the symbiont is dropped
    pub fn add_symbiont(&mut self, symbiont: Symbiont, sym_limit: usize) -> bool {
        if self.has_capacity(sym_limit) {
            self.symbionts.push(symbiont);
            true
        } else {
            false
        }
    }

    pub fn add_resources(&mut self, amount: f64) {
        self.resources += amount;
    }

    /// Spend `amount` if the pool covers it
    pub fn spend_resources(&mut self, amount: f64) -> bool {
        if self.resources >= amount {
            self.resources -= amount;
            true
        } else {
            false
        }
    }

    pub fn can_reproduce(&self, threshold: f64) -> bool {
        self.resources >= threshold
    }

    /// Share this update's incoming resources with the residents.
    ///
    /// Each resident receives an equal share which the policy splits between it and
    /// the host. A host without residents keeps everything.
    pub fn distribute_resources(
        &mut self,
        resources: f64,
        synergy: f64,
        policy: &dyn InteractionPolicy,
    ) {
        if self.symbionts.is_empty() {
            self.resources += resources;
            return;
        }

        let share = resources / self.symbionts.len() as f64;
        let host_int = self.interaction_value;
        let mut host_gain = 0.0;
        for symbiont in &mut self.symbionts {
            let exchange = policy.exchange(host_int, symbiont.interaction_value(), share, synergy);
            symbiont.add_resources(exchange.symbiont);
            host_gain += exchange.host;
        }
        self.resources += host_gain;
    }

    pub fn mutate(&mut self, random: &mut RandomSource, std_dev: f64) {
        let delta = random.get_rand_normal(0.0, std_dev);
        self.interaction_value = clamp_interaction(self.interaction_value + delta);
    }

    /// Mutated offspring with no resources and no residents.
    ///
    /// The parent's resource pool is left for the caller to charge.
    pub fn reproduce(&self, random: &mut RandomSource, std_dev: f64) -> Host {
        let mut offspring = Host::new(self.interaction_value);
        offspring.mutate(random, std_dev);
        offspring
    }
}
