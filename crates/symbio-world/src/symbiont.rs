//! Symbiont state and lifecycle.

use serde::{Deserialize, Serialize};
use symbio_core::{clamp_interaction, BurstSize, RandomSource, WorldParams, BURST_STAGGER_WINDOW};

/// A symbiont living inside a host, or in transit between hosts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbiont {
    interaction_value: f64,
    resources: f64,
    burst_timer: i32,
}

impl Symbiont {
    /// New symbiont with an empty resource pool and a full burst timer
    pub fn new(interaction_value: f64, burst_time: u32) -> Self {
        Self {
            interaction_value: clamp_interaction(interaction_value),
            resources: 0.0,
            burst_timer: i32::try_from(burst_time).unwrap_or(i32::MAX),
        }
    }

    pub fn interaction_value(&self) -> f64 {
        self.interaction_value
    }

    pub fn resources(&self) -> f64 {
        self.resources
    }

    pub fn burst_timer(&self) -> i32 {
        self.burst_timer
    }

    pub fn set_burst_timer(&mut self, ticks: i32) {
        self.burst_timer = ticks;
    }

    /// Shift the burst timer by a random offset so bursts don't line up population-wide
    pub fn stagger_burst_timer(&mut self, random: &mut RandomSource) {
        let (lo, hi) = BURST_STAGGER_WINDOW;
        let offset = random.get_int(lo, hi);
        self.burst_timer = self.burst_timer.saturating_add(offset).max(0);
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

    pub fn mutate(&mut self, random: &mut RandomSource, std_dev: f64) {
        let delta = random.get_rand_normal(0.0, std_dev);
        self.interaction_value = clamp_interaction(self.interaction_value + delta);
    }

    /// Mutated offspring with a fresh timer and no resources. The parent is untouched.
    pub fn reproduce(&self, random: &mut RandomSource, std_dev: f64, burst_time: u32) -> Symbiont {
        let mut offspring = Symbiont::new(self.interaction_value, burst_time);
        offspring.mutate(random, std_dev);
        offspring
    }

    /// Count down one update; returns true once the timer has run out
    pub fn tick_burst_timer(&mut self) -> bool {
        self.burst_timer = self.burst_timer.saturating_sub(1);
        self.burst_timer <= 0
    }

    /// Evaluate a due burst.
    ///
    /// With enough resources the burst cost is paid and at most `max_offspring`
    /// offspring are returned; otherwise the timer restarts and `None` is returned.
    /// An unlimited burst pays `SYM_LYSIS_RES` only for the offspring it produces.
    pub fn try_burst(
        &mut self,
        params: &WorldParams,
        max_offspring: usize,
        random: &mut RandomSource,
    ) -> Option<Vec<Symbiont>> {
        if self.resources < params.sym_lysis_res {
            self.burst_timer = i32::try_from(params.burst_time).unwrap_or(i32::MAX);
            return None;
        }

        let max_offspring = u64::try_from(max_offspring).unwrap_or(u64::MAX);
        let count = match params.burst_size {
            BurstSize::Count(_) => {
                self.resources -= params.sym_lysis_res;
                params.offspring_per_burst().unwrap_or(0).min(max_offspring)
            }
            BurstSize::Unlimited => {
                let affordable = (self.resources / params.sym_lysis_res).floor();
                let count = if affordable >= max_offspring as f64 {
                    max_offspring
                } else {
                    affordable as u64
                };
                self.resources -= count as f64 * params.sym_lysis_res;
                count
            }
        };

        Some(
            (0..count)
                .map(|_| self.reproduce(random, params.mutation_rate, params.burst_time))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn lysis_params() -> WorldParams {
        WorldParams {
            lysis: true,
            burst_size: BurstSize::Count(10),
            burst_time: 5,
            sym_lysis_res: 4.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_symbiont_creation() {
        let sym = Symbiont::new(0.5, 10);
        assert_eq!(sym.interaction_value(), 0.5);
        assert_eq!(sym.resources(), 0.0);
        assert_eq!(sym.burst_timer(), 10);

        let clamped = Symbiont::new(-4.0, 10);
        assert_eq!(clamped.interaction_value(), -1.0);
    }

    #[test]
    fn test_resource_management() {
        let mut sym = Symbiont::new(0.0, 10);
        sym.add_resources(50.0);
        assert!(sym.spend_resources(20.0));
        assert_eq!(sym.resources(), 30.0);
        assert!(!sym.spend_resources(100.0));
        assert_eq!(sym.resources(), 30.0);
    }

    #[test]
    fn test_reproduce_leaves_parent_alone() {
        let mut random = RandomSource::from_seed(5);
        let mut parent = Symbiont::new(0.3, 10);
        parent.add_resources(12.0);
        parent.set_burst_timer(2);

        let child = parent.reproduce(&mut random, 0.1, 10);
        assert_eq!(parent.interaction_value(), 0.3);
        assert_eq!(parent.resources(), 12.0);
        assert_eq!(child.resources(), 0.0);
        assert_eq!(child.burst_timer(), 10);
        assert_ne!(child.interaction_value(), 0.3);
    }

    #[test]
    fn test_burst_timer_countdown() {
        let mut sym = Symbiont::new(0.0, 2);
        assert!(!sym.tick_burst_timer());
        assert!(sym.tick_burst_timer());

        let mut zero = Symbiont::new(0.0, 0);
        assert!(zero.tick_burst_timer());
    }

    #[test]
    fn test_stagger_stays_in_window() {
        let mut random = RandomSource::from_seed(10);
        for _ in 0..200 {
            let mut sym = Symbiont::new(0.0, 10);
            sym.stagger_burst_timer(&mut random);
            assert!((5..=15).contains(&sym.burst_timer()));

            let mut short = Symbiont::new(0.0, 2);
            short.stagger_burst_timer(&mut random);
            assert!(short.burst_timer() >= 0);
        }
    }

    #[test]
    fn test_burst_with_resources() {
        let params = lysis_params();
        let mut random = RandomSource::from_seed(1);
        let mut sym = Symbiont::new(-0.5, 5);
        sym.add_resources(5.0);

        let offspring = sym.try_burst(&params, usize::MAX, &mut random).expect("burst should happen");
        assert_eq!(offspring.len(), 2);
        assert_eq!(sym.resources(), 1.0);
        assert!(offspring.iter().all(|o| o.resources() == 0.0));
    }

    #[test]
    fn test_failed_burst_resets_timer() {
        let params = lysis_params();
        let mut random = RandomSource::from_seed(1);
        let mut sym = Symbiont::new(-0.5, 5);
        sym.set_burst_timer(0);
        sym.add_resources(1.0);

        assert!(sym.try_burst(&params, usize::MAX, &mut random).is_none());
        assert_eq!(sym.burst_timer(), 5);
        assert_eq!(sym.resources(), 1.0);
    }

    #[test]
    fn test_unlimited_burst_spends_everything_it_can() {
        let params = WorldParams {
            burst_size: BurstSize::Unlimited,
            sym_lysis_res: 2.0,
            ..lysis_params()
        };
        let mut random = RandomSource::from_seed(1);
        let mut sym = Symbiont::new(0.0, 5);
        sym.add_resources(7.0);

        let offspring = sym.try_burst(&params, usize::MAX, &mut random).unwrap();
        assert_eq!(offspring.len(), 3);
        assert_eq!(sym.resources(), 1.0);
    }

    #[test]
    fn test_unlimited_burst_capped_and_charged_per_offspring() {
        let params = WorldParams {
            burst_size: BurstSize::Unlimited,
            sym_lysis_res: 1e-9,
            ..lysis_params()
        };
        let mut random = RandomSource::from_seed(1);
        let mut sym = Symbiont::new(0.0, 5);
        sym.add_resources(100.0);

        let offspring = sym.try_burst(&params, 4, &mut random).unwrap();
        assert_eq!(offspring.len(), 4);
        assert!((sym.resources() - (100.0 - 4e-9)).abs() < 1e-9);
    }

    #[test]
    fn test_fixed_burst_capped() {
        let params = lysis_params();
        let mut random = RandomSource::from_seed(1);
        let mut sym = Symbiont::new(0.0, 5);
        sym.add_resources(5.0);

        let offspring = sym.try_burst(&params, 1, &mut random).unwrap();
        assert_eq!(offspring.len(), 1);
        assert_eq!(sym.resources(), 1.0);
    }

    proptest! {
        #[test]
        fn prop_mutation_stays_in_range(
            seed in any::<u64>(),
            start in -1.0f64..=1.0,
            std_dev in 0.0f64..1e9,
        ) {
            let mut random = RandomSource::from_seed(seed);
            let mut sym = Symbiont::new(start, 10);
            for _ in 0..5 {
                sym.mutate(&mut random, std_dev);
                prop_assert!((-1.0..=1.0).contains(&sym.interaction_value()));
            }
        }
    }
}
