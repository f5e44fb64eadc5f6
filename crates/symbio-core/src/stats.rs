//! Population statistics handed to reporting layers.

use serde::{Deserialize, Serialize};

/// Aggregate snapshot of the population after an update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PopulationStats {
    /// Number of updates completed when the snapshot was taken
    pub update: u64,
    pub host_count: u64,
    pub symbiont_count: u64,
    pub mean_host_interaction: f64,
    pub mean_symbiont_interaction: f64,
    pub mean_host_resources: f64,
    /// Hosts carrying no symbionts at all
    pub uninfected_hosts: u64,
}

impl PopulationStats {
    pub fn new(update: u64) -> Self {
        Self {
            update,
            ..Self::default()
        }
    }

    /// Fold one host into the running means
    pub fn record_host(&mut self, interaction: f64, resources: f64, resident_count: usize) {
        let n = self.host_count as f64;
        let new_n = n + 1.0;

        self.mean_host_interaction = (self.mean_host_interaction * n + interaction) / new_n;
        self.mean_host_resources = (self.mean_host_resources * n + resources) / new_n;
        if resident_count == 0 {
            self.uninfected_hosts += 1;
        }

        self.host_count += 1;
    }

    /// Fold one resident symbiont into the running means
    pub fn record_symbiont(&mut self, interaction: f64) {
        let n = self.symbiont_count as f64;
        self.mean_symbiont_interaction =
            (self.mean_symbiont_interaction * n + interaction) / (n + 1.0);
        self.symbiont_count += 1;
    }

    /// Average number of residents per living host
    pub fn multiplicity_of_infection(&self) -> f64 {
        if self.host_count == 0 {
            0.0
        } else {
            self.symbiont_count as f64 / self.host_count as f64
        }
    }

    pub fn is_extinct(&self) -> bool {
        self.host_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incremental_means() {
        let mut stats = PopulationStats::new(3);
        stats.record_host(1.0, 10.0, 1);
        stats.record_host(-0.5, 30.0, 0);
        stats.record_symbiont(0.2);
        stats.record_symbiont(0.4);

        assert_eq!(stats.update, 3);
        assert_eq!(stats.host_count, 2);
        assert!((stats.mean_host_interaction - 0.25).abs() < 1e-12);
        assert!((stats.mean_host_resources - 20.0).abs() < 1e-12);
        assert!((stats.mean_symbiont_interaction - 0.3).abs() < 1e-12);
        assert_eq!(stats.uninfected_hosts, 1);
        assert!((stats.multiplicity_of_infection() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_population() {
        let stats = PopulationStats::new(0);
        assert!(stats.is_extinct());
        assert_eq!(stats.multiplicity_of_infection(), 0.0);
    }
}
