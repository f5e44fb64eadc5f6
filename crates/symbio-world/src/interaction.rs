//! Resource exchange between a host and one resident symbiont.

use std::fmt;

/// Resources each side keeps from one exchange. Both parts are never negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exchange {
    pub host: f64,
    pub symbiont: f64,
}

impl Exchange {
    pub fn new(host: f64, symbiont: f64) -> Self {
        Self {
            host: host.max(0.0),
            symbiont: symbiont.max(0.0),
        }
    }
}

/// Strategy deciding how a share of incoming resources is split between a host
/// and a resident symbiont, given both interaction values and the synergy multiplier.
pub trait InteractionPolicy: fmt::Debug + Send + Sync {
    fn exchange(&self, host_int: f64, sym_int: f64, resources: f64, synergy: f64) -> Exchange;
}

/// Donation/defense/theft model keyed on the signs of the two interaction values.
///
/// A positive host donates part of its share; a positive symbiont returns part
/// of the donation multiplied by synergy. A negative host spends resources on
/// defense; a negative symbiont steals whatever the defense fails to cover.
#[derive(Debug, Clone, Copy, Default)]
pub struct DonationExchange;

impl InteractionPolicy for DonationExchange {
    fn exchange(&self, host_int: f64, sym_int: f64, resources: f64, synergy: f64) -> Exchange {
        if host_int >= 0.0 && sym_int >= 0.0 {
            let donation = resources * host_int;
            let returned = donation * sym_int;
            Exchange::new(
                resources - donation + returned * synergy,
                donation - returned,
            )
        } else if host_int <= 0.0 && sym_int < 0.0 {
            let defense = -host_int * resources;
            let remaining = resources - defense;
            let stolen = (host_int - sym_int) * remaining;
            if stolen > 0.0 {
                Exchange::new(remaining - stolen, stolen)
            } else {
                Exchange::new(remaining, 0.0)
            }
        } else if host_int > 0.0 {
            // cooperative host, exploitative symbiont
            let donation = resources * host_int;
            let kept = resources - donation;
            let stolen = -sym_int * kept;
            Exchange::new(kept - stolen, donation + stolen)
        } else {
            // defensive host against a harmless symbiont: the defense is wasted
            Exchange::new(resources + host_int * resources, 0.0)
        }
    }
}
