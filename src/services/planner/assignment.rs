//! Capacity-constrained distribution of the fleet-wide stop order across buses

use tracing::debug;

use crate::types::Stop;

/// Stops loaded onto one bus, in the order they were assigned
#[derive(Debug, Clone, PartialEq)]
pub struct BusLoad {
    pub capacity: u32,
    pub seats_used: u32,
    pub stops: Vec<Stop>,
}

impl BusLoad {
    fn new(capacity: u32) -> Self {
        Self {
            capacity,
            seats_used: 0,
            stops: Vec::new(),
        }
    }

    pub fn remaining(&self) -> u32 {
        self.capacity.saturating_sub(self.seats_used)
    }

    fn fits(&self, seats: u32) -> bool {
        seats <= self.remaining()
    }

    fn load(&mut self, stop: Stop) {
        self.seats_used += stop.seats_needed;
        self.stops.push(stop);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// One entry per capacity, same order
    pub buses: Vec<BusLoad>,
    /// Stops no bus had room for, in sequence order
    pub overflow: Vec<Stop>,
}

/// Round-robin the sequence over the buses, falling back to the first bus with room.
///
/// Stop `k` is tried on bus `k % buses` first; when it does not fit, buses are
/// scanned in index order. A stop that fits nowhere lands in `overflow`.
pub fn assign_to_buses(sequence: Vec<Stop>, capacities: &[u32]) -> Assignment {
    let mut buses: Vec<BusLoad> = capacities.iter().map(|&c| BusLoad::new(c)).collect();
    let mut overflow = Vec::new();

    if buses.is_empty() {
        return Assignment {
            buses,
            overflow: sequence,
        };
    }

    let fleet = buses.len();
    for (k, stop) in sequence.into_iter().enumerate() {
        let preferred = k % fleet;
        let target = if buses[preferred].fits(stop.seats_needed) {
            Some(preferred)
        } else {
            buses.iter().position(|bus| bus.fits(stop.seats_needed))
        };

        match target {
            Some(index) => {
                debug!("Stop '{}' -> bus {}", stop.address, index + 1);
                buses[index].load(stop);
            }
            None => overflow.push(stop),
        }
    }

    Assignment { buses, overflow }
}
