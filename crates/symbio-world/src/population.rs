//! Population container and placement policy.

use crate::host::Host;
use serde::{Deserialize, Serialize};
use symbio_core::{Direction, Position, RandomSource};

/// How new hosts and symbionts find a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PopulationStructure {
    /// No spatial constraint; neighbours are drawn uniformly from the whole population
    Mixed,
    /// Fixed toroidal grid; neighbours are the eight surrounding cells
    Grid { width: u32, height: u32 },
}

/// Slot storage for hosts under a given structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Population {
    structure: PopulationStructure,
    slots: Vec<Option<Host>>,
}

impl Population {
    pub fn new(structure: PopulationStructure) -> Self {
        let slots = match structure {
            PopulationStructure::Mixed => Vec::new(),
            PopulationStructure::Grid { width, height } => {
                vec![None; width as usize * height as usize]
            }
        };
        Self { structure, slots }
    }

    pub fn structure(&self) -> PopulationStructure {
        self.structure
    }

    /// Number of slots, occupied or not
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Upper bound on slots, if the structure has one
    pub fn capacity(&self) -> Option<usize> {
        match self.structure {
            PopulationStructure::Mixed => None,
            PopulationStructure::Grid { .. } => Some(self.slots.len()),
        }
    }

    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_occupied(&self, slot: usize) -> bool {
        matches!(self.slots.get(slot), Some(Some(_)))
    }

    pub fn get(&self, slot: usize) -> Option<&Host> {
        self.slots.get(slot).and_then(|s| s.as_ref())
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut Host> {
        self.slots.get_mut(slot).and_then(|s| s.as_mut())
    }

    /// Occupied slot indices in ascending order
    pub fn occupied_slots(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|_| i))
            .collect()
    }

    /// Iterator over every slot with its index
    pub fn iter(&self) -> impl Iterator<Item = (usize, Option<&Host>)> + '_ {
        self.slots.iter().enumerate().map(|(i, slot)| (i, slot.as_ref()))
    }

    /// Where the next injected host goes: the lowest empty slot, or a new slot
    /// at the end of a mixed population. `None` once a grid is full.
    pub fn next_open_slot(&self) -> Option<usize> {
        let hole = self.slots.iter().position(|slot| slot.is_none());
        match self.structure {
            PopulationStructure::Mixed => Some(hole.unwrap_or(self.slots.len())),
            PopulationStructure::Grid { .. } => hole,
        }
    }

    pub fn random_occupied_slot(&self, random: &mut RandomSource) -> Option<usize> {
        let occupied = self.occupied_slots();
        random.get_index(occupied.len()).map(|i| occupied[i])
    }

    /// A random neighbour of `slot`: one of the eight wrapped Moore neighbours on a
    /// grid, any slot of the population when mixed.
    pub fn neighbor_of(&self, slot: usize, random: &mut RandomSource) -> Option<usize> {
        match self.structure {
            PopulationStructure::Mixed => random.get_index(self.slots.len()),
            PopulationStructure::Grid { width, height } => {
                let pos = self.index_to_pos(slot)?;
                let directions = Direction::all();
                let direction = directions[random.get_index(directions.len())?];
                let (dx, dy) = direction.to_delta();
                let neighbor = pos.add(dx, dy).wrap(width as i32, height as i32);
                self.pos_to_index(neighbor)
            }
        }
    }

    /// Put a host into `slot`, returning whoever it displaced.
    ///
    /// A mixed population grows when `slot` is one past the end. Slots beyond that
    /// are ignored and the host is dropped.
    pub fn place(&mut self, slot: usize, host: Host) -> Option<Host> {
        if slot < self.slots.len() {
            self.slots[slot].replace(host)
        } else {
            if slot == self.slots.len() && self.structure == PopulationStructure::Mixed {
                self.slots.push(Some(host));
            }
            None
        }
    }

    /// Empty a slot, handing back its host
    pub fn take(&mut self, slot: usize) -> Option<Host> {
        self.slots.get_mut(slot).and_then(|s| s.take())
    }

    /// Grid coordinate of a slot; `None` for mixed populations or out-of-range slots
    pub fn index_to_pos(&self, slot: usize) -> Option<Position> {
        match self.structure {
            PopulationStructure::Grid { width, .. } if slot < self.slots.len() => {
                let width = width as usize;
                Some(Position::new((slot % width) as i32, (slot / width) as i32))
            }
            _ => None,
        }
    }

    pub fn pos_to_index(&self, pos: Position) -> Option<usize> {
        match self.structure {
            PopulationStructure::Grid { width, height }
                if pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < width && (pos.y as u32) < height =>
            {
                Some(pos.y as usize * width as usize + pos.x as usize)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_creation() {
        let pop = Population::new(PopulationStructure::Grid { width: 10, height: 4 });
        assert_eq!(pop.len(), 40);
        assert_eq!(pop.capacity(), Some(40));
        assert_eq!(pop.occupied_count(), 0);
        assert_eq!(pop.next_open_slot(), Some(0));
    }

    #[test]
    fn test_slot_index_layout() {
        let pop = Population::new(PopulationStructure::Grid { width: 5, height: 3 });
        assert_eq!(pop.index_to_pos(7), Some(Position::new(2, 1)));
        assert_eq!(pop.pos_to_index(Position::new(2, 1)), Some(7));
        assert_eq!(pop.index_to_pos(15), None);
        assert_eq!(pop.pos_to_index(Position::new(5, 0)), None);
    }

    #[test]
    fn test_grid_neighbors_wrap() {
        let pop = Population::new(PopulationStructure::Grid { width: 5, height: 5 });
        let mut random = RandomSource::from_seed(10);
        let expected = [1, 4, 5, 6, 9, 20, 21, 24];

        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            let neighbor = pop.neighbor_of(0, &mut random).unwrap();
            assert!(expected.contains(&neighbor), "unexpected neighbour {}", neighbor);
            seen.insert(neighbor);
        }
        assert_eq!(seen.len(), 8);
    }

    #[test]
    fn test_single_cell_grid_neighbors_itself() {
        let pop = Population::new(PopulationStructure::Grid { width: 1, height: 1 });
        let mut random = RandomSource::from_seed(1);
        assert_eq!(pop.neighbor_of(0, &mut random), Some(0));
    }

    #[test]
    fn test_full_grid_rejects_injection() {
        let mut pop = Population::new(PopulationStructure::Grid { width: 2, height: 1 });
        pop.place(0, Host::new(0.0));
        pop.place(1, Host::new(0.0));
        assert_eq!(pop.next_open_slot(), None);

        // out of range slots never grow a grid
        assert!(pop.place(2, Host::new(0.0)).is_none());
        assert_eq!(pop.len(), 2);
    }

    #[test]
    fn test_mixed_grows_and_reuses_holes() {
        let mut pop = Population::new(PopulationStructure::Mixed);
        assert_eq!(pop.capacity(), None);
        for _ in 0..3 {
            let slot = pop.next_open_slot().unwrap();
            pop.place(slot, Host::new(0.0));
        }
        assert_eq!(pop.len(), 3);

        pop.take(1);
        assert_eq!(pop.next_open_slot(), Some(1));
        assert_eq!(pop.occupied_slots(), vec![0, 2]);
    }

    #[test]
    fn test_place_returns_evicted_host() {
        let mut pop = Population::new(PopulationStructure::Grid { width: 2, height: 2 });
        assert!(pop.place(3, Host::new(0.5)).is_none());
        let evicted = pop.place(3, Host::new(-0.5)).unwrap();
        assert_eq!(evicted.interaction_value(), 0.5);
        assert_eq!(pop.get(3).unwrap().interaction_value(), -0.5);
    }

    #[test]
    fn test_random_occupied_slot() {
        let mut pop = Population::new(PopulationStructure::Grid { width: 3, height: 3 });
        let mut random = RandomSource::from_seed(4);
        assert_eq!(pop.random_occupied_slot(&mut random), None);

        pop.place(4, Host::new(0.0));
        pop.place(8, Host::new(0.0));
        for _ in 0..50 {
            let slot = pop.random_occupied_slot(&mut random).unwrap();
            assert!(slot == 4 || slot == 8);
        }
    }

    #[test]
    fn test_mixed_neighbor_covers_population() {
        let mut pop = Population::new(PopulationStructure::Mixed);
        let mut random = RandomSource::from_seed(2);
        assert_eq!(pop.neighbor_of(0, &mut random), None);
        for i in 0..4 {
            pop.place(i, Host::new(0.0));
        }
        for _ in 0..50 {
            assert!(pop.neighbor_of(0, &mut random).unwrap() < 4);
        }
    }
}
