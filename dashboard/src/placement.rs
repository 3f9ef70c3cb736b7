use std::collections::{HashMap, HashSet};

use nodewatch_shared::geo::{MAX_PLACEMENT_RADIUS, MIN_PLACEMENT_RADIUS, hashed_offset};
use nodewatch_shared::{COLLECTOR_POSITION, Coordinates};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// How a node id is turned into a map position on first sighting.
///
/// Both strategies are keyed on the id alone, never on snapshot order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlacementStrategy {
    /// CRC32 of the id mapped into the radius band. Recomputable.
    #[default]
    Hashed,
    /// Random angle and radius drawn once per id, then cached.
    Scattered,
}

impl PlacementStrategy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hashed" | "hash" => Some(Self::Hashed),
            "scattered" | "random" => Some(Self::Scattered),
            _ => None,
        }
    }
}

/// What happens to a cached placement when its node leaves the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeparturePolicy {
    /// Keep it for the process lifetime; a returning node reappears in place.
    #[default]
    Retain,
    /// Drop it as soon as the node is absent from a snapshot.
    Forget,
    /// Drop it after the node has been absent for this many consecutive passes.
    EvictAfter(u32),
}

impl DeparturePolicy {
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_lowercase();
        match value.as_str() {
            "retain" | "keep" => Some(Self::Retain),
            "forget" => Some(Self::Forget),
            other => other
                .parse::<u32>()
                .ok()
                .filter(|passes| *passes > 0)
                .map(Self::EvictAfter),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Placement {
    coordinates: Coordinates,
    absent_passes: u32,
}

/// Stable id → position mapping around the collector anchor.
#[derive(Debug)]
pub struct PositionAssigner {
    strategy: PlacementStrategy,
    anchor: Coordinates,
    min_radius: f64,
    max_radius: f64,
    placements: HashMap<String, Placement>,
    rng: StdRng,
}

impl PositionAssigner {
    pub fn new(strategy: PlacementStrategy) -> Self {
        Self::with_rng(strategy, StdRng::from_entropy())
    }

    pub fn with_seed(strategy: PlacementStrategy, seed: u64) -> Self {
        Self::with_rng(strategy, StdRng::seed_from_u64(seed))
    }

    fn with_rng(strategy: PlacementStrategy, rng: StdRng) -> Self {
        Self {
            strategy,
            anchor: COLLECTOR_POSITION,
            min_radius: MIN_PLACEMENT_RADIUS,
            max_radius: MAX_PLACEMENT_RADIUS,
            placements: HashMap::new(),
            rng,
        }
    }

    pub fn strategy(&self) -> PlacementStrategy {
        self.strategy
    }

    pub fn anchor(&self) -> Coordinates {
        self.anchor
    }

    /// Coordinates for `id`, assigned on first call and cached afterwards.
    pub fn place(&mut self, id: &str) -> Coordinates {
        if let Some(placement) = self.placements.get_mut(id) {
            placement.absent_passes = 0;
            return placement.coordinates;
        }

        let coordinates = match self.strategy {
            PlacementStrategy::Hashed => {
                hashed_offset(id, self.anchor, self.min_radius, self.max_radius)
            }
            PlacementStrategy::Scattered => {
                let angle = self.rng.gen_range(0.0..std::f64::consts::TAU);
                let radius = self.rng.gen_range(self.min_radius..=self.max_radius);
                self.anchor.polar_offset(angle, radius)
            }
        };
        self.placements.insert(
            id.to_string(),
            Placement {
                coordinates,
                absent_passes: 0,
            },
        );
        coordinates
    }

    pub fn cached(&self, id: &str) -> Option<Coordinates> {
        self.placements.get(id).map(|placement| placement.coordinates)
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Apply `policy` to every cached id not in `present`. Returns the number
    /// of placements evicted.
    pub fn sweep(&mut self, present: &HashSet<&str>, policy: DeparturePolicy) -> usize {
        let before = self.placements.len();
        match policy {
            DeparturePolicy::Retain => {
                for (id, placement) in self.placements.iter_mut() {
                    if !present.contains(id.as_str()) {
                        placement.absent_passes = placement.absent_passes.saturating_add(1);
                    }
                }
            }
            DeparturePolicy::Forget => {
                self.placements.retain(|id, _| present.contains(id.as_str()));
            }
            DeparturePolicy::EvictAfter(limit) => {
                self.placements.retain(|id, placement| {
                    if present.contains(id.as_str()) {
                        return true;
                    }
                    placement.absent_passes = placement.absent_passes.saturating_add(1);
                    placement.absent_passes < limit
                });
            }
        }
        before - self.placements.len()
    }
}
