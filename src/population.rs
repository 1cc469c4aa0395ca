//! Fixed-size population with one parent slot.
//!
//! Slot 0 is the parent; every other slot holds an offspring. Selection copies
//! the winner into the parent slot, so roles never move.

use rand::Rng;

use crate::config::RunConfig;
use crate::genotype::{Individual, Shape};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    Parent,
    Offspring,
}

#[derive(Debug, Clone)]
pub struct Slot {
    pub role: Role,
    pub individual: Individual,
}

#[derive(Debug, Clone)]
pub struct Population {
    slots: Vec<Slot>,
}

impl Population {
    pub const PARENT: usize = 0;

    pub fn random<R: Rng>(config: &RunConfig, shape: Shape, rng: &mut R) -> Self {
        let slots = (0..config.population_size)
            .map(|i| Slot {
                role: if i == Self::PARENT { Role::Parent } else { Role::Offspring },
                individual: Individual::random(shape, rng),
            })
            .collect();
        Self { slots }
    }

    /// Population whose every slot is a copy of `parent`.
    pub fn from_parent(config: &RunConfig, parent: Individual) -> Self {
        let mut population = Self {
            slots: vec![
                Slot {
                    role: Role::Offspring,
                    individual: parent,
                };
                config.population_size
            ],
        };
        population.slots[Self::PARENT].role = Role::Parent;
        population
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn parent(&self) -> &Individual {
        &self.slots[Self::PARENT].individual
    }

    pub fn parent_mut(&mut self) -> &mut Individual {
        &mut self.slots[Self::PARENT].individual
    }

    pub fn get(&self, index: usize) -> &Individual {
        &self.slots[index].individual
    }

    pub fn role(&self, index: usize) -> Role {
        self.slots[index].role
    }

    pub fn individuals(&self) -> impl Iterator<Item = &Individual> {
        self.slots.iter().map(|s| &s.individual)
    }

    pub fn individuals_mut(&mut self) -> impl Iterator<Item = &mut Individual> {
        self.slots.iter_mut().map(|s| &mut s.individual)
    }

    pub fn offspring_mut(&mut self) -> impl Iterator<Item = &mut Individual> {
        self.slots
            .iter_mut()
            .filter(|s| s.role == Role::Offspring)
            .map(|s| &mut s.individual)
    }

    /// Copy slot `index` into the parent slot.
    pub fn promote(&mut self, index: usize) {
        if index != Self::PARENT {
            self.slots[Self::PARENT].individual = self.slots[index].individual.clone();
        }
    }

    /// Overwrite every offspring with the parent.
    pub fn clone_parent(&mut self) {
        let (parent, rest) = self.slots.split_at_mut(Self::PARENT + 1);
        let parent = &parent[Self::PARENT].individual;
        for slot in rest {
            slot.individual.clone_from(parent);
        }
    }

    /// Lowest score; ties go to the later slot.
    pub fn best_by_score(&self) -> usize {
        self.individuals()
            .enumerate()
            .fold(0, |best, (i, ind)| {
                if ind.score <= self.get(best).score {
                    i
                } else {
                    best
                }
            })
    }

    /// Lowest transistor count among correct individuals; ties go to the
    /// later slot. Falls back to the parent when nothing is correct.
    pub fn best_by_cost(&self) -> usize {
        let mut best = Self::PARENT;
        let mut best_cost = if self.parent().score == 0 {
            Some(self.parent().metrics.transistors)
        } else {
            None
        };
        for (i, ind) in self.individuals().enumerate().skip(1) {
            if ind.score != 0 {
                continue;
            }
            let cost = ind.metrics.transistors;
            if best_cost.map_or(true, |c| cost <= c) {
                best = i;
                best_cost = Some(cost);
            }
        }
        best
    }
}
