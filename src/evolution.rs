//! Two-phase (1 + λ) evolutionary controller.
//!
//! Phase I searches for a functionally correct circuit by minimizing the
//! mismatch count. Phase II keeps the circuit correct and minimizes its
//! transistor count. Both phases draw from one evaluation budget; every
//! generation costs `population_size - 1` evaluations.

use std::io::Write;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::circuit::Circuit;
use crate::config::RunConfig;
use crate::engine::FunctionEngine;
use crate::error::{Error, Result};
use crate::fitness::Evaluator;
use crate::genotype::{Individual, Shape};
use crate::guard::ResourceGuard;
use crate::mutation;
use crate::population::Population;
use crate::report::RunLog;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SearchOutcome {
    /// A correct circuit was found; Phase II may follow.
    Feasible,
    /// The budget ran out before any circuit was correct.
    Infeasible,
}

pub struct Evolution<'a, E: FunctionEngine, W: Write> {
    config: &'a RunConfig,
    evaluator: Evaluator<E>,
    guard: ResourceGuard,
    log: RunLog<W>,
    rng: StdRng,
    population: Population,
    remaining: i64,
}

impl<'a, E: FunctionEngine, W: Write> Evolution<'a, E, W> {
    /// Seed the generator and draw a random initial population.
    pub fn new(config: &'a RunConfig, evaluator: Evaluator<E>, log: RunLog<W>) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let shape = Shape::new(evaluator.num_inputs(), evaluator.num_outputs(), config);
        let population = Population::random(config, shape, &mut rng);
        Self {
            config,
            evaluator,
            guard: ResourceGuard::new(config.gc_threshold),
            log,
            rng,
            population,
            remaining: config.max_evaluations as i64,
        }
    }

    pub fn shape(&self) -> Shape {
        self.population.parent().shape
    }

    pub fn parent(&self) -> &Individual {
        self.population.parent()
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn remaining(&self) -> i64 {
        self.remaining
    }

    pub fn used(&self) -> u64 {
        (self.config.max_evaluations as i64 - self.remaining) as u64
    }

    fn per_generation(&self) -> i64 {
        self.config.evaluations_per_generation() as i64
    }

    fn budget_exhausted(&self) -> bool {
        self.remaining - self.per_generation() < 0
    }

    /// Mutate and evaluate every offspring, then charge the budget.
    fn generation(&mut self) -> Result<()> {
        self.population.parent_mut().last_mutation = None;
        for child in self.population.offspring_mut() {
            mutation::mutate(child, self.config, &mut self.rng);
            self.evaluator.evaluate(child)?;
        }
        self.remaining -= self.per_generation();
        Ok(())
    }

    fn collect_if_needed(&mut self) {
        if self.guard.check(self.evaluator.engine()) {
            debug!("Garbage collection after {} evaluations", self.used());
        }
    }

    /// Phase I: minimize the mismatch count until it reaches zero or the
    /// budget runs out.
    pub fn search(&mut self) -> Result<SearchOutcome> {
        for individual in self.population.individuals_mut() {
            self.evaluator.evaluate(individual)?;
        }
        let best = self.population.best_by_score();
        self.population.promote(best);
        self.population.clone_parent();
        info!("Initial best score {} (slot {})", self.parent().score, best);

        self.log.separator()?;
        let shape = self.shape();
        self.log.header(shape.num_inputs, shape.num_outputs)?;

        loop {
            self.generation()?;

            let best = self.population.best_by_score();
            self.population.promote(best);
            let used = self.used();
            self.log.row(used, best, self.population.parent())?;

            let score = self.parent().score;
            if score == 0 {
                info!("Correct circuit found after {} evaluations", self.used());
                self.log.sat_summary(score, best, self.remaining)?;
                self.log.separator()?;
                self.log.circuit_report(self.population.parent())?;
                self.population.clone_parent();
                return Ok(SearchOutcome::Feasible);
            }

            self.collect_if_needed();

            if self.budget_exhausted() {
                info!("Budget exhausted with best score {}", score);
                self.log.sat_summary(score, best, self.remaining)?;
                return Ok(SearchOutcome::Infeasible);
            }

            self.population.clone_parent();
        }
    }

    /// Phase II: minimize the transistor count among correct circuits until
    /// the budget runs out.
    pub fn optimize(&mut self) -> Result<()> {
        self.log.separator()?;
        let mut cost = self.parent().metrics.transistors;
        info!("Optimizing from {} transistors", cost);

        loop {
            self.generation()?;

            let best = self.population.best_by_cost();
            self.population.promote(best);
            let used = self.used();
            self.log.row(used, best, self.population.parent())?;

            let transistors = self.parent().metrics.transistors;
            if transistors < cost {
                debug!("{} -> {} transistors after {} evaluations", cost, transistors, self.used());
                cost = transistors;
            }

            self.collect_if_needed();

            if self.budget_exhausted() {
                self.log.transistor_summary(transistors, best, self.remaining)?;
                break;
            }

            self.population.clone_parent();
        }

        self.log.separator()?;
        self.log.circuit_report(self.population.parent())?;
        info!("Finished with {} transistors", cost);
        Ok(())
    }

    /// Replace the population with copies of a known-correct circuit.
    pub fn sow(&mut self, circuit: &Circuit, ngates: usize) -> Result<()> {
        let mut parent = circuit.to_individual(self.shape(), ngates, &mut self.rng)?;
        self.evaluator.evaluate(&mut parent)?;
        if parent.score != 0 {
            return Err(Error::SeedNotCorrect { score: parent.score });
        }
        info!(
            "Seeded with {} gates, {} transistors",
            parent.metrics.gates, parent.metrics.transistors
        );
        self.population = Population::from_parent(self.config, parent);
        Ok(())
    }

    /// Phase I followed, when it succeeds, by Phase II.
    pub fn run(&mut self) -> Result<SearchOutcome> {
        let outcome = self.search()?;
        if outcome == SearchOutcome::Feasible {
            self.optimize()?;
        }
        Ok(outcome)
    }

    /// Release the engine and close the log with the elapsed time.
    pub fn finish(self, seconds: f64) -> Result<W> {
        let Evolution { evaluator, mut log, .. } = self;
        evaluator.into_engine().shutdown();
        log.total_time(seconds)?;
        Ok(log.into_inner())
    }
}
