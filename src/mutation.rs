//! Mutation operators.
//!
//! Every operator edits the genotype in place, keeps it well formed and
//! returns the index of the gene it changed. The caller re-traces the active
//! set during evaluation.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::{MutationKind, RunConfig};
use crate::gate::Gate;
use crate::genotype::{Allele, Individual, Source};

/// Apply the run's mutation operator to one offspring.
pub fn mutate<R: Rng>(individual: &mut Individual, config: &RunConfig, rng: &mut R) -> usize {
    let gene = match config.mutation {
        MutationKind::Sam => single_active(individual, rng),
        MutationKind::SamGam => {
            if rng.gen_bool(config.guided_probability) {
                guided_active(individual, rng).unwrap_or_else(|| single_active(individual, rng))
            } else {
                single_active(individual, rng)
            }
        }
        MutationKind::Pm => point(individual, config.point_mutation_rate, rng),
    };
    individual.last_mutation = Some(gene);
    gene
}

/// Draw a new gate different from `current`.
fn other_gate<R: Rng>(current: Gate, rng: &mut R) -> Gate {
    loop {
        let gate = Gate::ALL[rng.gen_range(0..Gate::ALL.len())];
        if gate != current {
            return gate;
        }
    }
}

/// Number of legal values a source allele can take.
fn num_values(individual: &Individual, allele: Allele) -> usize {
    let shape = &individual.shape;
    match allele {
        Allele::Gate(_) => Gate::ALL.len(),
        Allele::Input(i, _) => shape.num_sources(i),
        Allele::Output(_) => shape.num_output_sources(),
    }
}

/// Give `allele` a new random legal value, different from the current one
/// whenever the allele has more than one legal value.
fn redraw<R: Rng>(individual: &mut Individual, allele: Allele, rng: &mut R) {
    let shape = individual.shape;
    match allele {
        Allele::Gate(i) => {
            let gate = other_gate(individual.nodes[i].gate, rng);
            individual.nodes[i].gate = gate;
        }
        Allele::Input(i, _) | Allele::Output(i) => {
            let current = individual.source_at(allele);
            let multiple = num_values(individual, allele) > 1;
            let source = loop {
                let source = match allele {
                    Allele::Output(_) => shape.random_output_source(rng),
                    _ => shape.random_source(i, rng),
                };
                if !multiple || Some(source) != current {
                    break source;
                }
            };
            individual.set_source(allele, source);
        }
    }
}

/// Single Active Mutation: change exactly one allele of an active gene.
pub fn single_active<R: Rng>(individual: &mut Individual, rng: &mut R) -> usize {
    let n = individual.shape.num_nodes();
    let genes = individual.active_genes();
    // Output genes are always present, so `genes` is never empty.
    let gene = genes[rng.gen_range(0..genes.len())];

    let allele = if gene >= n {
        Allele::Output(gene - n)
    } else {
        let node = individual.nodes[gene];
        let mut choices = vec![Allele::Gate(gene)];
        if individual.shape.num_sources(gene) > 1 {
            choices.push(Allele::Input(gene, 0));
            if node.gate.arity() == 2 {
                choices.push(Allele::Input(gene, 1));
            }
        }
        choices[rng.gen_range(0..choices.len())]
    };

    redraw(individual, allele, rng);
    gene
}

/// Active consumers: read inputs of active nodes and all output genes.
fn consumers(individual: &Individual) -> Vec<Allele> {
    let mut result = Vec::new();
    for i in individual.active_nodes() {
        for slot in 0..individual.nodes[i].gate.arity() {
            result.push(Allele::Input(i, slot));
        }
    }
    result.extend((0..individual.shape.num_outputs).map(Allele::Output));
    result
}

/// Consumers that could be redirected to a currently inactive node.
fn grow_candidates(individual: &Individual) -> Vec<(Allele, Vec<Source>)> {
    let shape = &individual.shape;
    consumers(individual)
        .into_iter()
        .filter_map(|consumer| {
            let targets: Vec<Source> = (0..shape.num_nodes())
                .filter(|&j| !individual.is_active(j))
                .map(Source::Node)
                .filter(|&s| shape.is_legal_for(consumer, s))
                .collect();
            if targets.is_empty() {
                None
            } else {
                Some((consumer, targets))
            }
        })
        .collect()
}

/// Consumers reading an active node that could read one of its inputs instead.
fn shrink_candidates(individual: &Individual) -> Vec<(Allele, Vec<Source>)> {
    let shape = &individual.shape;
    consumers(individual)
        .into_iter()
        .filter_map(|consumer| {
            let current = individual.source_at(consumer)?;
            let y = current.node()?;
            let mut targets: Vec<Source> = Vec::new();
            for &s in individual.nodes[y].read_inputs() {
                if s != current && shape.is_legal_for(consumer, s) && !targets.contains(&s) {
                    targets.push(s);
                }
            }
            if targets.is_empty() {
                None
            } else {
                Some((consumer, targets))
            }
        })
        .collect()
}

/// Guided Active Mutation: one structural change at the border of the active
/// region. Returns `None` when neither growing nor shrinking is possible.
pub fn guided_active<R: Rng>(individual: &mut Individual, rng: &mut R) -> Option<usize> {
    let grow_first = rng.gen_bool(0.5);
    let mut candidates = if grow_first {
        grow_candidates(individual)
    } else {
        shrink_candidates(individual)
    };
    if candidates.is_empty() {
        log::trace!("GAM: no {} candidate", if grow_first { "grow" } else { "shrink" });
        candidates = if grow_first {
            shrink_candidates(individual)
        } else {
            grow_candidates(individual)
        };
    }

    let (consumer, targets) = candidates.choose(rng)?;
    let source = *targets.choose(rng)?;
    let consumer = *consumer;
    individual.set_source(consumer, source);
    Some(individual.gene_of(consumer))
}

/// Point Mutation: redraw `max(1, round(rate * alleles))` alleles chosen
/// uniformly over the whole genotype. Returns the first mutated gene.
pub fn point<R: Rng>(individual: &mut Individual, rate: f64, rng: &mut R) -> usize {
    let shape = individual.shape;
    let total = shape.num_alleles();
    let count = ((rate * total as f64).round() as usize).max(1);
    let n = shape.num_nodes();

    let mut first = None;
    for _ in 0..count {
        let index = rng.gen_range(0..total);
        let allele = if index < 3 * n {
            match index % 3 {
                0 => Allele::Gate(index / 3),
                slot => Allele::Input(index / 3, slot - 1),
            }
        } else {
            Allele::Output(index - 3 * n)
        };
        redraw(individual, allele, rng);
        first.get_or_insert(individual.gene_of(allele));
    }
    first.unwrap_or(0)
}
