//! Functional scoring of genotypes against the target table.

use log::debug;

use crate::engine::{EngineError, FunctionEngine};
use crate::gate::Gate;
use crate::genotype::{Individual, Source};
use crate::table::TargetTable;

pub struct Evaluator<E: FunctionEngine> {
    engine: E,
    num_inputs: usize,
    inputs: Vec<E::Function>,
    targets: Vec<E::Function>,
}

impl<E: FunctionEngine> Evaluator<E> {
    /// Build the input projections and target functions and protect them
    /// from garbage collection.
    pub fn new(engine: E, table: &TargetTable) -> Result<Self, EngineError> {
        let inputs = (0..table.num_inputs)
            .map(|k| engine.projection(k))
            .collect::<Result<Vec<_>, _>>()?;
        let targets = table.build_targets(&engine, &inputs)?;
        for f in inputs.iter().chain(&targets) {
            engine.protect(f);
        }
        debug!(
            "Built {} input and {} target functions ({} engine nodes)",
            inputs.len(),
            targets.len(),
            engine.node_count()
        );
        Ok(Self {
            engine,
            num_inputs: table.num_inputs,
            inputs,
            targets,
        })
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    pub fn num_outputs(&self) -> usize {
        self.targets.len()
    }

    /// Number of input assignments on which some output differs from its target.
    ///
    /// Only active nodes are composed, so the active set must be current.
    pub fn score(&self, individual: &Individual) -> Result<u64, EngineError> {
        let mut values: Vec<Option<E::Function>> = vec![None; individual.nodes.len()];

        for i in individual.active_nodes() {
            let node = &individual.nodes[i];
            let a = self.value(&values, node.inputs[0]);
            let f = if node.gate.arity() == 1 {
                self.engine.combine(node.gate, a, a)?
            } else {
                let b = self.value(&values, node.inputs[1]);
                self.engine.combine(node.gate, a, b)?
            };
            values[i] = Some(f);
        }

        let mut mismatch = self.engine.constant(false);
        for (source, target) in individual.outputs.iter().zip(&self.targets) {
            let out = self.value(&values, *source);
            let diff = self.engine.combine(Gate::Xor, out, target)?;
            mismatch = self.engine.combine(Gate::Or, &mismatch, &diff)?;
        }

        self.engine.satisfying_count(&mismatch, self.num_inputs)
    }

    fn value<'a>(&'a self, values: &'a [Option<E::Function>], source: Source) -> &'a E::Function {
        match source {
            Source::Input(k) => &self.inputs[k],
            Source::Node(j) => match &values[j] {
                Some(f) => f,
                None => panic!("node {} is read before it is composed", j),
            },
        }
    }

    /// Re-trace the active set and refresh score and metrics.
    pub fn evaluate(&self, individual: &mut Individual) -> Result<(), EngineError> {
        individual.update_active_genes();
        individual.score = self.score(individual)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bdd::Bdd;
    use crate::exhaustive::Exhaustive;
    use crate::genotype::{Node, Shape};
    use crate::mutation;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use test_log::test;

    use crate::genotype::Source::{Input as I, Node as N};

    fn xor_table() -> TargetTable {
        TargetTable::from_fn(2, 1, |x| vec![x[0] ^ x[1]])
    }

    fn full_adder() -> TargetTable {
        TargetTable::from_fn(3, 2, |x| {
            let sum = x[0] ^ x[1] ^ x[2];
            let carry = (x[0] && x[1]) || (x[2] && (x[0] ^ x[1]));
            vec![sum, carry]
        })
    }

    fn shape(table: &TargetTable, columns: usize) -> Shape {
        Shape {
            num_inputs: table.num_inputs,
            num_outputs: table.num_outputs,
            columns,
            rows: 1,
            levels_back: columns / 2,
        }
    }

    #[test]
    fn test_single_xor_gate_is_correct() {
        let table = xor_table();
        let eval = Evaluator::new(Bdd::new(12, 10), &table).unwrap();
        let s = shape(&table, 2);
        let nodes = vec![
            Node { gate: Gate::Xor, inputs: [I(0), I(1)] },
            Node { gate: Gate::And, inputs: [I(0), N(0)] },
        ];
        let mut ind = Individual::from_genes(s, nodes, vec![N(0)]);
        eval.evaluate(&mut ind).unwrap();
        assert_eq!(ind.score, 0);
        assert_eq!(ind.metrics.transistors, 12);
    }

    #[test]
    fn test_score_counts_mismatching_assignments() {
        let table = xor_table();
        let eval = Evaluator::new(Bdd::new(12, 10), &table).unwrap();
        let s = shape(&table, 2);
        let nodes = vec![
            Node { gate: Gate::Or, inputs: [I(0), I(1)] },
            Node { gate: Gate::And, inputs: [I(0), I(1)] },
        ];
        // OR differs from XOR only on 11.
        let mut ind = Individual::from_genes(s, nodes.clone(), vec![N(0)]);
        eval.evaluate(&mut ind).unwrap();
        assert_eq!(ind.score, 1);
        // Input 0 differs from XOR wherever x1 is set.
        let mut ind = Individual::from_genes(s, nodes, vec![I(0)]);
        eval.evaluate(&mut ind).unwrap();
        assert_eq!(ind.score, 2);
    }

    #[test]
    fn test_full_adder_by_hand() {
        let table = full_adder();
        let eval = Evaluator::new(Bdd::new(14, 12), &table).unwrap();
        let s = shape(&table, 6);
        let nodes = vec![
            Node { gate: Gate::Xor, inputs: [I(0), I(1)] },
            Node { gate: Gate::And, inputs: [I(0), I(1)] },
            Node { gate: Gate::Xor, inputs: [N(0), I(2)] },
            Node { gate: Gate::And, inputs: [N(0), I(2)] },
            Node { gate: Gate::Or, inputs: [N(3), N(1)] },
            Node { gate: Gate::Not, inputs: [I(0), I(0)] },
        ];
        let mut ind = Individual::from_genes(s, nodes, vec![N(2), N(4)]);
        eval.evaluate(&mut ind).unwrap();
        assert_eq!(ind.score, 0);
        assert_eq!(ind.metrics.gates, 5);
        assert_eq!(ind.metrics.transistors, 12 + 6 + 12 + 6 + 6);
    }

    #[test]
    fn test_identical_genotypes_score_identically() {
        let table = full_adder();
        let eval = Evaluator::new(Bdd::new(16, 12), &table).unwrap();
        let s = shape(&table, 12);
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..20 {
            let mut a = Individual::random(s, &mut rng);
            let mut b = a.clone();
            eval.evaluate(&mut a).unwrap();
            eval.evaluate(&mut b).unwrap();
            assert_eq!(a.score, b.score);
        }
    }

    #[test]
    fn test_inactive_point_mutations_keep_score() {
        let table = full_adder();
        let eval = Evaluator::new(Bdd::new(16, 12), &table).unwrap();
        let s = shape(&table, 16);
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..50 {
            let mut parent = Individual::random(s, &mut rng);
            eval.evaluate(&mut parent).unwrap();
            let mut child = parent.clone();
            mutation::point(&mut child, 0.05, &mut rng);
            let inactive_only = (0..s.num_nodes())
                .filter(|&i| parent.is_active(i))
                .all(|i| child.nodes[i] == parent.nodes[i])
                && child.outputs == parent.outputs;
            if inactive_only {
                eval.evaluate(&mut child).unwrap();
                assert_eq!(child.score, parent.score);
            }
        }
    }

    #[test]
    fn test_engines_agree() {
        let table = full_adder();
        let bdd = Evaluator::new(Bdd::new(16, 12), &table).unwrap();
        let exhaustive = Evaluator::new(Exhaustive::new(3).unwrap(), &table).unwrap();
        let s = shape(&table, 10);
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..50 {
            let ind = Individual::random(s, &mut rng);
            assert_eq!(bdd.score(&ind).unwrap(), exhaustive.score(&ind).unwrap());
        }
    }
}
