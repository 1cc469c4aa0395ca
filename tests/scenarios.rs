use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

use test_log::test;

use cgp_bdd::bdd::Bdd;
use cgp_bdd::circuit::{seed_path, Circuit};
use cgp_bdd::config::{MutationKind, RunConfig};
use cgp_bdd::engine::{EngineError, FunctionEngine};
use cgp_bdd::error::Error;
use cgp_bdd::evolution::{Evolution, SearchOutcome};
use cgp_bdd::exhaustive::Exhaustive;
use cgp_bdd::fitness::Evaluator;
use cgp_bdd::gate::Gate;
use cgp_bdd::genotype::{Individual, Shape};
use cgp_bdd::mutation;
use cgp_bdd::reference::Ref;
use cgp_bdd::report::RunLog;
use cgp_bdd::table::TargetTable;

use rand::rngs::StdRng;
use rand::SeedableRng;

const SEPARATOR: &str = "--------------------------";

fn data(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data").join(name)
}

fn table(name: &str) -> TargetTable {
    TargetTable::load(data(name)).unwrap()
}

fn evolution<'a, E: FunctionEngine>(
    config: &'a RunConfig,
    engine: E,
    table: &TargetTable,
) -> Evolution<'a, E, Vec<u8>> {
    let evaluator = Evaluator::new(engine, table).unwrap();
    let mut log = RunLog::new(Vec::new());
    log.banner(config.mutation).unwrap();
    Evolution::new(config, evaluator, log)
}

fn finish<E: FunctionEngine>(evolution: Evolution<'_, E, Vec<u8>>) -> String {
    String::from_utf8(evolution.finish(0.0).unwrap()).unwrap()
}

/// Generation rows of the log section starting after the `n`-th separator.
fn rows(log: &str, section: usize) -> Vec<Vec<String>> {
    log.split(SEPARATOR)
        .nth(section)
        .unwrap_or("")
        .lines()
        .filter(|line| line.split('\t').next().map_or(false, |f| f.parse::<u64>().is_ok()))
        .map(|line| line.split('\t').map(str::to_string).collect())
        .collect()
}

fn column(row: &[String], index: usize) -> u64 {
    row[index].parse().unwrap()
}

#[test]
fn scenario_a_xor_with_sam() {
    let table = table("xor.pla");
    let config = RunConfig::new(1, 4, 10_000, MutationKind::Sam).with_pool(16, 12);
    let mut evo = evolution(&config, Bdd::new(16, 12), &table);

    assert_eq!(evo.run().unwrap(), SearchOutcome::Feasible);
    assert_eq!(evo.parent().score, 0);
    let log = finish(evo);

    let mut lines = log.lines();
    assert_eq!(lines.next(), Some("SAM"));
    assert_eq!(lines.next(), Some(SEPARATOR));
    assert!(lines.next().unwrap().starts_with("Eval.\tIndv.\tGene\tScore"));
    assert!(log.contains("SAT COUNT: 0 INDIVIDUAL: "));
    assert!(log.contains("NUM TRANSISTORS: "));
    assert!(log.trim_end().ends_with("seconds"));

    let search = rows(&log, 1);
    let used = column(search.last().unwrap(), 0);
    assert!(used < 10_000);
    assert_eq!(column(search.last().unwrap(), 3), 0);

    // Phase II rows: correct and never more expensive than the previous one.
    let optimize = rows(&log, 3);
    assert!(!optimize.is_empty());
    let mut cost = u64::MAX;
    for row in &optimize {
        assert_eq!(column(row, 3), 0);
        let transistors = column(row, 5);
        assert!(transistors <= cost);
        cost = transistors;
    }
}

#[test]
fn scenario_b_seeded_full_adder() {
    let table_path = data("full_adder.pla");
    let table = TargetTable::load(&table_path).unwrap();
    let circuit = Circuit::load(seed_path(&table_path)).unwrap();

    let config = RunConfig::new(7, 10, 4_000, MutationKind::SamGam).with_pool(16, 12);
    let mut evo = evolution(&config, Bdd::new(16, 12), &table);
    evo.sow(&circuit, 5).unwrap();
    assert_eq!(evo.parent().score, 0);
    let seeded = evo.parent().metrics.transistors;
    assert_eq!(seeded, 42);

    evo.optimize().unwrap();
    assert_eq!(evo.parent().score, 0);
    assert!(evo.parent().metrics.transistors <= seeded);

    let log = finish(evo);
    let optimize = rows(&log, 1);
    assert_eq!(optimize.len(), 1_000);
    let mut cost = seeded as u64;
    for row in &optimize {
        assert_eq!(column(row, 3), 0);
        let transistors = column(row, 5);
        assert!(transistors <= cost);
        cost = transistors;
    }

    // The final report is a valid seed for the same table.
    let report = log.split(SEPARATOR).nth(2).unwrap();
    let text: String = report
        .lines()
        .filter(|l| l.starts_with("gate ") || l.starts_with("output "))
        .map(|l| format!("{}\n", l))
        .collect();
    let reparsed: Circuit = text.parse().unwrap();
    let mut again = evolution(&config, Bdd::new(16, 12), &table);
    again.sow(&reparsed, reparsed.gates.len()).unwrap();
    assert_eq!(again.parent().metrics.transistors as u64, cost);
}

#[test]
fn scenario_b_rejects_wrong_seed_and_gate_count() {
    let table = table("full_adder.pla");
    let config = RunConfig::new(7, 10, 100, MutationKind::Sam).with_pool(16, 12);
    let circuit = Circuit::load(data("full_adder.circuit")).unwrap();

    let mut evo = evolution(&config, Bdd::new(16, 12), &table);
    assert!(matches!(evo.sow(&circuit, 4), Err(Error::Config(_))));

    // Swap the carry OR for an AND.
    let broken: Circuit = circuit.to_string().replace("gate OR", "gate AND").parse().unwrap();
    assert!(matches!(evo.sow(&broken, 5), Err(Error::SeedNotCorrect { .. })));
}

#[test]
fn scenario_c_budget_too_small() {
    let table = table("adder2.pla");
    assert_eq!((table.num_inputs, table.num_outputs), (4, 3));

    let config = RunConfig::new(1, 20, 4, MutationKind::Sam).with_pool(16, 12);
    let mut evo = evolution(&config, Bdd::new(16, 12), &table);
    assert_eq!(evo.run().unwrap(), SearchOutcome::Infeasible);
    assert_ne!(evo.parent().score, 0);
    assert_eq!(evo.remaining(), 0);

    let log = finish(evo);
    assert_eq!(rows(&log, 1).len(), 1);
    assert!(log.contains("SAT COUNT: "));
    assert!(log.contains(" EVALUATIONS: 0\n"));
    assert!(!log.contains("NUM TRANSISTORS"));
    assert!(!log.contains("GATES: "));
}

#[test]
fn runs_are_deterministic() {
    let table = table("full_adder.pla");
    for kind in [MutationKind::Sam, MutationKind::SamGam, MutationKind::Pm] {
        let config = RunConfig::new(42, 12, 1_000, kind).with_pool(16, 12);
        let logs: Vec<String> = (0..2)
            .map(|_| {
                let mut evo = evolution(&config, Bdd::new(16, 12), &table);
                evo.run().unwrap();
                finish(evo)
            })
            .collect();
        assert_eq!(logs[0], logs[1]);
    }
}

#[test]
fn engines_produce_identical_runs() {
    let table = table("full_adder.pla");
    let config = RunConfig::new(5, 12, 2_000, MutationKind::SamGam).with_pool(16, 12);

    let mut with_bdd = evolution(&config, Bdd::new(16, 12), &table);
    with_bdd.run().unwrap();
    let mut with_tables = evolution(&config, Exhaustive::new(3).unwrap(), &table);
    with_tables.run().unwrap();

    assert_eq!(finish(with_bdd), finish(with_tables));
}

/// `Bdd` that counts how often it is asked to collect.
struct CountingBdd {
    inner: Bdd,
    collections: Rc<Cell<usize>>,
}

impl FunctionEngine for CountingBdd {
    type Function = Ref;

    fn projection(&self, index: usize) -> Result<Ref, EngineError> {
        self.inner.projection(index)
    }

    fn constant(&self, value: bool) -> Ref {
        self.inner.constant(value)
    }

    fn combine(&self, gate: Gate, a: &Ref, b: &Ref) -> Result<Ref, EngineError> {
        self.inner.combine(gate, a, b)
    }

    fn satisfying_count(&self, f: &Ref, num_vars: usize) -> Result<u64, EngineError> {
        self.inner.satisfying_count(f, num_vars)
    }

    fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    fn allocated_capacity(&self) -> usize {
        self.inner.allocated_capacity()
    }

    fn protect(&self, f: &Ref) {
        FunctionEngine::protect(&self.inner, f)
    }

    fn garbage_collect(&self) {
        self.collections.set(self.collections.get() + 1);
        self.inner.garbage_collect()
    }

    fn shutdown(self) {
        self.inner.shutdown()
    }
}

#[test]
fn garbage_collection_does_not_change_the_run() {
    let table = table("adder2.pla");
    let config = RunConfig::new(3, 16, 4_000, MutationKind::Pm);

    // 512 nodes: the guard fires repeatedly.
    let collections = Rc::new(Cell::new(0));
    let small = CountingBdd {
        inner: Bdd::new(9, 8),
        collections: Rc::clone(&collections),
    };
    let mut small = evolution(&config, small, &table);
    small.run().unwrap();
    let mut large = evolution(&config, Bdd::new(18, 12), &table);
    large.run().unwrap();

    assert!(collections.get() > 0);
    assert_eq!(finish(small), finish(large));
}

#[test]
fn point_mutation_of_inactive_genes_is_neutral() {
    let table = table("adder2.pla");
    let evaluator = Evaluator::new(Bdd::new(16, 12), &table).unwrap();
    let config = RunConfig::new(0, 30, 100, MutationKind::Pm);
    let shape = Shape::new(table.num_inputs, table.num_outputs, &config);
    let mut rng = StdRng::seed_from_u64(12);

    let mut checked = 0;
    for _ in 0..200 {
        let mut parent = Individual::random(shape, &mut rng);
        evaluator.evaluate(&mut parent).unwrap();
        let mut child = parent.clone();
        mutation::point(&mut child, config.point_mutation_rate, &mut rng);

        let active_untouched = parent
            .active_nodes()
            .all(|i| parent.nodes[i] == child.nodes[i])
            && parent.outputs == child.outputs;
        if active_untouched {
            evaluator.evaluate(&mut child).unwrap();
            assert_eq!(child.score, parent.score);
            checked += 1;
        }
    }
    assert!(checked > 0);
}
