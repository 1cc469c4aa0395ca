//! Cartesian genotype: a fixed grid of gate nodes plus one output gene per
//! circuit output.
//!
//! Node `i` sits in column `i / rows`. It may read any primary input and any
//! node at most `levels_back` columns to its left. Output genes may read any
//! input or node. Genes are numbered `0..N` for nodes and `N..N + outputs`
//! for output genes.

use std::ops::Range;

use rand::Rng;

use crate::config::RunConfig;
use crate::gate::Gate;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Source {
    Input(usize),
    Node(usize),
}

impl Source {
    /// Single-number form used in run logs: inputs first, then nodes.
    pub fn flatten(self, num_inputs: usize) -> usize {
        match self {
            Source::Input(k) => k,
            Source::Node(j) => num_inputs + j,
        }
    }

    pub fn node(self) -> Option<usize> {
        match self {
            Source::Node(j) => Some(j),
            Source::Input(_) => None,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Node {
    pub gate: Gate,
    pub inputs: [Source; 2],
}

impl Node {
    /// Inputs the gate actually reads.
    pub fn read_inputs(&self) -> &[Source] {
        &self.inputs[..self.gate.arity()]
    }
}

/// One mutable position of the genotype.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Allele {
    Gate(usize),
    Input(usize, usize),
    Output(usize),
}

/// Geometry of the genotype grid.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Shape {
    pub num_inputs: usize,
    pub num_outputs: usize,
    pub columns: usize,
    pub rows: usize,
    pub levels_back: usize,
}

impl Shape {
    pub fn new(num_inputs: usize, num_outputs: usize, config: &RunConfig) -> Self {
        Self {
            num_inputs,
            num_outputs,
            columns: config.columns,
            rows: config.rows,
            levels_back: config.levels_back,
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.columns * self.rows
    }

    pub fn num_genes(&self) -> usize {
        self.num_nodes() + self.num_outputs
    }

    /// Three alleles per node plus one per output gene.
    pub fn num_alleles(&self) -> usize {
        3 * self.num_nodes() + self.num_outputs
    }

    pub fn column(&self, node: usize) -> usize {
        node / self.rows
    }

    /// Nodes that node `i` may read.
    pub fn node_sources(&self, i: usize) -> Range<usize> {
        let col = self.column(i);
        let first = col.saturating_sub(self.levels_back);
        first * self.rows..col * self.rows
    }

    /// Number of distinct legal sources for node `i`.
    pub fn num_sources(&self, i: usize) -> usize {
        self.num_inputs + self.node_sources(i).len()
    }

    pub fn num_output_sources(&self) -> usize {
        self.num_inputs + self.num_nodes()
    }

    pub fn is_legal_source(&self, i: usize, source: Source) -> bool {
        match source {
            Source::Input(k) => k < self.num_inputs,
            Source::Node(j) => self.node_sources(i).contains(&j),
        }
    }

    pub fn is_legal_output_source(&self, source: Source) -> bool {
        match source {
            Source::Input(k) => k < self.num_inputs,
            Source::Node(j) => j < self.num_nodes(),
        }
    }

    /// Whether `source` may feed the consumer allele (a node input or an output gene).
    pub fn is_legal_for(&self, consumer: Allele, source: Source) -> bool {
        match consumer {
            Allele::Input(i, _) => self.is_legal_source(i, source),
            Allele::Output(_) => self.is_legal_output_source(source),
            Allele::Gate(_) => false,
        }
    }

    pub fn random_source<R: Rng>(&self, i: usize, rng: &mut R) -> Source {
        let nodes = self.node_sources(i);
        let pick = rng.gen_range(0..self.num_inputs + nodes.len());
        if pick < self.num_inputs {
            Source::Input(pick)
        } else {
            Source::Node(nodes.start + pick - self.num_inputs)
        }
    }

    pub fn random_output_source<R: Rng>(&self, rng: &mut R) -> Source {
        let pick = rng.gen_range(0..self.num_output_sources());
        if pick < self.num_inputs {
            Source::Input(pick)
        } else {
            Source::Node(pick - self.num_inputs)
        }
    }

    pub fn random_node<R: Rng>(&self, i: usize, rng: &mut R) -> Node {
        Node {
            gate: Gate::ALL[rng.gen_range(0..Gate::ALL.len())],
            inputs: [self.random_source(i, rng), self.random_source(i, rng)],
        }
    }
}

/// Phenotype measurements derived from the active set.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Metrics {
    pub gates: usize,
    pub transistors: u32,
    pub depth: usize,
    pub output_depths: Vec<usize>,
    pub input_fanout: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct Individual {
    pub shape: Shape,
    pub nodes: Vec<Node>,
    pub outputs: Vec<Source>,
    /// Mismatch count against the target; 0 means functionally correct.
    pub score: u64,
    pub metrics: Metrics,
    /// Gene changed by the last mutation, if any.
    pub last_mutation: Option<usize>,
    active: Vec<bool>,
}

impl Individual {
    /// Assemble an individual from explicit genes and trace its active set.
    pub fn from_genes(shape: Shape, nodes: Vec<Node>, outputs: Vec<Source>) -> Self {
        assert_eq!(nodes.len(), shape.num_nodes());
        assert_eq!(outputs.len(), shape.num_outputs);
        let mut individual = Self {
            shape,
            nodes,
            outputs,
            score: u64::MAX,
            metrics: Metrics::default(),
            last_mutation: None,
            active: vec![false; shape.num_nodes()],
        };
        individual.update_active_genes();
        individual
    }

    pub fn random<R: Rng>(shape: Shape, rng: &mut R) -> Self {
        let nodes = (0..shape.num_nodes()).map(|i| shape.random_node(i, rng)).collect();
        let outputs = (0..shape.num_outputs)
            .map(|_| shape.random_output_source(rng))
            .collect();
        Self::from_genes(shape, nodes, outputs)
    }

    pub fn is_active(&self, node: usize) -> bool {
        self.active[node]
    }

    pub fn active_nodes(&self) -> impl Iterator<Item = usize> + '_ {
        self.active
            .iter()
            .enumerate()
            .filter_map(|(i, &a)| if a { Some(i) } else { None })
    }

    /// Active nodes plus every output gene.
    pub fn active_genes(&self) -> Vec<usize> {
        let n = self.shape.num_nodes();
        self.active_nodes().chain(n..n + self.shape.num_outputs).collect()
    }

    /// Recompute the active set from the outputs, then the metrics derived
    /// from it.
    pub fn update_active_genes(&mut self) {
        self.active.iter_mut().for_each(|a| *a = false);

        let mut stack: Vec<usize> = self.outputs.iter().filter_map(|s| s.node()).collect();
        for &j in &stack {
            self.active[j] = true;
        }
        while let Some(i) = stack.pop() {
            for source in self.nodes[i].read_inputs() {
                if let Source::Node(j) = *source {
                    if !self.active[j] {
                        self.active[j] = true;
                        stack.push(j);
                    }
                }
            }
        }

        self.update_metrics();
    }

    fn update_metrics(&mut self) {
        let mut depth = vec![0usize; self.nodes.len()];
        let mut metrics = Metrics {
            input_fanout: vec![0; self.shape.num_inputs],
            ..Metrics::default()
        };

        // Sources always precede their consumers, so index order is dependency order.
        for i in 0..self.nodes.len() {
            if !self.active[i] {
                continue;
            }
            let node = &self.nodes[i];
            metrics.gates += 1;
            metrics.transistors += node.gate.transistors();
            let mut d = 0;
            for source in node.read_inputs() {
                match *source {
                    Source::Input(k) => metrics.input_fanout[k] += 1,
                    Source::Node(j) => d = d.max(depth[j]),
                }
            }
            depth[i] = d + 1;
        }

        metrics.output_depths = self
            .outputs
            .iter()
            .map(|s| match *s {
                Source::Input(_) => 0,
                Source::Node(j) => depth[j],
            })
            .collect();
        metrics.depth = metrics.output_depths.iter().copied().max().unwrap_or(0);

        self.metrics = metrics;
    }

    /// Whether every gene respects acyclicity and levels-back.
    pub fn is_well_formed(&self) -> bool {
        self.nodes.len() == self.shape.num_nodes()
            && self.outputs.len() == self.shape.num_outputs
            && self
                .nodes
                .iter()
                .enumerate()
                .all(|(i, node)| node.inputs.iter().all(|&s| self.shape.is_legal_source(i, s)))
            && self.outputs.iter().all(|&s| self.shape.is_legal_output_source(s))
    }

    /// Current value of a source-valued allele.
    pub fn source_at(&self, allele: Allele) -> Option<Source> {
        match allele {
            Allele::Input(i, slot) => Some(self.nodes[i].inputs[slot]),
            Allele::Output(k) => Some(self.outputs[k]),
            Allele::Gate(_) => None,
        }
    }

    pub fn set_source(&mut self, allele: Allele, source: Source) {
        match allele {
            Allele::Input(i, slot) => self.nodes[i].inputs[slot] = source,
            Allele::Output(k) => self.outputs[k] = source,
            Allele::Gate(_) => panic!("gate allele {:?} has no source", allele),
        }
    }

    /// Gene index that owns `allele`.
    pub fn gene_of(&self, allele: Allele) -> usize {
        match allele {
            Allele::Gate(i) | Allele::Input(i, _) => i,
            Allele::Output(k) => self.shape.num_nodes() + k,
        }
    }

    /// Same genes, ignoring derived fields.
    pub fn same_genotype(&self, other: &Individual) -> bool {
        self.nodes == other.nodes && self.outputs == other.outputs
    }
}
