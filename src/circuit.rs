//! Plain-text gate-list circuits, used for seeding and the final report.
//!
//! ```text
//! # half adder
//! gate XOR i0 i1
//! gate AND i0 i1
//! output g0
//! output g1
//! ```
//!
//! `i<k>` names primary input `k` and `g<k>` the `k`-th gate line, which must
//! appear earlier. Unary gates may omit their second source.

use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

use rand::Rng;

use crate::error::{Error, Result};
use crate::gate::Gate;
use crate::genotype::{Individual, Node, Shape, Source};

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Circuit {
    pub gates: Vec<Node>,
    pub outputs: Vec<Source>,
    /// Source line of each gate, for error reporting.
    lines: Vec<usize>,
}

/// Seed circuit location for a target table: same path, `.circuit` extension.
pub fn seed_path(table_path: impl AsRef<Path>) -> PathBuf {
    table_path.as_ref().with_extension("circuit")
}

fn parse_source(token: &str, gates_so_far: usize, line: usize) -> Result<Source> {
    let error = |message: String| Error::Circuit { line, message };
    let (kind, index) = token.split_at(token.find(|c: char| c.is_ascii_digit()).unwrap_or(token.len()));
    let index: usize = index
        .parse()
        .map_err(|_| error(format!("bad source '{}'", token)))?;
    match kind {
        "i" => Ok(Source::Input(index)),
        "g" if index < gates_so_far => Ok(Source::Node(index)),
        "g" => Err(error(format!("'{}' does not refer to an earlier gate", token))),
        _ => Err(error(format!("bad source '{}'", token))),
    }
}

impl Circuit {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        text.parse()
    }

    /// Active part of `individual`, renumbered densely.
    pub fn from_individual(individual: &Individual) -> Self {
        let mut renumber = vec![usize::MAX; individual.nodes.len()];
        let mut gates = Vec::new();
        let map = |renumber: &[usize], s: Source| match s {
            Source::Node(j) => Source::Node(renumber[j]),
            input => input,
        };
        for i in individual.active_nodes() {
            let node = individual.nodes[i];
            let a = map(&renumber, node.inputs[0]);
            let b = if node.gate.arity() == 1 {
                a
            } else {
                map(&renumber, node.inputs[1])
            };
            renumber[i] = gates.len();
            gates.push(Node {
                gate: node.gate,
                inputs: [a, b],
            });
        }
        let outputs = individual.outputs.iter().map(|&s| map(&renumber, s)).collect();
        let lines = (1..=gates.len()).collect();
        Self { gates, outputs, lines }
    }

    /// Check the circuit against the declared gate count and the genotype
    /// geometry, then place it in nodes `0..gates` and fill the rest randomly.
    pub fn to_individual<R: Rng>(&self, shape: Shape, ngates: usize, rng: &mut R) -> Result<Individual> {
        let error = |line: usize, message: String| Error::Circuit { line, message };

        if self.gates.len() != ngates {
            return Err(Error::Config(format!(
                "circuit has {} gates but ngates={}",
                self.gates.len(),
                ngates
            )));
        }
        if ngates > shape.num_nodes() {
            return Err(Error::Config(format!(
                "{} gates do not fit into {} nodes",
                ngates,
                shape.num_nodes()
            )));
        }
        if self.outputs.len() != shape.num_outputs {
            return Err(error(
                0,
                format!("expected {} outputs, found {}", shape.num_outputs, self.outputs.len()),
            ));
        }

        for (i, gate) in self.gates.iter().enumerate() {
            for &s in &gate.inputs {
                if !shape.is_legal_source(i, s) {
                    return Err(error(
                        self.lines[i],
                        format!("source {:?} is out of range or beyond levels-back {}", s, shape.levels_back),
                    ));
                }
            }
        }
        for &s in &self.outputs {
            if !shape.is_legal_output_source(s) {
                return Err(error(0, format!("output source {:?} is out of range", s)));
            }
        }

        let nodes = (0..shape.num_nodes())
            .map(|i| match self.gates.get(i) {
                Some(node) => *node,
                None => shape.random_node(i, rng),
            })
            .collect();
        Ok(Individual::from_genes(shape, nodes, self.outputs.clone()))
    }
}

impl std::str::FromStr for Circuit {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        let mut gates = Vec::new();
        let mut outputs = Vec::new();
        let mut lines = Vec::new();

        for (i, raw) in text.lines().enumerate() {
            let line = i + 1;
            let content = raw.split('#').next().unwrap_or("").trim();
            let tokens: Vec<&str> = content.split_whitespace().collect();
            let error = |message: String| Error::Circuit { line, message };

            match tokens.as_slice() {
                [] => {}
                ["gate", name, sources @ ..] => {
                    let gate: Gate = name.parse().map_err(error)?;
                    let parsed = sources
                        .iter()
                        .map(|t| parse_source(t, gates.len(), line))
                        .collect::<Result<Vec<_>>>()?;
                    let inputs = match (parsed.as_slice(), gate.arity()) {
                        ([a, b], 2) | ([a, b], 1) => [*a, *b],
                        ([a], 1) => [*a, *a],
                        _ => {
                            return Err(error(format!(
                                "{} takes {} source(s), found {}",
                                gate,
                                gate.arity(),
                                parsed.len()
                            )))
                        }
                    };
                    gates.push(Node { gate, inputs });
                    lines.push(line);
                }
                ["output", source] => outputs.push(parse_source(source, gates.len(), line)?),
                _ => return Err(error(format!("cannot parse '{}'", content))),
            }
        }

        Ok(Self { gates, outputs, lines })
    }
}

impl Display for Circuit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = |s: Source| match s {
            Source::Input(k) => format!("i{}", k),
            Source::Node(j) => format!("g{}", j),
        };
        for gate in &self.gates {
            write!(f, "gate {} {}", gate.gate, name(gate.inputs[0]))?;
            if gate.gate.arity() == 2 {
                write!(f, " {}", name(gate.inputs[1]))?;
            }
            writeln!(f)?;
        }
        for &s in &self.outputs {
            writeln!(f, "output {}", name(s))?;
        }
        Ok(())
    }
}
