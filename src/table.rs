//! Target truth tables in PLA format.
//!
//! ```text
//! # 2-input XOR
//! .i 2
//! .o 1
//! .p 2
//! 01 1
//! 10 1
//! .e
//! ```
//!
//! Every cube line lists one character per input (`0`, `1` or `-`) followed by
//! one character per output. An output character `1` puts the cube into the
//! on-set of that output; `0`, `-` and `~` leave it out.

use std::fs;
use std::path::Path;

use crate::engine::{EngineError, FunctionEngine};
use crate::error::{Error, Result};
use crate::gate::Gate;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Literal {
    Zero,
    One,
    DontCare,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Cube {
    pub inputs: Vec<Literal>,
    pub outputs: Vec<bool>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TargetTable {
    pub num_inputs: usize,
    pub num_outputs: usize,
    pub cubes: Vec<Cube>,
}

impl TargetTable {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        text.parse()
    }

    /// Build a table from the full truth table of `f`.
    pub fn from_fn(num_inputs: usize, num_outputs: usize, f: impl Fn(&[bool]) -> Vec<bool>) -> Self {
        let mut cubes = Vec::with_capacity(1 << num_inputs);
        let mut assignment = vec![false; num_inputs];
        for i in 0..(1usize << num_inputs) {
            for (k, value) in assignment.iter_mut().enumerate() {
                *value = (i >> k) & 1 == 1;
            }
            let outputs = f(&assignment);
            assert_eq!(outputs.len(), num_outputs, "Expected {} outputs", num_outputs);
            let inputs = assignment
                .iter()
                .map(|&b| if b { Literal::One } else { Literal::Zero })
                .collect();
            cubes.push(Cube { inputs, outputs });
        }
        Self {
            num_inputs,
            num_outputs,
            cubes,
        }
    }

    /// Build one function per output with the given engine.
    pub fn build_targets<E: FunctionEngine>(
        &self,
        engine: &E,
        inputs: &[E::Function],
    ) -> std::result::Result<Vec<E::Function>, EngineError> {
        let mut targets = vec![engine.constant(false); self.num_outputs];
        for cube in &self.cubes {
            if !cube.outputs.iter().any(|&b| b) {
                continue;
            }
            let mut term = engine.constant(true);
            for (k, literal) in cube.inputs.iter().enumerate() {
                term = match literal {
                    Literal::One => engine.combine(Gate::And, &term, &inputs[k])?,
                    Literal::Zero => {
                        let negated = engine.combine(Gate::Not, &inputs[k], &inputs[k])?;
                        engine.combine(Gate::And, &term, &negated)?
                    }
                    Literal::DontCare => term,
                };
            }
            for (target, &on) in targets.iter_mut().zip(&cube.outputs) {
                if on {
                    *target = engine.combine(Gate::Or, target, &term)?;
                }
            }
        }
        Ok(targets)
    }
}

impl std::str::FromStr for TargetTable {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        let mut num_inputs = None;
        let mut num_outputs = None;
        let mut cubes = Vec::new();

        let error = |line: usize, message: String| Error::Table { line, message };

        for (i, raw) in text.lines().enumerate() {
            let line_no = i + 1;
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            if let Some(directive) = line.strip_prefix('.') {
                let mut parts = directive.split_whitespace();
                let keyword = parts.next().unwrap_or("");
                let count = || -> Result<usize> {
                    directive
                        .split_whitespace()
                        .nth(1)
                        .and_then(|v| v.parse().ok())
                        .ok_or_else(|| error(line_no, format!("'.{}' needs a count", keyword)))
                };
                match keyword {
                    "i" => num_inputs = Some(count()?),
                    "o" => num_outputs = Some(count()?),
                    "p" | "ilb" | "ob" | "type" | "e" | "end" => {}
                    other => log::warn!("Ignoring unknown PLA directive '.{}' at line {}", other, line_no),
                }
                continue;
            }

            let (n, m) = match (num_inputs, num_outputs) {
                (Some(n), Some(m)) => (n, m),
                _ => return Err(error(line_no, "cube before '.i' and '.o'".to_string())),
            };

            let symbols: String = line.split_whitespace().collect();
            if symbols.chars().count() != n + m {
                return Err(error(
                    line_no,
                    format!("expected {} input and {} output symbols", n, m),
                ));
            }

            let mut chars = symbols.chars();
            let inputs = chars
                .by_ref()
                .take(n)
                .map(|c| match c {
                    '0' => Ok(Literal::Zero),
                    '1' => Ok(Literal::One),
                    '-' => Ok(Literal::DontCare),
                    other => Err(error(line_no, format!("bad input symbol '{}'", other))),
                })
                .collect::<Result<Vec<_>>>()?;
            let outputs = chars
                .map(|c| match c {
                    '1' => Ok(true),
                    '0' | '-' | '~' => Ok(false),
                    other => Err(error(line_no, format!("bad output symbol '{}'", other))),
                })
                .collect::<Result<Vec<_>>>()?;

            cubes.push(Cube { inputs, outputs });
        }

        match (num_inputs, num_outputs) {
            (Some(n), Some(m)) if n > 0 && m > 0 => Ok(Self {
                num_inputs: n,
                num_outputs: m,
                cubes,
            }),
            (Some(_), Some(_)) => Err(error(0, "table needs at least one input and one output".to_string())),
            _ => Err(error(0, "missing '.i' or '.o' directive".to_string())),
        }
    }
}
