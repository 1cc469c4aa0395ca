//! Tab-separated run log.

use std::io::{self, Write};

use crate::circuit::Circuit;
use crate::config::MutationKind;
use crate::genotype::Individual;

const SEPARATOR: &str = "--------------------------";

pub struct RunLog<W: Write> {
    out: W,
}

impl<W: Write> RunLog<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    /// First line of every log: the mutation operator.
    pub fn banner(&mut self, mutation: MutationKind) -> io::Result<()> {
        writeln!(self.out, "{}", mutation)?;
        self.out.flush()
    }

    pub fn separator(&mut self) -> io::Result<()> {
        writeln!(self.out, "{}", SEPARATOR)?;
        self.out.flush()
    }

    pub fn header(&mut self, num_inputs: usize, num_outputs: usize) -> io::Result<()> {
        write!(self.out, "Eval.\tIndv.\tGene\tScore\tGates\tTrans.\t")?;
        for k in 0..num_outputs {
            write!(self.out, "DO{}\t", k)?;
        }
        write!(self.out, "Gate\tIn.1\tIn.2\tDepth\t")?;
        for k in 0..num_inputs {
            write!(self.out, "DI{}\t", k)?;
        }
        writeln!(self.out)
    }

    /// One generation: `slot` is the winner, `used` the evaluations spent so far.
    pub fn row(&mut self, used: u64, slot: usize, winner: &Individual) -> io::Result<()> {
        let shape = &winner.shape;
        let m = &winner.metrics;

        let gene = winner.last_mutation.map_or(-1, |g| g as i64);
        write!(
            self.out,
            "{}\t{}\t{}\t{}\t{}\t{}\t",
            used, slot, gene, winner.score, m.gates, m.transistors
        )?;
        for d in &m.output_depths {
            write!(self.out, "{}\t", d)?;
        }

        match winner.last_mutation {
            Some(g) if g < shape.num_nodes() => {
                let node = &winner.nodes[g];
                write!(
                    self.out,
                    "{}\t{}\t{}\t",
                    node.gate.id(),
                    node.inputs[0].flatten(shape.num_inputs),
                    node.inputs[1].flatten(shape.num_inputs)
                )?;
            }
            Some(g) => {
                let source = winner.outputs[g - shape.num_nodes()];
                write!(self.out, "OUT\t{}\t-\t", source.flatten(shape.num_inputs))?;
            }
            None => write!(self.out, "-\t-\t-\t")?,
        }

        write!(self.out, "{}\t", m.depth)?;
        for f in &m.input_fanout {
            write!(self.out, "{}\t", f)?;
        }
        writeln!(self.out)?;
        self.out.flush()
    }

    pub fn sat_summary(&mut self, score: u64, slot: usize, remaining: i64) -> io::Result<()> {
        writeln!(
            self.out,
            "SAT COUNT: {} INDIVIDUAL: {} EVALUATIONS: {}",
            score, slot, remaining
        )?;
        self.out.flush()
    }

    pub fn transistor_summary(&mut self, transistors: u32, slot: usize, remaining: i64) -> io::Result<()> {
        writeln!(
            self.out,
            "NUM TRANSISTORS: {} INDIVIDUAL: {} EVALUATIONS: {}",
            transistors, slot, remaining
        )?;
        self.out.flush()
    }

    /// Cost figures followed by the active circuit in seed format.
    pub fn circuit_report(&mut self, individual: &Individual) -> io::Result<()> {
        let m = &individual.metrics;
        writeln!(self.out, "GATES: {}", m.gates)?;
        writeln!(self.out, "TRANSISTORS: {}", m.transistors)?;
        writeln!(self.out, "DEPTH: {}", m.depth)?;
        write!(self.out, "{}", Circuit::from_individual(individual))?;
        self.out.flush()
    }

    pub fn total_time(&mut self, seconds: f64) -> io::Result<()> {
        writeln!(self.out, "TOTAL TIME: {:.6} seconds", seconds)?;
        self.out.flush()
    }
}
