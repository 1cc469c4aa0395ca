//! The gate set, with ids as written in run logs and CMOS transistor costs.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Logic functions available to a genotype node.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Gate {
    And,
    Or,
    Not,
    Nand,
    Nor,
    Xor,
    Xnor,
    Wire,
}

/// Size of the gate set.
pub const NGATES: usize = 8;

impl Gate {
    pub const ALL: [Gate; NGATES] = [
        Gate::And,
        Gate::Or,
        Gate::Not,
        Gate::Nand,
        Gate::Nor,
        Gate::Xor,
        Gate::Xnor,
        Gate::Wire,
    ];

    /// Numeric identifier (1-based) used in logs and circuit files.
    pub fn id(self) -> u32 {
        match self {
            Gate::And => 1,
            Gate::Or => 2,
            Gate::Not => 3,
            Gate::Nand => 4,
            Gate::Nor => 5,
            Gate::Xor => 6,
            Gate::Xnor => 7,
            Gate::Wire => 8,
        }
    }

    pub fn from_id(id: u32) -> Option<Gate> {
        Gate::ALL.iter().copied().find(|g| g.id() == id)
    }

    pub fn name(self) -> &'static str {
        match self {
            Gate::And => "AND",
            Gate::Or => "OR",
            Gate::Not => "NOT",
            Gate::Nand => "NAND",
            Gate::Nor => "NOR",
            Gate::Xor => "XOR",
            Gate::Xnor => "XNOR",
            Gate::Wire => "WIRE",
        }
    }

    /// Number of inputs the gate actually reads.
    pub fn arity(self) -> usize {
        match self {
            Gate::Not | Gate::Wire => 1,
            _ => 2,
        }
    }

    /// Static CMOS transistor count.
    pub fn transistors(self) -> u32 {
        match self {
            Gate::And | Gate::Or => 6,
            Gate::Not => 2,
            Gate::Nand | Gate::Nor => 4,
            Gate::Xor | Gate::Xnor => 12,
            Gate::Wire => 0,
        }
    }

    /// Evaluate on plain booleans.
    pub fn eval(self, a: bool, b: bool) -> bool {
        match self {
            Gate::And => a && b,
            Gate::Or => a || b,
            Gate::Not => !a,
            Gate::Nand => !(a && b),
            Gate::Nor => !(a || b),
            Gate::Xor => a ^ b,
            Gate::Xnor => !(a ^ b),
            Gate::Wire => a,
        }
    }
}

impl Display for Gate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Gate {
    type Err = String;

    /// Accepts either the gate name (case-insensitive) or its numeric id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(id) = s.parse::<u32>() {
            return Gate::from_id(id).ok_or_else(|| format!("unknown gate id {}", id));
        }
        Gate::ALL
            .iter()
            .copied()
            .find(|g| g.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown gate '{}'", s))
    }
}
