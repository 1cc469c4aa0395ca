//! # cgp-bdd: evolving combinational logic circuits
//!
//! **`cgp-bdd`** synthesizes a gate-level circuit for a target truth table and then
//! shrinks it, using **Cartesian Genetic Programming (CGP)** for the search and
//! **Binary Decision Diagrams (BDDs)** to score candidates exactly.
//!
//! ## How it works
//!
//! A candidate circuit is a fixed grid of gate nodes ([`genotype`]). Only nodes
//! reachable from the outputs (the *active* genes) take part in the circuit.
//! The [`fitness`] evaluator composes the active gates into BDDs, XORs each
//! output with its target and counts the satisfying assignments of the
//! mismatch. A count of 0 means the circuit is correct.
//!
//! The [`evolution`] controller runs a (1 + λ) strategy in two phases:
//!
//! - **Phase I** minimizes the mismatch count until some circuit is correct.
//! - **Phase II** keeps the circuit correct and minimizes its transistor count.
//!
//! ## Basic usage
//!
//! ```rust
//! use cgp_bdd::bdd::Bdd;
//! use cgp_bdd::config::{MutationKind, RunConfig};
//! use cgp_bdd::evolution::{Evolution, SearchOutcome};
//! use cgp_bdd::fitness::Evaluator;
//! use cgp_bdd::report::RunLog;
//! use cgp_bdd::table::TargetTable;
//!
//! // f = x0 XOR x1
//! let table: TargetTable = ".i 2\n.o 1\n01 1\n10 1\n".parse().unwrap();
//!
//! let config = RunConfig::new(1, 4, 10_000, MutationKind::Sam).with_pool(16, 12);
//! let evaluator = Evaluator::new(Bdd::new(config.pool_bits, config.cache_bits), &table).unwrap();
//! let mut evolution = Evolution::new(&config, evaluator, RunLog::new(Vec::new()));
//!
//! if evolution.run().unwrap() == SearchOutcome::Feasible {
//!     assert_eq!(evolution.parent().score, 0);
//! }
//! ```
//!
//! ## Core components
//!
//! - **[`bdd`]**: the BDD manager behind the [`engine::FunctionEngine`] interface.
//! - **[`exhaustive`]**: a truth-table engine for small widths and cross-checks.
//! - **[`mutation`]**: SAM, SAM+GAM and PM operators.
//! - **[`report`]**: the tab-separated run log.

pub mod bdd;
pub mod cache;
pub mod circuit;
pub mod config;
pub mod engine;
pub mod error;
pub mod evolution;
pub mod exhaustive;
pub mod fitness;
pub mod gate;
pub mod genotype;
pub mod guard;
pub mod mutation;
pub mod population;
pub mod reference;
pub mod report;
pub mod sat;
pub mod storage;
pub mod table;
pub mod utils;
