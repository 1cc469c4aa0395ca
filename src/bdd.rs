//! Reduced ordered BDD manager with complement edges.
//!
//! All nodes live in one fixed-capacity [`Storage`] that doubles as the unique
//! table. Variable `v` (1-based) is placed at level `v`, so the ordering is
//! the natural one. The single terminal is node 1: [`Bdd::one`] is `@1` and
//! [`Bdd::zero`] is `~@1`.
//!
//! Nodes are never freed implicitly. Callers register the handles they keep
//! across generations with [`Bdd::protect`] and call
//! [`Bdd::collect_garbage`] when the pool fills up; every other handle is
//! invalid after a collection.

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::fmt::Debug;

use log::debug;

use crate::cache::Cache;
use crate::engine::{EngineError, FunctionEngine};
use crate::gate::Gate;
use crate::reference::Ref;
use crate::storage::Storage;
use crate::utils::{pairing3, scramble, MyHash};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct Node {
    variable: u32,
    low: Ref,
    high: Ref,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            variable: 0,
            low: Ref::positive(1),
            high: Ref::positive(1),
        }
    }
}

impl MyHash for Node {
    fn hash(&self) -> u64 {
        scramble(pairing3(
            self.variable as u64,
            self.low.unsigned() as u64,
            self.high.unsigned() as u64,
        ))
    }
}

type IteKey = (Ref, Ref, Ref);

pub struct Bdd {
    storage: RefCell<Storage<Node>>,
    cache: RefCell<Cache<IteKey, Ref>>,
    roots: RefCell<Vec<Ref>>,
    pub zero: Ref,
    pub one: Ref,
}

impl Bdd {
    /// Create a manager with a pool of `2^storage_bits` nodes and a computed
    /// table of `2^cache_bits` lines.
    pub fn new(storage_bits: usize, cache_bits: usize) -> Self {
        assert!(
            storage_bits <= 31,
            "Storage bits should be in the range 0..=31"
        );

        let mut storage = Storage::new(storage_bits);

        // Allocate the terminal node:
        let one = match storage.alloc() {
            Ok(index) => index,
            Err(e) => panic!("Storage cannot hold the terminal node: {}", e),
        };
        assert_eq!(one, 1); // Make sure the terminal node is (1).
        let one = Ref::positive(one as u32);
        let zero = -one;

        Self {
            storage: RefCell::new(storage),
            cache: RefCell::new(Cache::new(cache_bits)),
            roots: RefCell::new(Vec::new()),
            zero,
            one,
        }
    }
}

impl Default for Bdd {
    fn default() -> Self {
        Bdd::new(20, 16)
    }
}

impl Debug for Bdd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let storage = self.storage.borrow();
        f.debug_struct("Bdd")
            .field("capacity", &storage.capacity())
            .field("size", &storage.size())
            .field("real_size", &storage.real_size())
            .field("roots", &self.roots.borrow().len())
            .finish()
    }
}

impl Bdd {
    pub fn cache(&self) -> std::cell::Ref<'_, Cache<IteKey, Ref>> {
        self.cache.borrow()
    }

    pub fn capacity(&self) -> usize {
        self.storage.borrow().capacity()
    }

    /// Number of live nodes, terminal included.
    pub fn num_nodes(&self) -> usize {
        self.storage.borrow().real_size()
    }

    pub fn variable(&self, index: usize) -> u32 {
        self.storage.borrow()[index].variable
    }
    pub fn low(&self, index: usize) -> Ref {
        self.storage.borrow()[index].low
    }
    pub fn high(&self, index: usize) -> Ref {
        self.storage.borrow()[index].high
    }

    pub fn low_node(&self, node: Ref) -> Ref {
        let low = self.low(node.index());
        if node.is_negated() {
            -low
        } else {
            low
        }
    }
    pub fn high_node(&self, node: Ref) -> Ref {
        let high = self.high(node.index());
        if node.is_negated() {
            -high
        } else {
            high
        }
    }

    pub fn is_zero(&self, node: Ref) -> bool {
        node == self.zero
    }
    pub fn is_one(&self, node: Ref) -> bool {
        node == self.one
    }
    pub fn is_terminal(&self, node: Ref) -> bool {
        node.index() == self.one.index()
    }

    pub fn mk_node(&self, v: u32, low: Ref, high: Ref) -> Result<Ref, EngineError> {
        assert_ne!(v, 0, "Variable index should not be zero");

        // Handle canonicity
        if high.is_negated() {
            return Ok(-self.mk_node(v, -low, -high)?);
        }

        // Handle duplicates
        if low == high {
            return Ok(low);
        }

        let i = self.storage.borrow_mut().put(Node {
            variable: v,
            low,
            high,
        })?;
        Ok(Ref::positive(i as u32))
    }

    pub fn mk_var(&self, v: u32) -> Result<Ref, EngineError> {
        assert_ne!(v, 0, "Variable index should not be zero");
        self.mk_node(v, self.zero, self.one)
    }

    pub fn top_cofactors(&self, node: Ref, v: u32) -> (Ref, Ref) {
        assert_ne!(v, 0, "Variable index should not be zero");

        if self.is_terminal(node) || v < self.variable(node.index()) {
            return (node, node);
        }
        assert_eq!(v, self.variable(node.index()));
        (self.low_node(node), self.high_node(node))
    }

    /// Apply the ITE operation to the arguments.
    ///
    /// ```text
    /// ITE(x, y, z) = (x ∧ y) ∨ (¬x ∧ z)
    /// ```
    pub fn apply_ite(&self, f: Ref, g: Ref, h: Ref) -> Result<Ref, EngineError> {
        // Base cases:
        //   ite(1,G,H) => G
        //   ite(0,G,H) => H
        if self.is_one(f) {
            return Ok(g);
        }
        if self.is_zero(f) {
            return Ok(h);
        }

        // From now on, F is known not to be a constant.
        //   ite(F,G,G) => G
        //   ite(F,1,0) => F
        //   ite(F,0,1) => ~F
        if g == h {
            return Ok(g);
        }
        if self.is_one(g) && self.is_zero(h) {
            return Ok(f);
        }
        if self.is_zero(g) && self.is_one(h) {
            return Ok(-f);
        }

        // Standard triples:
        //   ite(F,F,H) => ite(F,1,H)
        //   ite(F,G,F) => ite(F,G,0)
        //   ite(F,~F,H) => ite(F,0,H)
        //   ite(F,G,~F) => ite(F,G,1)
        if g == f {
            return self.apply_ite(f, self.one, h);
        }
        if h == f {
            return self.apply_ite(f, g, self.zero);
        }
        if g == -f {
            return self.apply_ite(f, self.zero, h);
        }
        if h == -f {
            return self.apply_ite(f, g, self.one);
        }

        let i = self.variable(f.index());
        let j = self.variable(g.index());
        let k = self.variable(h.index());
        assert_ne!(i, 0);

        // Equivalent pairs (choose the one with the lowest top variable):
        //   ite(F,1,H) == ite(H,1,F) == F ∨ H
        //   ite(F,G,0) == ite(G,F,0) == F ∧ G
        //   ite(F,G,1) == ite(~G,~F,1) == F -> G
        //   ite(F,0,H) == ite(~H,0,~F) == ~F ∧ H
        //   ite(F,G,~G) == ite(G,F,~F)
        if self.is_one(g) && k != 0 && k < i {
            return self.apply_ite(h, self.one, f);
        }
        if self.is_zero(h) && j != 0 && j < i {
            return self.apply_ite(g, f, self.zero);
        }
        if self.is_one(h) && j != 0 && j < i {
            return self.apply_ite(-g, -f, self.one);
        }
        if self.is_zero(g) && k != 0 && k < i {
            return self.apply_ite(-h, self.zero, -f);
        }
        if g == -h && j != 0 && j < i {
            return self.apply_ite(g, f, -f);
        }

        // Make sure the first two pointers (f and g) are regular (not negated).
        let (mut f, mut g, mut h) = (f, g, h);

        // ite(~F,G,H) => ite(F,H,G)
        if f.is_negated() {
            f = -f;
            std::mem::swap(&mut g, &mut h);
        }

        // ite(F,~G,H) => ~ite(F,G,~H)
        let mut n = false;
        if g.is_negated() {
            n = true;
            g = -g;
            h = -h;
        }

        let key = (f, g, h);
        if let Some(&res) = self.cache.borrow().get(&key) {
            return Ok(if n { -res } else { res });
        }

        // Determine the top variable:
        let mut m = self.variable(f.index());
        let j = self.variable(g.index());
        let k = self.variable(h.index());
        if j != 0 {
            m = m.min(j);
        }
        if k != 0 {
            m = m.min(k);
        }
        assert_ne!(m, 0);

        let (f0, f1) = self.top_cofactors(f, m);
        let (g0, g1) = self.top_cofactors(g, m);
        let (h0, h1) = self.top_cofactors(h, m);

        let e = self.apply_ite(f0, g0, h0)?;
        let t = self.apply_ite(f1, g1, h1)?;

        let res = self.mk_node(m, e, t)?;
        self.cache.borrow_mut().insert(key, res);

        Ok(if n { -res } else { res })
    }

    pub fn apply_not(&self, f: Ref) -> Ref {
        -f
    }

    pub fn apply_and(&self, u: Ref, v: Ref) -> Result<Ref, EngineError> {
        self.apply_ite(u, v, self.zero)
    }

    pub fn apply_or(&self, u: Ref, v: Ref) -> Result<Ref, EngineError> {
        self.apply_ite(u, self.one, v)
    }

    pub fn apply_xor(&self, u: Ref, v: Ref) -> Result<Ref, EngineError> {
        self.apply_ite(u, -v, v)
    }

    pub fn apply_eq(&self, u: Ref, v: Ref) -> Result<Ref, EngineError> {
        self.apply_ite(u, v, -v)
    }

    /// Apply a logic gate. Unary gates ignore `v`.
    pub fn apply_gate(&self, gate: Gate, u: Ref, v: Ref) -> Result<Ref, EngineError> {
        match gate {
            Gate::And => self.apply_and(u, v),
            Gate::Or => self.apply_or(u, v),
            Gate::Not => Ok(self.apply_not(u)),
            Gate::Nand => Ok(-self.apply_and(u, v)?),
            Gate::Nor => Ok(-self.apply_or(u, v)?),
            Gate::Xor => self.apply_xor(u, v),
            Gate::Xnor => self.apply_eq(u, v),
            Gate::Wire => Ok(u),
        }
    }

    /// Conjunction of literals given as signed 1-based variables.
    pub fn cube(&self, literals: impl IntoIterator<Item = i32>) -> Result<Ref, EngineError> {
        let mut literals = literals.into_iter().collect::<Vec<_>>();
        literals.sort_by_key(|&v| std::cmp::Reverse(v.abs()));
        let mut current = self.one;
        for lit in literals {
            assert_ne!(lit, 0, "Variable index should not be zero");
            current = if lit < 0 {
                self.mk_node(lit.unsigned_abs(), current, self.zero)?
            } else {
                self.mk_node(lit.unsigned_abs(), self.zero, current)?
            };
        }
        Ok(current)
    }

    /// Storage indices of all nodes reachable from `nodes`, terminal included.
    pub fn descendants(&self, nodes: impl IntoIterator<Item = Ref>) -> HashSet<usize> {
        let mut visited = HashSet::new();
        visited.insert(self.one.index());
        let mut queue = VecDeque::from_iter(nodes);

        while let Some(node) = queue.pop_front() {
            let i = node.index();
            if visited.insert(i) {
                queue.push_back(self.low(i));
                queue.push_back(self.high(i));
            }
        }

        visited
    }

    pub fn size(&self, f: Ref) -> usize {
        self.descendants([f]).len()
    }

    /// Keep `f` alive across [`Bdd::collect_garbage`].
    pub fn protect(&self, f: Ref) {
        if !self.is_terminal(f) {
            self.roots.borrow_mut().push(f);
        }
    }

    /// Release every node not reachable from a protected root.
    pub fn collect_garbage(&self) {
        debug!("Collecting garbage...");

        self.cache.borrow_mut().clear();

        let alive = self.descendants(self.roots.borrow().iter().copied());
        let before = self.num_nodes();

        let mut storage = self.storage.borrow_mut();
        let mut kept = Vec::new();
        for b in 0..storage.num_buckets() {
            let mut index = storage.bucket(b);
            if index == 0 {
                continue;
            }

            kept.clear();
            while index != 0 {
                let next = storage.next(index);
                if alive.contains(&index) {
                    kept.push(index);
                } else {
                    storage.drop(index);
                }
                index = next;
            }

            // Relink the surviving chain.
            storage.set_bucket(b, kept.first().copied().unwrap_or(0));
            for w in kept.windows(2) {
                storage.set_next(w[0], w[1]);
            }
            if let Some(&last) = kept.last() {
                storage.set_next(last, 0);
            }
        }

        debug!(
            "Garbage collected: {} -> {} nodes",
            before,
            storage.real_size()
        );
    }
}

impl FunctionEngine for Bdd {
    type Function = Ref;

    fn projection(&self, index: usize) -> Result<Ref, EngineError> {
        self.mk_var(index as u32 + 1)
    }

    fn constant(&self, value: bool) -> Ref {
        if value {
            self.one
        } else {
            self.zero
        }
    }

    fn combine(&self, gate: Gate, a: &Ref, b: &Ref) -> Result<Ref, EngineError> {
        self.apply_gate(gate, *a, *b)
    }

    fn satisfying_count(&self, f: &Ref, num_vars: usize) -> Result<u64, EngineError> {
        let count = self.sat_count(*f, num_vars);
        u64::try_from(&count).map_err(|_| EngineError::CountOverflow)
    }

    fn node_count(&self) -> usize {
        self.num_nodes()
    }

    fn allocated_capacity(&self) -> usize {
        self.capacity()
    }

    fn protect(&self, f: &Ref) {
        Bdd::protect(self, *f);
    }

    fn garbage_collect(&self) {
        self.collect_garbage();
    }

    fn shutdown(self) {
        debug!(
            "Shutting down {:?}: cache hits = {}, misses = {}",
            self,
            self.cache().hits(),
            self.cache().misses()
        );
    }
}

#[cfg(test)]
mod tests {
    use num_bigint::BigUint;
    use test_log::test;

    use super::*;

    fn small() -> Bdd {
        Bdd::new(12, 10)
    }

    #[test]
    fn test_var() {
        let bdd = small();

        let x = bdd.mk_var(1).unwrap();

        assert_eq!(bdd.variable(x.index()), 1);
        assert_eq!(bdd.high_node(x), bdd.one);
        assert_eq!(bdd.low_node(x), bdd.zero);
    }

    #[test]
    fn test_not_var() {
        let bdd = small();

        let x = bdd.mk_var(1).unwrap();
        let not_x = -x;

        assert_eq!(bdd.variable(not_x.index()), 1);
        assert_eq!(bdd.high_node(not_x), bdd.zero);
        assert_eq!(bdd.low_node(not_x), bdd.one);
    }

    #[test]
    fn test_terminal() {
        let bdd = small();

        assert!(bdd.is_terminal(bdd.zero));
        assert!(bdd.is_zero(bdd.zero));
        assert!(!bdd.is_one(bdd.zero));
        assert!(bdd.is_terminal(bdd.one));
        assert_eq!(bdd.variable(bdd.one.index()), 0);
    }

    #[test]
    fn test_cube() {
        let bdd = small();

        let x1 = bdd.mk_var(1).unwrap();
        let x2 = bdd.mk_var(2).unwrap();
        let x3 = bdd.mk_var(3).unwrap();

        let f = bdd.apply_and(bdd.apply_and(x1, -x2).unwrap(), -x3).unwrap();
        assert_eq!(bdd.cube([1, -2, -3]).unwrap(), f);
    }

    #[test]
    fn test_de_morgan() {
        let bdd = small();

        let x = bdd.mk_var(1).unwrap();
        let y = bdd.mk_var(2).unwrap();

        let f = -bdd.apply_and(x, y).unwrap();
        let g = bdd.apply_or(-x, -y).unwrap();
        assert_eq!(f, g);
        assert_eq!(bdd.apply_gate(Gate::Nand, x, y).unwrap(), f);
    }

    #[test]
    fn test_xor_itself() {
        let bdd = small();

        let x = bdd.mk_var(1).unwrap();
        let y = bdd.mk_var(2).unwrap();
        let f = bdd.apply_and(x, y).unwrap();

        assert_eq!(bdd.apply_xor(f, f).unwrap(), bdd.zero);
        assert_eq!(bdd.apply_xor(f, -f).unwrap(), bdd.one);
    }

    #[test]
    fn test_xnor_is_negated_xor() {
        let bdd = small();

        let x = bdd.mk_var(1).unwrap();
        let y = bdd.mk_var(2).unwrap();

        let xor = bdd.apply_gate(Gate::Xor, x, y).unwrap();
        let xnor = bdd.apply_gate(Gate::Xnor, x, y).unwrap();
        assert_eq!(xnor, -xor);
    }

    #[test]
    fn test_apply_ite_general_case() {
        let bdd = small();

        let f = bdd.mk_var(6).unwrap();
        let g = bdd.mk_var(7).unwrap();
        let h = bdd.mk_var(8).unwrap();
        let result = bdd.mk_node(bdd.variable(f.index()), -g, -h).unwrap();
        assert_eq!(bdd.apply_ite(-f, -g, -h).unwrap(), result);
    }

    #[test]
    fn test_pool_exhaustion_is_reported() {
        // Sentry, terminal and two variables fill 2^2 cells.
        let bdd = Bdd::new(2, 2);
        let x1 = bdd.mk_var(1).unwrap();
        let x2 = bdd.mk_var(2).unwrap();
        let res = bdd.apply_and(x1, x2);
        assert_eq!(res, Err(EngineError::PoolExhausted { capacity: 4 }));
    }

    #[test]
    fn test_collect_garbage_keeps_roots() {
        let bdd = small();

        let x1 = bdd.mk_var(1).unwrap();
        let x2 = bdd.mk_var(2).unwrap();
        let x3 = bdd.mk_var(3).unwrap();
        bdd.protect(x1);
        bdd.protect(x2);

        let kept = bdd.apply_xor(x1, x2).unwrap();
        bdd.protect(kept);
        let _garbage = bdd.apply_and(bdd.apply_or(x1, x3).unwrap(), x2).unwrap();

        let before = bdd.num_nodes();
        bdd.collect_garbage();
        let after = bdd.num_nodes();
        assert!(after < before);
        assert_eq!(after, bdd.descendants([x1, x2, kept]).len());

        // Protected handles remain valid and canonical.
        assert_eq!(bdd.apply_xor(x1, x2).unwrap(), kept);
        assert_eq!(bdd.sat_count(kept, 2), BigUint::from(2u32));
    }

    #[test]
    fn test_storage_reused_after_collection() {
        let bdd = small();
        let x1 = bdd.mk_var(1).unwrap();
        bdd.protect(x1);
        let x2 = bdd.mk_var(2).unwrap();
        let _ = bdd.apply_and(x1, x2).unwrap();
        bdd.collect_garbage();
        assert_eq!(bdd.num_nodes(), 2);
        // Rebuilding after collection yields working nodes again.
        let x2 = bdd.mk_var(2).unwrap();
        let f = bdd.apply_and(x1, x2).unwrap();
        assert_eq!(bdd.sat_count(f, 2), BigUint::from(1u32));
    }
}
