use std::collections::HashMap;

use num_bigint::BigUint;

use crate::bdd::Bdd;
use crate::reference::Ref;

impl Bdd {
    /// Number of assignments to variables `1..=num_vars` that satisfy `node`.
    ///
    /// `node` must not depend on variables above `num_vars`.
    pub fn sat_count(&self, node: Ref, num_vars: usize) -> BigUint {
        let mut cache = HashMap::new();
        let max = BigUint::from(1u32) << num_vars;
        self._sat_count(node, &max, &mut cache)
    }

    fn _sat_count(&self, node: Ref, max: &BigUint, cache: &mut HashMap<Ref, BigUint>) -> BigUint {
        if self.is_zero(node) {
            return BigUint::ZERO;
        } else if self.is_one(node) {
            return max.clone();
        }

        if let Some(count) = cache.get(&node) {
            return count.clone();
        }

        // Counts are taken over the full space, so each branch covers half of it.
        let low = self.low(node.index());
        let high = self.high(node.index());

        let count_low = self._sat_count(low, max, cache);
        let count_high = self._sat_count(high, max, cache);

        let count: BigUint = (count_low + count_high) >> 1;
        let count = if node.is_negated() { max - count } else { count };

        cache.insert(node, count.clone());
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big(x: u32) -> BigUint {
        BigUint::from(x)
    }

    #[test]
    fn test_sat_count_terminal() {
        let bdd = Bdd::new(10, 8);

        assert_eq!(bdd.sat_count(bdd.zero, 1), big(0));
        assert_eq!(bdd.sat_count(bdd.zero, 3), big(0));

        assert_eq!(bdd.sat_count(bdd.one, 1), big(2));
        assert_eq!(bdd.sat_count(bdd.one, 2), big(4));
        assert_eq!(bdd.sat_count(bdd.one, 3), big(8));
    }

    #[test]
    fn test_sat_count_var() {
        let bdd = Bdd::new(10, 8);

        let x1 = bdd.mk_var(1).unwrap();
        assert_eq!(bdd.sat_count(x1, 1), big(1));
        assert_eq!(bdd.sat_count(x1, 2), big(2));
        assert_eq!(bdd.sat_count(x1, 3), big(4));

        let x2 = bdd.mk_var(2).unwrap();
        assert_eq!(bdd.sat_count(x2, 2), big(2));
        assert_eq!(bdd.sat_count(-x2, 3), big(4));
    }

    #[test]
    fn test_sat_count_cube() {
        let bdd = Bdd::new(10, 8);

        let f = bdd.cube([1, 2]).unwrap();
        assert_eq!(bdd.sat_count(f, 2), big(1));
        assert_eq!(bdd.sat_count(f, 3), big(2));
        assert_eq!(bdd.sat_count(f, 5), big(8));

        assert_eq!(bdd.sat_count(-f, 2), big(3));
        assert_eq!(bdd.sat_count(-f, 4), big(12));
    }

    #[test]
    fn test_sat_count_xor_chain() {
        let bdd = Bdd::new(10, 8);

        let mut f = bdd.zero;
        for v in 1..=4 {
            f = bdd.apply_xor(f, bdd.mk_var(v).unwrap()).unwrap();
        }
        // Odd parity holds on exactly half of the assignments.
        assert_eq!(bdd.sat_count(f, 4), big(8));
    }
}
