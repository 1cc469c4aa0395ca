/// [Szudzik pairing function][szudzik-pairing], computed modulo `2^64`.
///
/// ```text
/// (a, b) -> if (a<b) then (b^2 + a) else (a^2 + a + b)
/// ```
///
/// The result is only used for bucket selection, so wrap-around on large
/// arguments is harmless.
///
/// [szudzik-pairing]: http://szudzik.com/ElegantPairing.pdf
pub fn pairing_szudzik(a: u64, b: u64) -> u64 {
    if a < b {
        b.wrapping_mul(b).wrapping_add(a)
    } else {
        a.wrapping_mul(a).wrapping_add(a).wrapping_add(b)
    }
}

/// [Pairing function][pairing] for two `u64` values.
///
/// [pairing]: https://en.wikipedia.org/wiki/Pairing_function
pub fn pairing2(a: u64, b: u64) -> u64 {
    pairing_szudzik(a, b)
}

/// Pairing function for three `u64` values.
pub fn pairing3(a: u64, b: u64, c: u64) -> u64 {
    pairing2(pairing2(a, b), c)
}

/// Spread the bits of a pairing result so that the low bits used for
/// bucket indexing depend on every input bit.
pub fn scramble(x: u64) -> u64 {
    // Finalizer of splitmix64.
    let x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    let x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

pub trait MyHash {
    /// Hash used for bucket and cache-line selection.
    fn hash(&self) -> u64;
}

impl MyHash for (u64, u64) {
    fn hash(&self) -> u64 {
        scramble(pairing2(self.0, self.1))
    }
}

impl MyHash for (u64, u64, u64) {
    fn hash(&self) -> u64 {
        scramble(pairing3(self.0, self.1, self.2))
    }
}
