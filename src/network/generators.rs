//! Network generators and templates

/// Adder generators
pub mod adder {
    use crate::Network;

    /// A simple and slow ripple-carry adder, with the carry as an Or of two Ands
    pub fn ripple_carry(len: usize) -> Network {
        let mut ret = Network::new();
        let mut c = None;
        for _ in 0..len {
            let a = ret.add_input();
            let b = ret.add_input();
            let p = ret.xor(a, b);
            let g = ret.and(a, b);
            c = Some(match c {
                None => g,
                Some(c) => {
                    ret.xor(p, c);
                    let t = ret.and(p, c);
                    ret.or(g, t)
                }
            });
        }
        ret.check();
        ret
    }
}

/// Carry chain generators
pub mod carry_chain {
    use crate::Network;

    /// A simple and slow ripple-carry chain
    pub fn ripple_carry(len: usize) -> Network {
        let mut ret = Network::new();
        let mut c = None;
        for _ in 0..len {
            let propagate = ret.add_input();
            let generate = ret.add_input();
            c = Some(match c {
                None => generate,
                Some(c) => {
                    let d = ret.and(propagate, c);
                    !ret.and(!generate, !d)
                }
            });
        }
        ret.check();
        ret
    }
}

/// Random networks
pub mod random {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use crate::{Handle, Network};

    /// A random And/Xor network
    ///
    /// Fanins are picked among the last `window` nodes, so that the network has some depth and
    /// reconvergence. About one node in `xor_ratio` is a Xor.
    pub fn random_network(
        nb_inputs: usize,
        nb_gates: usize,
        window: usize,
        xor_ratio: usize,
        seed: u64,
    ) -> Network {
        assert!(nb_inputs > 0);
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut ret = Network::new();
        ret.add_inputs(nb_inputs);
        for _ in 0..nb_gates {
            let nb = ret.nb_nodes();
            let lo = nb.saturating_sub(window.max(2));
            let a = Handle::new(rng.gen_range(lo..nb), rng.gen());
            let b = Handle::new(rng.gen_range(lo..nb), rng.gen());
            if xor_ratio > 0 && rng.gen_range(0..xor_ratio) == 0 {
                ret.xor(a, b);
            } else {
                ret.and(a, b);
            }
        }
        ret.check();
        ret
    }
}

/// Simple generators to test functionality
pub mod testcases {
    use crate::Network;

    /// Single And gate `c = a & b`, with ids a=0, b=1, c=2
    pub fn and2() -> Network {
        let mut ret = Network::new();
        let a = ret.add_input();
        let b = ret.add_input();
        ret.and(a, b);
        ret
    }

    /// Single Xor gate `c = a ^ b`, with ids a=0, b=1, c=2
    pub fn xor2() -> Network {
        let mut ret = Network::new();
        let a = ret.add_input();
        let b = ret.add_input();
        ret.xor(a, b);
        ret
    }

    /// Logic that is constant but not trivially so
    ///
    /// Node 2 is `a & !a` (constant 0), node 5 is `(a & b) & (a ^ b)` (constant 0) and
    /// node 6 is `a ^ a` (constant 0).
    pub fn constants() -> Network {
        let mut ret = Network::new();
        let a = ret.add_input();
        let b = ret.add_input();
        ret.and(a, !a);
        let x = ret.and(a, b);
        let y = ret.xor(a, b);
        ret.and(x, y);
        ret.xor(a, a);
        ret.check();
        ret
    }

    /// Reconvergent logic where some implications need case splits to be found
    ///
    /// `f = (a & b) | (a & c)`, `g = a & (b | c)`: f and g are equivalent, which propagation
    /// alone does not see.
    pub fn reconvergent() -> Network {
        let mut ret = Network::new();
        let a = ret.add_input();
        let b = ret.add_input();
        let c = ret.add_input();
        let ab = ret.and(a, b);
        let ac = ret.and(a, c);
        ret.or(ab, ac);
        let bc = ret.or(b, c);
        ret.and(a, bc);
        ret.check();
        ret
    }
}

#[cfg(test)]
mod tests {
    use super::{adder, carry_chain, random, testcases};
    use crate::network::stats::stats;

    #[test]
    fn test_adder() {
        for i in [0, 1, 2, 4, 8, 16, 32, 64, 128] {
            let net = adder::ripple_carry(i);
            assert_eq!(net.nb_inputs(), 2 * i);
        }
    }

    #[test]
    fn test_carry_chain() {
        for i in [0, 1, 2, 4, 8, 16, 32, 64, 128] {
            let net = carry_chain::ripple_carry(i);
            assert_eq!(net.nb_inputs(), 2 * i);
            assert_eq!(stats(&net).nb_xor, 0);
        }
    }

    #[test]
    fn test_random() {
        for seed in 0..10 {
            let net = random::random_network(4, 30, 8, 3, seed);
            assert_eq!(net.nb_nodes(), 34);
            assert_eq!(net.nb_inputs(), 4);
        }
        let a = random::random_network(5, 20, 6, 2, 7);
        let b = random::random_network(5, 20, 6, 2, 7);
        assert_eq!(format!("{a}"), format!("{b}"));
    }

    #[test]
    fn test_testcases() {
        assert_eq!(testcases::and2().nb_nodes(), 3);
        assert_eq!(testcases::xor2().nb_nodes(), 3);
        assert_eq!(testcases::constants().nb_nodes(), 7);
        assert_eq!(testcases::reconvergent().nb_nodes(), 8);
    }
}
