//! Simulation of a network. Simulation is bit-parallel, running 64 patterns at once.

mod bit_sim;

use crate::Network;

pub use bit_sim::BitSimulator;

/// Simulate a network on a single input pattern; return the values of all nodes
pub fn simulate(net: &Network, input_values: &[bool]) -> Vec<bool> {
    let multi_input: Vec<u64> = input_values
        .iter()
        .map(|b| if *b { !0 } else { 0 })
        .collect();
    simulate_multi(net, &multi_input)
        .iter()
        .map(|v| *v & 1 != 0)
        .collect()
}

/// Simulate a network on 64 input patterns at once; return the values of all nodes
pub fn simulate_multi(net: &Network, input_values: &[u64]) -> Vec<u64> {
    let mut sim = BitSimulator::new(net);
    sim.run(input_values);
    sim.values().to_vec()
}

/// All input patterns of a network with few inputs, packed by 64
///
/// Each element holds one word per input. Patterns beyond 2^nb_inputs repeat earlier ones.
pub fn exhaustive_patterns(nb_inputs: usize) -> Vec<Vec<u64>> {
    assert!(nb_inputs < 32, "Too many inputs for exhaustive simulation");
    let nb_patterns = 1u64 << nb_inputs;
    let nb_words = nb_patterns.div_ceil(64);
    let mut ret = Vec::new();
    for w in 0..nb_words {
        let mut words = vec![0u64; nb_inputs];
        for bit in 0..64 {
            let p = (w * 64 + bit) % nb_patterns;
            for (i, word) in words.iter_mut().enumerate() {
                if (p >> i) & 1 != 0 {
                    *word |= 1 << bit;
                }
            }
        }
        ret.push(words);
    }
    ret
}

#[cfg(test)]
mod tests {
    use super::{exhaustive_patterns, simulate, simulate_multi};
    use crate::Network;

    #[test]
    fn test_basic() {
        let mut net = Network::default();
        let i0 = net.add_input();
        let i1 = net.add_input();
        let i2 = net.add_input();
        let x1 = net.xor(i0, i1);
        let x2 = net.and(i0, i2);
        let x3 = net.and(x2, !i1);

        let outputs = |v: Vec<bool>| (v[x1.node()], v[x3.node()]);
        assert_eq!(outputs(simulate(&net, &[false, false, false])), (false, false));
        assert_eq!(outputs(simulate(&net, &[true, false, false])), (true, false));
        assert_eq!(outputs(simulate(&net, &[true, false, true])), (true, true));
        assert_eq!(outputs(simulate(&net, &[true, true, true])), (false, false));
    }

    #[test]
    fn test_exhaustive() {
        let p = exhaustive_patterns(3);
        assert_eq!(p.len(), 1);
        assert_eq!(p[0][0] & 0xff, 0b1010_1010);
        assert_eq!(p[0][1] & 0xff, 0b1100_1100);
        assert_eq!(p[0][2] & 0xff, 0b1111_0000);
        assert_eq!(exhaustive_patterns(8).len(), 4);

        // And over all patterns of its inputs
        let mut net = Network::default();
        let a = net.add_input();
        let b = net.add_input();
        let c = net.and(a, !b);
        let v = simulate_multi(&net, &exhaustive_patterns(2)[0]);
        assert_eq!(v[c.node()] & 0xf, 0b0010);
    }
}
