//! Three-valued node states
//!
//! The state of an And or Xor node records what is known about its two inputs and its output.
//! Only the combinations that are closed under the gate function are reachable: whenever a value
//! is forced by the others, it is part of the state. This gives 10 states for And and 11 for Xor.

use std::fmt;
use std::ops::Not;

use crate::NodeType;

/// Three-valued logic value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Val3 {
    /// Unknown
    #[default]
    X,
    /// Known to be 0
    Zero,
    /// Known to be 1
    One,
}

impl Val3 {
    /// Returns true if the value is 0 or 1
    pub fn is_known(self) -> bool {
        self != Val3::X
    }

    /// Boolean value, if known
    pub fn to_bool(self) -> Option<bool> {
        match self {
            Val3::X => None,
            Val3::Zero => Some(false),
            Val3::One => Some(true),
        }
    }

    /// Returns true if the value is unknown or equal to b
    fn admits(self, b: bool) -> bool {
        self.to_bool().map_or(true, |v| v == b)
    }
}

impl From<bool> for Val3 {
    fn from(b: bool) -> Val3 {
        if b {
            Val3::One
        } else {
            Val3::Zero
        }
    }
}

impl Not for Val3 {
    type Output = Val3;
    fn not(self) -> Val3 {
        match self {
            Val3::X => Val3::X,
            Val3::Zero => Val3::One,
            Val3::One => Val3::Zero,
        }
    }
}

impl fmt::Display for Val3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Val3::X => write!(f, "X"),
            Val3::Zero => write!(f, "0"),
            Val3::One => write!(f, "1"),
        }
    }
}

/// Pin of a two-input node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pin {
    /// Input slot 0 or 1
    In(usize),
    /// Output
    Out,
}

/// Known values on the pins of a two-input node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pins {
    /// Value of input 0, after edge inversion
    pub in0: Val3,
    /// Value of input 1, after edge inversion
    pub in1: Val3,
    /// Value of the output
    pub out: Val3,
}

impl Pins {
    const fn new(in0: Val3, in1: Val3, out: Val3) -> Pins {
        Pins { in0, in1, out }
    }

    /// Value on a pin
    pub fn get(&self, pin: Pin) -> Val3 {
        match pin {
            Pin::In(0) => self.in0,
            Pin::In(_) => self.in1,
            Pin::Out => self.out,
        }
    }

    fn with(mut self, pin: Pin, v: Val3) -> Pins {
        match pin {
            Pin::In(0) => self.in0 = v,
            Pin::In(_) => self.in1 = v,
            Pin::Out => self.out = v,
        }
        self
    }

    /// Add every value implied by the others; None if no assignment is compatible
    fn settle(self, f: fn(bool, bool) -> bool) -> Option<Pins> {
        let mut seen = [[false; 2]; 3];
        let mut any = false;
        for a in [false, true] {
            for b in [false, true] {
                let o = f(a, b);
                if self.in0.admits(a) && self.in1.admits(b) && self.out.admits(o) {
                    any = true;
                    seen[0][a as usize] = true;
                    seen[1][b as usize] = true;
                    seen[2][o as usize] = true;
                }
            }
        }
        if !any {
            return None;
        }
        let forced = |s: [bool; 2]| match s {
            [true, false] => Val3::Zero,
            [false, true] => Val3::One,
            _ => Val3::X,
        };
        Some(Pins::new(forced(seen[0]), forced(seen[1]), forced(seen[2])))
    }
}

impl fmt::Display for Pins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}:{}", self.in0, self.in1, self.out)
    }
}

use Val3::{One, Zero, X};

/// Reachable states of an And node
pub const AND_STATES: [Pins; 10] = [
    Pins::new(X, X, X),
    Pins::new(One, X, X),
    Pins::new(X, One, X),
    Pins::new(X, X, Zero),
    Pins::new(X, Zero, Zero),
    Pins::new(Zero, X, Zero),
    Pins::new(Zero, Zero, Zero),
    Pins::new(One, Zero, Zero),
    Pins::new(Zero, One, Zero),
    Pins::new(One, One, One),
];

/// Reachable states of a Xor node
pub const XOR_STATES: [Pins; 11] = [
    Pins::new(X, X, X),
    Pins::new(Zero, X, X),
    Pins::new(One, X, X),
    Pins::new(X, Zero, X),
    Pins::new(X, One, X),
    Pins::new(X, X, Zero),
    Pins::new(X, X, One),
    Pins::new(Zero, Zero, Zero),
    Pins::new(Zero, One, One),
    Pins::new(One, Zero, One),
    Pins::new(One, One, Zero),
];

const UNKNOWN: Pins = Pins::new(X, X, X);

fn and_fn(a: bool, b: bool) -> bool {
    a & b
}

fn xor_fn(a: bool, b: bool) -> bool {
    a ^ b
}

/// Result of pushing a value onto a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// The value was already known
    Unchanged,
    /// New state, with the value and everything it implies locally
    Changed(State),
    /// The value is incompatible with the current state
    Conflict,
}

/// Current partial assignment of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// Primary input: only the output value
    Input(Val3),
    /// And node
    And(Pins),
    /// Xor node
    Xor(Pins),
}

impl State {
    /// All-unknown state for a node kind
    pub fn initial(kind: NodeType) -> State {
        match kind {
            NodeType::Input => State::Input(X),
            NodeType::And => State::And(UNKNOWN),
            NodeType::Xor => State::Xor(UNKNOWN),
        }
    }

    /// Output value of the node
    pub fn value(&self) -> Val3 {
        self.pin(Pin::Out)
    }

    /// Value on a pin; inputs have no fanin pins and report X for them
    pub fn pin(&self, pin: Pin) -> Val3 {
        match (self, pin) {
            (State::Input(v), Pin::Out) => *v,
            (State::Input(_), Pin::In(_)) => X,
            (State::And(p), _) | (State::Xor(p), _) => p.get(pin),
        }
    }

    /// Returns true if the state belongs to the reachable set of its kind
    pub fn is_legal(&self) -> bool {
        match self {
            State::Input(_) => true,
            State::And(p) => AND_STATES.contains(p),
            State::Xor(p) => XOR_STATES.contains(p),
        }
    }

    /// Returns true if the output is known but not explained by known inputs
    pub fn is_unjustified(&self) -> bool {
        match self {
            State::Input(_) => false,
            State::And(p) => *p == Pins::new(X, X, Zero),
            State::Xor(p) => p.out.is_known() && !p.in0.is_known(),
        }
    }

    /// Alternative input assignments, as (slot, value), that would justify the output
    pub fn justifications(&self) -> &'static [(usize, bool)] {
        if !self.is_unjustified() {
            return &[];
        }
        match self {
            State::And(_) => &[(0, false), (1, false)],
            _ => &[(0, false), (0, true)],
        }
    }

    /// Push a value onto a pin
    pub(crate) fn set(&self, pin: Pin, val: bool) -> Step {
        let cur = self.pin(pin);
        if cur.is_known() {
            return if cur == Val3::from(val) {
                Step::Unchanged
            } else {
                Step::Conflict
            };
        }
        let next = match self {
            State::Input(_) => {
                assert_eq!(pin, Pin::Out, "Input nodes have no fanin");
                Some(State::Input(val.into()))
            }
            State::And(p) => p.with(pin, val.into()).settle(and_fn).map(State::And),
            State::Xor(p) => p.with(pin, val.into()).settle(xor_fn).map(State::Xor),
        };
        match next {
            Some(s) => Step::Changed(s),
            None => Step::Conflict,
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Input(v) => write!(f, "{v}"),
            State::And(p) => write!(f, "and {p}"),
            State::Xor(p) => write!(f, "xor {p}"),
        }
    }
}
