use std::fmt;
use std::ops::{BitXor, BitXorAssign, Not};

/// Reference to a node of the network, possibly complemented
///
/// Used for the fanins of And and Xor nodes, where the inversion is carried by the edge.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct Handle {
    node: usize,
    inverted: bool,
}

impl Handle {
    /// Create a handle from a node index and an inversion flag
    pub fn new(node: usize, inverted: bool) -> Handle {
        Handle { node, inverted }
    }

    /// Create a non-inverted handle to a node
    pub fn from_node(node: usize) -> Handle {
        Handle::new(node, false)
    }

    /// Index of the node referenced
    pub fn node(&self) -> usize {
        self.node
    }

    /// Returns true if the handle is complemented
    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// Clear the inversion, if set
    pub fn without_inversion(&self) -> Handle {
        Handle::from_node(self.node)
    }
}

impl From<usize> for Handle {
    fn from(node: usize) -> Handle {
        Handle::from_node(node)
    }
}

impl Not for Handle {
    type Output = Handle;
    fn not(self) -> Handle {
        Handle::new(self.node, !self.inverted)
    }
}

impl Not for &'_ Handle {
    type Output = Handle;
    fn not(self) -> Handle {
        !*self
    }
}

impl BitXorAssign<bool> for Handle {
    fn bitxor_assign(&mut self, rhs: bool) {
        self.inverted ^= rhs;
    }
}

impl BitXor<bool> for Handle {
    type Output = Handle;
    fn bitxor(self, rhs: bool) -> Self::Output {
        let mut h = self;
        h ^= rhs;
        h
    }
}

impl BitXor<bool> for &'_ Handle {
    type Output = Handle;
    fn bitxor(self, rhs: bool) -> Self::Output {
        *self ^ rhs
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inverted {
            write!(f, "!")?;
        }
        write!(f, "n{}", self.node)
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inversion() {
        for n in 0..10 {
            let h = Handle::from_node(n);
            assert_eq!(h.node(), n);
            assert_eq!((!h).node(), n);
            assert!(!h.is_inverted());
            assert!((!h).is_inverted());
            assert_eq!(!!h, h);
            assert_eq!(h ^ false, h);
            assert_eq!(h ^ true, !h);
            assert_eq!((!h).without_inversion(), h);
        }
    }

    #[test]
    fn test_display() {
        let h = Handle::from(3);
        assert_eq!(format!("{h}"), "n3");
        assert_eq!(format!("{}", !h), "!n3");
    }

    #[test]
    fn test_comparison() {
        assert_ne!(Handle::new(0, false), Handle::new(0, true));
        assert_ne!(Handle::new(0, false), Handle::new(1, false));
        assert!(Handle::new(0, true) < Handle::new(1, false));
    }
}
