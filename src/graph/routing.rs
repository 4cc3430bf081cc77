//! The particle's fixed modulation topology, expressed as data.

/*
Operator Routing
================

The seven operators are wired once and never rewired:

                 ┌──────── OP1 ────────┐
                 ▼                     ▼
        ┌───── OP2 ─────┐     ┌───── OP3 ─────┐
        ▼               ▼     ▼               ▼
       OP4             OP6   OP5             OP7
     ch 1-2          ch 5-6  ch 3-4         ch 7-8

OP1 to OP3 only modulate. OP4 to OP7 are carriers: each one reaches the
output through its own stereo delay and panner, on a dedicated channel pair.

The topology is a plain edge list `(from, to)` plus the carrier list, turned
into a per-operator parent table at startup. Two rules make evaluation
trivial:

  - every edge goes from a LOWER index to a HIGHER one, so evaluating the
    operators in index order always sees parents before children, and there
    can be no cycles
  - fan-in is bounded, so the parent table is a fixed-size array

Self-modulation (feedback) is not an edge: each operator reads its own
previous output from a one-sample register instead.
*/

use crate::{error::Error, CARRIER_COUNT, OPERATOR_COUNT};

/// Most parents a single operator may have.
pub const MAX_FAN_IN: usize = 4;

/// OP1→{OP2,OP3}, OP2→{OP4,OP6}, OP3→{OP5,OP7} (0-based).
pub const PARTICLE_EDGES: [(usize, usize); 6] = [(0, 1), (0, 2), (1, 3), (1, 5), (2, 4), (2, 6)];

/// Carriers in output order: OP4→ch1-2, OP5→ch3-4, OP6→ch5-6, OP7→ch7-8.
pub const PARTICLE_CARRIERS: [usize; CARRIER_COUNT] = [3, 4, 5, 6];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Routing {
    parents: [[usize; MAX_FAN_IN]; OPERATOR_COUNT],
    parent_counts: [usize; OPERATOR_COUNT],
    carriers: [usize; CARRIER_COUNT],
}

impl Routing {
    /// Validate an edge list and carrier list and build the parent table.
    pub fn new(edges: &[(usize, usize)], carriers: [usize; CARRIER_COUNT]) -> Result<Self, Error> {
        let mut parents = [[0; MAX_FAN_IN]; OPERATOR_COUNT];
        let mut parent_counts = [0; OPERATOR_COUNT];

        for (i, &(from, to)) in edges.iter().enumerate() {
            if from >= OPERATOR_COUNT || to >= OPERATOR_COUNT {
                return Err(Error::Routing(format!(
                    "edge {from} -> {to} references a missing operator"
                )));
            }
            if from >= to {
                return Err(Error::Routing(format!(
                    "edge {from} -> {to} must point to a later operator"
                )));
            }
            if edges[..i].contains(&(from, to)) {
                return Err(Error::Routing(format!("duplicate edge {from} -> {to}")));
            }
            if parent_counts[to] == MAX_FAN_IN {
                return Err(Error::Routing(format!(
                    "operator {to} has more than {MAX_FAN_IN} modulators"
                )));
            }
            parents[to][parent_counts[to]] = from;
            parent_counts[to] += 1;
        }

        for (i, &carrier) in carriers.iter().enumerate() {
            if carrier >= OPERATOR_COUNT {
                return Err(Error::Routing(format!(
                    "carrier {carrier} references a missing operator"
                )));
            }
            if carriers[..i].contains(&carrier) {
                return Err(Error::Routing(format!("carrier {carrier} listed twice")));
            }
        }

        Ok(Self {
            parents,
            parent_counts,
            carriers,
        })
    }

    /// The standard 7-operator particle topology.
    pub fn particle() -> Result<Self, Error> {
        Self::new(&PARTICLE_EDGES, PARTICLE_CARRIERS)
    }

    /// Operators modulating `operator`, in edge order.
    #[inline]
    pub fn parents(&self, operator: usize) -> &[usize] {
        &self.parents[operator][..self.parent_counts[operator]]
    }

    pub fn carriers(&self) -> &[usize; CARRIER_COUNT] {
        &self.carriers
    }

    /// Output pair index of a carrier, `None` for modulators.
    pub fn carrier_slot(&self, operator: usize) -> Option<usize> {
        self.carriers.iter().position(|&c| c == operator)
    }

    pub fn is_carrier(&self, operator: usize) -> bool {
        self.carrier_slot(operator).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn particle_topology() {
        let routing = Routing::particle().unwrap();
        assert!(routing.parents(0).is_empty());
        assert_eq!(routing.parents(1), &[0]);
        assert_eq!(routing.parents(2), &[0]);
        assert_eq!(routing.parents(3), &[1]);
        assert_eq!(routing.parents(4), &[2]);
        assert_eq!(routing.parents(5), &[1]);
        assert_eq!(routing.parents(6), &[2]);

        for op in 0..3 {
            assert!(!routing.is_carrier(op));
        }
        assert_eq!(routing.carrier_slot(3), Some(0));
        assert_eq!(routing.carrier_slot(6), Some(3));
    }

    #[test]
    fn backward_edges_are_rejected() {
        let err = Routing::new(&[(3, 1)], PARTICLE_CARRIERS).unwrap_err();
        assert!(matches!(err, Error::Routing(_)));
        assert!(Routing::new(&[(2, 2)], PARTICLE_CARRIERS).is_err());
    }

    #[test]
    fn out_of_range_is_rejected() {
        assert!(Routing::new(&[(0, 7)], PARTICLE_CARRIERS).is_err());
        assert!(Routing::new(&PARTICLE_EDGES, [3, 4, 5, 9]).is_err());
    }

    #[test]
    fn duplicates_are_rejected() {
        assert!(Routing::new(&[(0, 1), (0, 1)], PARTICLE_CARRIERS).is_err());
        assert!(Routing::new(&PARTICLE_EDGES, [3, 3, 5, 6]).is_err());
    }

    #[test]
    fn fan_in_is_bounded() {
        let edges = [(0, 6), (1, 6), (2, 6), (3, 6), (4, 6)];
        assert!(Routing::new(&edges, PARTICLE_CARRIERS).is_err());
        assert!(Routing::new(&edges[..MAX_FAN_IN], PARTICLE_CARRIERS).is_ok());
    }
}
