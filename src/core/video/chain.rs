//! Greedy nearest-neighbour chain reconstruction.
//!
//! The path is seeded with the globally closest pair, then grown one frame
//! at a time: every unused frame is scored against both ends of the path and
//! the single best (frame, end) candidate wins. Ties resolve to the first
//! candidate in scan order (lower index first, front before back), so the
//! result is fully deterministic.

use super::distance::DistanceMatrix;
use log::{debug, info};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum End {
    Front,
    Back,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    index: usize,
    end: End,
    dist: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ChainReconstructor;

impl ChainReconstructor {
    pub fn new() -> Self {
        Self
    }

    /// Returns a permutation of `0..d.size()`.
    pub fn reconstruct(&self, d: &DistanceMatrix) -> Vec<usize> {
        let m = d.size();
        let (start, end) = match Self::seed_pair(d) {
            Some(pair) => pair,
            None => return (0..m).collect(),
        };
        info!(
            "🔗 Seed pair ({}, {}) at distance {:.4}",
            start,
            end,
            d.get(start, end)
        );

        let mut used = vec![false; m];
        let mut path = VecDeque::with_capacity(m);
        path.push_back(start);
        path.push_back(end);
        used[start] = true;
        used[end] = true;

        while path.len() < m {
            let (front, back) = match (path.front(), path.back()) {
                (Some(&f), Some(&b)) => (f, b),
                _ => break,
            };

            let best = match Self::best_candidate(d, &used, front, back) {
                Some(c) => c,
                None => break,
            };

            match best.end {
                End::Front => path.push_front(best.index),
                End::Back => path.push_back(best.index),
            }
            used[best.index] = true;
            debug!(
                "placed frame {} at {:?} ({:.4})",
                best.index, best.end, best.dist
            );
        }

        let order: Vec<usize> = path.into_iter().collect();
        info!(
            "✅ Reconstructed order of {} frames, path cost {:.4}",
            order.len(),
            d.path_cost(&order)
        );
        order
    }

    /// Closest pair over the upper triangle, first in row-major order on ties.
    pub fn seed_pair(d: &DistanceMatrix) -> Option<(usize, usize)> {
        let m = d.size();
        let mut best: Option<(usize, usize, f64)> = None;
        for i in 0..m {
            for j in (i + 1)..m {
                let dist = d.get(i, j);
                if best.map_or(true, |(_, _, b)| dist < b) {
                    best = Some((i, j, dist));
                }
            }
        }
        best.map(|(i, j, _)| (i, j))
    }

    fn best_candidate(
        d: &DistanceMatrix,
        used: &[bool],
        front: usize,
        back: usize,
    ) -> Option<Candidate> {
        let mut best: Option<Candidate> = None;
        for (index, _) in used.iter().enumerate().filter(|&(_, &u)| !u) {
            for (end, anchor) in [(End::Front, front), (End::Back, back)] {
                let dist = d.get(index, anchor);
                if best.map_or(true, |c| dist < c.dist) {
                    best = Some(Candidate { index, end, dist });
                }
            }
        }
        best
    }
}
