//! Shuffled selection without immediate repeats.
//!
//! The cursor keeps a queue of shuffled ids. The queue is drained one id at a
//! time and refilled when empty, so every website is shown once per round.
//! When the set of ids changes the queue is discarded and reseeded. Reordering
//! the same ids does not reseed.

use std::collections::{BTreeSet, VecDeque};

use rand::Rng;
use rand::seq::SliceRandom;
use uuid::Uuid;

/// Random selection state for the website collection.
#[derive(Debug, Default, Clone)]
pub struct ShuffleCursor {
    membership: BTreeSet<Uuid>,
    queue: VecDeque<Uuid>,
}

impl ShuffleCursor {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Returns the next random id from `ids`, never `current` when there is
    /// more than one id to choose from.
    pub fn next<R>(&mut self, ids: &[Uuid], current: Option<Uuid>, rng: &mut R) -> Option<Uuid>
    where R: Rng + ?Sized {
        match ids {
            [] => {
                self.reset();
                return None;
            }
            [only] => return Some(*only),
            _ => {}
        }

        let membership: BTreeSet<Uuid> = ids.iter().copied().collect();
        if membership != self.membership {
            tracing::trace!(count = membership.len(), "reseeding shuffle cursor");
            self.membership = membership;
            self.queue.clear();
        }

        while let Some(id) = self.queue.pop_front() {
            if Some(id) != current {
                return Some(id);
            }
        }

        self.refill(ids, current, rng);
        self.queue.pop_front()
    }

    /// Drops the queued order so the next call reseeds.
    pub fn reset(&mut self) {
        self.membership.clear();
        self.queue.clear();
    }

    /// Number of ids left before the next refill.
    #[must_use]
    pub fn remaining(&self) -> usize { self.queue.len() }

    fn refill<R>(&mut self, ids: &[Uuid], current: Option<Uuid>, rng: &mut R)
    where R: Rng + ?Sized {
        let mut order = ids.to_vec();
        order.shuffle(rng);

        if order.len() > 1 && order.first().copied() == current {
            let last = order.len() - 1;
            order.swap(0, last);
        }

        self.queue = order.into();
    }
}
