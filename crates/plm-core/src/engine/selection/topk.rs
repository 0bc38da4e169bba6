use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// A scored candidate ordered by score, then by reversed coordinate order.
///
/// Equal scores rank the smaller coordinate higher, so under a row-major
/// candidate scan the first-encountered candidate beats any equal-scored
/// later one. The ordering is total: NaN scores compare as equal and fall
/// back to the coordinate.
#[derive(Debug, Clone, Copy)]
pub struct Scored<C> {
    pub score: f64,
    pub coord: C,
}

impl<C: Ord> PartialEq for Scored<C> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<C: Ord> Eq for Scored<C> {}

impl<C: Ord> PartialOrd for Scored<C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<C: Ord> Ord for Scored<C> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .partial_cmp(&other.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.coord.cmp(&self.coord))
    }
}

/// Bounded collector keeping the `capacity` greatest items seen.
///
/// A candidate replaces the current minimum only when strictly greater, so
/// with [`Scored`] items ties keep the earlier coordinate. Partitioned scans
/// can collect independently and [`merge`](Self::merge): the merged result
/// equals the single-pass result because any globally kept item is also kept
/// in its own partition.
#[derive(Debug)]
pub struct TopK<T> {
    capacity: usize,
    heap: BinaryHeap<Reverse<T>>,
}

impl<T: Ord> TopK<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            heap: BinaryHeap::with_capacity(capacity.min(1024)),
        }
    }

    pub fn push(&mut self, item: T) {
        if self.capacity == 0 {
            return;
        }
        if self.heap.len() < self.capacity {
            self.heap.push(Reverse(item));
        } else if let Some(Reverse(min)) = self.heap.peek() {
            if item > *min {
                self.heap.pop();
                self.heap.push(Reverse(item));
            }
        }
    }

    pub fn merge(&mut self, other: TopK<T>) {
        for Reverse(item) in other.heap {
            self.push(item);
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drains into a vector sorted from greatest to least.
    pub fn into_sorted(self) -> Vec<T> {
        let mut items: Vec<T> = self.heap.into_iter().map(|Reverse(item)| item).collect();
        items.sort_by(|a, b| b.cmp(a));
        items
    }
}
