//! A bounded FIFO queue with constant-time random access.
//!
//! [`RandomAccessQueue`] behaves like a double-ended queue with a maximum
//! length: appending to a full queue silently discards the oldest item.
//! Unlike a linked deque, any item can be read by its position in O(1),
//! which is what uniform sampling from a replay memory needs.
use crate::error::ReplayBufferError;
use anyhow::Result;
use rand::{seq::index, Rng};
use std::{iter::Chain, ops::Index, slice};

/// Iterator over the items of a [`RandomAccessQueue`], from the oldest to the newest.
pub type Iter<'a, T> = Chain<slice::Iter<'a, T>, slice::Iter<'a, T>>;

/// A FIFO queue with an optional maximum length and O(1) indexed access.
///
/// Items are kept in a growable circular buffer. While the queue is not full,
/// new items are pushed at the end of the storage. Once it reaches `maxlen`,
/// each append overwrites the slot of the oldest item and advances the head.
///
/// # Examples
///
/// ```rust
/// use nstep_replay::RandomAccessQueue;
///
/// let mut queue = RandomAccessQueue::new(Some(2));
/// queue.append(1);
/// queue.append(2);
/// assert_eq!(queue.append(3), Some(1));
/// assert_eq!(queue.get(0), Some(&2));
/// assert_eq!(queue.get_newest(0), Some(&3));
/// ```
#[derive(Clone, Debug)]
pub struct RandomAccessQueue<T> {
    /// Physical storage. Logical order starts at `head`.
    items: Vec<T>,

    /// Physical index of the oldest item. Non-zero only when the queue is full.
    head: usize,

    /// Maximum number of items, `None` for an unbounded queue.
    maxlen: Option<usize>,
}

impl<T> RandomAccessQueue<T> {
    /// Creates an empty queue.
    ///
    /// With `maxlen == None` the queue never evicts.
    pub fn new(maxlen: Option<usize>) -> Self {
        Self {
            items: Vec::new(),
            head: 0,
            maxlen,
        }
    }

    /// Builds a queue from items given oldest first.
    ///
    /// If there are more than `maxlen` items, only the newest `maxlen` are kept,
    /// as if they had been appended one by one.
    pub fn from_iter_with_maxlen<I>(iter: I, maxlen: Option<usize>) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let mut queue = Self::new(maxlen);
        for item in iter {
            queue.append(item);
        }
        queue
    }

    /// Appends an item at the newest end of the queue.
    ///
    /// Returns the evicted oldest item when the queue was already full.
    pub fn append(&mut self, item: T) -> Option<T> {
        match self.maxlen {
            Some(0) => Some(item),
            Some(maxlen) if self.items.len() == maxlen => {
                let evicted = std::mem::replace(&mut self.items[self.head], item);
                self.head = (self.head + 1) % maxlen;
                Some(evicted)
            }
            _ => {
                self.items.push(item);
                None
            }
        }
    }

    /// Returns the `i`-th oldest item.
    pub fn get(&self, i: usize) -> Option<&T> {
        if i < self.items.len() {
            Some(&self.items[(self.head + i) % self.items.len()])
        } else {
            None
        }
    }

    /// Returns the `i`-th newest item; `get_newest(0)` is the last appended one.
    pub fn get_newest(&self, i: usize) -> Option<&T> {
        if i < self.items.len() {
            self.get(self.items.len() - 1 - i)
        } else {
            None
        }
    }

    /// Samples `k` distinct items uniformly at random, without replacement.
    ///
    /// The order of the returned items is arbitrary.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayBufferError::InsufficientData`] if `k` exceeds the
    /// number of items in the queue.
    pub fn sample<R: Rng + ?Sized>(&self, k: usize, rng: &mut R) -> Result<Vec<&T>> {
        if k > self.items.len() {
            return Err(ReplayBufferError::InsufficientData {
                requested: k,
                available: self.items.len(),
            }
            .into());
        }

        // Physical positions are as good as logical ones for uniform sampling.
        Ok(index::sample(rng, self.items.len(), k)
            .into_iter()
            .map(|ix| &self.items[ix])
            .collect())
    }

    /// Returns an iterator from the oldest to the newest item.
    pub fn iter(&self) -> Iter<'_, T> {
        self.items[self.head..]
            .iter()
            .chain(self.items[..self.head].iter())
    }

    /// Consumes the queue and returns its items, oldest first.
    pub fn into_vec(mut self) -> Vec<T> {
        self.items.rotate_left(self.head);
        self.items
    }

    /// Removes all items. The maximum length is kept.
    pub fn clear(&mut self) {
        self.items.clear();
        self.head = 0;
    }

    /// Returns the number of items in the queue.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the queue holds no item.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the maximum length of the queue.
    pub fn maxlen(&self) -> Option<usize> {
        self.maxlen
    }
}

impl<T> Index<usize> for RandomAccessQueue<T> {
    type Output = T;

    fn index(&self, i: usize) -> &Self::Output {
        match self.get(i) {
            Some(item) => item,
            None => panic!(
                "index out of bounds: the len is {} but the index is {}",
                self.items.len(),
                i
            ),
        }
    }
}

impl<T: PartialEq> PartialEq for RandomAccessQueue<T> {
    /// Two queues are equal if they have the same maximum length and the same
    /// items in the same logical order, whatever their physical layout.
    fn eq(&self, other: &Self) -> bool {
        self.maxlen == other.maxlen && self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<'a, T> IntoIterator for &'a RandomAccessQueue<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashSet;

    #[test]
    fn test_append_evicts_oldest() {
        let mut queue = RandomAccessQueue::new(Some(3));
        assert_eq!(queue.append(0), None);
        assert_eq!(queue.append(1), None);
        assert_eq!(queue.append(2), None);
        assert_eq!(queue.append(3), Some(0));
        assert_eq!(queue.append(4), Some(1));
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
    }

    #[test]
    fn test_indexed_access_after_wrap() {
        let queue = RandomAccessQueue::from_iter_with_maxlen(0..7, Some(4));
        assert_eq!(queue.get(0), Some(&3));
        assert_eq!(queue.get(3), Some(&6));
        assert_eq!(queue.get(4), None);
        assert_eq!(queue.get_newest(0), Some(&6));
        assert_eq!(queue.get_newest(3), Some(&3));
        assert_eq!(queue.get_newest(4), None);
        assert_eq!(queue[1], 4);
    }

    #[test]
    #[should_panic]
    fn test_index_out_of_bounds() {
        let queue = RandomAccessQueue::from_iter_with_maxlen(0..2, None);
        let _value = queue[2];
    }

    #[test]
    fn test_unbounded_never_evicts() {
        let mut queue = RandomAccessQueue::new(None);
        for i in 0..1000 {
            assert_eq!(queue.append(i), None);
        }
        assert_eq!(queue.len(), 1000);
        assert_eq!(queue.get(0), Some(&0));
        assert_eq!(queue.get_newest(0), Some(&999));
    }

    #[test]
    fn test_zero_maxlen_stores_nothing() {
        let mut queue = RandomAccessQueue::new(Some(0));
        assert_eq!(queue.append(1), Some(1));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_into_vec_keeps_order() {
        let queue = RandomAccessQueue::from_iter_with_maxlen(0..10, Some(4));
        assert_eq!(queue.into_vec(), vec![6, 7, 8, 9]);
    }

    #[test]
    fn test_clear() {
        let mut queue = RandomAccessQueue::from_iter_with_maxlen(0..5, Some(3));
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.maxlen(), Some(3));
        queue.append(10);
        assert_eq!(queue.get(0), Some(&10));
    }

    #[test]
    fn test_eq_ignores_physical_layout() {
        let wrapped = RandomAccessQueue::from_iter_with_maxlen(0..5, Some(3));
        let fresh = RandomAccessQueue::from_iter_with_maxlen(2..5, Some(3));
        assert_eq!(wrapped, fresh);
        let other_maxlen = RandomAccessQueue::from_iter_with_maxlen(2..5, Some(4));
        assert_ne!(wrapped, other_maxlen);
    }

    #[test]
    fn test_sample_without_replacement() {
        let mut rng = StdRng::seed_from_u64(42);
        let queue = RandomAccessQueue::from_iter_with_maxlen(0..20, Some(10));
        for _ in 0..100 {
            let samples = queue.sample(10, &mut rng).unwrap();
            let distinct = samples.iter().copied().collect::<HashSet<_>>();
            assert_eq!(distinct.len(), 10);
            assert!(samples.iter().all(|&&x| (10..20).contains(&x)));
        }
    }

    #[test]
    fn test_sample_too_many() {
        let mut rng = StdRng::seed_from_u64(42);
        let queue = RandomAccessQueue::from_iter_with_maxlen(0..3, None);
        let err = queue.sample(4, &mut rng).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ReplayBufferError>(),
            Some(&ReplayBufferError::InsufficientData {
                requested: 4,
                available: 3
            })
        );
        assert!(queue.sample(0, &mut rng).unwrap().is_empty());
    }
}
