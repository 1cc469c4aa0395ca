//! Fixed-capacity hashed node pool.
//!
//! Cells are addressed by index. Index 0 is a sentry and never handed out.
//! Values that hash to the same bucket are chained through `next`, which is
//! how the unique table finds an existing node in `put`.

use std::cmp::min;
use std::ops::Index;

use crate::engine::EngineError;
use crate::utils::MyHash;

#[derive(Clone)]
struct Entry<T> {
    value: T,
    next: usize,
    occupied: bool,
}

impl<T> Default for Entry<T>
where
    T: Default,
{
    fn default() -> Self {
        Self {
            value: T::default(),
            next: 0,
            occupied: false,
        }
    }
}

pub struct Storage<T> {
    data: Vec<Entry<T>>,

    buckets: Vec<usize>,
    bitmask: u64,

    /// Index of the first *possibly* free (non-occupied) cell.
    min_free: usize,
    /// Index of the last occupied cell.
    last_index: usize,
    /// Number of occupied cells.
    real_size: usize,
}

impl<T> Storage<T>
where
    T: Default,
{
    /// Create a new storage of size `2^bits`.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "Storage bits should be in the range 0..=31");

        let capacity = 1 << bits;
        let mut data: Vec<Entry<T>> = Vec::with_capacity(capacity);
        data.resize_with(capacity, Entry::default);
        data[0].occupied = true; // Set 0th cell as occupied (sentry).

        let buckets_size = 1 << bits;
        let buckets = vec![0; buckets_size];
        let bitmask = (buckets_size - 1) as u64;

        Self {
            data,
            buckets,
            bitmask,
            min_free: 1,
            last_index: 0,
            real_size: 0,
        }
    }
}

impl<T> Storage<T> {
    /// Get the capacity of the storage.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }
    /// Get the index of the last occupied cell.
    pub fn size(&self) -> usize {
        self.last_index
    }
    /// Get the number of occupied cells.
    pub fn real_size(&self) -> usize {
        self.real_size
    }

    pub fn value(&self, index: usize) -> &T {
        assert_ne!(index, 0, "Index is 0");
        &self.data[index].value
    }

    pub fn is_occupied(&self, index: usize) -> bool {
        assert_ne!(index, 0, "Index is 0");
        self.data[index].occupied
    }
    pub fn next(&self, index: usize) -> usize {
        assert_ne!(index, 0, "Index is 0");
        self.data[index].next
    }
    pub fn set_next(&mut self, index: usize, next: usize) {
        assert_ne!(index, 0, "Index is 0");
        self.data[index].next = next;
    }

    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }
    pub fn bucket(&self, i: usize) -> usize {
        self.buckets[i]
    }
    pub fn set_bucket(&mut self, i: usize, index: usize) {
        self.buckets[i] = index;
    }

    /// Allocate a new cell and return its index.
    pub(crate) fn alloc(&mut self) -> Result<usize, EngineError> {
        let index = (self.min_free..=self.last_index)
            .find(|&i| !self.data[i].occupied)
            .unwrap_or(self.last_index + 1);

        if index >= self.capacity() {
            return Err(EngineError::PoolExhausted {
                capacity: self.capacity(),
            });
        }

        self.last_index = self.last_index.max(index);
        self.data[index].occupied = true;
        self.min_free = index + 1;
        self.real_size += 1;

        Ok(index)
    }

    /// Release the cell at the given index.
    pub fn drop(&mut self, index: usize) {
        assert_ne!(index, 0, "Index is 0");
        assert!(self.data[index].occupied, "Index {} is not occupied", index);

        self.data[index].occupied = false;
        self.min_free = min(self.min_free, index);
        self.real_size -= 1;
    }

    /// Add a new value and return its index.
    pub fn add(&mut self, value: T) -> Result<usize, EngineError> {
        let index = self.alloc()?;

        self.data[index].value = value;
        self.data[index].next = 0;

        Ok(index)
    }
}

impl<T> Storage<T>
where
    T: MyHash,
{
    fn bucket_index(&self, value: &T) -> usize {
        (value.hash() & self.bitmask) as usize
    }

    /// Return the index of `value`, inserting it first if it is absent.
    pub fn put(&mut self, value: T) -> Result<usize, EngineError>
    where
        T: Eq,
    {
        let bucket_index = self.bucket_index(&value);
        let mut index = self.buckets[bucket_index];

        if index == 0 {
            // Create new node and put it into the bucket.
            let i = self.add(value)?;
            self.buckets[bucket_index] = i;
            return Ok(i);
        }

        loop {
            if &value == self.value(index) {
                // The node already exists.
                return Ok(index);
            }

            let next = self.next(index);

            if next == 0 {
                // Create new node and append it to the bucket.
                let i = self.add(value)?;
                self.set_next(index, i);
                return Ok(i);
            } else {
                index = next;
            }
        }
    }
}

impl<T> Index<usize> for Storage<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        self.value(index)
    }
}
