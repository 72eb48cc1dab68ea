// Ring buffer backing every client-side rolling history.
// Invariants: len never exceeds cap; a full buffer evicts its oldest entry first.

#[derive(Clone, Debug)]
pub struct RingBuffer<T> {
    buf: Vec<T>,
    cap: usize,
    head: usize,
    len: usize,
}

impl<T> RingBuffer<T> {
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            buf: Vec::with_capacity(cap),
            cap,
            head: 0,
            len: 0,
        }
    }

    /// Appends `item`, returning the evicted oldest entry when full.
    pub fn push(&mut self, item: T) -> Option<T> {
        if self.len < self.cap {
            self.buf.push(item);
            self.len += 1;
            None
        } else {
            let evicted = std::mem::replace(&mut self.buf[self.head], item);
            self.head = (self.head + 1) % self.cap;
            Some(evicted)
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.head = 0;
        self.len = 0;
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        let (wrapped, front) = self.buf.split_at(self.head);
        front.iter().chain(wrapped.iter())
    }

    pub fn last(&self) -> Option<&T> {
        if self.len == 0 {
            return None;
        }
        let idx = (self.head + self.len - 1) % self.cap;
        self.buf.get(idx)
    }
}

impl<T: Clone> RingBuffer<T> {
    pub fn to_vec_ordered(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}
