//! Frame Queue
//!
//! Bounded buffer between the capture thread and the processing thread.
//! Live capture pushes with drop-oldest and never blocks; offline replay
//! pushes with back-pressure so nothing is lost.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::logic::frame::RawFrame;

#[derive(Debug)]
struct QueueState {
    items: VecDeque<RawFrame>,
    /// Producer finished; remaining items may still be drained
    closed: bool,
    dropped: u64,
}

/// Result of a push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Push {
    Queued,
    /// Queued after evicting the oldest frame
    Evicted,
    /// Queue closed; the frame was not taken
    Closed,
}

/// Result of a `pop`
#[derive(Debug)]
pub enum Pop {
    Frame(RawFrame),
    /// Timed out with nothing queued
    Empty,
    /// Closed and fully drained
    Closed,
}

#[derive(Debug)]
pub struct FrameQueue {
    capacity: usize,
    state: Mutex<QueueState>,
    not_empty: Condvar,
    not_full: Condvar,
}

impl FrameQueue {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity.min(1024)),
                closed: false,
                dropped: 0,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        }
    }

    /// Push without blocking; evicts the oldest frame when full
    pub fn push_drop_oldest(&self, frame: RawFrame) -> Push {
        let mut state = self.state.lock();
        if state.closed {
            return Push::Closed;
        }

        let mut result = Push::Queued;
        if state.items.len() >= self.capacity {
            state.items.pop_front();
            state.dropped += 1;
            result = Push::Evicted;
        }
        state.items.push_back(frame);
        drop(state);

        self.not_empty.notify_one();
        result
    }

    /// Push, waiting for room. `Push::Closed` if the queue was closed
    /// before the frame could be queued.
    pub fn push_blocking(&self, frame: RawFrame) -> Push {
        let mut state = self.state.lock();
        while state.items.len() >= self.capacity && !state.closed {
            self.not_full.wait_for(&mut state, Duration::from_millis(100));
        }
        if state.closed {
            return Push::Closed;
        }
        state.items.push_back(frame);
        drop(state);

        self.not_empty.notify_one();
        Push::Queued
    }

    /// Take the next frame, waiting up to `timeout`
    pub fn pop(&self, timeout: Duration) -> Pop {
        let mut state = self.state.lock();
        if state.items.is_empty() && !state.closed {
            self.not_empty.wait_for(&mut state, timeout);
        }

        match state.items.pop_front() {
            Some(frame) => {
                drop(state);
                self.not_full.notify_one();
                Pop::Frame(frame)
            }
            None if state.closed => Pop::Closed,
            None => Pop::Empty,
        }
    }

    /// Mark the producer side finished and wake everyone
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    /// Close and throw away whatever is still queued. Returns the count.
    pub fn discard_all(&self) -> usize {
        let mut state = self.state.lock();
        state.closed = true;
        let n = state.items.len();
        state.items.clear();
        drop(state);

        self.not_empty.notify_all();
        self.not_full.notify_all();
        n
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Frames evicted by drop-oldest pushes
    pub fn dropped(&self) -> u64 {
        self.state.lock().dropped
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
