use std::collections::VecDeque;

use crate::{Descriptors, Keypoint, Match};

/// Number of frames held at once unless configured otherwise.
pub const DEFAULT_CAPACITY: usize = 2;

/// One image of the sequence plus everything computed on it.
#[derive(Debug, Clone)]
pub struct Frame<I> {
    pub image: I,
    pub keypoints: Vec<Keypoint>,
    pub descriptors: Descriptors,
    /// Matches against the frame pushed before this one.
    pub matches: Vec<Match>,
}

impl<I> Frame<I> {
    pub fn new(image: I) -> Self {
        Self {
            image,
            keypoints: Vec::new(),
            descriptors: Descriptors::default(),
            matches: Vec::new(),
        }
    }
}

/// FIFO of the most recent frames. Pushing into a full buffer drops the
/// oldest frame first.
#[derive(Debug)]
pub struct FrameBuffer<I> {
    frames: VecDeque<Frame<I>>,
    capacity: usize,
}

impl<I> Default for FrameBuffer<I> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<I> FrameBuffer<I> {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, frame: Frame<I>) {
        if self.frames.len() == self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(frame);
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recently pushed frame.
    pub fn latest(&self) -> Option<&Frame<I>> {
        self.frames.back()
    }

    pub fn latest_mut(&mut self) -> Option<&mut Frame<I>> {
        self.frames.back_mut()
    }

    /// Frame pushed just before the latest one.
    pub fn previous(&self) -> Option<&Frame<I>> {
        self.frames.len().checked_sub(2).and_then(|i| self.frames.get(i))
    }

    /// The previous and latest frames, with the latest one mutable so
    /// matches can be stored on it.
    pub fn last_two_mut(&mut self) -> Option<(&Frame<I>, &mut Frame<I>)> {
        let n = self.frames.len();
        if n < 2 {
            return None;
        }
        let (front, back) = self.frames.as_mut_slices();
        // the last two frames may straddle the ring's wrap point
        match back.len() {
            0 => {
                let (head, tail) = front.split_at_mut(n - 1);
                Some((&head[n - 2], &mut tail[0]))
            }
            1 => Some((&front[front.len() - 1], &mut back[0])),
            m => {
                let (head, tail) = back.split_at_mut(m - 1);
                Some((&head[m - 2], &mut tail[0]))
            }
        }
    }

    /// Frames in push order, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Frame<I>> {
        self.frames.iter()
    }
}
