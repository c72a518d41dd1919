//! Frame sampling tiers and the previous-frame window.
//!
//! Within a segment, frame `i` is a scalar frame when `i % scalar_stride == 0`
//! and a detection frame when `i % detection_stride == 0`. Frames in neither
//! tier are decoded but never scored. The window remembers the last scalar
//! frame so frame-pair metrics can compare against it.

use std::collections::VecDeque;

use crate::config::SamplingPolicy;
use crate::frame::Frame;

/// Tier assignment for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePlan {
    /// Index within the segment
    pub index: usize,
    pub scalar: bool,
    pub detection: bool,
    /// A previous scalar frame is held in the window
    pub has_previous: bool,
}

impl FramePlan {
    /// Whether any metric runs on this frame.
    pub fn is_sampled(&self) -> bool {
        self.scalar || self.detection
    }
}

/// Assigns sampling tiers by frame index.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameSampler {
    policy: SamplingPolicy,
}

impl FrameSampler {
    pub fn new(policy: SamplingPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SamplingPolicy {
        &self.policy
    }

    pub fn is_scalar(&self, index: usize) -> bool {
        index % self.policy.scalar_stride.max(1) == 0
    }

    pub fn is_detection(&self, index: usize) -> bool {
        index % self.policy.detection_stride.max(1) == 0
    }

    /// Plan frame `index` given whether a previous frame is retained.
    pub fn plan(&self, index: usize, has_previous: bool) -> FramePlan {
        FramePlan {
            index,
            scalar: self.is_scalar(index),
            detection: self.is_detection(index),
            has_previous,
        }
    }

    /// Number of scalar frames in a segment of `frame_count` frames.
    pub fn scalar_count(&self, frame_count: usize) -> usize {
        frame_count.div_ceil(self.policy.scalar_stride.max(1))
    }
}

/// Sliding window of the last two sampled frames.
#[derive(Debug, Default)]
pub struct FrameWindow {
    frames: VecDeque<Frame>,
}

impl FrameWindow {
    const CAPACITY: usize = 2;

    pub fn new() -> Self {
        Self {
            frames: VecDeque::with_capacity(Self::CAPACITY),
        }
    }

    /// Push `frame`, evicting the oldest once the window is full.
    pub fn advance(&mut self, frame: Frame) {
        if self.frames.len() == Self::CAPACITY {
            self.frames.pop_front();
        }
        self.frames.push_back(frame);
    }

    /// Most recently pushed frame.
    pub fn current(&self) -> Option<&Frame> {
        self.frames.back()
    }

    /// The frame pushed before the current one.
    pub fn previous(&self) -> Option<&Frame> {
        if self.frames.len() == Self::CAPACITY {
            self.frames.front()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}
