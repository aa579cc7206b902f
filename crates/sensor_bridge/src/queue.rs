//! Bounded frame hand-off between the delivery thread and the poller.

use async_channel::{bounded, Receiver, Sender, TryRecvError, TrySendError};
use contracts::{DropPolicy, Frame};
use tracing::{trace, warn};

use crate::config::IngestionMetrics;

/// Bounded FIFO of decoded frames with an explicit overflow policy.
///
/// The producer side keeps its own receiver handle so `DropOldest` can evict
/// the head of the queue before retrying.
#[derive(Debug, Clone)]
pub struct FrameQueue {
    tx: Sender<Frame>,
    rx: Receiver<Frame>,
    policy: DropPolicy,
}

impl FrameQueue {
    /// `capacity` is clamped to at least one slot.
    pub fn bounded(capacity: usize, policy: DropPolicy) -> Self {
        let (tx, rx) = bounded(capacity.max(1));
        Self { tx, rx, policy }
    }

    /// Enqueue, applying the overflow policy. Returns false if the frame was
    /// discarded.
    pub fn push(&self, frame: Frame, metrics: &IngestionMetrics, sensor: &str) -> bool {
        let mut frame = frame;
        loop {
            match self.tx.try_send(frame) {
                Ok(()) => {
                    metrics.update_queue_len(self.tx.len());
                    return true;
                }
                Err(TrySendError::Full(rejected)) => match self.policy {
                    DropPolicy::DropNewest => {
                        metrics.record_dropped();
                        trace!(sensor, frame_id = rejected.frame_id, "frame dropped (newest)");
                        return false;
                    }
                    DropPolicy::DropOldest => {
                        // The poller may have freed a slot meanwhile; only
                        // count an eviction that actually happened.
                        if let Ok(evicted) = self.rx.try_recv() {
                            metrics.record_dropped();
                            trace!(sensor, frame_id = evicted.frame_id, "frame dropped (oldest)");
                        }
                        frame = rejected;
                    }
                },
                Err(TrySendError::Closed(_)) => {
                    warn!(sensor, "frame queue closed");
                    return false;
                }
            }
        }
    }

    /// Oldest queued frame, never blocks
    pub fn try_pop(&self) -> Option<Frame> {
        match self.rx.try_recv() {
            Ok(frame) => Some(frame),
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.tx.capacity().unwrap_or(usize::MAX)
    }

    /// Refuse further pushes. Frames already queued stay readable.
    pub fn close(&self) {
        self.tx.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::FrameData;
    use ndarray::Array2;

    fn frame(frame_id: u64) -> Frame {
        Frame {
            frame_id,
            timestamp: frame_id as f64 * 0.05,
            data: FrameData::Points(Array2::zeros((0, 4))),
        }
    }

    fn drain(queue: &FrameQueue) -> Vec<u64> {
        std::iter::from_fn(|| queue.try_pop())
            .map(|f| f.frame_id)
            .collect()
    }

    #[test]
    fn test_fifo_order() {
        let queue = FrameQueue::bounded(8, DropPolicy::DropOldest);
        let metrics = IngestionMetrics::new();
        for id in 1..=5 {
            assert!(queue.push(frame(id), &metrics, "lidar"));
        }
        assert_eq!(queue.len(), 5);
        assert_eq!(drain(&queue), vec![1, 2, 3, 4, 5]);
        assert!(queue.try_pop().is_none());
    }

    #[test]
    fn test_drop_oldest_evicts_head() {
        let queue = FrameQueue::bounded(3, DropPolicy::DropOldest);
        let metrics = IngestionMetrics::new();
        for id in 1..=5 {
            assert!(queue.push(frame(id), &metrics, "lidar"));
        }
        assert_eq!(drain(&queue), vec![3, 4, 5]);
        assert_eq!(metrics.snapshot().dropped, 2);
    }

    #[test]
    fn test_drop_newest_keeps_head() {
        let queue = FrameQueue::bounded(3, DropPolicy::DropNewest);
        let metrics = IngestionMetrics::new();
        let accepted: Vec<bool> = (1..=5)
            .map(|id| queue.push(frame(id), &metrics, "lidar"))
            .collect();
        assert_eq!(accepted, vec![true, true, true, false, false]);
        assert_eq!(drain(&queue), vec![1, 2, 3]);
        assert_eq!(metrics.snapshot().dropped, 2);
    }

    #[test]
    fn test_closed_queue_still_drains() {
        let queue = FrameQueue::bounded(4, DropPolicy::DropOldest);
        let metrics = IngestionMetrics::new();
        queue.push(frame(1), &metrics, "rgb");
        queue.close();
        assert!(!queue.push(frame(2), &metrics, "rgb"));
        assert_eq!(drain(&queue), vec![1]);
    }
}
