//! Batch scheduling
//!
//! Partitions the resolved entry list into fixed-size, source-order batches.
//! For uploads and downloads a batch is a submission-rate control device;
//! for deletes each batch maps onto the store's bulk-delete calls. Without
//! batching, a tree with hundreds of thousands of entries would hit the
//! pool with every task at once.

use super::entry::TransferEntry;

/// Default number of entries per batch
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// A bounded, ordered group of entries; exists only during scheduling and
/// bulk-delete submission
#[derive(Debug)]
pub struct Batch {
    /// Zero-based position in submission order
    pub index: usize,

    pub entries: Vec<TransferEntry>,
}

/// Splits entry lists into batches
#[derive(Debug, Clone)]
pub struct BatchScheduler {
    batch_size: usize,
}

impl BatchScheduler {
    /// Create a scheduler; a zero size is clamped to 1
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of batches `entry_count` entries will produce
    pub fn batch_count(&self, entry_count: usize) -> usize {
        entry_count.div_ceil(self.batch_size)
    }

    /// Partition `entries` into source-order batches
    pub fn schedule(&self, entries: Vec<TransferEntry>) -> Vec<Batch> {
        let mut batches = Vec::with_capacity(self.batch_count(entries.len()));
        let mut entries = entries.into_iter().peekable();
        let mut index = 0;

        while entries.peek().is_some() {
            let chunk: Vec<TransferEntry> = entries.by_ref().take(self.batch_size).collect();
            batches.push(Batch {
                index,
                entries: chunk,
            });
            index += 1;
        }

        batches
    }
}

impl Default for BatchScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(n: usize) -> Vec<TransferEntry> {
        (0..n)
            .map(|i| TransferEntry::delete(format!("key-{:05}", i), None))
            .collect()
    }

    #[test]
    fn test_2500_entries_make_3_batches() {
        let scheduler = BatchScheduler::new(1000);
        let batches = scheduler.schedule(entries(2500));

        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].entries.len(), 1000);
        assert_eq!(batches[1].entries.len(), 1000);
        assert_eq!(batches[2].entries.len(), 500);
    }

    #[test]
    fn test_source_order_preserved() {
        let scheduler = BatchScheduler::new(2);
        let batches = scheduler.schedule(entries(5));

        assert_eq!(batches[0].index, 0);
        assert_eq!(batches[0].entries[0].source_key, "key-00000");
        assert_eq!(batches[1].entries[0].source_key, "key-00002");
        assert_eq!(batches[2].entries[0].source_key, "key-00004");
    }

    #[test]
    fn test_empty_input_yields_no_batches() {
        let scheduler = BatchScheduler::default();
        assert!(scheduler.schedule(Vec::new()).is_empty());
        assert_eq!(scheduler.batch_count(0), 0);
    }

    #[test]
    fn test_exact_multiple() {
        let scheduler = BatchScheduler::new(500);
        let batches = scheduler.schedule(entries(1000));
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[1].entries.len(), 500);
    }

    #[test]
    fn test_zero_batch_size_clamped() {
        let scheduler = BatchScheduler::new(0);
        assert_eq!(scheduler.batch_size(), 1);
    }

    #[test]
    fn test_batch_count_math() {
        let scheduler = BatchScheduler::new(1000);
        assert_eq!(scheduler.batch_count(1), 1);
        assert_eq!(scheduler.batch_count(1000), 1);
        assert_eq!(scheduler.batch_count(1001), 2);
        assert_eq!(scheduler.batch_count(2500), 3);
    }
}
