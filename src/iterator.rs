//! Dataset traversal: the iterator contract and an in-memory implementation.

use crate::error::{CocoEvalError, Result};
use crate::types::Annotation;

/// One dataset example: an image and its ground truth.
#[derive(Debug, Clone, PartialEq)]
pub struct Example<I> {
    /// Position of the example in the dataset.
    pub index: usize,
    pub image: I,
    pub annotations: Vec<Annotation>,
}

/// Supplies batches of examples in a fixed order without repetition.
pub trait DatasetIterator {
    type Image;

    /// Rewind to the start of the dataset.
    fn reset(&mut self);

    /// Next batch, or `None` once the dataset is exhausted.
    fn next_batch(&mut self) -> Result<Option<Vec<Example<Self::Image>>>>;

    /// Number of examples in one full pass, when known.
    fn dataset_len(&self) -> Option<usize> {
        None
    }
}

/// Iterates an in-memory dataset once, in order, in fixed-size batches.
///
/// The last batch may be shorter.
///
/// # Example
///
/// ```
/// use coco_detection_eval::iterator::{DatasetIterator, SerialIterator};
///
/// let dataset = vec![("a", vec![]), ("b", vec![]), ("c", vec![])];
/// let mut iter = SerialIterator::new(dataset, 2).unwrap();
/// assert_eq!(iter.next_batch().unwrap().unwrap().len(), 2);
/// assert_eq!(iter.next_batch().unwrap().unwrap().len(), 1);
/// assert!(iter.next_batch().unwrap().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct SerialIterator<I> {
    dataset: Vec<(I, Vec<Annotation>)>,
    batch_size: usize,
    position: usize,
}

impl<I> SerialIterator<I> {
    /// # Errors
    ///
    /// Returns `InvalidParams` for a zero batch size.
    pub fn new(dataset: Vec<(I, Vec<Annotation>)>, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(CocoEvalError::InvalidParams(
                "batch size must be positive".to_string(),
            ));
        }
        Ok(Self {
            dataset,
            batch_size,
            position: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }
}

impl<I: Clone> DatasetIterator for SerialIterator<I> {
    type Image = I;

    fn reset(&mut self) {
        self.position = 0;
    }

    fn next_batch(&mut self) -> Result<Option<Vec<Example<I>>>> {
        if self.position >= self.dataset.len() {
            return Ok(None);
        }

        let end = (self.position + self.batch_size).min(self.dataset.len());
        let batch = self.dataset[self.position..end]
            .iter()
            .enumerate()
            .map(|(offset, (image, annotations))| Example {
                index: self.position + offset,
                image: image.clone(),
                annotations: annotations.clone(),
            })
            .collect();
        self.position = end;

        Ok(Some(batch))
    }

    fn dataset_len(&self) -> Option<usize> {
        Some(self.dataset.len())
    }
}
