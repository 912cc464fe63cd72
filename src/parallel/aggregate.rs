//! Histogram aggregation

use crate::histogram::Histogram;

use super::types::WorkerResult;

/// Sum every chunk histogram and the boundary histogram into one result.
///
/// Entries at or beyond `max_fields` are dropped with a warning.
pub fn aggregate(results: &[WorkerResult], boundary: &Histogram, max_fields: usize) -> Histogram {
    let mut total = Histogram::new(max_fields);
    for result in results {
        total.merge(&result.histogram);
    }
    total.merge(boundary);
    total
}
