//! SampleSource trait - where samples come from
//!
//! Real devices, synthetic generators and recordings all push samples
//! through the same callback.

use std::sync::Arc;

use crate::{Sample, StreamId};

/// Sample callback
///
/// Shared between the source's worker and whoever registered it.
pub type SampleCallback = Arc<dyn Fn(StreamId, Sample) + Send + Sync>;

/// Sample data source
///
/// One source feeds exactly one stream. Samples are delivered in
/// increasing timestamp order.
pub trait SampleSource: Send + Sync {
    /// Stream this source feeds
    fn stream_id(&self) -> &StreamId;

    /// Start delivering samples
    ///
    /// Calling it while already listening does nothing.
    fn listen(&self, callback: SampleCallback);

    /// Stop delivering samples
    fn stop(&self);

    fn is_listening(&self) -> bool;
}
