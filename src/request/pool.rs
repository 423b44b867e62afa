use std::collections::BTreeMap;

use crate::{request::model::ModelRequest, GraphError};

/// The transport boundary that turns a [ModelRequest] into an upstream subscription.
pub trait SubscriptionSink {
    fn subscribe(&mut self, request: &ModelRequest) -> Result<(), GraphError>;
}

/// Folds overlapping requests so that one upstream subscription serves every consumer.
///
/// Requests for the same collection are merged. A request whose fieldsets conflict with every
/// pending request of its collection is kept as a separate subscription.
#[derive(Debug, Default)]
pub struct RequestPool {
    pending: BTreeMap<String, Vec<ModelRequest>>,
}

impl RequestPool {
    pub fn new() -> RequestPool {
        RequestPool::default()
    }

    /// Queue `request`. Returns true if it was folded into an already pending request.
    pub fn add(&mut self, request: ModelRequest) -> Result<bool, GraphError> {
        let pending = self.pending.entry(request.collection.clone()).or_default();
        for existing in pending.iter_mut() {
            match existing.merge(&request) {
                Ok(merged) => {
                    *existing = merged;
                    return Ok(true);
                }
                Err(GraphError::FieldsetMismatch {
                    id_field,
                    left,
                    right,
                }) => {
                    tracing::debug!(
                        "[RequestPool] `{id_field}` asks for `{left}` and `{right}`, trying the next subscription"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        pending.push(request);
        Ok(false)
    }

    pub fn pending(&self) -> impl Iterator<Item = &ModelRequest> {
        self.pending.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hand every pending request to `sink` and clear the pool. Requests the sink rejects are
    /// put back.
    pub fn flush(&mut self, sink: &mut impl SubscriptionSink) -> Result<usize, GraphError> {
        let mut sent = 0;
        let mut failed = BTreeMap::<String, Vec<ModelRequest>>::new();
        let mut first_error = None;
        for (collection, requests) in std::mem::take(&mut self.pending) {
            for request in requests {
                match sink.subscribe(&request) {
                    Ok(()) => sent += 1,
                    Err(e) => {
                        tracing::warn!("[RequestPool::flush] subscription for {collection} failed: {e}");
                        first_error.get_or_insert(e);
                        failed.entry(collection.clone()).or_default().push(request);
                    }
                }
            }
        }
        self.pending = failed;
        match first_error {
            Some(e) => Err(e),
            None => Ok(sent),
        }
    }
}
