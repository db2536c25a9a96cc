//! Batch splitter (§4.4): caps every visitor call at `maxBatchSize`
//! bindings, splitting a large group into consecutive batches rather than
//! ever silently dropping bindings.

use super::grouper::Group;
use super::scope::BindingId;

/// One unit of work dispatched to a [`Visitor`](crate::engine::visitor::Visitor).
#[derive(Debug, Clone)]
pub struct Batch {
    /// Position in the overall batch stream; stable within one run and
    /// used as the resume cursor (§4.8) and in error messages (§7).
    pub id: usize,
    /// The scope this batch's bindings were grouped under, for the context
    /// extractor to render shared surrounding code.
    pub group: Group,
}

/// Splits every group into batches of at most `max_batch_size` bindings,
/// preserving each group's internal declaration order and never
/// interleaving bindings from two different groups in one batch.
#[must_use]
pub fn split(groups: Vec<Group>, max_batch_size: usize) -> Vec<Batch> {
    let max_batch_size = max_batch_size.max(1);
    let mut batches = Vec::new();
    for group in groups {
        if group.bindings.is_empty() {
            continue;
        }
        for chunk in group.bindings.chunks(max_batch_size) {
            let id = batches.len();
            batches.push(Batch {
                id,
                group: Group {
                    scope: group.scope,
                    bindings: chunk.to_vec(),
                },
            });
        }
    }
    batches
}

impl Batch {
    /// Convenience accessor mirroring the shape callers expect when they
    /// only need the binding ids, not the owning scope.
    #[must_use]
    pub fn bindings(&self) -> &[BindingId] {
        &self.group.bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scope::ScopeId;

    fn group_with(scope: ScopeId, n: usize) -> Group {
        Group {
            scope,
            bindings: (0..n).collect(),
        }
    }

    #[test]
    fn group_under_the_cap_produces_one_batch() {
        let batches = split(vec![group_with(0, 3)], 10);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].bindings().len(), 3);
    }

    #[test]
    fn group_over_the_cap_splits_into_consecutive_batches() {
        let batches = split(vec![group_with(0, 25)], 10);
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].bindings().len(), 10);
        assert_eq!(batches[1].bindings().len(), 10);
        assert_eq!(batches[2].bindings().len(), 5);
    }

    #[test]
    fn batch_ids_are_assigned_across_groups_in_order() {
        let batches = split(vec![group_with(0, 10), group_with(1, 10)], 10);
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].id, 0);
        assert_eq!(batches[1].id, 1);
    }

    #[test]
    fn empty_groups_produce_no_batches() {
        let batches = split(vec![group_with(0, 0)], 10);
        assert!(batches.is_empty());
    }
}
