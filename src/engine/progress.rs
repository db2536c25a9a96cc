//! Progress reporting (§6.4): a callback invoked after every batch so a
//! caller can render a progress bar without polling.

/// One progress update, emitted after each batch is applied (or skipped).
#[derive(Debug, Clone, Copy)]
pub struct ProgressUpdate {
    /// Bindings processed so far (including skipped ones), across the
    /// whole run.
    pub current_index: usize,
    /// Total bindings found in the original analysis pass.
    pub total_scopes: usize,
    /// Id of the batch this update corresponds to.
    pub batch_id: usize,
}

impl ProgressUpdate {
    /// Fraction of the run complete, in `[0.0, 1.0]`.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        if self.total_scopes == 0 {
            1.0
        } else {
            (self.current_index as f32 / self.total_scopes as f32).clamp(0.0, 1.0)
        }
    }
}

/// Callback type for [`rename`](super::engine::rename)'s `on_progress`
/// parameter.
pub type ProgressFn<'a> = dyn Fn(ProgressUpdate) + Send + Sync + 'a;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_clamps_and_handles_zero_total() {
        let update = ProgressUpdate {
            current_index: 0,
            total_scopes: 0,
            batch_id: 0,
        };
        assert!((update.fraction() - 1.0).abs() < f32::EPSILON);

        let update = ProgressUpdate {
            current_index: 5,
            total_scopes: 10,
            batch_id: 1,
        };
        assert!((update.fraction() - 0.5).abs() < f32::EPSILON);
    }
}
