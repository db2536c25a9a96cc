//! Top-level orchestration (§5, §6.5): the engine's single public entry
//! point, wiring the analyzer, grouper, merger, splitter, context
//! extractor, batch renamer, and checkpoint manager together behind a
//! bounded-concurrency visitor fan-out.
//!
//! The fan-out itself is grounded on `agent::orchestrator::fan_out`: an
//! `Arc<Semaphore>` permit per spawned unit of work, handles collected in
//! launch order, and that same order used to apply results so two
//! concurrently-dispatched batches never interleave their tree mutations.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::error::Result;
use crate::parser::tree::PlannedRename;
use crate::parser::SourceTree;

use super::checkpoint::{self, CheckpointState};
use super::config::RenameOptions;
use super::context;
use super::grouper;
use super::merger;
use super::progress::{ProgressFn, ProgressUpdate};
use super::skip;
use super::splitter::{self, Batch};
use super::visitor::Visitor;

/// Result of a completed (or checkpointed) [`rename`] call.
#[derive(Debug, Clone)]
pub struct RenameOutcome {
    /// The renamed source text.
    pub code: String,
    /// Every accepted old-name -> new-name mapping across the whole run.
    pub renames: HashMap<String, String>,
    /// Bindings left with their original name: low-signal skips, batches
    /// below the information-score floor, or rejected collisions.
    pub skipped: usize,
}

/// Renames every eligible identifier binding in `source` using `visitor`
/// to propose names, checkpointing progress so the run can resume if
/// interrupted (§4.8).
///
/// If `options.resume_path()` names an existing sidecar, `source` is
/// ignored in favor of the sidecar's own saved (partially renamed) code —
/// callers resuming a run should still pass the original file's current
/// on-disk contents; a mismatched `source_hash` is logged and the sidecar
/// is discarded rather than trusted.
pub async fn rename(
    input_path: &Path,
    source: &str,
    visitor: Arc<dyn Visitor>,
    options: &RenameOptions,
    on_progress: Option<&ProgressFn<'_>>,
) -> Result<RenameOutcome> {
    let original_hash = checkpoint::hex_md5(source.as_bytes());

    let mut state = if options.resume_path().is_some() {
        match checkpoint::load(input_path)? {
            Some(state) if state.source_hash == original_hash => state,
            Some(_) => {
                tracing::warn!("checkpoint source hash mismatch; starting a fresh run");
                fresh_state(&original_hash, source)
            }
            None => fresh_state(&original_hash, source),
        }
    } else {
        fresh_state(&original_hash, source)
    };

    let mut tree = SourceTree::parse(&input_path.to_string_lossy(), &state.code)?;
    let arena = super::analyzer::analyze(tree.program());
    // Every byte span in `arena` refers to this exact text. Once renames
    // start applying, `state.code` drifts (names change length); context
    // extraction for every remaining batch must keep reading from this
    // frozen copy rather than the mutating one.
    let original_for_context = state.code.clone();

    if state.total_scopes == 0 {
        state.total_scopes = arena.bindings.len();
    }

    let mut visited: HashSet<String> = state.visited.iter().cloned().collect();
    let mut renames = state.renames.clone();
    let mut assigned_this_run: HashSet<String> = renames.values().cloned().collect();

    let groups = merger::merge_small_scopes(
        &original_for_context,
        &arena,
        grouper::group(&arena),
        options.small_scope_merge_limit(),
        options.max_batch_size(),
    );
    let all_batches = splitter::split(groups, options.max_batch_size());

    let pending_batches: Vec<Batch> = all_batches
        .into_iter()
        .map(|mut batch| {
            batch.group.bindings.retain(|&id| {
                let binding = arena.binding(id);
                let key = binding.visited_key(&arena);
                !visited.contains(&key) && !skip::should_skip(binding, &original_for_context, &arena)
            });
            batch
        })
        .filter(|b| !b.group.bindings.is_empty())
        .collect();

    // Bindings excluded outright (skip rules or already visited from a
    // prior run) still count toward current_index immediately.
    for binding in &arena.bindings {
        let key = binding.visited_key(&arena);
        if visited.contains(&key) {
            continue;
        }
        if skip::should_skip(binding, &original_for_context, &arena) {
            visited.insert(key);
            state.current_index += 1;
        }
    }

    let semaphore = Arc::new(Semaphore::new(options.batch_concurrency()));

    // §4.8's checkpoint cadence: while dirty (a batch since the last save
    // produced an accepted rename), save every `dirty_checkpoint_interval`
    // groups; once a stretch of groups goes by with nothing accepted,
    // fall back to the coarser 200-group interval.
    const CLEAN_CHECKPOINT_INTERVAL: usize = 200;
    let mut groups_since_checkpoint: usize = 0;
    let mut dirty_since_checkpoint = false;

    for cohort in pending_batches.chunks(options.batch_concurrency()) {
        let mut handles = Vec::with_capacity(cohort.len());
        for batch in cohort {
            let ctx = context::extract(
                &original_for_context,
                &arena,
                batch,
                options.context_window_bytes(),
                options.min_information_score(),
            );
            if ctx.information_score < options.min_information_score() {
                tracing::debug!(batch_id = batch.id, score = ctx.information_score, "batch below information floor, skipping");
                let batch_id = batch.id;
                handles.push(tokio::spawn(async move { (batch_id, None::<super::visitor::RenameMap>) }));
                continue;
            }
            let permit = Arc::clone(&semaphore);
            let visitor = Arc::clone(&visitor);
            let batch_id = batch.id;
            let ctx_for_task = ctx;
            handles.push(tokio::spawn(async move {
                let _permit = permit.acquire_owned().await.ok();
                let result = visitor.propose_renames(batch_id, &ctx_for_task).await;
                (batch_id, result.ok())
            }));
        }

        let mut results: Vec<(usize, Option<super::visitor::RenameMap>)> = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(pair) => results.push(pair),
                Err(e) => {
                    tracing::warn!(error = %e, "visitor task panicked; treating batch as skipped");
                }
            }
        }

        for (batch, (batch_id, response)) in cohort.iter().zip(results.into_iter()) {
            debug_assert_eq!(batch.id, batch_id);
            let mut accepted: Vec<PlannedRename> = Vec::new();

            for &binding_id in batch.bindings() {
                let binding = arena.binding(binding_id);
                let key = binding.visited_key(&arena);
                if visited.contains(&key) {
                    continue;
                }

                let proposal = response.as_ref().and_then(|m| m.get(&binding.name)).cloned();
                let final_name = proposal
                    .as_deref()
                    .and_then(super::rename::normalize)
                    .and_then(|normalized| {
                        super::rename::resolve_collision(
                            &arena,
                            binding.owner_scope,
                            &normalized,
                            &assigned_this_run,
                            options.unique_names(),
                        )
                    });

                visited.insert(key);
                state.current_index += 1;

                match final_name {
                    Some(new_name) if new_name != binding.name => {
                        assigned_this_run.insert(new_name.clone());
                        renames.insert(binding.name.clone(), new_name.clone());
                        accepted.push(PlannedRename {
                            decl_span: binding.decl_span.clone(),
                            old_name: binding.name.clone(),
                            new_name,
                        });
                    }
                    _ => {}
                }
            }

            if !accepted.is_empty() {
                tree.apply_renames(&accepted);
                state.code = tree.print()?;
                dirty_since_checkpoint = true;
            }

            if let Some(cb) = on_progress {
                cb(ProgressUpdate {
                    current_index: state.current_index,
                    total_scopes: state.total_scopes,
                    batch_id: batch.id,
                });
            }

            groups_since_checkpoint += 1;
            let interval = if dirty_since_checkpoint {
                options.dirty_checkpoint_interval()
            } else {
                CLEAN_CHECKPOINT_INTERVAL
            };
            if options.resume_path().is_some() && interval > 0 && groups_since_checkpoint >= interval {
                state.visited = visited.iter().cloned().collect();
                state.renames = renames.clone();
                checkpoint::save(input_path, &state)?;
                groups_since_checkpoint = 0;
                dirty_since_checkpoint = false;
            }
        }
    }

    if options.resume_path().is_some() {
        if groups_since_checkpoint > 0 {
            state.visited = visited.iter().cloned().collect();
            state.renames = renames.clone();
            checkpoint::save(input_path, &state)?;
        }
        checkpoint::delete(input_path)?;
    }

    let skipped = arena.bindings.len().saturating_sub(renames.len());
    Ok(RenameOutcome {
        code: state.code,
        renames,
        skipped,
    })
}

fn fresh_state(source_hash: &str, source: &str) -> CheckpointState {
    CheckpointState {
        source_hash: source_hash.to_string(),
        code: source.to_string(),
        current_index: 0,
        total_scopes: 0,
        visited: Vec::new(),
        renames: HashMap::new(),
    }
}

