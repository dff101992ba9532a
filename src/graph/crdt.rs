//! Conflict resolution
//!
//! The stores never decide which write wins. They hand the incoming update
//! and the stored state to a `CrdtResolver` and persist whatever it returns.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{GunKvError, Result};

use super::node::{GunGraph, GunNode, GunValue, State};

/// Pure diff/merge pair used by the node stores
pub trait CrdtResolver {
    /// Fields of `updates` that change `existing`, or `None` if nothing does
    ///
    /// The result carries each changed field with its new state.
    fn diff(&self, updates: &GunGraph, existing: &GunGraph) -> Result<Option<GunGraph>>;

    /// `existing` with `diff` applied
    fn merge(&self, existing: &GunGraph, diff: &GunGraph) -> Result<GunGraph>;
}

/// A resolver built from two closures
pub struct FnResolver<D, M> {
    pub diff: D,
    pub merge: M,
}

impl<D, M> CrdtResolver for FnResolver<D, M>
where
    D: Fn(&GunGraph, &GunGraph) -> Result<Option<GunGraph>>,
    M: Fn(&GunGraph, &GunGraph) -> Result<GunGraph>,
{
    fn diff(&self, updates: &GunGraph, existing: &GunGraph) -> Result<Option<GunGraph>> {
        (self.diff)(updates, existing)
    }

    fn merge(&self, existing: &GunGraph, diff: &GunGraph) -> Result<GunGraph> {
        (self.merge)(existing, diff)
    }
}

/// Default future grace: ten minutes
pub const DEFAULT_FUTURE_GRACE_MS: f64 = 10.0 * 60.0 * 1000.0;

/// GUN's field-wise last-write-wins rule
///
/// - only fields that carry a state are considered
/// - a state further in the future than `future_grace_ms` is deferred
/// - the greater state wins
/// - on equal states the greater JSON encoding of the value wins
#[derive(Debug, Clone)]
pub struct HamResolver {
    future_grace_ms: f64,
    /// Fixed machine time; the system clock when `None`
    machine_state: Option<State>,
}

impl Default for HamResolver {
    fn default() -> Self {
        Self {
            future_grace_ms: DEFAULT_FUTURE_GRACE_MS,
            machine_state: None,
        }
    }
}

impl HamResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_future_grace_ms(mut self, grace: f64) -> Self {
        self.future_grace_ms = grace;
        self
    }

    /// Pin the machine clock
    pub fn with_machine_state(mut self, state: State) -> Self {
        self.machine_state = Some(state);
        self
    }

    fn machine_state(&self) -> State {
        self.machine_state.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs_f64() * 1000.0)
                .unwrap_or(0.0)
        })
    }

    fn node_diff(&self, updated: &GunNode, existing: Option<&GunNode>, max_state: State) -> Result<GunNode> {
        let mut changes = GunNode::new(updated.soul());

        for (field, &state) in &updated.meta.state {
            if !state.is_finite() || state > max_state {
                continue;
            }
            let Some(value) = updated.fields.get(field) else {
                continue;
            };

            let current = existing.and_then(|node| {
                node.state_of(field).map(|s| (s, node.fields.get(field)))
            });

            if let Some((current_state, current_value)) = current {
                if current_state > state {
                    continue;
                }
                if current_state == state {
                    let current_value = current_value.cloned().unwrap_or_default();
                    if lexical(&current_value)? >= lexical(value)? {
                        continue;
                    }
                }
            }

            changes.set(field.clone(), value.clone(), state);
        }

        Ok(changes)
    }
}

impl CrdtResolver for HamResolver {
    fn diff(&self, updates: &GunGraph, existing: &GunGraph) -> Result<Option<GunGraph>> {
        let max_state = self.machine_state() + self.future_grace_ms;
        let mut diff = GunGraph::new();

        for (soul, updated) in updates {
            let changes = self.node_diff(updated, existing.get(soul), max_state)?;
            if !changes.is_empty() {
                diff.insert(soul.clone(), changes);
            }
        }

        Ok(if diff.is_empty() { None } else { Some(diff) })
    }

    fn merge(&self, existing: &GunGraph, diff: &GunGraph) -> Result<GunGraph> {
        let mut merged = existing.clone();

        for (soul, changes) in diff {
            let node = merged
                .entry(soul.clone())
                .or_insert_with(|| GunNode::new(soul.clone()));

            for (field, value) in &changes.fields {
                let state = changes.state_of(field).ok_or_else(|| {
                    GunKvError::Resolver(format!("diff field {:?} of {:?} has no state", field, soul))
                })?;
                node.set(field.clone(), value.clone(), state);
            }
        }

        Ok(merged)
    }
}

fn lexical(value: &GunValue) -> Result<String> {
    serde_json::to_string(value).map_err(|e| GunKvError::Resolver(e.to_string()))
}
