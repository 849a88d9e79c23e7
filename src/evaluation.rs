//! The evaluation tracker and per-`validate()` run state (§3, §4.5).
//!
//! Instance nodes are compared by identity, not value (two structurally
//! equal sub-objects must be tracked independently). Since `validate()`
//! never clones the instance — it only ever borrows `&Value` — the address
//! of a borrowed node is a stable enough identity for the lifetime of one
//! `ValidationRun`. This sidesteps the teacher's `PathChunk`-annotated
//! `JSONSchemaValue` entirely: no parent back-pointers, no wrapper type,
//! matching §9's explicit rejection of the source's parent-pointer model.
use ahash::AHashMap;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum MemberKey {
    Property(String),
    Index(usize),
}

fn node_id(value: &Value) -> usize {
    value as *const Value as usize
}

/// Per-`validate()` call state: the evaluation tracker. Deliberately not
/// `Clone`-derived in the public sense — [`ValidationRun::fork`] is the only
/// sanctioned way to get an isolated copy, used by combinators
/// (`anyOf`/`oneOf`) that must try a branch without polluting the parent's
/// marks unless that branch is kept.
#[derive(Debug, Default)]
pub(crate) struct ValidationRun {
    tracker: AHashMap<(usize, MemberKey), bool>,
}

impl ValidationRun {
    pub(crate) fn new() -> Self {
        ValidationRun::default()
    }

    /// Record that `member` of `parent` was visited by an applicator.
    /// A later successful mark always wins over an earlier failed one for
    /// the same key, since "evaluated" only needs *some* applicator to
    /// have succeeded (§8, property 7).
    pub(crate) fn mark(&mut self, parent: &Value, member: MemberKey, success: bool) {
        let entry = self.tracker.entry((node_id(parent), member)).or_insert(false);
        *entry = *entry || success;
    }

    pub(crate) fn is_evaluated_success(&self, parent: &Value, member: &MemberKey) -> bool {
        matches!(
            self.tracker.get(&(node_id(parent), member.clone())),
            Some(true)
        )
    }

    /// An isolated copy of the current tracker state, for a combinator
    /// branch that must be tried speculatively.
    pub(crate) fn fork(&self) -> Self {
        ValidationRun {
            tracker: self.tracker.clone(),
        }
    }

    /// Replace this run's tracker with `branch`'s, keeping whatever marks
    /// that branch accumulated (including everything it inherited via
    /// [`fork`]). Used when exactly one speculative branch is accepted
    /// (`oneOf`, `if`/`then`/`else`).
    pub(crate) fn commit(&mut self, branch: ValidationRun) {
        self.tracker = branch.tracker;
    }

    /// Union another run's marks into this one: a `true` always wins over
    /// a `false` for the same key, same rule as [`mark`](Self::mark). Used
    /// to combine several passing `anyOf` branches, each forked
    /// independently from the same base state, so marks from every branch
    /// survive rather than just the last one committed.
    pub(crate) fn merge(&mut self, other: ValidationRun) {
        for (key, success) in other.tracker {
            let entry = self.tracker.entry(key).or_insert(false);
            *entry = *entry || success;
        }
    }
}

/// Every property name (objects) or index (arrays) of an instance node;
/// the complement of this set minus the evaluated-and-successful keys is
/// what `unevaluatedProperties`/`unevaluatedItems` applies to.
pub(crate) fn members(value: &Value) -> Vec<MemberKey> {
    match value {
        Value::Object(map) => map.keys().cloned().map(MemberKey::Property).collect(),
        Value::Array(items) => (0..items.len()).map(MemberKey::Index).collect(),
        _ => Vec::new(),
    }
}
