//! Lookahead bookkeeping for incremental reparsing
//!
//! Backtracking means a rule's result can depend on bytes no leaf of the
//! final tree covers: a failed alternative may have read past the point
//! where the chosen one starts. For each element a visible rule produced we
//! record how far the parser had read before that rule was entered. A rule
//! may only be re-run in isolation if nothing read before it touched the
//! edited bytes.

use rustc_hash::FxHashMap;

use crate::base::Edit;
use crate::grammar::KindId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Lookahead {
    /// `(element start, kind)` to the reach when its rule was entered.
    before: FxHashMap<(usize, KindId), usize>,
}

impl Lookahead {
    /// Entries for output that was later discarded may linger; keeping the
    /// maximum only ever overestimates.
    pub(crate) fn record(&mut self, start: usize, kind: KindId, reach: usize) {
        let entry = self.before.entry((start, kind)).or_insert(reach);
        *entry = (*entry).max(reach);
    }

    pub(crate) fn before(&self, start: usize, kind: KindId) -> Option<usize> {
        self.before.get(&(start, kind)).copied()
    }

    /// The table after the element at `start..end` was re-run against the
    /// edited text, producing `rerun` with an overall reach of `rerun_reach`.
    ///
    /// Entries behind the element are kept. Entries inside it come from the
    /// re-run, entries after it are shifted by the edit. Both are raised to
    /// a bound that covers what a parse from scratch would record.
    pub(crate) fn splice(
        &self,
        edit: &Edit,
        (start, end): (usize, usize),
        rerun: &Lookahead,
        rerun_reach: usize,
    ) -> Lookahead {
        let mut spliced = Lookahead::default();
        for (&(at, kind), &reach) in &self.before {
            if at <= start {
                spliced.record(at, kind, reach);
            } else if at >= end {
                let shifted = (reach + edit.new_end).saturating_sub(edit.old_end);
                let bound = shifted.max(rerun_reach).max(edit.start);
                spliced.record(at - edit.old_end + edit.new_end, kind, bound);
            }
        }
        for (&(at, kind), &reach) in &rerun.before {
            spliced.record(at, kind, reach.max(edit.start));
        }
        spliced
    }
}
