//! Branch inference for the commits of one push.
//!
//! The hosting service only names the branch on the tip commit of each pushed
//! branch. Every other commit's branch is reconstructed here by walking parent
//! links back from the tips, inside the push only.
//!
//! ## Rules
//!
//! - Tips are processed in payload order. When two tips share an unresolved
//!   ancestor, the tip that appears first in the payload claims it.
//! - A commit's branch is assigned at most once and never overwritten.
//! - Parent ids that are not part of the push end the walk along that path.
//! - A commit that no tip reaches keeps no branch.
//!
//! Each commit is pushed onto the worklist at most once, so the walk costs
//! O(commits + parent edges) whatever the shape of the graph.

use std::collections::HashMap;

use crate::{BranchName, CommitNode};

/// Counters describing one resolution pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionStats {
    /// Commits that already carried a branch when the pass started.
    pub seeds: usize,
    /// Commits that received an inherited branch during the pass.
    pub assigned: usize,
    /// Parent links looked at during the pass.
    pub edges_examined: usize,
}

/// Fills in the branch of every commit reachable from a branch tip.
///
/// Mutates `commits` in place; their order is left untouched. Running it a
/// second time over the same commits changes nothing.
pub fn resolve_branches(commits: &mut [CommitNode]) -> ResolutionStats {
    let index: HashMap<String, usize> = commits
        .iter()
        .enumerate()
        .map(|(position, commit)| (commit.id.as_str().to_string(), position))
        .collect();

    let seeds: Vec<(usize, BranchName)> = commits
        .iter()
        .enumerate()
        .filter_map(|(position, commit)| commit.branch.name().map(|name| (position, name.clone())))
        .collect();

    let mut stats = ResolutionStats {
        seeds: seeds.len(),
        ..ResolutionStats::default()
    };
    let mut worklist: Vec<usize> = Vec::new();

    for (tip, branch) in seeds {
        let before = stats.assigned;
        worklist.push(tip);

        while let Some(position) = worklist.pop() {
            // Reverse so parents are walked in their listed order.
            for k in (0..commits[position].parents.len()).rev() {
                stats.edges_examined += 1;
                let Some(&parent) = index.get(commits[position].parents[k].as_str()) else {
                    continue;
                };
                if commits[parent].branch.inherit(&branch) {
                    stats.assigned += 1;
                    worklist.push(parent);
                }
            }
        }

        tracing::debug!(
            tip = %commits[tip].id,
            branch = %branch,
            assigned = stats.assigned - before,
            "Propagated branch from tip"
        );
    }

    stats
}
