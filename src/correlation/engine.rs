use crate::correlation::tokens::{overlap_score, significant_tokens, LOOSE_MATCH_THRESHOLD};
use crate::models::commit::Commit;
use crate::models::issue::{Association, Issue, MatchType};
use crate::models::modifications::UserModifications;
use std::collections::{HashMap, HashSet};

/// Tunables for the heuristic phase. Defaults match the shipped product
/// behavior; the settings file can override both.
#[derive(Debug, Clone)]
pub struct CorrelationSettings {
    pub loose_match_threshold: usize,
    pub extra_stop_words: Vec<String>,
}

impl Default for CorrelationSettings {
    fn default() -> Self {
        CorrelationSettings {
            loose_match_threshold: LOOSE_MATCH_THRESHOLD,
            extra_stop_words: Vec::new(),
        }
    }
}

/// Classify every issue and commit into matched/unmatched buckets.
///
/// Runs three matching passes of decreasing confidence, in strict
/// order: manual matches recorded by the user, explicit key references
/// in commit text, then a keyword-overlap heuristic. Later passes never
/// override the conclusions of earlier ones, and pairs the user severed
/// are never revived by the heuristic.
///
/// Annotates the records in place. Ids in `mods` that do not resolve to
/// a current record are stale (from another context) and are ignored.
pub fn correlate(issues: &mut [Issue], commits: &mut [Commit], mods: &UserModifications) {
    correlate_with(issues, commits, mods, &CorrelationSettings::default())
}

pub fn correlate_with(
    issues: &mut [Issue],
    commits: &mut [Commit],
    mods: &UserModifications,
    settings: &CorrelationSettings,
) {
    let issue_index = index_issues(issues);
    let commit_index: HashMap<String, usize> = commits
        .iter()
        .enumerate()
        .map(|(i, c)| (c.id.clone(), i))
        .collect();

    apply_flags(issues, commits, mods);
    apply_manual_matches(issues, commits, mods, &issue_index.by_id, &commit_index);
    apply_explicit_matches(issues, commits, &issue_index);
    apply_loose_matches(issues, commits, mods, settings);
}

struct IssueIndex {
    by_id: HashMap<String, usize>,
    by_key: HashMap<String, usize>,
}

impl IssueIndex {
    /// Explicit references carry the tracker key; ids are accepted as a
    /// fallback since issue ids equal keys for tracker-sourced records.
    fn resolve(&self, reference: &str) -> Option<usize> {
        self.by_key
            .get(reference)
            .or_else(|| self.by_id.get(reference))
            .copied()
    }
}

fn index_issues(issues: &[Issue]) -> IssueIndex {
    let mut by_id = HashMap::new();
    let mut by_key = HashMap::new();
    for (i, issue) in issues.iter().enumerate() {
        by_id.insert(issue.id.clone(), i);
        by_key.insert(issue.key.clone(), i);
    }
    IssueIndex { by_id, by_key }
}

/// Phase 0: start from a clean slate, then apply persisted flags.
fn apply_flags(issues: &mut [Issue], commits: &mut [Commit], mods: &UserModifications) {
    for issue in issues.iter_mut() {
        issue.associations.clear();
        issue.needs_action = mods.flagged_items.get(&issue.id).copied().unwrap_or(false);
    }
    for commit in commits.iter_mut() {
        commit.associations.clear();
        commit.needs_action = mods.flagged_items.get(&commit.id).copied().unwrap_or(false);
    }
}

/// Phase 1: manual matches override everything previously computed for
/// either side. Each participating item is cleared exactly once before
/// any manual link is added, so an item named in several manual pairs
/// keeps links to all of them.
fn apply_manual_matches(
    issues: &mut [Issue],
    commits: &mut [Commit],
    mods: &UserModifications,
    issues_by_id: &HashMap<String, usize>,
    commits_by_id: &HashMap<String, usize>,
) {
    let resolved: Vec<(usize, usize)> = mods
        .manual_matches
        .iter()
        .filter_map(|m| {
            let ii = issues_by_id.get(&m.issue_id)?;
            let ci = commits_by_id.get(&m.commit_id)?;
            Some((*ii, *ci))
        })
        .collect();

    let mut cleared_issues = HashSet::new();
    let mut cleared_commits = HashSet::new();

    for &(ii, ci) in &resolved {
        if cleared_issues.insert(ii) {
            issues[ii].associations.clear();
        }
        if cleared_commits.insert(ci) {
            commits[ci].associations.clear();
        }
    }

    for &(ii, ci) in &resolved {
        link(&mut issues[ii], &mut commits[ci], MatchType::Manual);
    }
}

/// Phase 2: commits whose text names an issue key. Commits already
/// matched manually are settled and skipped.
fn apply_explicit_matches(issues: &mut [Issue], commits: &mut [Commit], index: &IssueIndex) {
    for ci in 0..commits.len() {
        if commits[ci].has_match_type(MatchType::Manual) {
            continue;
        }

        let keys = commits[ci].explicit_reference_keys.clone();
        for key in keys {
            if let Some(ii) = index.resolve(&key) {
                // An issue settled by a manual match is closed to
                // automated links as well.
                if issues[ii].has_match_type(MatchType::Manual) {
                    continue;
                }
                link(&mut issues[ii], &mut commits[ci], MatchType::Explicit);
            }
        }
    }
}

/// Phase 3: keyword-overlap heuristic for issues still unmatched. Each
/// issue takes at most one loose match; the best-scoring commit wins and
/// ties keep the first one seen. A commit already loose-matched to an
/// earlier issue remains eligible — only explicit/manual links exclude
/// it (observed product behavior, kept intentionally).
fn apply_loose_matches(
    issues: &mut [Issue],
    commits: &mut [Commit],
    mods: &UserModifications,
    settings: &CorrelationSettings,
) {
    let commit_tokens: Vec<HashSet<String>> = commits
        .iter()
        .map(|c| {
            let text = format!("{} {}", c.title, c.message);
            significant_tokens(&text, &settings.extra_stop_words)
        })
        .collect();

    for ii in 0..issues.len() {
        if issues[ii].has_match_type(MatchType::Explicit)
            || issues[ii].has_match_type(MatchType::Manual)
        {
            continue;
        }

        let issue_tokens = significant_tokens(&issues[ii].summary, &settings.extra_stop_words);
        if issue_tokens.is_empty() {
            continue;
        }

        let mut best: Option<(usize, usize)> = None; // (score, commit index)
        for ci in 0..commits.len() {
            if commits[ci].is_linked_to(&issues[ii].id) {
                continue;
            }
            if commits[ci].has_match_type(MatchType::Explicit)
                || commits[ci].has_match_type(MatchType::Manual)
            {
                continue;
            }
            if mods.is_unmatched(&issues[ii].id, &commits[ci].id) {
                continue;
            }

            let score = overlap_score(&issue_tokens, &commit_tokens[ci]);
            if score < settings.loose_match_threshold {
                continue;
            }
            // Strictly-greater keeps the first-seen commit on ties.
            if best.map_or(true, |(best_score, _)| score > best_score) {
                best = Some((score, ci));
            }
        }

        if let Some((_, ci)) = best {
            link(&mut issues[ii], &mut commits[ci], MatchType::Loose);
        }
    }
}

/// Add the reciprocal association, skipping sides that already link the
/// counterpart so no item ever holds two links to the same id.
fn link(issue: &mut Issue, commit: &mut Commit, match_type: MatchType) {
    if !issue.is_linked_to(&commit.id) {
        issue.associations.push(Association {
            counterpart_id: commit.id.clone(),
            match_type,
        });
    }
    if !commit.is_linked_to(&issue.id) {
        commit.associations.push(Association {
            counterpart_id: issue.id.clone(),
            match_type,
        });
    }
}
