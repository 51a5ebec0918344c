//! Duplicate collapsing for an author's works.
//!
//! OpenAlex often returns several records for one real-world publication
//! (preprint, accepted manuscript, journal version). Works are bucketed by a
//! normalized title and each bucket is reduced to a single canonical record.

use crate::openalex::RawWork;
use std::collections::HashMap;
use tracing::debug;

/// Grouping key for a title: lower-cased, only letters, digits and
/// whitespace kept, trimmed.
pub fn title_key(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Bucket works by [`title_key`], preserving first-seen order of keys and
/// of works within a key.
///
/// Works without a title are keyed as `"Untitled"` and therefore all land in
/// the same bucket.
pub fn group_by_title(works: Vec<RawWork>) -> Vec<(String, Vec<RawWork>)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<(String, Vec<RawWork>)> = Vec::new();

    for work in works {
        let key = title_key(work.title_or_untitled());
        match index.get(&key) {
            Some(&slot) => buckets[slot].1.push(work),
            None => {
                index.insert(key.clone(), buckets.len());
                buckets.push((key, vec![work]));
            }
        }
    }

    buckets
}

/// Outcome of one tie-break rule for a (best, candidate) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Promote,
    Retain,
}

/// A rule returns `None` when it does not apply to the pair.
type Rule = fn(best: &RawWork, candidate: &RawWork) -> Option<Verdict>;

/// Tie-break rules in evaluation order; the first rule that applies decides.
const RULES: &[(&str, Rule)] = &[
    ("journal article outranks other types", article_outranks),
    ("DOI outranks missing DOI", doi_outranks),
    ("more citations outrank fewer", citations_outrank),
];

fn article_outranks(best: &RawWork, candidate: &RawWork) -> Option<Verdict> {
    (candidate.work_type() == "article" && best.work_type() != "article").then_some(Verdict::Promote)
}

fn doi_outranks(best: &RawWork, candidate: &RawWork) -> Option<Verdict> {
    if candidate.work_type() != best.work_type() {
        return None;
    }
    match (best.doi().is_some(), candidate.doi().is_some()) {
        (false, true) => Some(Verdict::Promote),
        (true, false) => Some(Verdict::Retain),
        _ => None,
    }
}

fn citations_outrank(best: &RawWork, candidate: &RawWork) -> Option<Verdict> {
    if candidate.work_type() != best.work_type() {
        return None;
    }
    if candidate.citations() > best.citations() {
        Some(Verdict::Promote)
    } else {
        Some(Verdict::Retain)
    }
}

fn judge(best: &RawWork, candidate: &RawWork) -> Verdict {
    RULES
        .iter()
        .find_map(|(name, rule)| {
            rule(best, candidate).inspect(|verdict| {
                debug!(rule = *name, verdict = ?verdict, candidate = %candidate.id, "Tie-break");
            })
        })
        .unwrap_or(Verdict::Retain)
}

/// Pick the canonical work of a bucket.
///
/// Scans left to right keeping a running best, starting from the first
/// work. The result depends on arrival order. Returns `None` only for an
/// empty bucket.
pub fn select_canonical(bucket: Vec<RawWork>) -> Option<RawWork> {
    let mut works = bucket.into_iter();
    let first = works.next()?;

    Some(works.fold(first, |best, candidate| match judge(&best, &candidate) {
        Verdict::Promote => candidate,
        Verdict::Retain => best,
    }))
}

/// Group and select: one canonical work per distinct title key, in
/// first-seen order.
pub fn deduplicate(works: Vec<RawWork>) -> Vec<RawWork> {
    let total = works.len();
    let canonical: Vec<RawWork> = group_by_title(works)
        .into_iter()
        .filter_map(|(_, bucket)| select_canonical(bucket))
        .collect();

    debug!(total = total, unique = canonical.len(), "Deduplicated works");
    canonical
}
