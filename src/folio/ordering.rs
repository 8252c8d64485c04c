//! Ordering of the active ring.
//!
//! The ring is closed and has no stored head: the lowest-id active record
//! plays that role and new records are spliced in right after it, so a walk
//! along `next-id` reads head, newest, ..., oldest, head. Archived records
//! keep whatever links they had when they left the ring; walks skip them.

use crate::error::{RegistryError, RegistryResult};
use crate::folio::model::{ProjectRecord, Registry, format_id, parse_id_suffix};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Prev,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Next => "next",
            Self::Prev => "prev",
        }
    }

    fn link(self, record: &ProjectRecord) -> &str {
        match self {
            Self::Next => &record.next_id,
            Self::Prev => &record.prev_id,
        }
    }
}

/// Next id to hand out. Archived and removed ids stay reserved.
pub fn next_id(registry: &Registry) -> RegistryResult<String> {
    let highest = registry
        .projects
        .keys()
        .map(String::as_str)
        .chain(registry.last_id.as_deref())
        .filter_map(|id| parse_id_suffix(id).map(|suffix| (suffix, id)))
        .max_by_key(|(suffix, _)| *suffix);
    match highest {
        None => Ok(format_id(0)),
        Some((suffix, id)) => suffix
            .checked_add(1)
            .map(format_id)
            .ok_or_else(|| RegistryError::broken(id, "no project id left after this one")),
    }
}

fn active_suffixes(registry: &Registry) -> impl Iterator<Item = (u32, &str)> {
    registry
        .projects
        .values()
        .filter(|record| record.is_active())
        .filter_map(|record| parse_id_suffix(&record.id).map(|s| (s, record.id.as_str())))
}

pub fn highest_active_id(registry: &Registry) -> RegistryResult<String> {
    active_suffixes(registry)
        .max_by_key(|(suffix, _)| *suffix)
        .map(|(_, id)| id.to_string())
        .ok_or(RegistryError::EmptyRegistry)
}

pub fn lowest_active_id(registry: &Registry) -> RegistryResult<String> {
    active_suffixes(registry)
        .min_by_key(|(suffix, _)| *suffix)
        .map(|(_, id)| id.to_string())
        .ok_or(RegistryError::EmptyRegistry)
}

fn record_mut<'a>(registry: &'a mut Registry, id: &str) -> RegistryResult<&'a mut ProjectRecord> {
    registry
        .projects
        .get_mut(id)
        .ok_or_else(|| RegistryError::broken(id, "record is missing from the registry"))
}

fn record<'a>(registry: &'a Registry, id: &str) -> RegistryResult<&'a ProjectRecord> {
    registry
        .get(id)
        .ok_or_else(|| RegistryError::broken(id, "record is missing from the registry"))
}

/// Insert `new_id` between `after` and whatever `after` currently points to.
/// Splicing a record after itself turns it into a ring of one.
pub fn splice_in(registry: &mut Registry, new_id: &str, after: &str) -> RegistryResult<()> {
    if new_id == after {
        let record = record_mut(registry, new_id)?;
        record.prev_id = new_id.to_string();
        record.next_id = new_id.to_string();
        return Ok(());
    }

    let old_next = record(registry, after)?.next_id.clone();
    record(registry, &old_next)?;
    {
        let record = record_mut(registry, new_id)?;
        record.prev_id = after.to_string();
        record.next_id = old_next.clone();
    }
    record_mut(registry, after)?.next_id = new_id.to_string();
    record_mut(registry, &old_next)?.prev_id = new_id.to_string();
    tracing::debug!(id = new_id, prev = after, next = %old_next, "spliced in");
    Ok(())
}

/// Link the record's neighbors to each other. The record keeps its own links.
pub fn splice_out(registry: &mut Registry, id: &str) -> RegistryResult<()> {
    let (prev, next) = {
        let record = record(registry, id)?;
        (record.prev_id.clone(), record.next_id.clone())
    };
    if prev == id && next == id {
        return Ok(());
    }
    record(registry, &prev)?;
    record(registry, &next)?;
    record_mut(registry, &prev)?.next_id = next.clone();
    record_mut(registry, &next)?.prev_id = prev.clone();
    tracing::debug!(id, %prev, %next, "spliced out");
    Ok(())
}

/// Follow `direction` links from `from` until an active record is reached.
///
/// `None` means the links only cycle through archived records, which happens
/// once the ring emptied while those records were archived. Stepping onto an
/// id that is not in the registry means the chain is broken.
pub fn find_active(
    registry: &Registry,
    from: &str,
    direction: Direction,
) -> RegistryResult<Option<String>> {
    let start = record(registry, from)?;
    let mut cursor = direction.link(start).to_string();
    for _ in 0..registry.projects.len() {
        let current = registry.get(&cursor).ok_or_else(|| {
            RegistryError::broken(
                from,
                format!("{} link reaches missing record `{cursor}`", direction.as_str()),
            )
        })?;
        if current.is_active() {
            return Ok(Some(cursor));
        }
        cursor = direction.link(current).to_string();
    }
    Ok(None)
}

/// Like [`find_active`], but an unreachable active record is an error.
pub fn walk_active(registry: &Registry, from: &str, direction: Direction) -> RegistryResult<String> {
    find_active(registry, from, direction)?.ok_or_else(|| {
        RegistryError::broken(
            from,
            format!("no active record reachable through {} links", direction.as_str()),
        )
    })
}

pub fn next_active(registry: &Registry, id: &str) -> RegistryResult<String> {
    walk_active(registry, id, Direction::Next)
}

pub fn prev_active(registry: &Registry, id: &str) -> RegistryResult<String> {
    walk_active(registry, id, Direction::Prev)
}

/// Active ids in ring order starting at `start`, which must be active.
pub fn active_ring(registry: &Registry, start: &str) -> RegistryResult<Vec<String>> {
    if !record(registry, start)?.is_active() {
        return Err(RegistryError::broken(start, "ring walk must start at an active record"));
    }
    let bound = registry.active_count();
    let mut ring = vec![start.to_string()];
    let mut cursor = next_active(registry, start)?;
    while cursor != start {
        if ring.len() >= bound || ring.contains(&cursor) {
            return Err(RegistryError::broken(
                start,
                format!("ring does not close, revisits or overruns at `{cursor}`"),
            ));
        }
        ring.push(cursor.clone());
        cursor = next_active(registry, &cursor)?;
    }
    Ok(ring)
}

/// Ring violations, one line each. Empty means the active ring is sound.
pub fn verify(registry: &Registry) -> Vec<String> {
    let mut issues = Vec::new();
    for record in registry.projects.values().filter(|r| r.is_active()) {
        match next_active(registry, &record.id) {
            Ok(next) => match prev_active(registry, &next) {
                Ok(back) if back == record.id => {}
                Ok(back) => issues.push(format!(
                    "{} -> {next} but {next} points back to {back}",
                    record.id
                )),
                Err(err) => issues.push(err.to_string()),
            },
            Err(err) => issues.push(err.to_string()),
        }
    }

    let Ok(head) = lowest_active_id(registry) else {
        return issues;
    };
    match active_ring(registry, &head) {
        Ok(ring) if ring.len() == registry.active_count() => {}
        Ok(ring) => issues.push(format!(
            "ring from {head} visits {} of {} active projects",
            ring.len(),
            registry.active_count()
        )),
        Err(err) => issues.push(err.to_string()),
    }
    issues
}

/// Re-point archived records that still reference `id` past it, so the
/// record can be deleted without leaving dangling stale links.
pub fn detach(registry: &mut Registry, id: &str) -> RegistryResult<()> {
    let (prev, next) = {
        let record = record(registry, id)?;
        (record.prev_id.clone(), record.next_id.clone())
    };
    for other in registry.projects.values_mut() {
        if other.id == id || other.is_active() {
            continue;
        }
        if other.next_id == id {
            other.next_id = if next == id { other.id.clone() } else { next.clone() };
        }
        if other.prev_id == id {
            other.prev_id = if prev == id { other.id.clone() } else { prev.clone() };
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::folio::model::ProjectStatus;

    /// Registry whose records are linked in the given order.
    pub(crate) fn ring(ids_and_names: &[(&str, &str)]) -> Registry {
        let mut registry = Registry::default();
        let n = ids_and_names.len();
        for (i, (id, name)) in ids_and_names.iter().enumerate() {
            let mut record = ProjectRecord::new(id, name, "desc");
            record.prev_id = ids_and_names[(i + n - 1) % n].0.to_string();
            record.next_id = ids_and_names[(i + 1) % n].0.to_string();
            registry.projects.insert(id.to_string(), record);
        }
        registry
    }

    fn archive(registry: &mut Registry, id: &str) {
        registry.projects.get_mut(id).expect("record").status = ProjectStatus::Archived;
    }

    fn links(registry: &Registry, id: &str) -> (String, String) {
        let record = registry.get(id).expect("record");
        (record.prev_id.clone(), record.next_id.clone())
    }

    #[test]
    fn next_id_counts_archived_and_removed_ids() {
        let mut registry = ring(&[("p_000", "a"), ("p_001", "b")]);
        assert_eq!(next_id(&registry).expect("id"), "p_002");
        archive(&mut registry, "p_001");
        assert_eq!(next_id(&registry).expect("id"), "p_002");
        registry.projects.remove("p_001");
        registry.last_id = Some("p_001".into());
        assert_eq!(next_id(&registry).expect("id"), "p_002");
        assert_eq!(next_id(&Registry::default()).expect("id"), "p_000");
    }

    #[test]
    fn next_id_after_the_largest_suffix_is_an_error() {
        let mut registry = ring(&[("p_000", "a")]);
        registry.last_id = Some(format!("p_{}", u32::MAX));
        assert!(matches!(
            next_id(&registry),
            Err(RegistryError::BrokenChain { .. })
        ));
    }

    #[test]
    fn highest_and_lowest_skip_archived() {
        let mut registry = ring(&[("p_000", "a"), ("p_001", "b"), ("p_002", "c")]);
        archive(&mut registry, "p_000");
        archive(&mut registry, "p_002");
        assert_eq!(highest_active_id(&registry).expect("highest"), "p_001");
        assert_eq!(lowest_active_id(&registry).expect("lowest"), "p_001");
        archive(&mut registry, "p_001");
        assert!(matches!(
            highest_active_id(&registry),
            Err(RegistryError::EmptyRegistry)
        ));
        assert!(matches!(
            lowest_active_id(&registry),
            Err(RegistryError::EmptyRegistry)
        ));
    }

    #[test]
    fn splice_in_after_head_of_two_ring() {
        let mut registry = ring(&[("p_000", "a"), ("p_001", "b")]);
        let record = ProjectRecord::new("p_002", "c", "desc");
        registry.projects.insert(record.id.clone(), record);

        splice_in(&mut registry, "p_002", "p_000").expect("splice");

        assert_eq!(links(&registry, "p_000").1, "p_002");
        assert_eq!(links(&registry, "p_002"), ("p_000".into(), "p_001".into()));
        assert_eq!(links(&registry, "p_001").0, "p_002");
        assert!(verify(&registry).is_empty());
    }

    #[test]
    fn splice_in_after_itself_makes_ring_of_one() {
        let mut registry = Registry::default();
        let mut record = ProjectRecord::new("p_000", "a", "desc");
        record.next_id = "p_404".into();
        registry.projects.insert(record.id.clone(), record);
        splice_in(&mut registry, "p_000", "p_000").expect("splice");
        assert_eq!(links(&registry, "p_000"), ("p_000".into(), "p_000".into()));
        assert_eq!(active_ring(&registry, "p_000").expect("ring"), vec!["p_000"]);
    }

    #[test]
    fn splice_out_relinks_neighbors_and_keeps_stale_links() {
        let mut registry = ring(&[("p_000", "a"), ("p_001", "b"), ("p_002", "c")]);
        splice_out(&mut registry, "p_001").expect("splice out");
        archive(&mut registry, "p_001");

        assert_eq!(links(&registry, "p_000").1, "p_002");
        assert_eq!(links(&registry, "p_002").0, "p_000");
        assert_eq!(links(&registry, "p_001"), ("p_000".into(), "p_002".into()));
        assert!(verify(&registry).is_empty());
    }

    #[test]
    fn walk_skips_archived_neighbors_both_ways() {
        let mut registry = ring(&[
            ("p_000", "a"),
            ("p_001", "b"),
            ("p_002", "c"),
            ("p_003", "d"),
        ]);
        archive(&mut registry, "p_001");
        archive(&mut registry, "p_002");
        assert_eq!(next_active(&registry, "p_001").expect("next"), "p_003");
        assert_eq!(prev_active(&registry, "p_002").expect("prev"), "p_000");
    }

    #[test]
    fn walk_through_missing_record_is_broken_chain() {
        let mut registry = ring(&[("p_000", "a"), ("p_001", "b")]);
        archive(&mut registry, "p_001");
        registry.projects.get_mut("p_001").expect("b").next_id = "p_077".into();
        let err = next_active(&registry, "p_001").expect_err("dangling");
        assert!(matches!(err, RegistryError::BrokenChain { .. }));
    }

    #[test]
    fn walk_without_active_records_is_broken_chain() {
        let mut registry = ring(&[("p_000", "a"), ("p_001", "b")]);
        archive(&mut registry, "p_000");
        archive(&mut registry, "p_001");
        let err = prev_active(&registry, "p_000").expect_err("no active");
        assert!(matches!(err, RegistryError::BrokenChain { .. }));
        assert_eq!(find_active(&registry, "p_000", Direction::Prev).expect("walk"), None);
    }

    #[test]
    fn archived_cycle_misses_active_records_outside_it() {
        let mut registry = ring(&[("p_000", "a"), ("p_001", "b")]);
        archive(&mut registry, "p_000");
        archive(&mut registry, "p_001");
        let fresh = ProjectRecord::new("p_002", "c", "desc");
        registry.projects.insert(fresh.id.clone(), fresh);

        assert_eq!(find_active(&registry, "p_000", Direction::Prev).expect("walk"), None);
        assert_eq!(find_active(&registry, "p_000", Direction::Next).expect("walk"), None);
    }

    #[test]
    fn ring_closes_from_any_active_start() {
        let mut registry = ring(&[
            ("p_000", "a"),
            ("p_003", "d"),
            ("p_002", "c"),
            ("p_001", "b"),
        ]);
        splice_out(&mut registry, "p_002").expect("splice out");
        archive(&mut registry, "p_002");
        for start in ["p_000", "p_003", "p_001"] {
            let walked = active_ring(&registry, start).expect("ring");
            assert_eq!(walked.len(), 3);
            assert_eq!(walked[0], start);
        }
        assert_eq!(
            active_ring(&registry, "p_000").expect("ring"),
            vec!["p_000", "p_003", "p_001"]
        );
    }

    #[test]
    fn verify_reports_asymmetric_and_split_rings() {
        let mut registry = ring(&[("p_000", "a"), ("p_001", "b"), ("p_002", "c")]);
        registry.projects.get_mut("p_000").expect("a").next_id = "p_000".into();
        let issues = verify(&registry);
        assert!(!issues.is_empty());
        assert!(issues.iter().any(|line| line.contains("p_000")));
    }

    #[test]
    fn detach_repoints_archived_references() {
        let mut registry = ring(&[("p_000", "a"), ("p_001", "b"), ("p_002", "c")]);
        splice_out(&mut registry, "p_001").expect("out b");
        archive(&mut registry, "p_001");
        splice_out(&mut registry, "p_002").expect("out c");
        archive(&mut registry, "p_002");

        detach(&mut registry, "p_002").expect("detach");
        registry.projects.remove("p_002");

        assert_eq!(links(&registry, "p_001"), ("p_000".into(), "p_000".into()));
        assert_eq!(next_active(&registry, "p_001").expect("next"), "p_000");
    }
}
