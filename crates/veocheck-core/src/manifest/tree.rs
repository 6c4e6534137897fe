//! Rebuilding the object hierarchy from declared depths.
//!
//! The manifest lists information objects in one flat sequence. Either every
//! depth is zero (a flat list) or the depths form a depth-first pre-order
//! serialization of a forest rooted at depth 1. The frontier holds, for
//! each depth, the most recent object seen at that depth; a new object's
//! parent is the frontier entry one level up.

use tracing::debug;

use super::object::InformationObject;
use crate::IssueId;

const BAD_FIRST_DEPTH: IssueId = IssueId::new("InformationObject", "reconstruct", 1);
const EXPECTED_FLAT: IssueId = IssueId::new("InformationObject", "reconstruct", 2);
const EXPECTED_TREE: IssueId = IssueId::new("InformationObject", "reconstruct", 3);
const DEPTH_JUMP: IssueId = IssueId::new("InformationObject", "reconstruct", 4);

/// Shape the manifest committed to with its first object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeMode {
    /// Every object at depth 0.
    Flat,
    /// Pre-order tree with roots at depth 1.
    Tree,
}

/// Links `objects` into a forest, recording at most one error per object.
///
/// Objects whose depth did not parse are skipped. Violations never stop
/// the walk: each object is linked to whatever parent the frontier offers,
/// so later checks always see a best-effort tree. Returns the mode chosen by
/// the first object with a depth, or `None` if there was none.
pub fn reconstruct(objects: &mut [InformationObject]) -> Option<TreeMode> {
    let mut mode = None;
    let mut frontier: Vec<Option<usize>> = Vec::new();

    for index in 0..objects.len() {
        let Some(depth) = objects[index].depth else {
            continue;
        };
        let mut problem: Option<(IssueId, String)> = None;

        match mode {
            None if depth == 0 => mode = Some(TreeMode::Flat),
            None => {
                mode = Some(TreeMode::Tree);
                if depth != 1 {
                    problem = Some((
                        BAD_FIRST_DEPTH,
                        format!("first information object has depth {depth}, expected 0 or 1"),
                    ));
                }
            }
            Some(TreeMode::Flat) if depth != 0 => {
                problem = Some((
                    EXPECTED_FLAT,
                    format!("depth {depth} in a flat list of information objects, expected 0"),
                ));
            }
            Some(TreeMode::Tree) if depth == 0 => {
                problem = Some((
                    EXPECTED_TREE,
                    "depth 0 in a tree of information objects, expected 1 or more".to_string(),
                ));
            }
            Some(_) => {}
        }

        if depth > 1 {
            match frontier.get(depth - 2).copied().flatten() {
                Some(parent) => {
                    objects[parent].children.push(index);
                    objects[index].parent = Some(parent);
                }
                None => {
                    problem.get_or_insert_with(|| {
                        (
                            DEPTH_JUMP,
                            format!("depth {depth} jumps more than one level below the previous object"),
                        )
                    });
                }
            }
        }

        if depth > 0 {
            let slot = depth - 1;
            if slot < frontier.len() {
                frontier[slot] = Some(index);
                // Deeper entries belong to a finished subtree.
                frontier.truncate(slot + 1);
            } else if slot == frontier.len() {
                frontier.push(Some(index));
            } else {
                // Already reported as a jump above; keep the slot reachable.
                frontier.resize(slot, None);
                frontier.push(Some(index));
            }
        }

        if let Some((id, message)) = problem {
            debug!(seq = objects[index].seq, %message, "depth violation");
            objects[index].ledger.error(id, message);
        }
    }
    mode
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Validated;

    fn build(depths: &[usize]) -> (Vec<InformationObject>, Option<TreeMode>) {
        let mut objects: Vec<InformationObject> = depths
            .iter()
            .enumerate()
            .map(|(i, d)| InformationObject::with_depth(i + 1, *d))
            .collect();
        let mode = reconstruct(&mut objects);
        (objects, mode)
    }

    fn error_codes(objects: &[InformationObject]) -> Vec<Option<u32>> {
        objects
            .iter()
            .map(|o| o.ledger().errors().first().map(|e| e.id.code))
            .collect()
    }

    #[test]
    fn test_flat_list() {
        let (objects, mode) = build(&[0, 0, 0]);
        assert_eq!(mode, Some(TreeMode::Flat));
        assert!(objects.iter().all(|o| !o.has_errors()));
        assert!(objects.iter().all(|o| o.parent.is_none()));
    }

    #[test]
    fn test_depth_in_flat_list_is_error() {
        let (objects, mode) = build(&[0, 1, 0]);
        assert_eq!(mode, Some(TreeMode::Flat));
        assert_eq!(error_codes(&objects), [None, Some(2), None]);
    }

    #[test]
    fn test_chain_links_parents() {
        let (objects, mode) = build(&[1, 2, 3]);
        assert_eq!(mode, Some(TreeMode::Tree));
        assert!(objects.iter().all(|o| !o.has_errors()));
        assert_eq!(objects[2].parent, Some(1));
        assert_eq!(objects[1].parent, Some(0));
        assert_eq!(objects[0].parent, None);
        assert_eq!(objects[0].children, [1]);
        assert_eq!(objects[1].children, [2]);
    }

    #[test]
    fn test_jump_is_error() {
        let (objects, _) = build(&[1, 3]);
        assert_eq!(error_codes(&objects), [None, Some(4)]);
        assert_eq!(objects[1].parent, None);
    }

    #[test]
    fn test_first_depth_two_is_error() {
        let (objects, mode) = build(&[2]);
        assert_eq!(mode, Some(TreeMode::Tree));
        assert_eq!(objects[0].ledger().errors().len(), 1);
        assert_eq!(error_codes(&objects), [Some(1)]);
    }

    #[test]
    fn test_zero_in_tree_is_error() {
        let (objects, _) = build(&[1, 2, 0, 1]);
        assert_eq!(error_codes(&objects), [None, None, Some(3), None]);
    }

    #[test]
    fn test_siblings_and_stale_frontier() {
        let (objects, _) = build(&[1, 2, 2, 1, 2]);
        assert!(objects.iter().all(|o| !o.has_errors()));
        assert_eq!(objects[0].children, [1, 2]);
        assert_eq!(objects[3].children, [4]);

        // 3 under the second 2 would need a fresh depth-3 parent.
        let (objects, _) = build(&[1, 2, 3, 2, 4]);
        assert_eq!(error_codes(&objects), [None, None, None, None, Some(4)]);
    }

    #[test]
    fn test_unparsed_depth_skipped() {
        let mut objects = vec![
            InformationObject::with_depth(1, 1),
            InformationObject::new(2),
            InformationObject::with_depth(3, 2),
        ];
        assert_eq!(reconstruct(&mut objects), Some(TreeMode::Tree));
        assert_eq!(objects[2].parent, Some(0));
        assert!(objects[1].parent.is_none());
    }

    #[test]
    fn test_empty() {
        assert_eq!(reconstruct(&mut []), None);
    }
}
