//! Property-based tests for the extraction sandbox and the object tree.

#![allow(clippy::unwrap_used)]

use std::path::Path;

use proptest::prelude::*;
use tempfile::TempDir;
use veocheck_core::ValidationConfig;
use veocheck_core::extract_archive;
use veocheck_core::manifest::InformationObject;
use veocheck_core::manifest::tree::reconstruct;
use veocheck_core::test_utils::create_test_zip;
use veocheck_core::types::SafePath;
use walkdir::WalkDir;

fn files_under(root: &Path) -> usize {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .count()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Any entry with a `..` segment fails the whole extraction and leaves
    /// nothing but the archive behind.
    #[test]
    fn prop_traversal_entries_rejected(
        prefix in "([a-z]{1,8}/){0,3}",
        ups in 1usize..6,
        leaf in "[a-z]{1,8}",
        backslashes in any::<bool>(),
    ) {
        let temp = TempDir::new().unwrap();
        let mut name = format!("R-1.veo/{prefix}{}{leaf}.txt", "../".repeat(ups));
        if backslashes {
            name = name.replace('/', "\\");
        }
        let data = create_test_zip(vec![("R-1.veo/first.txt", b"ok".as_slice()), (name.as_str(), b"evil".as_slice())]);
        let archive = temp.path().join("R-1.veo.zip");
        std::fs::write(&archive, data).unwrap();

        let result = extract_archive(&archive, temp.path().join("out"), &ValidationConfig::default());

        prop_assert!(result.is_err());
        prop_assert_eq!(files_under(temp.path()), 1);
    }

    /// Names without special segments always land strictly inside the root.
    #[test]
    fn prop_plain_names_rerooted(
        segments in prop::collection::vec("[A-Za-z0-9_-]{1,12}", 2..6)
    ) {
        let name = format!("R-1.veo/{}", segments[1..].join("/"));
        let (safe, renamed) = SafePath::reroot(&name, "R-1.veo", 32).unwrap();
        prop_assert!(!renamed);
        prop_assert_eq!(safe.as_path().components().count(), segments.len() - 1);
    }

    /// Valid pre-order depth sequences never record an error and every
    /// object below depth 1 gets a parent one level up.
    #[test]
    fn prop_valid_preorder_links_every_object(
        steps in prop::collection::vec(0usize..4, 0..20)
    ) {
        // Build depths where each is at most one deeper than the last.
        let mut depths = vec![1usize];
        for step in steps {
            let last = *depths.last().unwrap();
            let next = if step == 0 { last + 1 } else { last.saturating_sub(step - 1).max(1) };
            depths.push(next);
        }
        let mut objects: Vec<InformationObject> = depths
            .iter()
            .enumerate()
            .map(|(i, d)| InformationObject::with_depth(i + 1, *d))
            .collect();

        reconstruct(&mut objects);

        for object in &objects {
            prop_assert!(!veocheck_core::Validated::has_errors(object));
            let depth = object.depth.unwrap();
            match object.parent {
                Some(parent) => prop_assert_eq!(objects[parent].depth, Some(depth - 1)),
                None => prop_assert_eq!(depth, 1),
            }
        }
    }
}
