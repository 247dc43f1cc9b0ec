//! Property-based tests for path canonicalization.
//!
//! Traversal attempts are generated from a small alphabet of segments so that
//! `..`, `.`, empty segments and both separators show up often.

#[cfg(test)]
mod proptest_tests {
    use crate::path::{canonicalize, PathEscape};
    use proptest::prelude::*;
    use std::path::Path;

    fn segment() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("..".to_string()),
            Just(".".to_string()),
            Just(String::new()),
            "[a-z]{1,6}",
            "\\.[a-z]{1,4}",
        ]
    }

    fn raw_path() -> impl Strategy<Value = String> {
        (
            prop::collection::vec(segment(), 0..12),
            prop::collection::vec(prop_oneof![Just('/'), Just('\\')], 12),
        )
            .prop_map(|(segments, seps)| {
                let mut out = String::new();
                for (i, segment) in segments.iter().enumerate() {
                    if i > 0 {
                        out.push(seps[i]);
                    }
                    out.push_str(segment);
                }
                out
            })
    }

    /// Depth reached while walking the raw segments; negative means escape.
    fn min_depth(raw: &str) -> i64 {
        let mut depth = 0i64;
        let mut min = 0i64;
        for segment in raw.split(['/', '\\']) {
            match segment {
                "" | "." => {}
                ".." => depth -= 1,
                _ => depth += 1,
            }
            min = min.min(depth);
        }
        min
    }

    proptest! {
        /// Property: a successful result joined onto a root stays under that root.
        #[test]
        fn canonical_path_never_leaves_root(raw in raw_path()) {
            if let Ok(path) = canonicalize(&raw) {
                let root = Path::new("/srv/repos/host/owner/name");
                let joined = path.to_path_under(root);
                prop_assert!(joined.starts_with(root));
                for segment in path.segments() {
                    prop_assert!(segment != ".." && segment != "." && !segment.is_empty());
                    prop_assert!(!segment.contains('/') && !segment.contains('\\'));
                }
            }
        }

        /// Property: canonicalization fails exactly when some prefix climbs above the root.
        #[test]
        fn escape_is_rejected_not_clamped(raw in raw_path()) {
            let result = canonicalize(&raw);
            if min_depth(&raw) < 0 {
                prop_assert!(matches!(result, Err(PathEscape::AboveRoot(_))));
            } else {
                prop_assert!(result.is_ok());
            }
        }

        /// Property: leading `../` segments beyond the path's depth always fail.
        #[test]
        fn extra_parent_segments_fail(
            names in prop::collection::vec("[a-z]{1,6}", 0..6),
            extra in 1usize..4,
        ) {
            let mut raw = names.join("/");
            for _ in 0..names.len() + extra {
                raw.push_str("/..");
            }
            prop_assert!(canonicalize(&raw).is_err());
        }

        /// Property: canonicalizing the canonical form is a fixed point.
        #[test]
        fn canonicalize_is_idempotent(raw in raw_path()) {
            if let Ok(path) = canonicalize(&raw) {
                let again = canonicalize(&path.as_url_path()).unwrap();
                prop_assert_eq!(again, path);
            }
        }
    }
}
