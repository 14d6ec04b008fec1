//! Property-based tests for JKC format primitives

use jkc_format::{KeyPattern, KeyTable, PrefixStyle, TreePath};
use proptest::prelude::*;
use std::collections::HashSet;

fn presets() -> Vec<KeyPattern> {
    vec![
        KeyPattern::Alpha,
        KeyPattern::Numeric,
        KeyPattern::Alphanumeric,
        KeyPattern::Short,
        KeyPattern::Prefixed {
            prefix: "k".to_string(),
            style: PrefixStyle::Numeric,
        },
        KeyPattern::Prefixed {
            prefix: "k".to_string(),
            style: PrefixStyle::Alpha,
        },
    ]
}

proptest! {
    #[test]
    fn presets_are_injective(start in 0usize..100_000, len in 1usize..500) {
        for pattern in presets() {
            let mut seen = HashSet::new();
            for index in start..start + len {
                prop_assert!(seen.insert(pattern.generate(index)), "{:?} repeated at {}", pattern, index);
            }
        }
    }

    #[test]
    fn presets_are_deterministic(index in 0usize..1_000_000) {
        for pattern in presets() {
            prop_assert_eq!(pattern.generate(index), pattern.generate(index));
        }
    }

    #[test]
    fn alpha_uses_lowercase_letters_only(index in 0usize..1_000_000) {
        let alias = KeyPattern::Alpha.generate(index);
        prop_assert!(!alias.is_empty());
        prop_assert!(alias.bytes().all(|b| b.is_ascii_lowercase()));
    }

    #[test]
    fn table_wire_form_round_trips(names in prop::collection::btree_set("[a-zA-Z]{3,12}", 0..40)) {
        let mut table = KeyTable::new();
        for (idx, name) in names.iter().enumerate() {
            table.insert(name.clone(), KeyPattern::Alpha.generate(idx));
        }
        let parsed = KeyTable::from_json(&table.to_json()).unwrap();
        prop_assert_eq!(parsed, table);
    }

    #[test]
    fn tree_path_display_parses_back(
        keys in prop::collection::vec("[a-zA-Z_][a-zA-Z0-9_]{0,8}", 1..6),
        indices in prop::collection::vec(prop::option::of(0usize..50), 1..6)
    ) {
        let mut path = TreePath::root();
        for (key, index) in keys.iter().zip(indices.iter()) {
            path = path.child_key(key.clone());
            if let Some(i) = index {
                path = path.child_index(*i);
            }
        }
        let parsed: TreePath = path.to_string().parse().unwrap();
        prop_assert_eq!(parsed, path);
    }
}

proptest! {
    #[test]
    fn tree_path_with_special_keys_parses_back(
        keys in prop::collection::vec(r#"[a-z._\[\]"\\ ]{0,8}"#, 1..6),
        indices in prop::collection::vec(prop::option::of(0usize..50), 1..6)
    ) {
        let mut path = TreePath::root();
        for (key, index) in keys.iter().zip(indices.iter()) {
            path = path.child_key(key.clone());
            if let Some(i) = index {
                path = path.child_index(*i);
            }
        }
        let text = path.to_string();
        let parsed: TreePath = text.parse().unwrap();
        prop_assert_eq!(parsed, path, "display form {}", text);
    }
}
