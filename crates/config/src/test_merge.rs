#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use serde_json::{Value, json};

    use crate::{DesktopOptions, DesktopPosition, deep_merge, merge_into, merge_values};

    #[test]
    fn nested_objects_merge() {
        let base = json!({"a": 1, "b": {"c": 1, "d": 2}});
        let patch = json!({"b": {"c": 2}});
        assert_eq!(merge_values(&base, &patch), json!({"a": 1, "b": {"c": 2, "d": 2}}));
    }

    #[test]
    fn null_deletes_key() {
        assert_eq!(merge_values(&json!({"a": 1}), &json!({"a": null})), json!({}));
        // Deleting a key the base never had is a no-op.
        assert_eq!(
            merge_values(&json!({"a": 1}), &json!({"z": null})),
            json!({"a": 1})
        );
    }

    #[test]
    fn arrays_replace_wholesale() {
        assert_eq!(
            merge_values(&json!({"a": [1, 2, 3]}), &json!({"a": [9]})),
            json!({"a": [9]})
        );
        assert_eq!(
            merge_values(&json!({"a": [{"x": 1, "y": 2}]}), &json!({"a": [{"x": 5}]})),
            json!({"a": [{"x": 5}]})
        );
    }

    #[test]
    fn absent_patch_returns_base_reference() {
        let base = json!({"a": {"b": 1}});
        let out = deep_merge(&base, None);
        assert!(matches!(out, Cow::Borrowed(r) if std::ptr::eq(r, &base)));
    }

    #[test]
    fn array_and_primitive_patches_are_borrowed() {
        let base = json!({"a": 1});
        let patch = json!([1]);
        assert!(matches!(deep_merge(&base, Some(&patch)), Cow::Borrowed(r) if std::ptr::eq(r, &patch)));
        let patch = json!("text");
        assert!(matches!(deep_merge(&base, Some(&patch)), Cow::Borrowed(r) if std::ptr::eq(r, &patch)));
    }

    #[test]
    fn empty_patch_is_identity() {
        let base = json!({"a": 1, "b": {"c": [1, 2]}, "d": null});
        assert_eq!(merge_values(&base, &json!({})), base);
    }

    #[test]
    fn keys_only_in_base_survive() {
        let base = json!({"keep": {"deep": true}, "change": 1});
        assert_eq!(
            merge_values(&base, &json!({"change": 2, "new": "x"})),
            json!({"keep": {"deep": true}, "change": 2, "new": "x"})
        );
    }

    #[test]
    fn type_mismatches_let_patch_win() {
        assert_eq!(merge_values(&json!({"a": {"b": 1}}), &json!({"a": 5})), json!({"a": 5}));
        assert_eq!(merge_values(&json!({"a": 5}), &json!({"a": {"b": 1}})), json!({"a": {"b": 1}}));
        assert_eq!(merge_values(&json!([1]), &json!({"b": 1})), json!({"b": 1}));
        assert_eq!(merge_values(&json!(null), &json!({"b": 1})), json!({"b": 1}));
    }

    #[test]
    fn top_level_null_patch_wins() {
        assert_eq!(merge_values(&json!({"a": 1}), &Value::Null), Value::Null);
    }

    #[test]
    fn inputs_are_not_mutated() {
        let base = json!({"a": {"b": 1}, "c": 2});
        let patch = json!({"a": {"b": null}, "c": null});
        let base_before = base.clone();
        let patch_before = patch.clone();
        assert_eq!(merge_values(&base, &patch), json!({"a": {}}));
        assert_eq!(base, base_before);
        assert_eq!(patch, patch_before);
    }

    #[test]
    fn total_over_mixed_inputs() {
        let samples = [
            json!(null),
            json!(true),
            json!(3),
            json!("s"),
            json!([1, {"a": 1}]),
            json!({"a": null, "b": [1], "c": {"d": 1}}),
        ];
        for base in &samples {
            assert_eq!(deep_merge(base, None).as_ref(), base);
            for patch in &samples {
                let _ = merge_values(base, patch);
            }
        }
    }

    #[test]
    fn typed_merge_overlays_fields() {
        let base = DesktopOptions::default();
        let merged: DesktopOptions =
            merge_into(&base, &json!({"position": "left", "min_width": 1024})).unwrap();
        assert_eq!(merged.position, DesktopPosition::Left);
        assert_eq!(merged.min_width, 1024);
        assert_eq!(merged.show_labels, base.show_labels);
    }
}
