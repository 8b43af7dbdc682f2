use deckscan_exp::{expand_flat_key, expand_flat_sample, Sample};
use serde_json::json;

#[test]
fn flat_keys_expand_into_nested_blocks() {
    let sample: Sample = [
        ("a:b:c", json!(1)),
        ("a:b:d", json!(2)),
        ("a:e:f", json!(3)),
        ("a:e:g", json!(4)),
        ("h:i", json!(5)),
        ("h:j", json!(6)),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value))
    .collect();

    let expected = json!({
        "a": {
            "b": {"c": 1, "d": 2},
            "e": {"f": 3, "g": 4},
        },
        "h": {"i": 5, "j": 6},
    });

    assert_eq!(expand_flat_sample(&sample).expect("expand"), expected);
}

#[test]
fn single_key_nests_one_level_per_segment() {
    let expanded = expand_flat_key("constant:laser:lambda", json!(1.0e-6)).expect("expand");
    assert_eq!(expanded, json!({"constant": {"laser": {"lambda": 1.0e-6}}}));
}

#[test]
fn empty_sample_expands_to_empty_mapping() {
    assert_eq!(expand_flat_sample(&Sample::new()).expect("expand"), json!({}));
}

#[test]
fn malformed_key_reports_the_full_key() {
    let sample: Sample = [("block::var".to_string(), json!(1))].into_iter().collect();
    let err = expand_flat_sample(&sample).expect_err("empty segment");
    assert_eq!(err.info().code, "flat-key-empty-segment");
    assert_eq!(err.info().context["flat_key"], "block::var");
}

#[test]
fn prefix_keys_are_rejected_instead_of_overwritten() {
    let mut sample = Sample::new();
    sample.insert("a:b".to_string(), json!(1));
    sample.insert("a".to_string(), json!(2));
    let err = expand_flat_sample(&sample).expect_err("prefix clash");
    assert_eq!(err.info().code, "flat-key-prefix-clash");
    assert_eq!(err.info().context["flat_key"], "a");
    assert_eq!(err.info().context["nested_key"], "a:b");
}
