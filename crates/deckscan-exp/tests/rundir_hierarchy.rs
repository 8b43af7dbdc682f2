use std::collections::BTreeSet;
use std::path::Path;

use deckscan_exp::{ensure_run_dir, run_dir_path, run_dir_segments, run_index_from_signed};
use proptest::prelude::*;

#[test]
fn run_1234_lands_in_nested_buckets() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let path = ensure_run_dir(temp.path(), 1234).expect("create run dir");
    let expected = temp
        .path()
        .join("run_0_1000000/run_0_10000/run_1200_1300/run_1234");
    assert_eq!(path, expected);
    assert!(expected.is_dir());
}

#[test]
fn creating_twice_is_idempotent() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let first = ensure_run_dir(temp.path(), 42).expect("first");
    let second = ensure_run_dir(temp.path(), 42).expect("second");
    assert_eq!(first, second);
    let siblings = std::fs::read_dir(first.parent().expect("parent"))
        .expect("read bucket")
        .count();
    assert_eq!(siblings, 1);
}

#[test]
fn bucket_boundaries_change_only_the_affected_level() {
    assert_eq!(
        run_dir_segments(99),
        ["run_0_1000000", "run_0_10000", "run_0_100", "run_99"]
    );
    assert_eq!(
        run_dir_segments(100),
        ["run_0_1000000", "run_0_10000", "run_100_200", "run_100"]
    );
    assert_eq!(
        run_dir_segments(1_000_000),
        [
            "run_1000000_2000000",
            "run_1000000_1010000",
            "run_1000000_1000100",
            "run_1000000"
        ]
    );
}

#[test]
fn largest_index_does_not_overflow() {
    let segments = run_dir_segments(u64::MAX);
    assert_eq!(segments[0], "run_18446744073709000000_18446744073710000000");
    assert_eq!(segments[3], format!("run_{}", u64::MAX));
}

#[test]
fn negative_indices_are_rejected() {
    let err = run_index_from_signed(-1).expect_err("negative index");
    assert_eq!(err.info().code, "run-index-negative");
    assert_eq!(run_index_from_signed(7).expect("positive"), 7);
}

#[test]
fn consecutive_indices_share_a_bucket_with_bounded_fan_out() {
    let root = Path::new("root");
    let parents: BTreeSet<_> = (0..100)
        .map(|index| run_dir_path(root, index).parent().map(Path::to_path_buf))
        .collect();
    assert_eq!(parents.len(), 1);
}

proptest! {
    #[test]
    fn addresses_are_injective(a in any::<u64>(), b in any::<u64>()) {
        prop_assume!(a != b);
        let root = Path::new("root");
        prop_assert_ne!(run_dir_path(root, a), run_dir_path(root, b));
    }

    #[test]
    fn leaf_and_buckets_contain_the_index(index in any::<u64>()) {
        let segments = run_dir_segments(index);
        prop_assert_eq!(&segments[3], &format!("run_{index}"));
        for (segment, width) in segments[..3].iter().zip([1_000_000u128, 10_000, 100]) {
            let bounds: Vec<u128> = segment
                .trim_start_matches("run_")
                .split('_')
                .map(|part| part.parse().unwrap())
                .collect();
            prop_assert_eq!(bounds[1] - bounds[0], width);
            prop_assert!(bounds[0] <= u128::from(index) && u128::from(index) < bounds[1]);
            prop_assert_eq!(bounds[0] % width, 0);
        }
    }
}
