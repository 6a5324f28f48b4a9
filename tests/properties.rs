use proptest::prelude::*;

use lab_analysis::domain::{Slice, Variable};

fn series(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1.0e6..1.0e6f64, 1..max_len)
}

/// A series with a same-length uncertainty buffer.
fn series_with_err() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    series(40).prop_flat_map(|data| {
        let n = data.len();
        (Just(data), prop::collection::vec(0.0..10.0f64, n))
    })
}

/// A series plus positions into it (repeats and any order allowed).
fn series_and_positions() -> impl Strategy<Value = (Vec<f64>, Vec<f64>, Vec<usize>)> {
    series_with_err().prop_flat_map(|(data, err)| {
        let n = data.len();
        (Just(data), Just(err), prop::collection::vec(0..n, 0..60))
    })
}

fn slice() -> impl Strategy<Value = Slice> {
    (
        prop::option::of(-50isize..50),
        prop::option::of(-50isize..50),
        prop_oneof![1isize..5, -4isize..0],
    )
        .prop_map(|(start, stop, step)| Slice::new(start, stop, step))
}

proptest! {
    #[test]
    fn subset_keeps_requested_order((data, err, idx) in series_and_positions()) {
        let v = Variable::measurement(data.clone(), "y", "m").with_err(err.clone()).unwrap();
        let sub = v.subset(idx.clone()).unwrap();

        let expected: Vec<f64> = idx.iter().map(|&i| data[i]).collect();
        let expected_err: Vec<f64> = idx.iter().map(|&i| err[i]).collect();
        prop_assert_eq!(sub.data(), expected.as_slice());
        prop_assert_eq!(sub.err().unwrap(), expected_err.as_slice());
    }

    #[test]
    fn subset_and_delete_keep_err_aligned((data, err) in series_with_err(), slice in slice()) {
        let v = Variable::parameter(data.clone(), "x", "s").with_err(err.clone()).unwrap();
        let selected = slice.indices(data.len()).unwrap();

        let kept = v.subset(slice).unwrap();
        prop_assert_eq!(kept.len(), selected.len());
        for (k, &i) in selected.iter().enumerate() {
            prop_assert_eq!(kept.data()[k], data[i]);
            prop_assert_eq!(kept.err().unwrap()[k], err[i]);
        }

        let rest = v.delete(slice).unwrap();
        let remaining: Vec<usize> = (0..data.len()).filter(|i| !selected.contains(i)).collect();
        prop_assert_eq!(rest.len(), remaining.len());
        prop_assert_eq!(rest.err().map(<[f64]>::len), Some(rest.len()));
        for (k, &i) in remaining.iter().enumerate() {
            prop_assert_eq!(rest.data()[k], data[i]);
            prop_assert_eq!(rest.err().unwrap()[k], err[i]);
        }
    }

    #[test]
    fn sort_permutation_realigns_measurements((x, y) in series(40).prop_flat_map(|x| {
        let n = x.len();
        (Just(x), prop::collection::vec(-100.0..100.0f64, n))
    })) {
        let p = Variable::parameter(x.clone(), "x", "s");
        let m = Variable::measurement(y.clone(), "y", "m");

        let (sorted, order) = p.sort(None).unwrap();
        let aligned = m.subset(order.clone()).unwrap();

        prop_assert!(sorted.data().windows(2).all(|w| w[0] <= w[1]));
        for (i, &orig) in order.iter().enumerate() {
            prop_assert_eq!(sorted.data()[i], x[orig]);
            prop_assert_eq!(aligned.data()[i], y[orig]);
        }
    }

    // Sorting reorders data only; the uncertainty keeps its original order.
    #[test]
    fn sort_leaves_err_in_original_order((data, err) in series_with_err()) {
        let v = Variable::parameter(data, "x", "s").with_err(err.clone()).unwrap();
        let (sorted, _) = v.sort(None).unwrap();
        prop_assert_eq!(sorted.err().unwrap(), err.as_slice());
    }
}
