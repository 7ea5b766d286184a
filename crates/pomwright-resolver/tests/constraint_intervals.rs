use proptest::prelude::*;

use pomwright_resolver::constraint::VersionConstraint;

fn part() -> impl Strategy<Value = u64> {
    0u64..5
}

fn triple() -> impl Strategy<Value = (u64, u64, u64)> {
    (part(), part(), part())
}

fn v((a, b, c): (u64, u64, u64)) -> String {
    format!("{a}.{b}.{c}")
}

fn satisfied(spec: &str, candidate: (u64, u64, u64)) -> bool {
    VersionConstraint::parse(spec)
        .unwrap()
        .is_satisfied_by(&v(candidate))
}

proptest! {
    #[test]
    fn tilde_keeps_major_minor(base in triple(), cand in triple()) {
        let (a, b, c) = base;
        let (x, y, z) = cand;
        let expected = x == a && y == b && z >= c;
        prop_assert_eq!(satisfied(&format!("~{}", v(base)), cand), expected);
    }

    #[test]
    fn caret_keeps_first_nonzero(base in triple(), cand in triple()) {
        let (a, b, c) = base;
        let (x, y, z) = cand;
        let expected = if a > 0 {
            x == a && (y, z) >= (b, c)
        } else if b > 0 {
            x == 0 && y == b && z >= c
        } else {
            (x, y, z) == (0, 0, c)
        };
        prop_assert_eq!(satisfied(&format!("^{}", v(base)), cand), expected);
    }

    #[test]
    fn hyphen_is_inclusive(lo in triple(), hi in triple(), cand in triple()) {
        let expected = lo <= cand && cand <= hi;
        prop_assert_eq!(satisfied(&format!("{} - {}", v(lo), v(hi)), cand), expected);
    }

    #[test]
    fn xrange_fixes_leading_parts(a in part(), b in part(), cand in triple()) {
        let (x, y, _) = cand;
        prop_assert_eq!(satisfied(&format!("{a}.{b}.x"), cand), x == a && y == b);
        prop_assert_eq!(satisfied(&format!("{a}.*"), cand), x == a);
        prop_assert!(satisfied("*", cand));
    }

    #[test]
    fn select_best_is_idempotent(
        spec in prop::sample::select(vec!["~1.2.0", "^1.0.0", "1.x", "*", "latest.release", "[1.0,3.0)", "0.0.1 - 2.2"]),
        cands in prop::collection::vec(triple(), 0..12),
    ) {
        let constraint = VersionConstraint::parse(spec).unwrap();
        let versions: Vec<String> = cands.into_iter().map(v).collect();
        let best = constraint.select_best(versions.iter().map(String::as_str)).map(str::to_string);
        if let Some(ref best) = best {
            prop_assert!(constraint.is_satisfied_by(best));
            prop_assert_eq!(constraint.select_best([best.as_str()]), Some(best.as_str()));
            let mut again = versions.clone();
            again.push(best.clone());
            prop_assert_eq!(
                constraint.select_best(again.iter().map(String::as_str)),
                Some(best.as_str())
            );
        } else {
            prop_assert!(versions.iter().all(|c| !constraint.is_satisfied_by(c)));
        }
    }
}

#[test]
fn documented_examples() {
    assert!(satisfied("1.2 - 2", (2, 0, 0)));
    assert!(satisfied("~1.2", (1, 2, 0)));
    assert!(!satisfied("~1.2", (1, 3, 0)));
    assert!(satisfied("~1", (1, 4, 4)));
    assert!(!satisfied("^0.0.3", (0, 0, 4)));
    assert!(!VersionConstraint::parse("^0.0.3").unwrap().is_satisfied_by("0.0.3.1"));
    assert!(satisfied("1.2.X", (1, 2, 4)));
}
