use std::fmt::Debug;

use tact_absint::{HasBottom, JoinSemiLattice};

/// Check the join-semilattice laws on every pair (and triple) of samples.
pub fn assert_join_semilattice_laws<D>(samples: &[D])
where
    D: JoinSemiLattice + Clone + PartialEq + Debug,
{
    for a in samples {
        assert_eq!(a.join(a), *a, "join must be idempotent: {a:?}");
        assert!(a.is_subseteq(a), "order must be reflexive: {a:?}");
    }
    for a in samples {
        for b in samples {
            let ab = a.join(b);
            assert_eq!(ab, b.join(a), "join must be commutative: {a:?}, {b:?}");
            assert!(
                a.is_subseteq(&ab) && b.is_subseteq(&ab),
                "join must be an upper bound: {a:?}, {b:?}"
            );
            if a.is_subseteq(b) {
                assert_eq!(ab, *b, "a ⊑ b must mean a ⊔ b = b: {a:?}, {b:?}");
            }
            for c in samples {
                assert_eq!(
                    ab.join(c),
                    a.join(&b.join(c)),
                    "join must be associative: {a:?}, {b:?}, {c:?}"
                );
            }
        }
    }
}

/// Check that `bottom` is the identity of `join` and the least element.
pub fn assert_bottom_laws<D>(samples: &[D])
where
    D: HasBottom + Clone + PartialEq + Debug,
{
    let bottom = D::bottom();
    assert!(bottom.is_bottom());
    for a in samples {
        assert_eq!(bottom.join(a), *a, "bottom must be the join identity: {a:?}");
        assert!(bottom.is_subseteq(a), "bottom must be least: {a:?}");
    }
}
