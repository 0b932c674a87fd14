//! Register and record joins form a semilattice

use proptest::prelude::*;
use vellum::document::{EntryRecord, Register, Stamp};

fn stamp() -> impl Strategy<Value = Stamp> {
    (0u64..8, prop::sample::select(vec!["a", "b", "c"])).prop_map(|(c, r)| Stamp::new(c, r))
}

fn register() -> impl Strategy<Value = Register<Vec<u8>>> {
    (prop::collection::vec(any::<u8>(), 0..4), stamp()).prop_map(|(v, s)| Register::new(v, s))
}

fn record() -> impl Strategy<Value = EntryRecord> {
    (
        (any::<[u8; 32]>(), stamp()),
        (0i64..1000, stamp()),
        (prop::option::of(stamp()), stamp()),
        register(),
    )
        .prop_map(|((id, s1), (created, s2), (seen, s3), content)| EntryRecord {
            path: "n.md".to_string(),
            identity: Register::new(id, s1),
            created_at: Register::new(created, s2),
            tombstone: Register::new(seen, s3),
            content,
        })
}

fn joined<T: Clone>(a: &T, b: &T, join: impl Fn(&mut T, &T) -> bool) -> T {
    let mut out = a.clone();
    join(&mut out, b);
    out
}

proptest! {
    #[test]
    fn register_join_is_commutative(a in register(), b in register()) {
        let ab = joined(&a, &b, |x, y| x.join(y));
        let ba = joined(&b, &a, |x, y| x.join(y));
        prop_assert_eq!(ab, ba);
    }

    #[test]
    fn register_join_is_associative(a in register(), b in register(), c in register()) {
        let left = joined(&joined(&a, &b, |x, y| x.join(y)), &c, |x, y| x.join(y));
        let right = joined(&a, &joined(&b, &c, |x, y| x.join(y)), |x, y| x.join(y));
        prop_assert_eq!(left, right);
    }

    #[test]
    fn register_join_is_idempotent(a in register()) {
        let mut again = a.clone();
        prop_assert!(!again.join(&a));
        prop_assert_eq!(again, a);
    }

    #[test]
    fn record_join_converges_in_any_order(a in record(), b in record(), c in record()) {
        let abc = joined(&joined(&a, &b, EntryRecord::join), &c, EntryRecord::join);
        let cba = joined(&joined(&c, &b, EntryRecord::join), &a, EntryRecord::join);
        let bca = joined(&joined(&b, &c, EntryRecord::join), &a, EntryRecord::join);
        prop_assert_eq!(&abc, &cba);
        prop_assert_eq!(&abc, &bca);
    }
}
