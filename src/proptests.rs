use super::{AvlMap, Key, NodeArena, NodeId};

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeMap;

/// Height computed by walking the whole subtree, ignoring cached values.
fn recomputed_height<V>(arena: &NodeArena<V>, node: Option<NodeId>) -> u8 {
    node.map_or(0, |id| {
        let n = arena.node(id);
        recomputed_height(arena, n.left()).max(recomputed_height(arena, n.right())) + 1
    })
}

/// Check BST ordering, the AVL bound and cached heights for every node under
/// `root`. Returns the number of reachable nodes.
pub(crate) fn validate_tree<V>(arena: &NodeArena<V>, root: Option<NodeId>) -> usize {
    let mut count = 0usize;
    // (node, exclusive lower bound, exclusive upper bound)
    let mut stack: Vec<(NodeId, Option<Key>, Option<Key>)> = Vec::new();
    if let Some(id) = root {
        stack.push((id, None, None));
    }

    while let Some((id, lo, hi)) = stack.pop() {
        let node = arena
            .get(id)
            .unwrap_or_else(|| panic!("reachable handle {id:?} points at a released slot"));
        count += 1;

        if let Some(lo) = lo {
            assert!(node.key() > lo, "key {} must be greater than {}", node.key(), lo);
        }
        if let Some(hi) = hi {
            assert!(node.key() < hi, "key {} must be less than {}", node.key(), hi);
        }

        let lh = arena.height(node.left());
        let rh = arena.height(node.right());
        assert_eq!(
            node.height(),
            lh.max(rh) + 1,
            "stored height of {} must match children",
            node.key()
        );
        assert!(
            (i32::from(lh) - i32::from(rh)).abs() <= 1,
            "node {} is out of balance ({lh} vs {rh})",
            node.key()
        );

        if let Some(left) = node.left() {
            stack.push((left, lo, Some(node.key())));
        }
        if let Some(right) = node.right() {
            stack.push((right, Some(node.key()), hi));
        }
    }

    assert_eq!(
        arena.height(root),
        recomputed_height(arena, root),
        "cached root height must match a full walk"
    );
    count
}

fn validate_map<V>(m: &AvlMap<V>) {
    let reachable = validate_tree(m.arena(), m.root());
    assert_eq!(reachable, m.len(), "reachable node count must match AvlMap::len");
    assert_eq!(
        m.arena().live_nodes(),
        m.len(),
        "no node may outlive its key"
    );
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 5)]
    Insert(#[proptest(strategy = "-256i64..256")] i64, u64),
    #[proptest(weight = 3)]
    Remove(#[proptest(strategy = "-256i64..256")] i64),
    #[proptest(weight = 2)]
    Get(#[proptest(strategy = "-256i64..256")] i64),
    #[proptest(weight = 1)]
    ReplaceExisting(u64),
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_u64(ops in prop::collection::vec(any::<Op>(), 0..=1500)) {
        let mut t: AvlMap<u64> = AvlMap::new();
        let mut m: BTreeMap<i64, u64> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    let old_t = t.insert(key, value).unwrap();
                    let old_m = m.insert(key, value);
                    prop_assert_eq!(old_t, old_m);
                }
                Op::Remove(key) => {
                    prop_assert_eq!(t.remove(key), m.remove(&key));
                }
                Op::Get(key) => {
                    prop_assert_eq!(t.get(key).copied(), m.get(&key).copied());
                }
                Op::ReplaceExisting(value) => {
                    // Overwriting the smallest key must not change the shape.
                    if let Some((&key, _)) = m.iter().next() {
                        let shape: Vec<(i64, u8)> = t.arena().traverse_inorder(t.root()).collect();
                        prop_assert!(t.insert(key, value).unwrap().is_some());
                        m.insert(key, value);
                        let after: Vec<(i64, u8)> = t.arena().traverse_inorder(t.root()).collect();
                        prop_assert_eq!(shape, after);
                    }
                }
            }

            prop_assert_eq!(t.len(), m.len());
        }

        validate_map(&t);
        let got: Vec<(i64, u64)> = t.iter().map(|(k, v)| (k, *v)).collect();
        let expected: Vec<(i64, u64)> = m.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_invariants_hold_after_every_op(
        keys in prop::collection::vec(any::<i64>(), 0..=200),
        removals in prop::collection::vec(any::<prop::sample::Index>(), 0..=200),
    ) {
        let mut t: AvlMap<()> = AvlMap::new();
        for &key in &keys {
            t.insert(key, ()).unwrap();
            validate_map(&t);
        }
        if !keys.is_empty() {
            for idx in removals {
                let key = keys[idx.index(keys.len())];
                t.remove(key);
                validate_map(&t);
                prop_assert!(!t.contains_key(key));
            }
        }
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys: Vec<i64> = vec![-3, 0, 1, 4, 7, 8, 12];

    for_each_permutation(&keys, |perm| {
        let mut t: AvlMap<u64> = AvlMap::new();
        let mut m: BTreeMap<i64, u64> = BTreeMap::new();

        for (i, k) in perm.into_iter().enumerate() {
            let v = i as u64;
            assert_eq!(t.insert(k, v).unwrap(), m.insert(k, v));
            validate_map(&t);
        }

        // The sparsest AVL tree of height 4 already has 7 nodes.
        assert!(t.height() <= 4, "height {}", t.height());
        let got: Vec<(i64, u64)> = t.iter().map(|(k, v)| (k, *v)).collect();
        let expected: Vec<(i64, u64)> = m.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(got, expected);
    });
}

#[test]
fn exhaustive_remove_order_small_set() {
    let keys: Vec<i64> = vec![10, 5, 15, 3, 7, 12, 20];

    // Insert in a fixed order, then remove in all permutations.
    let mut base_tree: AvlMap<u64> = AvlMap::new();
    let mut base_map: BTreeMap<i64, u64> = BTreeMap::new();
    for (i, &k) in keys.iter().enumerate() {
        let v = i as u64;
        assert_eq!(base_tree.insert(k, v).unwrap(), base_map.insert(k, v));
    }

    for_each_permutation(&keys, |perm| {
        let mut t = base_tree.clone();
        let mut m = base_map.clone();

        for k in perm {
            assert_eq!(t.remove(k), m.remove(&k));
            assert_eq!(t.len(), m.len());
            validate_map(&t);
        }
        assert_eq!(t.len(), 0);
        assert!(t.root().is_none());
        assert_eq!(t.arena().live_nodes(), 0);
    });
}
