//! Property-based tests for the accumulation strategies.
//!
//! The decoder may deliver a field's values in one call or spread over many,
//! so every strategy must satisfy batch associativity:
//! merge(merge(c, A), B) == merge(c, A ++ B)
//!
//! Message merges additionally follow the per-field rule: a field present on
//! the right-hand side is merged in by that field's own strategy, and a field
//! absent there keeps its left-hand value.

use protofold_engine::{
    Accumulate, ContainerKind, LastOneWins, Message, MessageSchema, Repeated, ScalarType,
    Sequence, TypeHint, Value,
};
use proptest::prelude::*;
use std::sync::Arc;

// =============================================================================
// HELPER STRATEGIES
// =============================================================================

fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i32>().prop_map(Value::from),
        any::<u64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        "[a-z]{0,8}".prop_map(Value::from),
    ]
}

fn batch_strategy() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(value_strategy(), 0..8)
}

fn kind_strategy() -> impl Strategy<Value = ContainerKind> {
    prop_oneof![
        Just(ContainerKind::List),
        Just(ContainerKind::Deque),
        Just(ContainerKind::Tuple),
    ]
}

fn concat(a: &[Value], b: &[Value]) -> Vec<Value> {
    a.iter().chain(b).cloned().collect()
}

// =============================================================================
// LAST ONE WINS
// =============================================================================

mod last_one_wins_properties {
    use super::*;

    proptest! {
        /// The result is the last observation, or the current value if none.
        #[test]
        fn result_is_last_or_current(
            current in prop::option::of(value_strategy()),
            batch in batch_strategy(),
        ) {
            let expected = batch.last().cloned().or_else(|| current.clone());
            let merged = LastOneWins.merge(current, batch).unwrap();
            prop_assert_eq!(merged, expected);
        }

        #[test]
        fn batches_compose(
            current in prop::option::of(value_strategy()),
            a in batch_strategy(),
            b in batch_strategy(),
        ) {
            let stepwise = LastOneWins.merge(current.clone(), a.clone()).unwrap();
            let stepwise = LastOneWins.merge(stepwise, b.clone()).unwrap();
            let at_once = LastOneWins.merge(current, concat(&a, &b)).unwrap();
            prop_assert_eq!(stepwise, at_once);
        }
    }
}

// =============================================================================
// SEQUENCE
// =============================================================================

mod sequence_properties {
    use super::*;

    proptest! {
        /// Splitting observations across calls never changes the result.
        #[test]
        fn batches_compose(
            kind in kind_strategy(),
            a in batch_strategy(),
            b in batch_strategy(),
        ) {
            let sequence = Sequence::new(kind);
            let stepwise = sequence.merge(None, a.clone()).unwrap();
            let stepwise = sequence.merge(stepwise, b.clone()).unwrap();
            let at_once = sequence.merge(None, concat(&a, &b)).unwrap();
            prop_assert_eq!(stepwise, at_once);
        }

        /// Elements come out in observation order, one call per element.
        #[test]
        fn unpacked_matches_packed(kind in kind_strategy(), batch in batch_strategy()) {
            let sequence = Sequence::new(kind);
            let mut unpacked = None;
            for value in batch.clone() {
                unpacked = sequence.merge(unpacked, [value]).unwrap();
            }
            let packed = sequence.merge(None, batch.clone()).unwrap();

            if batch.is_empty() {
                prop_assert_eq!(unpacked, None);
            } else {
                prop_assert_eq!(unpacked, packed.clone());
            }
            let Some(Value::Repeated(packed)) = packed else {
                return Err(TestCaseError::fail("sequence must yield a container"));
            };
            prop_assert_eq!(packed.kind(), kind);
            prop_assert_eq!(packed.to_vec(), batch);
        }

        /// An existing container keeps its kind whatever the configured one.
        #[test]
        fn stored_kind_is_kept(
            stored in kind_strategy(),
            configured in kind_strategy(),
            a in batch_strategy(),
            b in batch_strategy(),
        ) {
            let current = Value::Repeated(Repeated::collect(stored, a.clone()));
            let merged = Sequence::new(configured).merge(Some(current), b.clone()).unwrap();
            let Some(Value::Repeated(merged)) = merged else {
                return Err(TestCaseError::fail("sequence must yield a container"));
            };
            prop_assert_eq!(merged.kind(), stored);
            prop_assert_eq!(merged.to_vec(), concat(&a, &b));
        }
    }
}

// =============================================================================
// MESSAGE MERGE
// =============================================================================

mod message_merge_properties {
    use super::*;

    fn schema() -> Arc<MessageSchema> {
        MessageSchema::builder("Sample")
            .field(1, "x", ScalarType::Int32)
            .field(2, "rep", TypeHint::list(ScalarType::Int32.into()))
            .build()
            .unwrap()
    }

    fn message(schema: &Arc<MessageSchema>, x: Option<i32>, rep: Option<Vec<i32>>) -> Message {
        let mut message = schema.new_message();
        if let Some(x) = x {
            message.set("x", x).unwrap();
        }
        if let Some(rep) = rep {
            let values = rep.into_iter().map(Value::from);
            message.set("rep", Repeated::collect(ContainerKind::List, values)).unwrap();
        }
        message
    }

    fn part_strategy() -> impl Strategy<Value = (Option<i32>, Option<Vec<i32>>)> {
        (
            prop::option::of(any::<i32>()),
            prop::option::of(prop::collection::vec(any::<i32>(), 0..6)),
        )
    }

    proptest! {
        #[test]
        fn fields_follow_their_strategy(lhs in part_strategy(), rhs in part_strategy()) {
            let schema = schema();
            let merger = schema.merger();
            let merged = merger
                .merge_messages(
                    Some(message(&schema, lhs.0, lhs.1.clone())),
                    [Some(message(&schema, rhs.0, rhs.1.clone()))],
                )
                .unwrap();

            let x = rhs.0.or(lhs.0);
            let rep = match (lhs.1, rhs.1) {
                (Some(mut a), Some(b)) => {
                    a.extend(b);
                    Some(a)
                }
                (a, b) => b.or(a),
            };
            prop_assert_eq!(merged, message(&schema, x, rep));
        }

        /// Merging three messages in one call equals merging them pairwise.
        #[test]
        fn merges_compose(
            a in part_strategy(),
            b in part_strategy(),
            c in part_strategy(),
        ) {
            let schema = schema();
            let merger = schema.merger();
            let build = |(x, rep): &(Option<i32>, Option<Vec<i32>>)| {
                message(&schema, *x, rep.clone())
            };

            let at_once = merger
                .merge_messages(Some(build(&a)), [Some(build(&b)), Some(build(&c))])
                .unwrap();
            let first = merger.merge_messages(Some(build(&a)), [Some(build(&b))]).unwrap();
            let stepwise = merger.merge_messages(Some(first), [Some(build(&c))]).unwrap();
            prop_assert_eq!(at_once, stepwise);
        }
    }
}
