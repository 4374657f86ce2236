use protofold_engine::{Accumulate, Accumulator, LastOneWins, Value};
use std::cell::Cell;

fn ints(values: &[i32]) -> Vec<Value> {
    values.iter().copied().map(Value::from).collect()
}

#[test]
fn returns_last_observed() {
    let merged = LastOneWins.merge(None, ints(&[1, 2, 3])).unwrap();
    assert_eq!(merged, Some(Value::from(3)));
}

#[test]
fn ignores_current_when_something_observed() {
    let merged = LastOneWins.merge(Some(Value::from(9)), ints(&[4])).unwrap();
    assert_eq!(merged, Some(Value::from(4)));
}

#[test]
fn empty_observation_keeps_current() {
    let merged = LastOneWins
        .merge(Some(Value::from("kept")), std::iter::empty())
        .unwrap();
    assert_eq!(merged, Some(Value::from("kept")));
}

#[test]
fn empty_observation_keeps_absent() {
    let merged = LastOneWins.merge(None, Vec::new()).unwrap();
    assert_eq!(merged, None);
}

#[test]
fn replaces_rather_than_blends() {
    let current = Value::from(b"abc".to_vec());
    let merged = LastOneWins
        .merge(Some(current), [Value::from(b"x".to_vec())])
        .unwrap();
    assert_eq!(merged, Some(Value::Bytes(b"x".to_vec())));
}

#[test]
fn drains_the_whole_observation() {
    let seen = Cell::new(0);
    let observed = ints(&[1, 2, 3, 4]).into_iter().inspect(|_| seen.set(seen.get() + 1));
    LastOneWins.merge(None, observed).unwrap();
    assert_eq!(seen.get(), 4);
}

#[test]
fn split_calls_match_single_call() {
    let once = LastOneWins.merge(None, ints(&[1, 2, 3])).unwrap();
    let first = LastOneWins.merge(None, ints(&[1, 2])).unwrap();
    let twice = LastOneWins.merge(first, ints(&[3])).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn dispatches_through_accumulator() {
    let accumulator = Accumulator::from(LastOneWins);
    assert_eq!(accumulator.name(), "last_one_wins");
    let merged = accumulator.merge(None, ints(&[5, 6])).unwrap();
    assert_eq!(merged, Some(Value::from(6)));
}

#[test]
fn merge_stored_skips_absent_incoming() {
    let accumulator = Accumulator::from(LastOneWins);
    let merged = accumulator.merge_stored(Some(Value::from(1)), None).unwrap();
    assert_eq!(merged, Some(Value::from(1)));
    let merged = accumulator
        .merge_stored(Some(Value::from(1)), Some(Value::from(2)))
        .unwrap();
    assert_eq!(merged, Some(Value::from(2)));
}
