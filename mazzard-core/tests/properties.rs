//! Property-based tests for change propagation.
//!
//! 1. Writing the value a key already holds never re-runs its readers
//! 2. A reaction runs once per write that changes what it read
//! 3. One batch of writes runs each reader once, seeing the final state
//! 4. A reaction never re-runs for keys it did not read
//! 5. Sequence length readers see every push and truncation

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use mazzard_core::{action, observe, wrap, List, Observable, Record, Value};
use proptest::prelude::*;

// ── Helpers ──────────────────────────────────────────────────────────

const KEYS: [&str; 4] = ["a", "b", "c", "d"];

fn record() -> Observable {
    let raw = KEYS.iter().fold(Record::new(), |raw, key| raw.with(*key, 0));
    wrap(raw).as_observable().cloned().unwrap()
}

/// Observe `key`, recording every value seen.
fn watch(state: &Observable, key: &'static str) -> Rc<RefCell<Vec<Value>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let (seen_clone, reader) = (seen.clone(), state.clone());
    observe(move |_| {
        seen_clone.borrow_mut().push(reader.read(key)?);
        Ok(())
    })
    .unwrap();
    seen
}

fn arb_write() -> impl Strategy<Value = (usize, i32)> {
    (0..KEYS.len(), 0..4i32)
}

// ═════════════════════════════════════════════════════════════════════════
// 1–2. Idempotent writes, one run per change
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn runs_match_value_changes(writes in proptest::collection::vec(arb_write(), 0..40)) {
        let state = record();
        let seen = watch(&state, "a");

        let mut current = 0;
        let mut expected = vec![Value::from(0)];
        for (key, value) in writes {
            state.write(KEYS[key], value).unwrap();
            if key == 0 && value != current {
                current = value;
                expected.push(Value::from(value));
            }
        }

        prop_assert_eq!(&*seen.borrow(), &expected);
    }

    #[test]
    fn repeated_write_is_quiet(value in 0..100i32, repeats in 1..10usize) {
        let state = record();
        state.write("b", value).unwrap();
        let seen = watch(&state, "b");

        for _ in 0..repeats {
            state.write("b", value).unwrap();
        }
        prop_assert_eq!(seen.borrow().len(), 1);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Batching
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn batch_runs_reader_once(writes in proptest::collection::vec(arb_write(), 1..20)) {
        let state = record();
        let runs = Rc::new(Cell::new(0));
        let (runs_clone, reader) = (runs.clone(), state.clone());
        observe(move |_| {
            runs_clone.set(runs_clone.get() + 1);
            for key in KEYS {
                reader.read(key)?;
            }
            Ok(())
        })
        .unwrap();

        let changes = writes.iter().any(|(_, value)| *value != 0);
        let mut finals = [0; 4];
        for (key, value) in &writes {
            finals[*key] = *value;
        }

        let writer = state.clone();
        let apply = action(move |writes: Vec<(usize, i32)>| {
            for (key, value) in writes {
                writer.write(KEYS[key], value)?;
            }
            Ok(())
        });
        apply(writes).unwrap();

        let expected_runs = if changes { 2 } else { 1 };
        prop_assert_eq!(runs.get(), expected_runs);
        for (key, value) in KEYS.iter().zip(finals) {
            prop_assert_eq!(state.read(*key).unwrap(), Value::from(value));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Lazy subscription
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn unread_keys_never_trigger(writes in proptest::collection::vec((1..KEYS.len(), 1..9i32), 0..30)) {
        let state = record();
        let seen = watch(&state, "a");

        for (key, value) in writes {
            state.write(KEYS[key], value).unwrap();
        }
        prop_assert_eq!(seen.borrow().len(), 1);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Sequence length
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn length_readers_follow_pushes_and_truncation(
        pushes in 0..20usize,
        truncate_to in 0..25usize,
    ) {
        let list = wrap(List::new()).as_observable().cloned().unwrap();
        let lengths = Rc::new(RefCell::new(Vec::new()));
        let (lengths_clone, reader) = (lengths.clone(), list.clone());
        observe(move |_| {
            lengths_clone.borrow_mut().push(reader.len()?);
            Ok(())
        })
        .unwrap();

        for n in 0..pushes {
            list.push(n).unwrap();
        }
        list.set_len(truncate_to).unwrap();

        let mut expected: Vec<usize> = (0..=pushes).collect();
        if truncate_to != pushes {
            expected.push(truncate_to);
        }
        prop_assert_eq!(&*lengths.borrow(), &expected);
    }
}
