#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;
use std::thread;

use common::*;
use relay_core::chain::Chain;
use relay_core::command::{Command, CommandRef};
use relay_core::context::{Context, ContextBase};
use relay_core::errors::ChainError;

fn run(chain: &Chain) -> (Result<bool, ChainError>, String) {
    let mut ctx = ContextBase::new();
    let result = chain.execute(&mut ctx);
    (result, log_of(&ctx))
}

#[test]
fn test_single_non_delegating_command() {
    let chain = Chain::from_commands(vec![non_delegating("1")]);
    let (result, log) = run(&chain);
    assert!(result.unwrap());
    assert_eq!(log, "1");
}

#[test]
fn test_delegating_then_non_delegating() {
    let chain = Chain::from_commands(vec![delegating("1"), delegating("2"), non_delegating("3")]);
    let (result, log) = run(&chain);
    assert!(result.unwrap());
    assert_eq!(log, "1/2/3");
}

#[test]
fn test_all_delegating_falls_through_with_false() {
    let chain = Chain::from_commands(vec![delegating("1"), delegating("2"), delegating("3")]);
    let (result, log) = run(&chain);
    assert!(!result.unwrap());
    assert_eq!(log, "1/2/3");
}

#[test]
fn test_filters_unwind_after_normal_completion() {
    let chain = Chain::from_commands(vec![
        delegating_filter("1"),
        delegating_filter("2"),
        non_delegating("3"),
    ]);
    let (result, log) = run(&chain);
    assert!(result.unwrap());
    assert_eq!(log, "1/2/3/2/1");
}

#[test]
fn test_fall_through_unwinds_from_last_member() {
    let chain = Chain::from_commands(vec![delegating_filter("1"), delegating_filter("2")]);
    let (result, log) = run(&chain);
    assert!(!result.unwrap());
    assert_eq!(log, "1/2/2/1");
}

#[test]
fn test_short_circuit_skips_later_members_and_their_filters() {
    let chain = Chain::from_commands(vec![
        delegating_filter("1"),
        non_delegating_filter("2"),
        delegating_filter("3"),
    ]);
    let (result, log) = run(&chain);
    assert!(result.unwrap());
    // "3" never executed, so it is not post-processed either.
    assert_eq!(log, "1/2/2/1");
}

#[test]
fn test_error_propagates_after_unwind() {
    let chain = Chain::from_commands(vec![
        delegating_filter("1"),
        delegating_filter("2"),
        failing("3"),
        delegating_filter("4"),
    ]);
    let (result, log) = run(&chain);

    let err = result.unwrap_err();
    let fixture = err.downcast_ref::<FixtureError>().expect("original error type");
    assert_eq!(fixture.id, "3");
    assert_eq!(log, "1/2/3/2/1");
}

#[test]
fn test_error_is_propagated_verbatim() {
    let original = ChainError::command(FixtureError { id: "x".to_string() });
    let raise = {
        let original = original.clone();
        Arc::new(relay_core::command::FnCommand::new(move |_: &mut dyn Context| {
            Err(original.clone())
        })) as CommandRef
    };
    let chain = Chain::from_commands(vec![delegating_filter("1"), raise]);
    let err = chain.execute(&mut ContextBase::new()).unwrap_err();
    assert!(err.is_same(&original));
}

#[test]
fn test_handling_filter_suppresses_error() {
    let chain = Chain::from_commands(vec![
        handling_filter("1"),
        delegating_filter("2"),
        failing("3"),
    ]);
    let (result, log) = run(&chain);
    // Suppressed errors report the recorded result, which is false here.
    assert!(!result.unwrap());
    assert_eq!(log, "1/2/3/2/1");
}

#[test]
fn test_handled_flag_is_sticky() {
    // The inner filter handles, the outer one does not: still handled.
    let chain = Chain::from_commands(vec![
        delegating_filter("1"),
        handling_filter("2"),
        failing("3"),
    ]);
    let (result, log) = run(&chain);
    assert!(!result.unwrap());
    assert_eq!(log, "1/2/3/2/1");
}

#[test]
fn test_failing_postprocess_is_swallowed() {
    let chain = Chain::from_commands(vec![
        delegating_filter("1"),
        failing_filter("2"),
        non_delegating("3"),
    ]);
    let (result, log) = run(&chain);
    assert!(result.unwrap());
    // The unwind continues past the failing filter.
    assert_eq!(log, "1/2/3/2/1");
}

#[test]
fn test_failing_postprocess_does_not_replace_original_error() {
    let chain = Chain::from_commands(vec![failing_filter("1"), failing("2")]);
    let (result, log) = run(&chain);
    let err = result.unwrap_err();
    assert_eq!(err.downcast_ref::<FixtureError>().unwrap().id, "2");
    assert_eq!(log, "1/2/1");
}

#[test]
fn test_failing_member_that_is_a_filter_postprocesses_itself() {
    struct FailingSelfCleaning;

    impl Command for FailingSelfCleaning {
        fn execute(&self, context: &mut dyn Context) -> relay_core::Result<bool> {
            append_log(context, "x");
            Err(ChainError::failed("x broke"))
        }

        fn as_filter(&self) -> Option<&dyn relay_core::Filter> {
            Some(self)
        }
    }

    impl relay_core::Filter for FailingSelfCleaning {
        fn postprocess(
            &self,
            context: &mut dyn Context,
            error: Option<&ChainError>,
        ) -> relay_core::Result<bool> {
            append_log(context, "x-cleanup");
            Ok(error.is_some())
        }
    }

    let chain = Chain::from_commands(vec![Arc::new(FailingSelfCleaning) as CommandRef]);
    let (result, log) = run(&chain);
    assert!(!result.unwrap());
    assert_eq!(log, "x/x-cleanup");
}

#[test]
fn test_nested_chains() {
    let inner = Chain::from_commands(vec![delegating_filter("2"), delegating("3")]);
    let outer = Chain::from_commands(vec![
        delegating_filter("1"),
        Arc::new(inner) as CommandRef,
        non_delegating("4"),
    ]);
    let (result, log) = run(&outer);
    assert!(result.unwrap());
    // The inner chain unwinds when it falls off its end, before "4" runs.
    assert_eq!(log, "1/2/3/2/4/1");
}

#[test]
fn test_empty_chain_returns_false_without_unwind() {
    let chain = Chain::new();
    let (result, log) = run(&chain);
    assert!(!result.unwrap());
    assert_eq!(log, "");
}

#[test]
fn test_repeated_execution_is_identical_and_stays_frozen() {
    let chain = Chain::from_commands(vec![delegating("1"), non_delegating("2"), delegating("3")]);
    let (_, first) = run(&chain);
    let (_, second) = run(&chain);
    assert_eq!(first, second);
    assert_eq!(first, "1/2");

    for _ in 0..3 {
        assert!(matches!(
            chain.add_command(delegating("4")),
            Err(ChainError::IllegalState { .. })
        ));
    }
    assert_eq!(chain.len(), 3);
}

#[test]
fn test_concurrent_executions_of_frozen_chain() {
    let chain = Arc::new(Chain::from_commands(vec![
        delegating_filter("a"),
        delegating("b"),
        non_delegating("c"),
    ]));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let chain = Arc::clone(&chain);
            thread::spawn(move || {
                let mut ctx = ContextBase::new();
                let result = chain.execute(&mut ctx).unwrap();
                (result, log_of(&ctx))
            })
        })
        .collect();

    for handle in handles {
        let (result, log) = handle.join().unwrap();
        assert!(result);
        assert_eq!(log, "a/b/c/a");
    }
}

#[test]
fn test_first_execution_races_with_appends() {
    // Appends either land before the freeze or fail; never both.
    let chain = Arc::new(Chain::from_commands(vec![delegating("0")]));
    let appender = {
        let chain = Arc::clone(&chain);
        thread::spawn(move || {
            (0..100)
                .filter(|i| chain.add_command(delegating(&i.to_string())).is_ok())
                .count()
        })
    };
    let mut ctx = ContextBase::new();
    chain.execute(&mut ctx).unwrap();
    let appended = appender.join().unwrap();

    assert_eq!(chain.len(), 1 + appended);
    let (_, second) = run(&chain);
    assert_eq!(second.split('/').count(), chain.len());
}
