#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::*;
use proptest::prelude::*;
use relay_core::chain::Chain;
use relay_core::command::{Command, CommandRef};
use relay_core::context::ContextBase;

/// Behaviour of one generated chain member
#[derive(Debug, Clone, Copy)]
enum Step {
    Continue,
    Stop,
    Fail,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        6 => Just(Step::Continue),
        1 => Just(Step::Stop),
        1 => Just(Step::Fail),
    ]
}

/// Every member is a filter so the unwind is fully observable.
fn build(steps: &[Step], handles_at: Option<usize>) -> Chain {
    let members: Vec<CommandRef> = steps
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let id = i.to_string();
            let handles = handles_at == Some(i);
            match s {
                Step::Continue => std::sync::Arc::new(LoggingFilter {
                    id,
                    stops: false,
                    handles,
                }) as CommandRef,
                Step::Stop => std::sync::Arc::new(LoggingFilter {
                    id,
                    stops: true,
                    handles,
                }) as CommandRef,
                Step::Fail => std::sync::Arc::new(FailingThenFilter { id, handles }) as CommandRef,
            }
        })
        .collect();
    Chain::from_commands(members)
}

/// Fails on execute, logs on postprocess
struct FailingThenFilter {
    id: String,
    handles: bool,
}

impl Command for FailingThenFilter {
    fn execute(&self, context: &mut dyn relay_core::Context) -> relay_core::Result<bool> {
        append_log(context, &self.id);
        Err(relay_core::ChainError::failed(format!("step {}", self.id)))
    }

    fn as_filter(&self) -> Option<&dyn relay_core::Filter> {
        Some(self)
    }
}

impl relay_core::Filter for FailingThenFilter {
    fn postprocess(
        &self,
        context: &mut dyn relay_core::Context,
        _error: Option<&relay_core::ChainError>,
    ) -> relay_core::Result<bool> {
        append_log(context, &self.id);
        Ok(self.handles)
    }
}

/// Index of the first member that stops or fails
fn stop_point(steps: &[Step]) -> Option<usize> {
    steps
        .iter()
        .position(|s| matches!(s, Step::Stop | Step::Fail))
}

fn expected_log(last: usize) -> String {
    let forward = (0..=last).map(|i| i.to_string());
    let backward = (0..=last).rev().map(|i| i.to_string());
    forward.chain(backward).collect::<Vec<_>>().join("/")
}

proptest! {
    #[test]
    fn prop_members_after_stop_never_run(steps in prop::collection::vec(step(), 1..12)) {
        let chain = build(&steps, None);
        let mut ctx = ContextBase::new();
        let result = chain.execute(&mut ctx);

        let last = stop_point(&steps).unwrap_or(steps.len() - 1);
        prop_assert_eq!(log_of(&ctx), expected_log(last));

        match stop_point(&steps).map(|i| steps[i]) {
            Some(Step::Stop) => prop_assert!(result.unwrap()),
            Some(Step::Fail) => prop_assert!(result.is_err()),
            _ => prop_assert!(!result.unwrap()),
        }
    }

    #[test]
    fn prop_any_handling_filter_suppresses(
        steps in prop::collection::vec(step(), 1..12),
        pick in any::<prop::sample::Index>(),
    ) {
        let Some(fail_at) = steps.iter().position(|s| matches!(s, Step::Fail)) else {
            return Ok(());
        };
        if steps[..fail_at].iter().any(|s| matches!(s, Step::Stop)) {
            return Ok(());
        }

        let handler = pick.index(fail_at + 1);
        let chain = build(&steps, Some(handler));
        let mut ctx = ContextBase::new();
        let result = chain.execute(&mut ctx);

        prop_assert!(!result.unwrap());
        prop_assert_eq!(log_of(&ctx), expected_log(fail_at));
    }

    #[test]
    fn prop_repeated_runs_are_identical(steps in prop::collection::vec(step(), 0..8)) {
        let chain = build(&steps, None);
        let mut first = ContextBase::new();
        let mut second = ContextBase::new();
        let a = chain.execute(&mut first).is_ok();
        let b = chain.execute(&mut second).is_ok();
        prop_assert_eq!(a, b);
        prop_assert_eq!(log_of(&first), log_of(&second));
        prop_assert!(chain.is_frozen());
    }
}
