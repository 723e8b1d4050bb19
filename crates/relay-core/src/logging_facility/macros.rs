//! Lifecycle event macros
//!
//! Each macro stamps `component` with the calling module and `op` with the
//! given operation name. Extra `key = value` fields are passed straight to
//! `tracing`.

/// Debug event marking the start of `op`
///
/// ```
/// # use relay_core::log_op_start;
/// log_op_start!("chain_execute");
/// log_op_start!("chain_execute", chain_len = 3u64);
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)*)?) => {
        tracing::debug!(
            component = module_path!(),
            op = $op,
            event = relay_core_types::schema::EVENT_START,
            $($($field)*)?
        )
    };
}

/// Debug event marking the successful end of `op`
///
/// ```
/// # use relay_core::log_op_end;
/// log_op_end!("chain_execute", duration_ms = 4u64);
/// log_op_end!("chain_execute", duration_ms = 4u64, result = true);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {
        tracing::debug!(
            component = module_path!(),
            op = $op,
            event = relay_core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($($field)*)?
        )
    };
}

/// Error event for a failed `op`
///
/// `$err` is a `ChainError`; it is borrowed, not moved. The event carries
/// the error's kind and stable code plus its rendering with `op` attached.
///
/// ```
/// # use relay_core::{log_op_error, errors::ChainError};
/// let err = ChainError::illegal_state("chain is frozen");
/// log_op_error!("chain_add_command", err, duration_ms = 0u64);
/// assert!(err.to_string().contains("frozen"));
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {{
        let op = $op;
        let ex_err = $crate::errors::ExError::from(&$err).with_op(op);
        tracing::error!(
            component = module_path!(),
            op = op,
            event = relay_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code(),
            error = %ex_err,
            $($($field)*)?
        )
    }};
}
