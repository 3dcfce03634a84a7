/// Logs a completed step.
///
/// Emitted at `INFO` under the `labsync::success` target so the terminal
/// formatter can render it with its own symbol.
#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {
        $crate::tracing::info!(target: "labsync::success", $($arg)*)
    };
}
