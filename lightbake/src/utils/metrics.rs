use std::time::{Duration, Instant};

/// Runs `f`, returning its result together with how long it took.
pub(crate) fn measure<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let tt = Instant::now();
    let val = f();

    (val, tt.elapsed())
}

/// Runs `f` and, with the `metrics` feature on, logs how long it took.
pub(crate) fn metric<T>(label: &str, f: impl FnOnce() -> T) -> T {
    let (val, tt) = measure(f);

    #[cfg(feature = "metrics")]
    log::info!("{}: {}", label, humantime::format_duration(tt));

    #[cfg(not(feature = "metrics"))]
    let _ = (label, tt);

    val
}
