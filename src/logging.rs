use tracing::Level;
use tracing_subscriber::fmt;

/// Install the stderr subscriber: warnings only, or everything down to
/// debug with `verbose`. A second call is a no-op.
pub fn init(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let _ = fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .try_init();
}
