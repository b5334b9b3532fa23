use std::panic;

/// Install panic reporting for the binary.
///
/// Debug builds get `better-panic` backtraces; release builds get a
/// `human-panic` crash report. Either way the panic is logged first so the
/// log file ends with what went wrong.
pub fn initialize_panic_handler() {
    #[cfg(debug_assertions)]
    better_panic::install();

    #[cfg(not(debug_assertions))]
    human_panic::setup_panic!();

    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        log::error!("panic: {panic_info}");
        log::logger().flush();

        default_hook(panic_info);

        std::process::exit(1);
    }));
}
