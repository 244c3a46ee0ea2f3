#[macro_use]
extern crate tracing;

mod app;
pub mod args;
pub mod logging;
pub mod manifest;

pub use app::App;
pub use args::Args;
use color_eyre::Result;

/// Installs the `color-eyre` report handler and a panic hook: `better-panic` backtraces in debug builds, a
/// `human-panic` crash report in release builds.
pub fn init_errors() -> Result<()> {
    let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default()
        .display_location_section(cfg!(debug_assertions))
        .display_env_section(false)
        .into_hooks();
    eyre_hook.install()?;

    std::panic::set_hook(Box::new(move |panic_info| {
        error!("{}", panic_hook.panic_report(panic_info));

        #[cfg(not(debug_assertions))]
        {
            use human_panic::{
                handle_dump,
                print_msg,
                Metadata,
            };
            let metadata = Metadata::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
                .authors(env!("CARGO_PKG_AUTHORS"))
                .homepage(env!("CARGO_PKG_HOMEPAGE"));
            let file_path = handle_dump(&metadata, panic_info);
            let _ = print_msg(file_path, &metadata);
        }

        #[cfg(debug_assertions)]
        {
            better_panic::Settings::auto()
                .most_recent_first(false)
                .lineno_suffix(true)
                .verbosity(better_panic::Verbosity::Full)
                .create_panic_handler()(panic_info);
        }

        std::process::exit(1);
    }));
    Ok(())
}
