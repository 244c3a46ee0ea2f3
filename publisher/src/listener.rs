/// Prefix of every progress line written to the build log.
pub const LOG_PREFIX: &str = "[InfluxDB Publisher]";

/// The live log stream of the build, where progress lines for the user end up.
pub trait TaskListener {
    fn println(&self, line: &str);

    fn log(&self, message: &str) {
        self.println(&format!("{LOG_PREFIX} {message}"));
    }
}

/// Writes progress lines to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleListener;

impl TaskListener for ConsoleListener {
    fn println(&self, line: &str) {
        println!("{line}");
    }
}
