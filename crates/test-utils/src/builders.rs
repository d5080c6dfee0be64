//! Shorthands for the commands the tests run.

use parallel_exec::exec::Command;

/// `true`: exits 0 immediately.
pub fn succeed() -> Command {
    Command::new("true")
}

/// `false`: exits 1 immediately.
pub fn fail() -> Command {
    Command::new("false")
}

/// `sleep <secs>`.
pub fn sleep(secs: f64) -> Command {
    Command::new("sleep").arg(secs.to_string())
}

/// `sh -c <script>`.
pub fn sh(script: &str) -> Command {
    Command::new("sh").args(["-c", script])
}

/// A command that can never be launched.
pub fn missing() -> Command {
    Command::new("/nonexistent/parallel-exec-test-binary")
}
