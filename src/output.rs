//! # Terminal Output
//!
//! Status-line helpers for the `docker-hadoop` binary. Emojis and colour are
//! used only when the terminal and the user allow them:
//!
//! - `--color=always|never|auto` on the command line
//! - `NO_COLOR` (any value) disables colour in auto mode
//! - `CLICOLOR=0` disables colour, `CLICOLOR_FORCE=1` forces it
//! - `TERM=dumb` disables colour
//!
//! ```rust,ignore
//! use docker_hadoop::output::{mark, Mark, OutputConfig};
//!
//! let out = OutputConfig::from_env_and_flag("auto");
//! println!("{} Provisioning cluster", mark(&out, Mark::Start));
//! ```

use std::env;

use console::style;

/// Whether the current invocation may use colour and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub use_color: bool,
}

impl OutputConfig {
    /// Resolves the `--color` flag against the environment.
    ///
    /// `always` and `never` are absolute; anything else falls back to
    /// environment and TTY detection.
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };
        Self { use_color }
    }

    fn detect_color_support() -> bool {
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }
        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }
        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }
        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }
        console::Term::stdout().features().colors_supported()
    }

    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Returns `emoji_str` when colour is enabled and `plain` otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// Prefixes used on status lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Start,
    Plan,
    Done,
    Skip,
    Fail,
    Write,
    Tree,
}

/// The prefix for `kind`, honouring the colour setting.
pub fn mark(config: &OutputConfig, kind: Mark) -> &'static str {
    match kind {
        Mark::Start => emoji(config, "🚀", "[START]"),
        Mark::Plan => emoji(config, "📋", "[PLAN]"),
        Mark::Done => emoji(config, "✅", "[OK]"),
        Mark::Skip => emoji(config, "⏭️", "[SKIP]"),
        Mark::Fail => emoji(config, "❌", "[ERR]"),
        Mark::Write => emoji(config, "📝", "[WRITE]"),
        Mark::Tree => emoji(config, "🌳", "[TREE]"),
    }
}

/// Formats `count` in bold when colour is enabled.
pub fn count(config: &OutputConfig, count: usize) -> String {
    if config.use_color {
        style(count).bold().to_string()
    } else {
        count.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_always() {
        assert!(OutputConfig::from_env_and_flag("always").use_color);
    }

    #[test]
    fn test_color_never() {
        assert!(!OutputConfig::from_env_and_flag("NEVER").use_color);
    }

    #[test]
    fn test_marks_fall_back_to_plain_text() {
        let out = OutputConfig::without_color();
        assert_eq!(mark(&out, Mark::Done), "[OK]");
        assert_eq!(mark(&out, Mark::Skip), "[SKIP]");
        assert_eq!(count(&out, 3), "3");
    }

    #[test]
    fn test_marks_use_emoji_with_color() {
        let out = OutputConfig::with_color();
        assert_eq!(mark(&out, Mark::Fail), "❌");
        assert_eq!(emoji(&out, "🔍", "[SCAN]"), "🔍");
    }
}
