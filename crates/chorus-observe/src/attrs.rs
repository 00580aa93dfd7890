//! Span names and log filter directives shared by the Chorus binaries.
//!
//! The engine spans in `chorus-core` use the same names so a single
//! `RUST_LOG` directive covers both.

/// Root span for one `chorus run` invocation.
pub const SPAN_RUN: &str = "chorus.run";

/// One orchestrator cycle.
pub const SPAN_CYCLE: &str = "chorus.cycle";

/// One reply round on an existing thread.
pub const SPAN_REPLY_ROUND: &str = "chorus.reply_round";

/// One character workflow inside a cycle.
pub const SPAN_WORKFLOW: &str = "chorus.workflow";

/// Crates whose targets the verbosity flags control.
pub const CHORUS_TARGETS: &[&str] = &["chorus_api", "chorus_core", "chorus_infra"];

/// Build an `EnvFilter` directive string for a verbosity level.
///
/// `quiet` keeps only errors. Otherwise 0 = warn, 1 = info, 2 = debug and
/// 3+ = trace for the Chorus crates; everything else stays at warn.
pub fn filter_directive(verbose: u8, quiet: bool) -> String {
    if quiet {
        return "error".to_string();
    }
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let mut directive = String::from("warn");
    for target in CHORUS_TARGETS {
        directive.push_str(&format!(",{target}={level}"));
    }
    directive
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_wins_over_verbose() {
        assert_eq!(filter_directive(3, true), "error");
    }

    #[test]
    fn verbosity_raises_chorus_targets_only() {
        let directive = filter_directive(2, false);
        assert!(directive.starts_with("warn,"));
        assert!(directive.contains("chorus_core=debug"));
        assert!(directive.contains("chorus_api=debug"));
    }

    #[test]
    fn span_names_share_prefix() {
        for name in [SPAN_RUN, SPAN_CYCLE, SPAN_REPLY_ROUND, SPAN_WORKFLOW] {
            assert!(name.starts_with("chorus."));
        }
    }
}
