//! Setup rules for the assistant.
//!
//! Each sentinel only fires if the assistant writes it. The rule text
//! produced here is pasted into the assistant's "Rules for AI" and tells it
//! which shell command to run and when.

use std::fmt;
use std::path::Path;

use crate::config::Config;
use crate::types::SentinelKind;

/// Shell the rule command is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    /// `sh -lc` on macOS and Linux.
    Posix,
    /// `powershell -command` on Windows.
    PowerShell,
}

impl Shell {
    /// Shell for the platform this binary was built for.
    #[must_use]
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::PowerShell
        } else {
            Self::Posix
        }
    }
}

impl fmt::Display for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Posix => f.write_str("sh"),
            Self::PowerShell => f.write_str("powershell"),
        }
    }
}

/// Rule text for `kind` on the current platform.
#[must_use]
pub fn rule_for(kind: SentinelKind, config: &Config) -> String {
    rule_for_shell(kind, config, Shell::current())
}

/// Rule text for `kind` written for `shell`.
///
/// The context rule quotes the configured threshold. Nothing checks the
/// threshold; the assistant decides when it is crossed.
#[must_use]
pub fn rule_for_shell(kind: SentinelKind, config: &Config, shell: Shell) -> String {
    let intro = match kind {
        SentinelKind::Task => "At the END of your turn, after you have completely finished all \
                               work and before ending your response, run this command to notify \
                               the user:"
            .to_string(),
        SentinelKind::Context => format!(
            "When the context window usage exceeds {}%, run this command to alert the user:",
            config.context_threshold
        ),
        SentinelKind::Confirmation => {
            "Before asking for confirmation to edit a file, run this command to alert the user:"
                .to_string()
        }
    };

    let target = shell_target(&config.sentinel(kind).flag_file, &config.home_dir, shell);
    let command = match shell {
        Shell::Posix => format!(
            "<!run:sh -lc \"echo \\\"$(date) :: {}\\\" > {target}\">",
            marker(kind)
        ),
        Shell::PowerShell => format!(
            "<!run:powershell -command \"$d=Get-Date; Set-Content -Path {target} -Value $d;\">"
        ),
    };

    format!("{intro}\n{command}")
}

/// Steps shown after the rule when printed from the CLI.
#[must_use]
pub fn setup_steps(kind: SentinelKind) -> &'static str {
    match kind {
        SentinelKind::Context => {
            "Next steps:\n\
             1. Open Cursor Settings (Cmd+, or Ctrl+,)\n\
             2. Click the \"Cursor Settings\" tab\n\
             3. Scroll to \"Rules for AI\"\n\
             4. Paste this rule along with your existing rules\n\n\
             Adjust the percentage with CURSOR_HELPER_CONTEXT_THRESHOLD."
        }
        _ => {
            "Next steps:\n\
             1. Open Cursor Settings (Cmd+, or Ctrl+,)\n\
             2. Click the \"Cursor Settings\" tab\n\
             3. Scroll to \"Rules for AI\"\n\
             4. Paste the rule\n\n\
             Run `cursor-helper test-notify` to check the alert."
        }
    }
}

fn marker(kind: SentinelKind) -> &'static str {
    match kind {
        SentinelKind::Task => "CURSOR_DONE",
        SentinelKind::Context => "CONTEXT_ALERT",
        SentinelKind::Confirmation => "FILE_CONFIRM",
    }
}

/// Writes the sentinel path relative to the shell's home variable when it
/// lives under the home directory.
fn shell_target(flag_file: &Path, home: &Path, shell: Shell) -> String {
    let Ok(relative) = flag_file.strip_prefix(home) else {
        return flag_file.display().to_string();
    };

    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    match shell {
        Shell::Posix => format!("$HOME/{}", parts.join("/")),
        Shell::PowerShell => format!("$env:USERPROFILE\\{}", parts.join("\\")),
    }
}
