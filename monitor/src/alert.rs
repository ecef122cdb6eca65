//! User-facing alerts for sentinel events.
//!
//! [`Alerter`] is the [`ActivityHandler`] the `watch` command installs. For
//! each event it shows the configured message for the event's kind through a
//! [`Notifier`] and, when enabled, plays a sound through a [`SoundPlayer`].
//! Presentation failures are logged and never reach the watcher.
//!
//! Both capabilities are traits so tests (and other front ends) can swap in
//! their own implementations.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use chrono::Local;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::types::{SentinelKind, WatchEvent};
use crate::watcher::ActivityHandler;

/// macOS system sound used when no custom sound is configured.
const MACOS_DEFAULT_SOUND: &str = "/System/Library/Sounds/Glass.aiff";

/// freedesktop sound used on Linux when no custom sound is configured.
const LINUX_DEFAULT_SOUND: &str = "/usr/share/sounds/freedesktop/stereo/complete.oga";

/// Errors raised while presenting an alert.
#[derive(Error, Debug)]
pub enum AlertError {
    /// Writing the notification failed.
    #[error("failed to write notification: {0}")]
    Io(#[from] io::Error),

    /// The sound command could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The sound command exited unsuccessfully.
    #[error("{program} exited with {status}")]
    CommandFailed { program: String, status: ExitStatus },
}

/// Shows an alert message to the user.
pub trait Notifier: Send + Sync {
    /// Presents `message` for an event of `kind`.
    ///
    /// # Errors
    ///
    /// Returns an error if the message could not be shown.
    fn notify(&self, kind: SentinelKind, message: &str) -> Result<(), AlertError>;
}

/// Plays the alert sound.
pub trait SoundPlayer: Send + Sync {
    /// Plays `sound`, or the player's default when `None` or missing.
    ///
    /// # Errors
    ///
    /// Returns an error if playback fails.
    fn play(&self, sound: Option<&Path>) -> Result<(), AlertError>;

    /// Whether this player can make a sound on this machine.
    fn can_play(&self) -> bool;
}

/// Prints a timestamped line to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    fn format_line(kind: SentinelKind, message: &str) -> String {
        format!("[{}] {}: {message}", Local::now().format("%H:%M:%S"), kind.label())
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, kind: SentinelKind, message: &str) -> Result<(), AlertError> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", Self::format_line(kind, message))?;
        stdout.flush()?;
        Ok(())
    }
}

/// Platform families with a known sound command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundPlatform {
    MacOs,
    Linux,
    Windows,
}

impl SoundPlatform {
    /// Platform this binary was built for, if it has a sound command.
    #[must_use]
    pub fn current() -> Option<Self> {
        if cfg!(target_os = "macos") {
            Some(Self::MacOs)
        } else if cfg!(target_os = "linux") {
            Some(Self::Linux)
        } else if cfg!(windows) {
            Some(Self::Windows)
        } else {
            None
        }
    }
}

/// Plays sounds by running the platform's command line player.
///
/// | Platform | Custom sound | Default |
/// |----------|--------------|---------|
/// | macOS | `afplay <file>` | `afplay Glass.aiff` |
/// | Linux | `paplay <file>` | `paplay complete.oga` |
/// | Windows | `Media.SoundPlayer` | console beep |
///
/// A custom sound that does not exist falls back to the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSoundPlayer {
    platform: SoundPlatform,
}

impl CommandSoundPlayer {
    #[must_use]
    pub fn new(platform: SoundPlatform) -> Self {
        Self { platform }
    }

    /// Player for the current platform, if supported.
    #[must_use]
    pub fn detect() -> Option<Self> {
        SoundPlatform::current().map(Self::new)
    }

    /// Program and arguments that play `sound`.
    #[must_use]
    pub fn command_for(&self, sound: Option<&Path>) -> (String, Vec<String>) {
        let custom = sound.filter(|path| {
            let exists = path.exists();
            if !exists {
                warn!(path = %path.display(), "Sound file not found, using default");
            }
            exists
        });

        match self.platform {
            SoundPlatform::MacOs => {
                let file = custom.map_or_else(
                    || MACOS_DEFAULT_SOUND.to_string(),
                    |p| p.display().to_string(),
                );
                ("afplay".to_string(), vec![file])
            }
            SoundPlatform::Linux => {
                let file = custom.map_or_else(
                    || LINUX_DEFAULT_SOUND.to_string(),
                    |p| p.display().to_string(),
                );
                ("paplay".to_string(), vec![file])
            }
            SoundPlatform::Windows => {
                let script = match custom {
                    Some(p) => format!(
                        "(New-Object Media.SoundPlayer '{}').PlaySync();",
                        p.display().to_string().replace('\'', "''")
                    ),
                    None => "[console]::beep(800, 300)".to_string(),
                };
                ("powershell".to_string(), vec!["-c".to_string(), script])
            }
        }
    }
}

impl SoundPlayer for CommandSoundPlayer {
    fn play(&self, sound: Option<&Path>) -> Result<(), AlertError> {
        let (program, args) = self.command_for(sound);

        let status = match Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            Ok(status) => status,
            Err(e) if e.kind() == io::ErrorKind::NotFound && self.platform == SoundPlatform::Linux => {
                debug!(program = %program, "Sound player missing, using terminal bell");
                return BellSoundPlayer.play(None);
            }
            Err(source) => return Err(AlertError::Spawn { program, source }),
        };

        if !status.success() {
            return Err(AlertError::CommandFailed { program, status });
        }

        debug!(program = %program, "Sound played");
        Ok(())
    }

    fn can_play(&self) -> bool {
        true
    }
}

/// Rings the terminal bell.
#[derive(Debug, Clone, Copy, Default)]
pub struct BellSoundPlayer;

impl SoundPlayer for BellSoundPlayer {
    fn play(&self, _sound: Option<&Path>) -> Result<(), AlertError> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(b"\x07")?;
        stdout.flush()?;
        Ok(())
    }

    fn can_play(&self) -> bool {
        true
    }
}

/// Never makes a sound.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSoundPlayer;

impl SoundPlayer for NoopSoundPlayer {
    fn play(&self, _sound: Option<&Path>) -> Result<(), AlertError> {
        Ok(())
    }

    fn can_play(&self) -> bool {
        false
    }
}

/// Picks the best sound player for this machine.
#[must_use]
pub fn default_sound_player() -> Box<dyn SoundPlayer> {
    match CommandSoundPlayer::detect() {
        Some(player) => {
            debug!(platform = ?player.platform, "Using command sound player");
            Box::new(player)
        }
        None => {
            warn!("No sound player for this platform, alerts will be silent");
            Box::new(NoopSoundPlayer)
        }
    }
}

/// Presents sentinel events to the user.
pub struct Alerter {
    notifier: Box<dyn Notifier>,
    sound: Box<dyn SoundPlayer>,
    messages: [String; 3],
    play_sound: bool,
    sound_path: Option<PathBuf>,
}

impl std::fmt::Debug for Alerter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Alerter")
            .field("messages", &self.messages)
            .field("play_sound", &self.play_sound)
            .field("sound_path", &self.sound_path)
            .finish_non_exhaustive()
    }
}

impl Alerter {
    /// Creates an alerter using the messages and sound settings in `config`.
    pub fn new(
        config: &Config,
        notifier: Box<dyn Notifier>,
        sound: Box<dyn SoundPlayer>,
    ) -> Self {
        Self {
            notifier,
            sound,
            messages: SentinelKind::ALL.map(|kind| config.sentinel(kind).message.clone()),
            play_sound: config.play_sound,
            sound_path: config.sound_path.clone(),
        }
    }

    /// Console notifications and the platform sound player.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config, Box::new(ConsoleNotifier), default_sound_player())
    }

    /// Configured message for `kind`.
    #[must_use]
    pub fn message_for(&self, kind: SentinelKind) -> &str {
        let index = match kind {
            SentinelKind::Task => 0,
            SentinelKind::Context => 1,
            SentinelKind::Confirmation => 2,
        };
        &self.messages[index]
    }

    /// Shows the message for `event` and plays the sound.
    pub fn alert(&self, event: &WatchEvent) {
        let message = self.message_for(event.kind);

        if let Err(e) = self.notifier.notify(event.kind, message) {
            error!(kind = %event.kind, error = %e, "Failed to show notification");
        }

        if self.play_sound && self.sound.can_play() {
            if let Err(e) = self.sound.play(self.sound_path.as_deref()) {
                warn!(kind = %event.kind, error = %e, "Failed to play sound");
            }
        }
    }
}

impl ActivityHandler for Alerter {
    fn on_activity(&self, event: WatchEvent) {
        info!(
            kind = %event.kind,
            source = %event.source,
            path = %event.path.display(),
            "{} detected",
            event.kind.label()
        );
        debug!(payload = ?event.payload, "Sentinel payload");
        self.alert(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingNotifier {
        shown: Arc<Mutex<Vec<(SentinelKind, String)>>>,
        fail: bool,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, kind: SentinelKind, message: &str) -> Result<(), AlertError> {
            self.shown.lock().unwrap().push((kind, message.to_string()));
            if self.fail {
                return Err(AlertError::Io(io::Error::other("display gone")));
            }
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct RecordingPlayer {
        played: Arc<Mutex<Vec<Option<PathBuf>>>>,
    }

    impl SoundPlayer for RecordingPlayer {
        fn play(&self, sound: Option<&Path>) -> Result<(), AlertError> {
            self.played.lock().unwrap().push(sound.map(Path::to_path_buf));
            Ok(())
        }

        fn can_play(&self) -> bool {
            true
        }
    }

    fn event(kind: SentinelKind) -> WatchEvent {
        WatchEvent::new(kind, PathBuf::from("/tmp/flag"), Map::new())
    }

    fn config() -> Config {
        Config::with_home(Path::new("/home/ann"))
    }

    #[test]
    fn alert_uses_message_for_kind() {
        let notifier = RecordingNotifier::default();
        let player = RecordingPlayer::default();
        let alerter = Alerter::new(
            &config(),
            Box::new(notifier.clone()),
            Box::new(player.clone()),
        );

        alerter.on_activity(event(SentinelKind::Context));
        alerter.on_activity(event(SentinelKind::Confirmation));

        let shown = notifier.shown.lock().unwrap();
        assert_eq!(
            *shown,
            vec![
                (SentinelKind::Context, "Context window is nearing capacity".to_string()),
                (SentinelKind::Confirmation, "Cursor is asking to edit a file".to_string()),
            ]
        );
        assert_eq!(player.played.lock().unwrap().len(), 2);
    }

    #[test]
    fn sound_skipped_when_disabled() {
        let mut config = config();
        config.play_sound = false;
        let player = RecordingPlayer::default();
        let alerter = Alerter::new(
            &config,
            Box::new(RecordingNotifier::default()),
            Box::new(player.clone()),
        );

        alerter.alert(&event(SentinelKind::Task));
        assert!(player.played.lock().unwrap().is_empty());
    }

    #[test]
    fn custom_sound_path_is_passed_through() {
        let mut config = config();
        config.sound_path = Some(PathBuf::from("/sounds/ding.wav"));
        let player = RecordingPlayer::default();
        let alerter = Alerter::new(
            &config,
            Box::new(RecordingNotifier::default()),
            Box::new(player.clone()),
        );

        alerter.alert(&event(SentinelKind::Task));
        assert_eq!(
            *player.played.lock().unwrap(),
            vec![Some(PathBuf::from("/sounds/ding.wav"))]
        );
    }

    #[test]
    fn notifier_failure_still_plays_sound() {
        let notifier = RecordingNotifier {
            fail: true,
            ..Default::default()
        };
        let player = RecordingPlayer::default();
        let alerter = Alerter::new(&config(), Box::new(notifier), Box::new(player.clone()));

        alerter.alert(&event(SentinelKind::Task));
        assert_eq!(player.played.lock().unwrap().len(), 1);
    }

    #[test]
    fn noop_player_is_never_asked_to_play() {
        let alerter = Alerter::new(
            &config(),
            Box::new(RecordingNotifier::default()),
            Box::new(NoopSoundPlayer),
        );
        alerter.alert(&event(SentinelKind::Task));
        assert!(!NoopSoundPlayer.can_play());
    }

    #[test]
    fn macos_command_falls_back_to_default_sound() {
        let player = CommandSoundPlayer::new(SoundPlatform::MacOs);
        let (program, args) = player.command_for(Some(Path::new("/definitely/missing.aiff")));
        assert_eq!(program, "afplay");
        assert_eq!(args, vec![MACOS_DEFAULT_SOUND.to_string()]);
    }

    #[test]
    fn linux_command_uses_existing_custom_sound() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let player = CommandSoundPlayer::new(SoundPlatform::Linux);
        let (program, args) = player.command_for(Some(file.path()));
        assert_eq!(program, "paplay");
        assert_eq!(args, vec![file.path().display().to_string()]);

        let (_, args) = player.command_for(None);
        assert_eq!(args, vec![LINUX_DEFAULT_SOUND.to_string()]);
    }

    #[test]
    fn windows_command_beeps_without_sound_file() {
        let player = CommandSoundPlayer::new(SoundPlatform::Windows);
        let (program, args) = player.command_for(None);
        assert_eq!(program, "powershell");
        assert_eq!(args[1], "[console]::beep(800, 300)");

        let file = tempfile::NamedTempFile::new().unwrap();
        let (_, args) = player.command_for(Some(file.path()));
        assert!(args[1].starts_with("(New-Object Media.SoundPlayer '"));
    }

    #[test]
    fn console_line_includes_label_and_message() {
        let line = ConsoleNotifier::format_line(SentinelKind::Task, "Done");
        assert!(line.ends_with("] task complete: Done"));
        assert!(line.starts_with('['));
    }
}
