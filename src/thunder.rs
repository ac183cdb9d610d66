// Copyright (c) 2026 rezky_nightky

//! Thunder sound effects. Playback is fire-and-forget: the render loop only
//! ever calls [`Thunder::request_playback`], which returns immediately.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::thread;

use color_eyre::eyre::{bail, eyre, Result, WrapErr as _};
use rand::Rng as _;

const CLIP_EXTENSIONS: [&str; 5] = ["wav", "ogg", "oga", "mp3", "flac"];

const MIN_GAIN: f32 = 0.3;
const MAX_GAIN: f32 = 0.7;

/// `paplay` treats 65536 as 100% volume.
const FULL_VOLUME: f32 = 65536.0;

pub trait Thunder: Send {
    fn request_playback(&self);
}

/// No sound at all.
pub struct Silent;

impl Thunder for Silent {
    fn request_playback(&self) {}
}

/// Plays a random clip from a directory through an external player command.
pub struct CommandThunder {
    clips: Arc<Vec<PathBuf>>,
    player: Arc<Vec<String>>,
}

impl CommandThunder {
    pub fn from_dir(dir: &Path, player: &str) -> Result<Self> {
        let player: Vec<String> = player.split_whitespace().map(str::to_owned).collect();
        if player.is_empty() {
            bail!("thunder player command is empty");
        }

        let entries = std::fs::read_dir(dir)
            .wrap_err_with(|| format!("Couldn't read thunder directory {}", dir.display()))?;
        let mut clips = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_clip = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| CLIP_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
            if is_clip && path.is_file() {
                clips.push(path);
            }
        }
        clips.sort();

        if clips.is_empty() {
            bail!("No thunder clips found in {}", dir.display());
        }
        tracing::info!(count = clips.len(), dir = %dir.display(), "thunder clips loaded");

        Ok(Self {
            clips: Arc::new(clips),
            player: Arc::new(player),
        })
    }

    #[cfg(test)]
    pub fn clips(&self) -> &[PathBuf] {
        &self.clips
    }
}

/// Expands `{volume}` and `{gain}` in the player template and appends the clip.
fn player_command(player: &[String], clip: &Path, gain: f32) -> Result<Command> {
    let (program, args) = player
        .split_first()
        .ok_or_else(|| eyre!("thunder player command is empty"))?;
    let volume = ((gain * FULL_VOLUME).round() as u32).to_string();
    let gain = format!("{gain:.2}");

    let mut cmd = Command::new(program);
    for arg in args {
        cmd.arg(arg.replace("{volume}", &volume).replace("{gain}", &gain));
    }
    cmd.arg(clip)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    Ok(cmd)
}

fn play_random_clip(clips: &[PathBuf], player: &[String]) -> Result<()> {
    let mut rng = rand::rng();
    if clips.is_empty() {
        bail!("no thunder clips to choose from");
    }
    let clip = &clips[rng.random_range(0..clips.len())];
    let gain = rng.random_range(MIN_GAIN..MAX_GAIN);

    let meta = std::fs::metadata(clip)
        .wrap_err_with(|| format!("Couldn't open thunder clip {}", clip.display()))?;
    if meta.len() == 0 {
        bail!("Thunder clip {} is empty", clip.display());
    }

    let status = player_command(player, clip, gain)?
        .status()
        .wrap_err("Couldn't start thunder player")?;
    if !status.success() {
        bail!("Thunder player exited with {status}");
    }
    tracing::trace!(clip = %clip.display(), gain, "thunder played");
    Ok(())
}

impl Thunder for CommandThunder {
    fn request_playback(&self) {
        let clips = Arc::clone(&self.clips);
        let player = Arc::clone(&self.player);
        let spawned = thread::Builder::new()
            .name("thunder".into())
            .spawn(move || {
                if let Err(error) = play_random_clip(&clips, &player) {
                    tracing::warn!("Thunder playback failed: {error:?}");
                }
            });
        if let Err(error) = spawned {
            tracing::warn!("Couldn't spawn thunder thread: {error:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_owned).collect()
    }

    #[test]
    fn from_dir_collects_only_audio_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.WAV"), b"x").unwrap();
        std::fs::write(dir.path().join("a.ogg"), b"x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("c.mp3")).unwrap();

        let thunder = CommandThunder::from_dir(dir.path(), "paplay").unwrap();
        let names: Vec<_> = thunder
            .clips()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.ogg", "b.WAV"]);
    }

    #[test]
    fn from_dir_without_clips_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CommandThunder::from_dir(dir.path(), "paplay").is_err());
        assert!(CommandThunder::from_dir(&dir.path().join("missing"), "paplay").is_err());
    }

    #[test]
    fn empty_player_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.wav"), b"x").unwrap();
        assert!(CommandThunder::from_dir(dir.path(), "   ").is_err());
    }

    #[test]
    fn player_template_expands_volume_and_gain() {
        let cmd = player_command(
            &player("paplay --volume={volume} -g {gain}"),
            Path::new("/tmp/clap.wav"),
            0.5,
        )
        .unwrap();
        assert_eq!(cmd.get_program(), "paplay");
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, vec!["--volume=32768", "-g", "0.50", "/tmp/clap.wav"]);
    }

    #[test]
    fn playback_failures_are_reported_not_panicked() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.wav");
        std::fs::write(&empty, b"").unwrap();
        assert!(play_random_clip(&[empty], &player("true")).is_err());
        assert!(play_random_clip(&[dir.path().join("gone.wav")], &player("true")).is_err());
        assert!(play_random_clip(&[], &player("true")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn request_playback_returns_before_the_player_finishes() {
        let dir = tempfile::tempdir().unwrap();
        let clip = dir.path().join("rumble.wav");
        std::fs::write(&clip, b"RIFF").unwrap();
        let thunder = CommandThunder {
            clips: Arc::new(vec![clip]),
            player: Arc::new(player("timeout 2 tail -f")),
        };

        let started = std::time::Instant::now();
        thunder.request_playback();
        assert!(started.elapsed() < std::time::Duration::from_millis(500));
    }
}
