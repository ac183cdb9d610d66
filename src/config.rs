// Copyright (c) 2026 rezky_nightky

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::Parser;

use crate::color::Rgb;
use crate::rain::DEFAULT_AREA_PER_DROPLET;

pub const DEFAULT_PARAMS_USAGE: &str = "DEFAULT PARAMS USAGE:\n  rainstorm --wind 0 --rain-speed 1 --drop-size 3 --background #0b1020 --rain-color #9fb8d8 --fps 60 --scale 4 --density 2000 --log-level warn";

pub const WIND_RANGE: (f32, f32) = (-10.0, 10.0);
pub const RAIN_SPEED_RANGE: (f32, f32) = (0.0, 10.0);
pub const DROP_SIZE_RANGE: (u16, u16) = (1, 10);

const WIND_STEP: f32 = 0.5;
const RAIN_SPEED_STEP: f32 = 0.25;

/// Live storm controls. Owned by the host and handed to the scene by shared
/// reference every frame; any field may change between two frames.
#[derive(Clone, Debug, PartialEq)]
pub struct StormSettings {
    pub wind_speed: f32,
    pub rain_speed: f32,
    pub max_drop_size: u16,
    pub background: Rgb,
    pub rain_color: Rgb,
}

impl Default for StormSettings {
    fn default() -> Self {
        Self {
            wind_speed: 0.0,
            rain_speed: 1.0,
            max_drop_size: 3,
            background: Rgb::new(0x0b, 0x10, 0x20),
            rain_color: Rgb::new(0x9f, 0xb8, 0xd8),
        }
    }
}

impl StormSettings {
    pub fn from_args(args: &Args) -> Self {
        Self {
            wind_speed: args.wind,
            rain_speed: args.rain_speed,
            max_drop_size: args.drop_size,
            background: args.background,
            rain_color: args.rain_color,
        }
    }

    pub fn nudge_wind(&mut self, steps: i8) {
        self.wind_speed =
            (self.wind_speed + WIND_STEP * f32::from(steps)).clamp(WIND_RANGE.0, WIND_RANGE.1);
        tracing::debug!(wind_speed = self.wind_speed, "wind changed");
    }

    pub fn nudge_rain_speed(&mut self, steps: i8) {
        self.rain_speed = (self.rain_speed + RAIN_SPEED_STEP * f32::from(steps))
            .clamp(RAIN_SPEED_RANGE.0, RAIN_SPEED_RANGE.1);
        tracing::debug!(rain_speed = self.rain_speed, "rain speed changed");
    }

    pub fn nudge_drop_size(&mut self, steps: i8) {
        let next = i32::from(self.max_drop_size) + i32::from(steps);
        let (lo, hi) = (i32::from(DROP_SIZE_RANGE.0), i32::from(DROP_SIZE_RANGE.1));
        self.max_drop_size = next.clamp(lo, hi) as u16;
        tracing::debug!(max_drop_size = self.max_drop_size, "max drop size changed");
    }
}

pub fn color_enabled_stdout() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if matches!(std::env::var("CLICOLOR").ok().as_deref(), Some("0")) {
        return false;
    }
    std::io::stdout().is_terminal()
}

fn colorize_help_detail(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 64);
    for chunk in text.split_inclusive('\n') {
        let (line, nl) = chunk
            .strip_suffix('\n')
            .map(|l| (l, "\n"))
            .unwrap_or((chunk, ""));

        let is_heading =
            !line.starts_with(' ') && line.ends_with(':') && line == line.to_ascii_uppercase();

        if is_heading {
            out.push_str(&format!("\x1b[1;36m{}\x1b[0m{}", line, nl));
        } else if let Some(rest) = line.strip_prefix("      Example:") {
            out.push_str(&format!("      \x1b[32mExample:\x1b[0m{}{}", rest, nl));
        } else if let Some(rest) = line.strip_prefix("  rainstorm") {
            out.push_str(&format!("  \x1b[1;34mrainstorm\x1b[0m{}{}", rest, nl));
        } else if let Some(rest) = line.strip_prefix("  -") {
            out.push_str(&format!("  \x1b[33m-{}\x1b[0m{}", rest, nl));
        } else {
            out.push_str(line);
            out.push_str(nl);
        }
    }
    out
}

pub fn default_params_usage_for_help() -> String {
    if color_enabled_stdout() {
        colorize_help_detail(DEFAULT_PARAMS_USAGE)
    } else {
        DEFAULT_PARAMS_USAGE.to_string()
    }
}

/// The valid log levels, mirroring `tracing`'s.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
    Off,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "rainstorm", version, disable_version_flag = true)]
pub struct Args {
    #[arg(
        short = 'w',
        long = "wind",
        default_value_t = 0.0,
        allow_negative_numbers = true,
        help_heading = "STORM",
        help = "Wind speed, negative blows left (min -10 max 10)"
    )]
    pub wind: f32,

    #[arg(
        short = 'r',
        long = "rain-speed",
        default_value_t = 1.0,
        help_heading = "STORM",
        help = "Fall speed multiplier (min 0 max 10)"
    )]
    pub rain_speed: f32,

    #[arg(
        short = 'z',
        long = "drop-size",
        default_value_t = 3,
        help_heading = "STORM",
        help = "Largest droplet edge in canvas units (min 1 max 10)"
    )]
    pub drop_size: u16,

    #[arg(
        short = 'B',
        long = "background",
        default_value = "#0b1020",
        help_heading = "STORM",
        help = "Background color as #rrggbb"
    )]
    pub background: Rgb,

    #[arg(
        short = 'C',
        long = "rain-color",
        default_value = "#9fb8d8",
        help_heading = "STORM",
        help = "Rain color as #rrggbb"
    )]
    pub rain_color: Rgb,

    #[arg(
        long = "no-lightning",
        help_heading = "STORM",
        help = "Start with automatic lightning switched off"
    )]
    pub no_lightning: bool,

    #[arg(
        short = 'd',
        long = "density",
        default_value_t = DEFAULT_AREA_PER_DROPLET,
        help_heading = "PERFORMANCE",
        help = "Canvas area per droplet, lower is denser (min 100 max 100000)"
    )]
    pub density: f32,

    #[arg(
        long = "scale",
        default_value_t = 4,
        help_heading = "PERFORMANCE",
        help = "Canvas units per half-block pixel (min 1 max 16)"
    )]
    pub scale: u8,

    #[arg(
        short = 'f',
        long = "fps",
        default_value_t = 60.0,
        help_heading = "PERFORMANCE",
        help = "Target FPS (min 1 max 240)"
    )]
    pub fps: f64,

    #[arg(
        long = "duration",
        help_heading = "GENERAL",
        help = "Stop after N seconds (min 0.1 max 86400; <=0 disables)"
    )]
    pub duration: Option<f64>,

    #[arg(
        long = "seed",
        help_heading = "GENERAL",
        help = "Seed the random generators for a repeatable storm"
    )]
    pub seed: Option<u64>,

    #[arg(
        long = "colormode",
        help_heading = "APPEARANCE",
        help = "Force color mode (allowed: 0,16,8/256,24/32). Default: 24-bit if supported (COLORTERM), else 8-bit"
    )]
    pub colormode: Option<u16>,

    #[arg(
        long = "thunder-dir",
        help_heading = "THUNDER",
        help = "Directory of thunder clips (wav, ogg, oga, mp3, flac) played on each strike"
    )]
    pub thunder_dir: Option<PathBuf>,

    #[arg(
        long = "thunder-player",
        default_value = "paplay --volume={volume}",
        help_heading = "THUNDER",
        help = "Player command; {volume} is 0..65536, {gain} is 0..1, the clip path is appended"
    )]
    pub thunder_player: String,

    #[arg(
        long = "log-level",
        value_enum,
        default_value_t = LogLevel::Warn,
        help_heading = "LOGGING",
        help = "Log level written to the log file (RAINSTORM_LOG overrides)"
    )]
    pub log_level: LogLevel,

    #[arg(
        long = "log-path",
        help_heading = "LOGGING",
        help = "Log file path (default: <state dir>/rainstorm/rainstorm.log)"
    )]
    pub log_path: Option<PathBuf>,

    #[arg(
        long = "check-bitcolor",
        help_heading = "HELP",
        help = "Print detected terminal color capability and exit"
    )]
    pub check_bitcolor: bool,

    #[arg(
        long = "help-detail",
        help_heading = "HELP",
        help = "Show detailed help for all parameters and exit"
    )]
    pub help_detail: bool,

    #[arg(
        long = "info",
        short = 'i',
        help_heading = "HELP",
        help = "Print version info and exit"
    )]
    pub info: bool,

    #[arg(
        long = "version",
        short = 'v',
        help_heading = "HELP",
        help = "Print version and exit"
    )]
    pub version: bool,
}

const HELP_DETAIL: &str = "\
USAGE:
  rainstorm [OPTIONS]

STORM:
  -w, --wind <number>
      Wind speed in canvas units per frame (min -10 max 10).
      Example: rainstorm --wind -2.5

  -r, --rain-speed <number>
      Fall speed multiplier (min 0 max 10).
      Example: rainstorm --rain-speed 2

  -z, --drop-size <number>
      Largest droplet edge (min 1 max 10).
      Example: rainstorm --drop-size 6

  -B, --background <#rrggbb>
      Background color; the scene fades toward it every frame.
      Example: rainstorm --background #101010

  -C, --rain-color <#rrggbb>
      Droplet color.
      Example: rainstorm --rain-color #c0d8ff

  --no-lightning
      Start with automatic lightning off (flash manually with space).
      Example: rainstorm --no-lightning

PERFORMANCE:
  -d, --density <number>
      Canvas area per droplet (min 100 max 100000).
      Example: rainstorm --density 1000

  --scale <number>
      Canvas units per half-block pixel (min 1 max 16).
      Example: rainstorm --scale 2

  -f, --fps <number>
      Target FPS (min 1 max 240).
      Example: rainstorm --fps 30

GENERAL:
  --duration <seconds>
      Stop after N seconds (min 0.1 max 86400).
      Example: rainstorm --duration 10

  --seed <number>
      Repeatable randomness.
      Example: rainstorm --seed 42

THUNDER:
  --thunder-dir <path>
      Play a random clip from this directory on every strike.
      Example: rainstorm --thunder-dir ~/sounds/thunder

  --thunder-player <command>
      Player invocation, clip path appended.
      Example: rainstorm --thunder-player \"play -q -v {gain}\"

LOGGING:
  --log-level <error|warn|info|debug|trace|off>
      Example: rainstorm --log-level debug

  --log-path <path>
      Example: rainstorm --log-path /tmp/rainstorm.log

KEYS:
  space, l     flash lightning now
  o / x        automatic lightning on / off
  a            toggle automatic lightning
  left/right   wind
  up/down      rain speed
  + / -        max drop size
  p            pause
  r            regenerate rain
  q, esc       quit
";

pub fn print_help_detail() {
    let block = format!("{}\n\n{}", DEFAULT_PARAMS_USAGE, HELP_DETAIL);
    if color_enabled_stdout() {
        print!("{}", colorize_help_detail(&block));
    } else {
        print!("{}", block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_storm_settings_defaults() {
        let args = Args::try_parse_from(["rainstorm"]).unwrap();
        assert_eq!(StormSettings::from_args(&args), StormSettings::default());
        assert_eq!(args.density, 2000.0);
        assert_eq!(args.log_level, LogLevel::Warn);
        assert!(!args.no_lightning);
    }

    #[test]
    fn colors_and_negative_wind_parse() {
        let args = Args::try_parse_from([
            "rainstorm",
            "--wind",
            "-2.5",
            "--rain-color",
            "#336699",
            "--background",
            "000000",
        ])
        .unwrap();
        let s = StormSettings::from_args(&args);
        assert_eq!(s.wind_speed, -2.5);
        assert_eq!(s.rain_color, Rgb::new(51, 102, 153));
        assert_eq!(s.background, Rgb::new(0, 0, 0));
    }

    #[test]
    fn malformed_color_is_rejected() {
        assert!(Args::try_parse_from(["rainstorm", "--rain-color", "blue"]).is_err());
    }

    #[test]
    fn nudges_clamp_to_slider_ranges() {
        let mut s = StormSettings::default();
        for _ in 0..50 {
            s.nudge_wind(1);
            s.nudge_rain_speed(-1);
            s.nudge_drop_size(1);
        }
        assert_eq!(s.wind_speed, WIND_RANGE.1);
        assert_eq!(s.rain_speed, RAIN_SPEED_RANGE.0);
        assert_eq!(s.max_drop_size, DROP_SIZE_RANGE.1);

        s.nudge_drop_size(-100);
        assert_eq!(s.max_drop_size, DROP_SIZE_RANGE.0);
    }

    #[test]
    fn colorized_help_wraps_headings() {
        let out = colorize_help_detail("KEYS:\n  plain\n");
        assert!(out.starts_with("\x1b[1;36mKEYS:\x1b[0m\n"));
        assert!(out.ends_with("  plain\n"));
    }
}
