// Copyright (c) 2026 rezky_nightky

mod canvas;
mod cell;
mod color;
mod config;
mod frame;
mod lightning;
mod logging;
mod rain;
mod runtime;
mod storm;
mod surface;
mod terminal;
mod thunder;

use std::env;
use std::time::{Duration, Instant};

#[cfg(unix)]
use std::thread;

use clap::builder::styling::{AnsiColor as ClapAnsiColor, Color as ClapColor};
use clap::builder::styling::{Effects as ClapEffects, Style as ClapStyle};
use clap::builder::Styles as ClapStyles;
use clap::{CommandFactory, FromArgMatches};
use color_eyre::eyre::{Result, WrapErr as _};
use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers};

#[cfg(unix)]
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
#[cfg(unix)]
use signal_hook::iterator::Signals;

use crate::canvas::Canvas;
use crate::config::{
    color_enabled_stdout, default_params_usage_for_help, print_help_detail, Args, StormSettings,
};
use crate::frame::Frame;
use crate::runtime::ColorMode;
use crate::storm::Storm;
use crate::surface::Surface;
use crate::terminal::{restore_terminal_best_effort, Terminal};
use crate::thunder::{CommandThunder, Silent, Thunder};

const HELP_TEMPLATE_PLAIN: &str = "\
{before-help}{about-with-newline}
USAGE:
  {usage}

{all-args}{after-help}";

const HELP_TEMPLATE_COLOR: &str = "\
{before-help}{about-with-newline}
\x1b[1;36mUSAGE:\x1b[0m
  {usage}

{all-args}{after-help}";

fn clap_styles() -> ClapStyles {
    ClapStyles::styled()
        .header(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Cyan))),
        )
        .usage(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Green))),
        )
        .literal(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Yellow))))
        .placeholder(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Magenta))))
}

fn require_f64_range(name: &str, v: f64, min: f64, max: f64) -> f64 {
    if !v.is_finite() {
        eprintln!("failed to apply {} {} (must be a finite number)", name, v);
        std::process::exit(1);
    }
    if v < min || v > max {
        eprintln!("failed to apply {} {} (min {} max {})", name, v, min, max);
        std::process::exit(1);
    }
    v
}

fn require_f32_range(name: &str, v: f32, min: f32, max: f32) -> f32 {
    require_f64_range(name, f64::from(v), f64::from(min), f64::from(max)) as f32
}

fn require_u16_range(name: &str, v: u16, min: u16, max: u16) -> u16 {
    if v < min || v > max {
        eprintln!("failed to apply {} {} (min {} max {})", name, v, min, max);
        std::process::exit(1);
    }
    v
}

fn detect_color_mode_auto() -> ColorMode {
    let colorterm = env::var("COLORTERM")
        .unwrap_or_default()
        .to_ascii_lowercase();
    if colorterm.contains("truecolor") || colorterm.contains("24bit") {
        return ColorMode::TrueColor;
    }

    let term = env::var("TERM").unwrap_or_default().to_ascii_lowercase();
    if term == "dumb" {
        return ColorMode::Mono;
    }
    ColorMode::Color256
}

fn detect_color_mode(args: &Args) -> ColorMode {
    match args.colormode {
        None => detect_color_mode_auto(),
        Some(0) => ColorMode::Mono,
        Some(16) => ColorMode::Color16,
        Some(8) | Some(256) => ColorMode::Color256,
        Some(24) | Some(32) => ColorMode::TrueColor,
        Some(m) => {
            eprintln!("invalid --colormode: {} (allowed: 0,16,8,256,24,32)", m);
            std::process::exit(1);
        }
    }
}

fn color_mode_label(m: ColorMode) -> &'static str {
    match m {
        ColorMode::TrueColor => "24-bit truecolor",
        ColorMode::Color256 => "8-bit (256-color)",
        ColorMode::Color16 => "16-color",
        ColorMode::Mono => "mono",
    }
}

fn install_exit_handlers() {
    let eyre_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        restore_terminal_best_effort();
        eyre_hook(info);
    }));

    #[cfg(unix)]
    {
        if let Ok(mut signals) = Signals::new([SIGINT, SIGTERM, SIGHUP]) {
            thread::spawn(move || {
                if let Some(sig) = signals.forever().next() {
                    restore_terminal_best_effort();
                    std::process::exit(128 + sig);
                }
            });
        }
    }

    #[cfg(windows)]
    {
        if let Err(e) = ctrlc::set_handler(|| {
            restore_terminal_best_effort();
            std::process::exit(130);
        }) {
            eprintln!("failed to install Ctrl-C handler: {}", e);
        }
    }
}

fn parse_args() -> Args {
    let mut cmd = Args::command();
    cmd = cmd.styles(clap_styles());
    cmd = cmd.before_help(default_params_usage_for_help());
    let help_template = if color_enabled_stdout() {
        HELP_TEMPLATE_COLOR
    } else {
        HELP_TEMPLATE_PLAIN
    };
    cmd = cmd.help_template(help_template);
    cmd.build();

    if cmd.get_arguments().any(|a| a.get_id().as_str() == "help") {
        cmd = cmd.mut_arg("help", |a| a.help_heading("HELP"));
    }

    let matches = cmd.get_matches();
    Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
}

fn main() -> Result<()> {
    color_eyre::install()?;
    install_exit_handlers();

    let args = parse_args();

    if args.help_detail {
        print_help_detail();
        return Ok(());
    }

    if args.check_bitcolor {
        let colorterm = env::var("COLORTERM").unwrap_or_default();
        let term = env::var("TERM").unwrap_or_default();
        let effective = detect_color_mode(&args);

        println!("BITCOLOR CHECK:");
        println!(
            "  COLORTERM: {}",
            if colorterm.is_empty() {
                "(unset)"
            } else {
                &colorterm
            }
        );
        println!(
            "  TERM: {}",
            if term.is_empty() { "(unset)" } else { &term }
        );
        println!("  auto_detected: {}", color_mode_label(detect_color_mode_auto()));
        println!("  effective: {}", color_mode_label(effective));
        return Ok(());
    }

    if args.version {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if args.info {
        println!("Version: v{}", env!("CARGO_PKG_VERSION"));
        println!("Build: {}", env!("RAINSTORM_BUILD"));
        let sha = env!("RAINSTORM_GIT_SHA");
        if !sha.is_empty() {
            println!("Commit: {}", sha);
        }
        println!("License: {}", env!("CARGO_PKG_LICENSE"));
        println!("Source: {}", env!("CARGO_PKG_REPOSITORY"));
        return Ok(());
    }

    let color_mode = detect_color_mode(&args);
    let target_fps = require_f64_range("--fps", args.fps, 1.0, 240.0);
    let duration_s = args
        .duration
        .filter(|s| !s.is_finite() || *s > 0.0)
        .map(|s| require_f64_range("--duration", s, 0.1, 86400.0));
    let area_per_droplet = require_f32_range("--density", args.density, 100.0, 100_000.0);
    let scale = require_u16_range("--scale", u16::from(args.scale), 1, 16);
    require_f32_range("--wind", args.wind, -10.0, 10.0);
    require_f32_range("--rain-speed", args.rain_speed, 0.0, 10.0);
    require_u16_range("--drop-size", args.drop_size, 1, 10);

    logging::setup_logging(args.log_path.clone(), args.log_level)
        .wrap_err("Couldn't set up logging")?;

    let thunder: Box<dyn Thunder> = match &args.thunder_dir {
        Some(dir) => Box::new(CommandThunder::from_dir(dir, &args.thunder_player)?),
        None => Box::new(Silent),
    };

    let mut settings = StormSettings::from_args(&args);

    let mut term = Terminal::new()?;
    let (cols, rows) = term.size()?;
    let mut canvas = Canvas::new(cols, rows, f32::from(scale), settings.background);
    let mut frame = Frame::new(cols, rows);

    let mut storm = Storm::new(
        canvas.width(),
        canvas.height(),
        area_per_droplet,
        &settings,
        thunder,
        args.seed,
    );
    if args.no_lightning {
        storm.set_lightning_auto_mode(false);
    }
    tracing::info!(
        cols,
        rows,
        droplets = storm.rain.len(),
        color_mode = color_mode_label(color_mode),
        background = %settings.background.to_hex(),
        rain_color = %settings.rain_color.to_hex(),
        "storm started"
    );

    let start_time = Instant::now();
    let end_time = duration_s.map(|s| start_time + Duration::from_secs_f64(s));

    let target_period = Duration::from_secs_f64(1.0 / target_fps);
    let mut next_frame = Instant::now();
    let mut running = true;
    let mut paused = false;

    while running {
        if end_time.is_some_and(|end| Instant::now() >= end) {
            break;
        }
        let mut pending_resize: Option<(u16, u16)> = None;

        loop {
            while Terminal::poll_event(Duration::from_millis(0))? {
                match Terminal::read_event()? {
                    Event::Resize(nw, nh) => {
                        pending_resize = Some((nw, nh));
                    }
                    Event::Key(k) if k.kind == KeyEventKind::Press => match (k.code, k.modifiers) {
                        (KeyCode::Char('c'), KeyModifiers::CONTROL) => running = false,
                        (KeyCode::Esc, _) | (KeyCode::Char('q'), _) => running = false,
                        (KeyCode::Char(' '), _) | (KeyCode::Char('l'), _) => {
                            storm.trigger_lightning_now()
                        }
                        (KeyCode::Char('o'), _) => storm.set_lightning_auto_mode(true),
                        (KeyCode::Char('x'), _) => storm.set_lightning_auto_mode(false),
                        (KeyCode::Char('a'), _) => {
                            storm.set_lightning_auto_mode(!storm.lightning.auto_mode())
                        }
                        (KeyCode::Left, _) => settings.nudge_wind(-1),
                        (KeyCode::Right, _) => settings.nudge_wind(1),
                        (KeyCode::Up, _) => settings.nudge_rain_speed(1),
                        (KeyCode::Down, _) => settings.nudge_rain_speed(-1),
                        (KeyCode::Char('+'), _) | (KeyCode::Char('='), _) => {
                            settings.nudge_drop_size(1)
                        }
                        (KeyCode::Char('-'), _) => settings.nudge_drop_size(-1),
                        (KeyCode::Char('p'), _) => paused = !paused,
                        (KeyCode::Char('r'), _) => storm.rain.repopulate(&settings),
                        _ => {}
                    },
                    _ => {}
                }
            }

            if !running || pending_resize.is_some() {
                break;
            }

            let now = Instant::now();
            if now >= next_frame {
                break;
            }

            let mut timeout = next_frame - now;
            if let Some(end) = end_time {
                if now >= end {
                    break;
                }
                timeout = timeout.min(end - now);
            }
            let _ = Terminal::poll_event(timeout)?;
        }

        if !running {
            break;
        }

        if let Some((nw, nh)) = pending_resize {
            canvas.resize(nw, nh, settings.background);
            frame = Frame::new(nw, nh);
            storm.resize(canvas.width(), canvas.height(), &settings);
            tracing::debug!(cols = nw, rows = nh, droplets = storm.rain.len(), "resized");
        }

        if !paused {
            storm.tick(&settings, &mut canvas);
        }
        if !paused || pending_resize.is_some() {
            canvas.present(&mut frame, color_mode);
        }
        if frame.is_dirty_all() || !frame.dirty_indices().is_empty() {
            term.draw(&mut frame)?;
        }

        next_frame += target_period;
        let now = Instant::now();
        if now > next_frame {
            next_frame = now;
        }
    }

    tracing::info!(elapsed_s = start_time.elapsed().as_secs_f64(), "storm stopped");
    Ok(())
}
