use std::env;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};

mod audio;
mod config;
mod library;
mod player;
mod ui;

use crate::config::Settings;
use library::Playlist;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("segue: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let mut settings = load_settings();
    let args: Vec<String> = env::args().skip(1).collect();

    match args.as_slice() {
        [flag] if flag == "--help" || flag == "-h" || flag == "-?" => {
            print_help();
            Ok(ExitCode::SUCCESS)
        }
        [flag] if flag == "--version" || flag == "-v" => {
            println!("segue {}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::SUCCESS)
        }
        [verb, dir] if verb == "path" => {
            settings.library.root = dir.clone();
            let written = settings.save().context("failed to save config")?;
            println!("music path set to {dir} ({})", written.display());
            Ok(ExitCode::SUCCESS)
        }
        [dot] if dot == "." => {
            let main_list = library::load_main_playlist();
            if main_list.is_empty() {
                println!(
                    "The main playlist is empty. Add a track by pressing 'a' while it plays."
                );
                return Ok(ExitCode::FAILURE);
            }
            let mut queue = main_list.clone();
            if settings.playback.shuffle_on_main {
                queue.shuffle(&mut rand::rng());
            }
            session(settings, queue, main_list, true)
        }
        [] => {
            if settings.library.root.is_empty() {
                println!("No music path configured.");
                println!("Set one with: segue path \"/path/to/Music\"");
                return Ok(ExitCode::FAILURE);
            }
            let tracks = library::scan(Path::new(&settings.library.root), &settings.library);
            let queue = Playlist::new(tracks);
            if queue.is_empty() {
                println!(
                    "No audio files under {}. Check the configured path.",
                    settings.library.root
                );
                return Ok(ExitCode::FAILURE);
            }
            let main_list = library::load_main_playlist();
            session(settings, queue, main_list, false)
        }
        rest => {
            let queue = library::playlist_from_args(rest, &settings.library);
            if queue.is_empty() {
                println!("None of the given paths contained audio files.");
                return Ok(ExitCode::FAILURE);
            }
            let main_list = library::load_main_playlist();
            session(settings, queue, main_list, false)
        }
    }
}

/// Run one playback session with the terminal in raw mode. Terminal state
/// is restored before any result (or error) surfaces to the user.
fn session(
    settings: Settings,
    mut queue: Playlist,
    mut main_list: Playlist,
    from_main: bool,
) -> Result<ExitCode> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = player::run(&mut terminal, &settings, &mut queue, &mut main_list, from_main);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    let outcome = result?;
    Ok(conclude(settings, &main_list, from_main, outcome))
}

/// Persist what the session changed and report how it ended.
fn conclude(
    mut settings: Settings,
    main_list: &Playlist,
    from_main: bool,
    outcome: player::Outcome,
) -> ExitCode {
    if from_main || outcome.main_dirty {
        if let Err(e) = library::save_main_playlist(main_list) {
            eprintln!("segue: failed to save main playlist: {e}");
        }
    }

    // Persist UI toggles and volume the way the session left them.
    settings.ui = outcome.ui;
    settings.playback.volume = outcome.volume;
    if let Err(e) = settings.save() {
        eprintln!("segue: failed to save config: {e}");
    }

    if let Some(reason) = outcome.load_failure {
        eprintln!("segue: playback ended: {reason}");
    }

    ExitCode::SUCCESS
}

fn load_settings() -> Settings {
    match Settings::load() {
        Ok(s) => {
            if let Err(msg) = s.validate() {
                eprintln!("segue: invalid config, using defaults: {msg}");
                Settings::default()
            } else {
                s
            }
        }
        Err(e) => {
            // Config is optional; failures should not prevent the app from starting.
            eprintln!("segue: failed to load config, using defaults: {e}");
            Settings::default()
        }
    }
}

fn print_help() {
    println!("segue {} — terminal playlist player", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Usage:");
    println!("  segue                 play all tracks under the configured music path");
    println!("  segue .               play the main playlist");
    println!("  segue path <dir>      set the music path and save it");
    println!("  segue <files/dirs>…   play an ad-hoc queue built from the arguments");
    println!("  segue --help | -h | -?");
    println!("  segue --version | -v");
    println!();
    println!("Keys:");
    println!("  space  play/pause     ←/→  previous/next      ↑/↓  volume");
    println!("  s      shuffle        r    repeat             a    add to main playlist");
    println!("  p      export queue   c    album panel        e    visualizer");
    println!("  b      block glyphs   F1   help line          q    quit");
}
