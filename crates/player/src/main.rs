//! RGSS Player - runs scenes on the RGSS runtime
//!
//! Usage: rgss-player [OPTIONS]

mod config;
mod demo;

use std::env;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use log::{info, warn};

use rgss_bitmap::FontRegistry;
use rgss_render::{Graphics, HeadlessDevice, RenderDevice};
use rgss_types::{RgssError, RgssResult};

use crate::config::PlayerConfig;
use crate::demo::Demo;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Frames rendered headless when no count is given
const DEFAULT_HEADLESS_FRAMES: u64 = 120;

/// Parsed command line
#[derive(Debug, Default)]
struct Options {
    config: Option<PathBuf>,
    frames: Option<u64>,
    screenshot: Option<PathBuf>,
    headless: bool,
}

fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("rgss-player");

    let mut options = Options::default();
    let mut rest = args.iter().skip(1);
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--help" | "-h" => {
                print_usage(program);
                return ExitCode::SUCCESS;
            }
            "--version" | "-V" => {
                println!("RGSS Player {}", VERSION);
                return ExitCode::SUCCESS;
            }
            "--demo" => {}
            "--headless" => options.headless = true,
            "--config" | "--frames" | "--screenshot" => {
                let Some(value) = rest.next() else {
                    eprintln!("Usage: {} {} <VALUE>", program, arg);
                    return ExitCode::FAILURE;
                };
                match arg.as_str() {
                    "--config" => options.config = Some(PathBuf::from(value)),
                    "--screenshot" => options.screenshot = Some(PathBuf::from(value)),
                    _ => match value.parse() {
                        Ok(n) => options.frames = Some(n),
                        Err(_) => {
                            eprintln!("Error: --frames expects a number, got '{}'", value);
                            return ExitCode::FAILURE;
                        }
                    },
                }
            }
            other => {
                eprintln!("Error: unknown option '{}'", other);
                print_usage(program);
                return ExitCode::FAILURE;
            }
        }
    }

    if let Err(e) = run_demo(options) {
        eprintln!("Error: {}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn print_usage(program: &str) {
    println!(
        r#"RGSS Player {} - RGSS-style 2D runtime

USAGE:
    {} [OPTIONS]

OPTIONS:
    -h, --help            Print this help message
    -V, --version         Print version information
    --demo                Run the built-in demo scene (default)
    --config <FILE>       Load player settings from a JSON file
    --frames <N>          Stop after N frames
    --screenshot <PNG>    Save the last frame as a PNG
    --headless            Render without opening a window

EXAMPLES:
    {} --demo
    {} --headless --frames 60 --screenshot demo.png
    {} --config player.json

"#,
        VERSION, program, program, program, program
    );
}

fn load_fonts(config: &PlayerConfig) -> FontRegistry {
    let mut fonts = FontRegistry::new(config.font.clone());
    if let Some(dir) = &config.font_dir {
        if dir.is_dir() {
            if let Err(e) = fonts.load_dir(dir) {
                warn!("Failed to load fonts from {}: {}", dir.display(), e);
            }
        } else {
            warn!("Font directory {} not found", dir.display());
        }
    }
    fonts
}

#[cfg(feature = "sdl")]
fn open_device(config: &PlayerConfig, headless: bool) -> RgssResult<Box<dyn RenderDevice>> {
    if headless {
        return Ok(Box::new(HeadlessDevice::new(config.width, config.height)));
    }
    let device = rgss_render::SdlDevice::new(&config.title, config.width, config.height)?;
    Ok(Box::new(device))
}

#[cfg(not(feature = "sdl"))]
fn open_device(config: &PlayerConfig, headless: bool) -> RgssResult<Box<dyn RenderDevice>> {
    if !headless {
        info!("Built without the `sdl` feature; rendering headless");
    }
    Ok(Box::new(HeadlessDevice::new(config.width, config.height)))
}

/// Run the demo scene until the frame limit or a quit request
fn run_demo(options: Options) -> RgssResult<()> {
    let config = match &options.config {
        Some(path) => PlayerConfig::load(path)?,
        None => PlayerConfig::default(),
    };

    let headless = options.headless || cfg!(not(feature = "sdl"));
    let frames = match options.frames {
        Some(n) => Some(n),
        None if headless => Some(DEFAULT_HEADLESS_FRAMES),
        None => None,
    };

    let device = open_device(&config, headless)?;
    let mut graphics = Graphics::init(config.graphics(), device, load_fonts(&config))?;
    info!("Running '{}'", config.title);

    // Fade in from black
    graphics.freeze()?;
    let mut demo = Demo::build(&mut graphics)?;
    graphics.transition(20, None, 40)?;

    loop {
        if frames.is_some_and(|limit| graphics.frame_count() >= limit) {
            break;
        }
        if graphics.poll_quit() {
            info!("Quit requested");
            break;
        }
        demo.step(&mut graphics)?;
        graphics.update()?;
    }

    if let Some(path) = &options.screenshot {
        graphics.screen().save_png(path).map_err(|e| match e {
            RgssError::Io(e) => RgssError::Io(io::Error::new(e.kind(), format!("{}: {}", path.display(), e))),
            other => other,
        })?;
        info!("Saved screenshot to {}", path.display());
    }

    graphics.shutdown();
    Ok(())
}
