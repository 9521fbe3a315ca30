use std::path::PathBuf;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wwm::config;
use wwm::errors::{ConfigError, WmError};
use wwm::window_manager::WindowManager;
use wwm::x11::X11;

const TEMPLATE: &str = include_str!("../../templates/config.toml");

enum Args {
    Exit,
    Run(Option<PathBuf>),
    Error(WmError),
}

fn main() -> Result<(), WmError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "wwm=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = match process_args() {
        Args::Exit => return Ok(()),
        Args::Run(path) => path,
        Args::Error(err) => return Err(err),
    };

    let path = match config_path {
        Some(path) => path,
        None => config::default_path()?,
    };
    let config = config::load(&path)?;

    let conn = X11::connect()?;
    let mut window_manager = WindowManager::new(conn, config);
    info!(version = env!("CARGO_PKG_VERSION"), "starting wwm");
    window_manager.run()
}

fn process_args() -> Args {
    let mut args = std::env::args();
    let name = args.next().unwrap_or_else(|| "wwm".to_string());
    let switch = args.next();
    let path = args.next();

    let Some(switch) = switch else {
        return Args::Run(None);
    };

    match switch.as_str() {
        "--version" => {
            println!("{name} {}", env!("CARGO_PKG_VERSION"));
            Args::Exit
        }
        "--help" => {
            print_help();
            Args::Exit
        }
        "--init" => match init_config() {
            Ok(()) => Args::Exit,
            Err(err) => Args::Error(err.into()),
        },
        "--config" => match check_custom_config(path) {
            Ok(path) => Args::Run(Some(path)),
            Err(err) => Args::Error(err),
        },
        _ => Args::Error(WmError::InvalidArguments),
    }
}

fn check_custom_config(path: Option<String>) -> Result<PathBuf, WmError> {
    let Some(path) = path else {
        return Err(WmError::NoConfigPath);
    };
    let path = PathBuf::from(path);
    if path.exists() {
        Ok(path)
    } else {
        Err(WmError::BadConfigPath(path))
    }
}

fn init_config() -> Result<(), ConfigError> {
    let path = config::default_path()?;
    if let Some(directory) = path.parent() {
        std::fs::create_dir_all(directory).map_err(|source| ConfigError::Write {
            path: directory.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(&path, TEMPLATE).map_err(|source| ConfigError::Write {
        path: path.clone(),
        source,
    })?;

    println!("Config created at {path:?}");
    println!("Edit the file and restart wwm to pick up changes.");
    Ok(())
}

fn print_help() {
    println!("wwm - a minimal full-screen window manager\n");
    println!("USAGE:");
    println!("    wwm [OPTIONS]\n");
    println!("OPTIONS:");
    println!("    --init              Create a default config in ~/.config/wwm/{}", config::CONFIG_FILE);
    println!("    --config <PATH>     Use a custom config file");
    println!("    --version           Print version information");
    println!("    --help              Print this help message\n");
    println!("CONFIG:");
    println!("    Location: ~/.config/wwm/{}", config::CONFIG_FILE);
    println!("    Missing file: wwm starts with the built-in defaults");
    println!("    (Mod4+j/k to cycle windows, Mod4+Return for a terminal)\n");
}
