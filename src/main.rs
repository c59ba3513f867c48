use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use mealcam::{MealcamApp, MealcamConfig};

#[derive(Parser, Debug)]
#[command(name = "mealcam")]
#[command(about = "Camera-assisted meal logging and nutrition tracking for cafeteria service")]
#[command(version)]
#[command(long_about = "Interactive terminal front-end for the mealcam system: role-based \
dashboards for cafeteria staff (per-item image capture and density measurement), admins \
(food catalog maintenance), nutritionists (nutrition facts), and users (meal analysis). \
The camera and the analysis backend are mocked; only user preferences persist.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "mealcam.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit without starting the app")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle special modes that don't require full initialization
    if args.print_config {
        print_default_config();
        return Ok(());
    }

    // Initialize logging
    init_logging(&args)?;

    info!("Starting Mealcam v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    // Load and validate configuration
    let config = match MealcamConfig::load_from_file(&args.config) {
        Ok(config) => {
            info!("Configuration loaded successfully from: {}", args.config);
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if args.validate_config {
        match config.validate() {
            Ok(()) => {
                info!("Configuration validation successful");
                println!("✓ Configuration is valid");
                return Ok(());
            }
            Err(e) => {
                error!("Configuration validation failed: {}", e);
                eprintln!("✗ Configuration validation failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    config.validate().map_err(|e| {
        error!("Configuration validation failed: {}", e);
        e
    })?;

    let mut app = MealcamApp::new(config);
    let exit_code = app.run().await.map_err(|e| {
        error!("Application error during execution: {}", e);
        e
    })?;

    info!("Mealcam exited with code: {}", exit_code);
    std::process::exit(exit_code);
}

fn init_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    // Determine log level based on flags
    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    // Create environment filter
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mealcam={}", log_level)));

    // Configure format based on options
    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_target(true)
                .with_thread_ids(args.debug)
                .with_file(args.debug)
                .with_line_number(args.debug)
                .boxed()
        }
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    Ok(())
}

/// Print default configuration in TOML format
fn print_default_config() {
    println!("# Mealcam Configuration File");
    println!("# This is the default configuration with all available options");
    println!();

    let default_config = r#"[catalog]
# Seed the catalog with the sample menu on startup
seed_sample = true

[capture]
# Directory prefix for fabricated artifact references
artifact_dir = "./artifacts"

[analyzer]
# Simulated processing delay in milliseconds
delay_ms = 2000
# Confidence score reported with every fabricated result (0.0 - 1.0)
confidence = 0.85
# Fabricated nutrition numbers
calories = 410.0
protein_g = 18.0
carbs_g = 55.0
fat_g = 12.0

[preferences]
# Path of the preferences file (the only persisted state)
path = "mealcam_prefs.toml"

[system]
# Event bus capacity
event_bus_capacity = 100
"#;

    println!("{}", default_config);
}
