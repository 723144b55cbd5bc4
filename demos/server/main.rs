//! # layerfig demo server
//!
//! Not a real server: it loads its settings the way one would and prints the
//! result, so every layer can be exercised by hand.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example server
//! RUST_LOG=layerfig=trace cargo run --example server -- -p 8080
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature            | How to exercise it                                                   |
//! |--------------------|----------------------------------------------------------------------|
//! | Struct defaults    | `cargo run --example server`                                         |
//! | Config file (cwd)  | Create `demo.yaml` (or `.json`, `.toml`) in cwd                      |
//! | Ancestor config    | Put `demo.toml` in a parent directory of the cwd                     |
//! | Prefixed env var   | `DEMO_SERVER_HOST=0.0.0.0 cargo run --example server`                |
//! | Explicit env name  | `PORT=8080 cargo run --example server`                               |
//! | Short flag         | `cargo run --example server -- -p 9090`                              |
//! | Nested flag        | `cargo run --example server -- --database-pool_size 20`              |
//! | Reset with empty   | `cargo run --example server -- --server-allowed_origins=`            |
//! | Event log          | `RUST_LOG=layerfig=trace cargo run --example server`                 |

mod config;

use layerfig::{Boundary, Collector, LayerfigError, SearchPath};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use config::DemoSettings;

fn init_logging() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(EnvFilter::from_default_env())
        .init();
}

fn main() {
    init_logging();

    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), LayerfigError> {
    let mut settings = DemoSettings::default();

    Collector::new()
        .search_paths(vec![SearchPath::Ancestors(Boundary::Marker(".git"))])
        .base_name("demo")
        .env_prefix("DEMO")
        .get(&mut settings)?;

    println!("{} (log level {})", settings.name, settings.log_level);
    println!(
        "listening on {}:{} (read timeout {})",
        settings.server.host,
        settings.server.port,
        humantime::format_duration(settings.server.read_timeout)
    );
    println!("allowed origins: {}", settings.server.allowed_origins.join(", "));
    match &settings.database.url {
        Some(url) => println!("database: {url} (pool of {})", settings.database.pool_size),
        None => println!("database: not configured"),
    }
    Ok(())
}
