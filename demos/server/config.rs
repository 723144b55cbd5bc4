//! Settings structs for the server demo.
//!
//! | Field                     | Env var                      | Flag                          |
//! |---------------------------|------------------------------|-------------------------------|
//! | `name`                    | `DEMO_NAME`                  | `--name`                      |
//! | `log_level`               | `LOG_LEVEL`, `DEMO_LOG_LEVEL`| `--log_level`, `-l`           |
//! | `server.host`             | `DEMO_SERVER_HOST`           | `--server-host`               |
//! | `server.port`             | `PORT`, `DEMO_SERVER_PORT`   | `--port`, `-p`, `--server-port` |
//! | `server.read_timeout`     | `DEMO_SERVER_READ_TIMEOUT`   | `--server-read_timeout`       |
//! | `server.allowed_origins`  | `DEMO_SERVER_ALLOWED_ORIGINS`| `--server-allowed_origins`    |
//! | `database.url`            | `DATABASE_URL`, `DEMO_DATABASE_URL` | `--database-url`       |
//! | `database.pool_size`      | `DEMO_DATABASE_POOL_SIZE`    | `--database-pool_size`        |

use std::time::Duration;

use layerfig::Settings;

#[derive(Settings, Debug)]
pub struct DemoSettings {
    pub name: String,

    #[setting("env=LOG_LEVEL,flag=l")]
    pub log_level: tracing::Level,

    pub server: ServerSettings,

    pub database: DatabaseSettings,
}

#[derive(Settings, Debug)]
pub struct ServerSettings {
    pub host: String,

    #[setting("env=PORT,flag=p port")]
    pub port: u16,

    pub read_timeout: Duration,

    pub allowed_origins: Vec<String>,
}

#[derive(Settings, Debug)]
pub struct DatabaseSettings {
    #[setting("env=DATABASE_URL,file=database_url")]
    pub url: Option<String>,

    pub pool_size: u32,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            name: "layerfig-demo".to_string(),
            log_level: tracing::Level::INFO,
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 3000,
                read_timeout: Duration::from_secs(30),
                allowed_origins: vec!["*".to_string()],
            },
            database: DatabaseSettings {
                url: None,
                pool_size: 5,
            },
        }
    }
}
