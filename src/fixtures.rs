#[cfg(test)]
pub mod test {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use crate::Settings;

    #[derive(Settings, Debug, PartialEq)]
    pub struct ServerSettings {
        #[setting("env=PORT,flag=p port")]
        pub port: u16,

        pub host: String,

        #[setting("flag=verbose v")]
        pub verbose: bool,

        pub timeout: Duration,

        pub tags: Vec<String>,

        pub labels: BTreeMap<String, String>,

        pub token: Option<String>,

        pub mode: Mode,

        pub database: DatabaseSettings,

        #[setting(skip)]
        pub internal: u32,
    }

    impl Default for ServerSettings {
        fn default() -> Self {
            Self {
                port: 3000,
                host: "localhost".to_string(),
                verbose: false,
                timeout: Duration::from_secs(30),
                tags: vec![],
                labels: BTreeMap::new(),
                token: None,
                mode: Mode::Fast,
                database: DatabaseSettings::default(),
                internal: 7,
            }
        }
    }

    #[derive(Settings, Debug, PartialEq)]
    pub struct DatabaseSettings {
        #[setting("file=db_url,env=DATABASE_URL")]
        pub url: String,

        pub pool_size: u32,

        #[setting("flag=verbose")]
        pub verbose: bool,
    }

    impl Default for DatabaseSettings {
        fn default() -> Self {
            Self {
                url: "postgres://localhost".to_string(),
                pool_size: 5,
                verbose: false,
            }
        }
    }

    // -- Fixture for custom text decoding ---------------------------------------

    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub enum Mode {
        #[default]
        Fast,
        Slow,
    }

    impl std::str::FromStr for Mode {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s.to_ascii_lowercase().as_str() {
                "fast" => Ok(Mode::Fast),
                "slow" => Ok(Mode::Slow),
                other => Err(format!("unknown mode '{other}'")),
            }
        }
    }

    crate::text_setting!(Mode);

    // -- Fixture for the single-field example ------------------------------------

    #[derive(Settings, Debug, PartialEq)]
    pub struct PortSettings {
        #[setting("env=PORT,flag=p port")]
        pub port: u16,
    }

    impl Default for PortSettings {
        fn default() -> Self {
            Self { port: 3000 }
        }
    }

    // -- Fixture for optional and boxed nesting ----------------------------------

    #[derive(Settings, Debug, Default, PartialEq)]
    pub struct PoolSettings {
        pub size: u32,
    }

    #[derive(Settings, Debug, Default, PartialEq)]
    pub struct IndirectSettings {
        pub primary: Option<PoolSettings>,
        pub replica: Option<PoolSettings>,
        pub archive: Box<PoolSettings>,
        pub limit: f64,
        pub scale: f64,
    }

    #[test]
    fn derived_fields_in_declaration_order() {
        let mut settings = ServerSettings::default();
        let names: Vec<&str> = settings.fields_mut().iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec![
                "port", "host", "verbose", "timeout", "tags", "labels", "token", "mode",
                "database"
            ]
        );
    }

    #[test]
    fn derived_struct_is_a_nested_setting() {
        use crate::{Kind, Setting};

        let mut settings = ServerSettings::default();
        assert_eq!(settings.database.kind(), Kind::Struct);
        assert!(settings.database.as_settings_mut().is_some());
        assert!(settings.database.set_text("x").is_err());

        settings.reset();
        assert_eq!(settings.port, 0);
        assert_eq!(settings.database.url, "");
        assert_eq!(settings.mode, Mode::Fast);
        // skipped fields are left alone
        assert_eq!(settings.internal, 7);
    }

    #[test]
    fn text_setting_decodes_custom_type() {
        use crate::Setting;

        let mut mode = Mode::Fast;
        mode.set_text("SLOW").unwrap();
        assert_eq!(mode, Mode::Slow);
        assert!(mode.set_text("medium").is_err());
        assert_eq!(mode, Mode::Slow);
    }
}
