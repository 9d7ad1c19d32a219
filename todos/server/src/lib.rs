pub mod config {
    use serde::Deserialize;

    #[derive(Deserialize, Debug, Clone)]
    pub struct Config {
        #[serde(default = "default_port")]
        pub port: u16,
        #[serde(default = "default_session_cookie_name")]
        pub session_cookie_name: String,
    }

    impl Config {
        /// Loads configuration from environment variables.
        pub fn from_env() -> anyhow::Result<Self> {
            let settings = config::Config::builder()
                .add_source(config::Environment::default())
                .build()?;

            let config: Config = settings.try_deserialize()?;
            Ok(config)
        }
    }

    impl Default for Config {
        fn default() -> Self {
            Self {
                port: default_port(),
                session_cookie_name: default_session_cookie_name(),
            }
        }
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_session_cookie_name() -> String {
        "todos-session-id".to_string()
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn can_fall_back_to_default_port_and_cookie_name() {
            let config = Config::default();
            assert_eq!(config.port, 8080);
            assert_eq!(config.session_cookie_name, "todos-session-id");
        }
    }
}

pub mod session;
pub mod todo;
pub mod web;
