//! Command-line interface definitions for the gateway.
//!
//! The concrete types live in the `cli-defs` crate so that both this
//! library and `build.rs` (which generates the man page) can depend on them
//! without a brittle `#[path = ...]` include.

pub use cli_defs::{AppConfig, Cli, Commands, CreateUserArgs};

#[cfg(test)]
mod tests {
    use figment::Jail;
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn env_config_loading() {
        Jail::expect_with(|j| {
            j.set_env("MXDGW_BIND_REST", "127.0.0.1:9090");
            j.set_env("MXDGW_DATABASE", "env.db");
            let cfg = AppConfig::load_from_iter(["frame-gateway"]).expect("load");
            assert_eq!(cfg.bind_rest, "127.0.0.1:9090");
            assert_eq!(cfg.database, "env.db".to_owned());
            Ok(())
        });
    }

    #[rstest]
    fn cli_overrides_env() {
        Jail::expect_with(|j| {
            j.set_env("MXDGW_BIND_REST", "127.0.0.1:9090");
            let cfg = AppConfig::load_from_iter(["frame-gateway", "--bind-rest", "0.0.0.0:9999"])
                .expect("load");
            assert_eq!(cfg.bind_rest, "0.0.0.0:9999");
            Ok(())
        });
    }

    #[rstest]
    fn loads_from_dotfile() {
        Jail::expect_with(|j| {
            j.create_file(".frame-gateway.toml", "bind_frame = \"1.2.3.4:1111\"")?;
            let cfg = AppConfig::load_from_iter(["frame-gateway"]).expect("load");
            assert_eq!(cfg.bind_frame, "1.2.3.4:1111".to_owned());
            Ok(())
        });
    }

    #[rstest]
    fn argon2_cli_override() {
        Jail::expect_with(|_j| {
            let cfg =
                AppConfig::load_from_iter(["frame-gateway", "--argon2-m-cost", "1024"]).expect("load");
            assert_eq!(cfg.argon2_m_cost, 1024);
            Ok(())
        });
    }
}
