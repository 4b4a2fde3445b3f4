use clap::Parser;

use crate::config::AppConfig;
use crate::core::portal::DuplicatePolicy;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    /// Scene path (.toml or .json)
    #[arg(value_name = "SCENE_PATH")]
    pub scene_path: String,

    /// Path to config TOML
    #[arg(long, default_value = "tickportal.toml")]
    pub config: String,

    /// Reject portals that share a source position (overrides config)
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub strict_portals: Option<bool>,

    /// Scan the portal list on every tick instead of indexing it
    #[arg(long, default_value_t = false)]
    pub no_index: bool,

    /// Pretty-print the routed chunks (overrides config)
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub pretty: Option<bool>,

    /// Validate the scene only (no routing)
    #[arg(long, default_value_t = false)]
    pub validate_only: bool,

    /// Log filter, e.g. `debug` or `tickportal=trace` (overrides config)
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Args {
    /// Flags given on the command line win over the config file.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(strict) = self.strict_portals {
            config.routing.duplicate_policy = if strict {
                DuplicatePolicy::Reject
            } else {
                DuplicatePolicy::FirstWins
            };
        }
        if self.no_index {
            config.routing.index_portals = false;
        }
        if let Some(pretty) = self.pretty {
            config.output.pretty = pretty;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_flags_enable_overrides() {
        let args = Args::try_parse_from([
            "tickportal",
            "scene.toml",
            "--strict-portals",
            "--pretty",
            "--no-index",
        ])
        .unwrap();
        assert_eq!(args.scene_path, "scene.toml");
        assert_eq!(args.strict_portals, Some(true));
        assert_eq!(args.pretty, Some(true));
        assert!(args.no_index);
        assert_eq!(args.config, "tickportal.toml");
    }

    #[test]
    fn overrides_default_to_config() {
        let args = Args::try_parse_from(["tickportal", "scene.json"]).unwrap();
        assert_eq!(args.strict_portals, None);
        assert_eq!(args.pretty, None);
        assert!(!args.validate_only);
        assert!(args.log_level.is_none());
    }

    #[test]
    fn flags_override_config() {
        let args = Args::try_parse_from([
            "tickportal",
            "scene.toml",
            "--strict-portals",
            "--no-index",
            "--pretty",
            "--log-level",
            "tickportal=trace",
        ])
        .unwrap();
        let mut config = AppConfig::default();
        args.apply_overrides(&mut config);
        assert_eq!(config.routing.duplicate_policy, DuplicatePolicy::Reject);
        assert!(!config.routing.index_portals);
        assert!(config.output.pretty);
        assert_eq!(config.logging.level, "tickportal=trace");
    }

    #[test]
    fn strict_portals_false_restores_first_wins() {
        let args =
            Args::try_parse_from(["tickportal", "scene.toml", "--strict-portals", "false"]).unwrap();
        let mut config = AppConfig::default();
        config.routing.duplicate_policy = DuplicatePolicy::Reject;
        args.apply_overrides(&mut config);
        assert_eq!(config.routing.duplicate_policy, DuplicatePolicy::FirstWins);
        assert!(config.routing.index_portals);
    }

    #[test]
    fn absent_flags_leave_config_untouched() {
        let args = Args::try_parse_from(["tickportal", "scene.toml"]).unwrap();
        let mut config = AppConfig::default();
        config.output.pretty = true;
        config.routing.index_portals = false;
        let before = config.clone();
        args.apply_overrides(&mut config);
        assert_eq!(config, before);
    }
}
