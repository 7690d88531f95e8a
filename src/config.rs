use std::env;
use std::path::PathBuf;

use crate::injuries::NameMatch;

pub const DEFAULT_STATS_API_BASE: &str = "https://statsapi.mlb.com";
pub const DEFAULT_TRANSACTIONS_BASE: &str = "https://www.espn.com/mlb/team/transactions/_/name";
const DEFAULT_FETCH_PARALLELISM: usize = 4;

/// Run settings gathered from the environment (after `.env` files are loaded).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub stats_api_base: String,
    pub transactions_base: String,
    pub fetch_parallelism: usize,
    pub name_match: NameMatch,
    /// `None` keeps prompting until a team matches or input ends.
    pub prompt_max_attempts: Option<u32>,
    pub output_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            stats_api_base: DEFAULT_STATS_API_BASE.to_string(),
            transactions_base: DEFAULT_TRANSACTIONS_BASE.to_string(),
            fetch_parallelism: DEFAULT_FETCH_PARALLELISM,
            name_match: NameMatch::Substring,
            prompt_max_attempts: None,
            output_dir: PathBuf::from("."),
        }
    }
}

impl RunConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| {
            lookup(key)
                .map(|val| val.trim().to_string())
                .filter(|val| !val.is_empty())
        };

        let fetch_parallelism = non_empty("FETCH_PARALLELISM")
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(defaults.fetch_parallelism)
            .clamp(1, 16);
        let name_match = non_empty("NAME_MATCH")
            .and_then(|val| NameMatch::parse(&val))
            .unwrap_or(defaults.name_match);
        let prompt_max_attempts = non_empty("PROMPT_MAX_ATTEMPTS")
            .and_then(|val| val.parse::<u32>().ok())
            .filter(|n| *n > 0);

        Self {
            stats_api_base: non_empty("STATS_API_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or(defaults.stats_api_base),
            transactions_base: non_empty("TRANSACTIONS_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or(defaults.transactions_base),
            fetch_parallelism,
            name_match,
            prompt_max_attempts,
            output_dir: non_empty("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> RunConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RunConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let cfg = config_from(&[]);
        assert_eq!(cfg.stats_api_base, DEFAULT_STATS_API_BASE);
        assert_eq!(cfg.transactions_base, DEFAULT_TRANSACTIONS_BASE);
        assert_eq!(cfg.fetch_parallelism, 4);
        assert_eq!(cfg.name_match, NameMatch::Substring);
        assert_eq!(cfg.prompt_max_attempts, None);
        assert_eq!(cfg.output_dir, PathBuf::from("."));
    }

    #[test]
    fn overrides_are_trimmed_and_clamped() {
        let cfg = config_from(&[
            ("STATS_API_BASE", "http://localhost:8080/"),
            ("FETCH_PARALLELISM", "64"),
            ("NAME_MATCH", "word"),
            ("PROMPT_MAX_ATTEMPTS", "3"),
            ("OUTPUT_DIR", " out "),
        ]);
        assert_eq!(cfg.stats_api_base, "http://localhost:8080");
        assert_eq!(cfg.fetch_parallelism, 16);
        assert_eq!(cfg.name_match, NameMatch::WordBoundary);
        assert_eq!(cfg.prompt_max_attempts, Some(3));
        assert_eq!(cfg.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn garbage_values_fall_back() {
        let cfg = config_from(&[
            ("FETCH_PARALLELISM", "lots"),
            ("NAME_MATCH", "fuzzy"),
            ("PROMPT_MAX_ATTEMPTS", "0"),
        ]);
        assert_eq!(cfg.fetch_parallelism, 4);
        assert_eq!(cfg.name_match, NameMatch::Substring);
        assert_eq!(cfg.prompt_max_attempts, None);
    }
}
