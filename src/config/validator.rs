use anyhow::Result;
use std::collections::HashSet;
use std::path::Path;
use tracing::warn;

/// Flags configuration keys the program does not understand.
pub struct ConfigValidator {
    /// Fully qualified keys that are recognized
    known_fields: HashSet<String>,
    /// Keys accepted in older releases that no longer have an effect
    deprecated_fields: HashSet<String>,
}

/// Sections whose contents are free-form tables.
const TABLE_SECTIONS: &[&str] = &["resolution.movie_folders", "resolution.show_folders"];

impl ConfigValidator {
    /// Create a new validator with known configuration fields
    #[must_use]
    pub fn new() -> Self {
        let mut known_fields: HashSet<String> = crate::config::Config::KEYS
            .iter()
            .map(ToString::to_string)
            .collect();
        known_fields.extend(TABLE_SECTIONS.iter().map(ToString::to_string));

        let deprecated_fields = ["links.use_hardlinks", "library.anime_folder"]
            .iter()
            .map(ToString::to_string)
            .collect();

        Self {
            known_fields,
            deprecated_fields,
        }
    }

    /// Validate a configuration file and log unknown or deprecated keys
    ///
    /// Returns the offending keys so callers can surface them too.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub fn validate_config_file(&self, config_path: &Path) -> Result<Vec<String>> {
        if !config_path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(config_path)?;
        let parsed: toml::Value = toml::from_str(&content)?;

        let mut unknown = Vec::new();
        let mut deprecated = Vec::new();
        self.check_table(&parsed, "", &mut unknown, &mut deprecated);

        for field in &unknown {
            warn!(field = %field, "unknown configuration field");
        }
        for field in &deprecated {
            let suggestion = match field.as_str() {
                "links.use_hardlinks" => "use links.kind = \"hardlink\" instead",
                "library.anime_folder" => {
                    "split into library.anime_movie_folder and library.anime_tv_folder"
                }
                _ => "this field has no effect",
            };
            warn!(field = %field, "deprecated configuration field: {suggestion}");
        }

        unknown.extend(deprecated);
        Ok(unknown)
    }

    /// Walks a TOML table collecting unknown and deprecated leaf keys
    fn check_table(
        &self,
        table: &toml::Value,
        prefix: &str,
        unknown: &mut Vec<String>,
        deprecated: &mut Vec<String>,
    ) {
        let toml::Value::Table(map) = table else {
            return;
        };

        for (key, value) in map {
            let full_key = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };

            if self.deprecated_fields.contains(&full_key) {
                deprecated.push(full_key);
                continue;
            }

            if TABLE_SECTIONS.contains(&full_key.as_str()) {
                Self::check_quality_table(value, &full_key, unknown);
                continue;
            }

            match value {
                toml::Value::Table(_) => self.check_table(value, &full_key, unknown, deprecated),
                _ if self.known_fields.contains(&full_key) => {}
                _ => unknown.push(full_key),
            }
        }
    }

    /// Quality folder tables only accept the bucket names
    fn check_quality_table(value: &toml::Value, prefix: &str, unknown: &mut Vec<String>) {
        const BUCKETS: &[&str] = &[
            "remux_2160p",
            "remux_1080p",
            "remux_other",
            "uhd_2160p",
            "fhd_1080p",
            "hd_720p",
            "sd_480p",
            "dvd",
            "default",
        ];

        if let toml::Value::Table(map) = value {
            for key in map.keys() {
                if !BUCKETS.contains(&key.as_str()) {
                    unknown.push(format!("{prefix}.{key}"));
                }
            }
        }
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}
