use config::{Config, ConfigError, File, FileFormat};
use std::{
    env,
    fmt::Display,
    path::{Path, PathBuf},
    str::FromStr,
};

use benchplot_cli_types::{parse_delimiter, ChartFormat, ReductionFunc};

use crate::defaults::MAX_CHART_DIMENSION;

const PROJECT_CONFIG_FILE: &str = ".benchplotconfig";
const APP_CONFIG_DIR: &str = "benchplot";
const USER_CONFIG_FILE: &str = "config.toml";

/// Where configuration files are looked up.
#[derive(Debug, Clone, Default)]
pub struct ConfigLocations {
    /// User-wide configuration file
    pub user: Option<PathBuf>,
    /// Directory from which `.benchplotconfig` is searched upward
    pub project_root: Option<PathBuf>,
}

impl ConfigLocations {
    pub fn from_env() -> Self {
        ConfigLocations {
            user: user_config_path(),
            project_root: env::current_dir().ok(),
        }
    }
}

fn user_config_path() -> Option<PathBuf> {
    if let Ok(xdg_config_home) = env::var("XDG_CONFIG_HOME") {
        return Some(
            Path::new(&xdg_config_home)
                .join(APP_CONFIG_DIR)
                .join(USER_CONFIG_FILE),
        );
    }
    dirs_next::home_dir().map(|home| {
        home.join(".config")
            .join(APP_CONFIG_DIR)
            .join(USER_CONFIG_FILE)
    })
}

/// Nearest `.benchplotconfig` in `start` or one of its ancestors
pub fn find_project_config(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(PROJECT_CONFIG_FILE))
        .find(|candidate| candidate.is_file())
}

/// Read hierarchical configuration (user -> project override)
pub fn read_config(locations: &ConfigLocations) -> Result<Config, ConfigError> {
    let mut builder = Config::builder();

    // 1. User-wide config
    if let Some(user_path) = &locations.user {
        builder = builder.add_source(
            File::from(user_path.as_path())
                .format(FileFormat::Toml)
                .required(false),
        );
    }

    // 2. Project config, overrides the user config
    if let Some(project_path) = locations
        .project_root
        .as_deref()
        .and_then(find_project_config)
    {
        builder = builder.add_source(
            File::from(project_path)
                .format(FileFormat::Toml)
                .required(false),
        );
    }

    builder.build()
}

pub fn read_hierarchical_config() -> Result<Config, ConfigError> {
    read_config(&ConfigLocations::from_env())
}

/// Values found in the configuration files. Unset or invalid keys are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub input_path: Option<PathBuf>,
    pub delimiter: Option<u8>,
    pub output_dir: Option<PathBuf>,
    pub format: Option<ChartFormat>,
    pub aggregate_by: Option<ReductionFunc>,
    pub panel_width: Option<u32>,
    pub chart_height: Option<u32>,
}

impl Settings {
    /// Settings from the user and project configuration; empty when none can be read.
    pub fn load() -> Settings {
        match read_hierarchical_config() {
            Ok(config) => Settings::from_config(&config),
            Err(e) => {
                // Missing or malformed config is not an error
                log::debug!("Could not read hierarchical config: {}", e);
                Settings::default()
            }
        }
    }

    pub fn from_config(config: &Config) -> Settings {
        Settings {
            input_path: config.get_string("input.path").ok().map(PathBuf::from),
            delimiter: config
                .get_string("input.delimiter")
                .ok()
                .and_then(|raw| accept("input.delimiter", &raw, parse_delimiter(&raw))),
            output_dir: config.get_string("output.directory").ok().map(PathBuf::from),
            format: parsed(config, "output.format"),
            aggregate_by: parsed(config, "aggregate.function"),
            panel_width: pixels(config, "chart.panel_width"),
            chart_height: pixels(config, "chart.height"),
        }
    }
}

fn accept<T, E: Display>(key: &str, raw: &str, parsed: Result<T, E>) -> Option<T> {
    match parsed {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Ignoring invalid value '{}' for {}: {}", raw, key, e);
            None
        }
    }
}

fn parsed<T>(config: &Config, key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = config.get_string(key).ok()?;
    accept(key, &raw, raw.parse::<T>())
}

fn pixels(config: &Config, key: &str) -> Option<u32> {
    let raw = config.get_int(key).ok()?;
    let value = u32::try_from(raw)
        .ok()
        .filter(|&v| v > 0 && v <= MAX_CHART_DIMENSION)
        .ok_or_else(|| format!("expected between 1 and {} pixels", MAX_CHART_DIMENSION));
    accept(key, &raw.to_string(), value)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn locations(user: Option<&Path>, project_root: &Path) -> ConfigLocations {
        ConfigLocations {
            user: user.map(Path::to_path_buf),
            project_root: Some(project_root.to_path_buf()),
        }
    }

    #[test]
    fn test_no_config_files() {
        let temp_dir = TempDir::new().unwrap();
        let config = read_config(&locations(
            Some(&temp_dir.path().join("missing.toml")),
            temp_dir.path(),
        ))
        .unwrap();
        assert_eq!(Settings::default(), Settings::from_config(&config));
    }

    #[test]
    fn test_parsing() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(PROJECT_CONFIG_FILE),
            r#"
[input]
path = "bench/results.tsv"
delimiter = "\t"

[output]
directory = "charts"
format = "html"

[aggregate]
function = "median"

[chart]
panel_width = 800
height = 450
"#,
        )
        .unwrap();

        let config = read_config(&locations(None, temp_dir.path())).unwrap();
        let settings = Settings::from_config(&config);
        assert_eq!(
            Settings {
                input_path: Some(PathBuf::from("bench/results.tsv")),
                delimiter: Some(b'\t'),
                output_dir: Some(PathBuf::from("charts")),
                format: Some(ChartFormat::Html),
                aggregate_by: Some(ReductionFunc::Median),
                panel_width: Some(800),
                chart_height: Some(450),
            },
            settings
        );
    }

    #[test]
    fn test_project_config_overrides_user_config() {
        let temp_dir = TempDir::new().unwrap();
        let user_config = temp_dir.path().join("user.toml");
        fs::write(
            &user_config,
            "[output]\ndirectory = \"user-charts\"\nformat = \"csv\"\n",
        )
        .unwrap();
        let project = temp_dir.path().join("project");
        fs::create_dir_all(&project).unwrap();
        fs::write(
            project.join(PROJECT_CONFIG_FILE),
            "[output]\ndirectory = \"project-charts\"\n",
        )
        .unwrap();

        let config = read_config(&locations(Some(&user_config), &project)).unwrap();
        let settings = Settings::from_config(&config);
        assert_eq!(Some(PathBuf::from("project-charts")), settings.output_dir);
        assert_eq!(Some(ChartFormat::Csv), settings.format);
    }

    #[test]
    fn test_find_project_config_upward_search() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        let config_path = temp_dir.path().join(PROJECT_CONFIG_FILE);
        fs::write(&config_path, "[chart]\nheight = 300\n").unwrap();

        assert_eq!(Some(config_path), find_project_config(&nested));

        let config = read_config(&locations(None, &nested)).unwrap();
        assert_eq!(Some(300), Settings::from_config(&config).chart_height);
    }

    #[test]
    fn test_invalid_values_are_ignored() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(PROJECT_CONFIG_FILE),
            r#"
[input]
delimiter = ";;"

[output]
format = "svg"

[aggregate]
function = "average"

[chart]
panel_width = -5
height = 0
"#,
        )
        .unwrap();

        let config = read_config(&locations(None, temp_dir.path())).unwrap();
        assert_eq!(Settings::default(), Settings::from_config(&config));
    }

    #[test]
    fn test_oversized_charts_are_ignored() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(PROJECT_CONFIG_FILE),
            "[chart]\npanel_width = 3000000000\nheight = 16385\n",
        )
        .unwrap();

        let config = read_config(&locations(None, temp_dir.path())).unwrap();
        let settings = Settings::from_config(&config);
        assert_eq!(None, settings.panel_width);
        assert_eq!(None, settings.chart_height);

        fs::write(
            temp_dir.path().join(PROJECT_CONFIG_FILE),
            "[chart]\npanel_width = 16384\n",
        )
        .unwrap();
        let config = read_config(&locations(None, temp_dir.path())).unwrap();
        assert_eq!(Some(16_384), Settings::from_config(&config).panel_width);
    }

    #[test]
    fn test_malformed_config_fails_to_build() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(PROJECT_CONFIG_FILE), "[output\nformat =").unwrap();
        assert!(read_config(&locations(None, temp_dir.path())).is_err());
    }
}
