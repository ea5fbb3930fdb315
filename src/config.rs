#![forbid(unsafe_code)]

use anyhow::{Context, Result, anyhow};
use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
};
use tracing::warn;
use url::Url;

pub const DEFAULT_ENV_PATH: &str = ".env";
pub const DEFAULT_ARCHIVE_ROOT: &str = "https://web.archive.org/";
pub const DEFAULT_CDX_ENDPOINT: &str = "https://web.archive.org/cdx/search/cdx";
pub const DEFAULT_PROFILE_HOST: &str = "plays.tv";
pub const USER_AGENT: &str = "PlaysTV Scraper 1.0";
pub const TARGET_RESOLUTION: &str = "720";
pub const UPLOAD_DATE_FORMAT: &str = "%b %d %Y";

const ARCHIVE_ROOT_KEY: &str = "PLAYSTV_ARCHIVE_ROOT";
const CDX_ENDPOINT_KEY: &str = "PLAYSTV_CDX_ENDPOINT";
const PROFILE_HOST_KEY: &str = "PLAYSTV_PROFILE_HOST";
const KNOWN_KEYS: [&str; 3] = [ARCHIVE_ROOT_KEY, CDX_ENDPOINT_KEY, PROFILE_HOST_KEY];

/// Everything the pipeline stages would otherwise hard-code. Each stage takes
/// a reference so tests can point them at stub hosts.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Base every archived path is joined onto. Always ends with `/`.
    pub archive_root: Url,
    pub cdx_endpoint: Url,
    pub profile_host: String,
    pub user_agent: String,
    pub resolution: String,
    pub date_format: String,
}

impl ScraperConfig {
    /// Built-in values only; ignores the environment and any env file.
    pub fn defaults() -> Result<Self> {
        build_config_with_overrides(&HashMap::new(), |_| None, ConfigOverrides::default())
    }

    pub fn profile_url(&self, username: &str) -> String {
        format!("https://{}/u/{}", self.profile_host, username)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub archive_root: Option<String>,
    pub cdx_endpoint: Option<String>,
    pub profile_host: Option<String>,
    pub env_path: Option<PathBuf>,
}

pub fn resolve_config(overrides: ConfigOverrides) -> Result<ScraperConfig> {
    let env_path = overrides
        .env_path
        .as_deref()
        .unwrap_or_else(|| Path::new(DEFAULT_ENV_PATH));
    let file_vars = read_env_file(env_path)?;
    for key in unknown_keys(&file_vars) {
        warn!(key, file = %env_path.display(), "ignoring unknown setting");
    }
    build_config_with_overrides(&file_vars, |key| env::var(key).ok(), overrides)
}

fn build_config_with_overrides(
    file_vars: &HashMap<String, String>,
    env_lookup: impl Fn(&str) -> Option<String>,
    overrides: ConfigOverrides,
) -> Result<ScraperConfig> {
    let setting = |key: &str, explicit: Option<String>, default: &str| {
        [explicit, env_lookup(key), file_vars.get(key).cloned()]
            .into_iter()
            .flatten()
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
            .unwrap_or_else(|| default.to_string())
    };

    let archive_root = setting(ARCHIVE_ROOT_KEY, overrides.archive_root, DEFAULT_ARCHIVE_ROOT);
    let cdx_endpoint = setting(CDX_ENDPOINT_KEY, overrides.cdx_endpoint, DEFAULT_CDX_ENDPOINT);
    let profile_host = setting(PROFILE_HOST_KEY, overrides.profile_host, DEFAULT_PROFILE_HOST);

    Ok(ScraperConfig {
        archive_root: parse_archive_root(&archive_root)?,
        cdx_endpoint: parse_absolute(CDX_ENDPOINT_KEY, &cdx_endpoint)?,
        profile_host,
        user_agent: USER_AGENT.to_string(),
        resolution: TARGET_RESOLUTION.to_string(),
        date_format: UPLOAD_DATE_FORMAT.to_string(),
    })
}

fn parse_absolute(key: &str, value: &str) -> Result<Url> {
    let url = Url::parse(value).with_context(|| format!("{key} is not a valid URL: {value}"))?;
    if url.cannot_be_a_base() {
        return Err(anyhow!("{key} must be an absolute http(s) URL: {value}"));
    }
    Ok(url)
}

fn parse_archive_root(value: &str) -> Result<Url> {
    let mut url = parse_absolute(ARCHIVE_ROOT_KEY, value)?;
    // Url::join drops the last path segment unless the base ends with a slash.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// `PLAYSTV_*` keys in the env file that nothing reads, usually typos.
/// Other keys belong to other tools sharing the file and are left alone.
fn unknown_keys(vars: &HashMap<String, String>) -> Vec<&str> {
    let mut unknown: Vec<&str> = vars
        .keys()
        .map(String::as_str)
        .filter(|key| key.starts_with("PLAYSTV_") && !KNOWN_KEYS.contains(key))
        .collect();
    unknown.sort_unstable();
    unknown
}

/// Reads a dotenv-style file. A missing file is an empty one.
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
    Ok(content
        .lines()
        .filter_map(parse_env_line)
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect())
}

/// `KEY=value`, optionally prefixed with `export` and with the value wrapped
/// in matching single or double quotes. Comments, blanks and lines without
/// `=` yield nothing.
fn parse_env_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, unquote(value.trim())))
}

fn unquote(value: &str) -> &str {
    ['"', '\'']
        .into_iter()
        .find_map(|quote| value.strip_prefix(quote)?.strip_suffix(quote))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    fn build(file: &[(&str, &str)], overrides: ConfigOverrides) -> Result<ScraperConfig> {
        build_config_with_overrides(&vars(file), |_| None, overrides)
    }

    #[test]
    fn defaults_point_at_the_wayback_machine() {
        let config = ScraperConfig::defaults().unwrap();
        assert_eq!(config.archive_root.as_str(), DEFAULT_ARCHIVE_ROOT);
        assert_eq!(config.cdx_endpoint.as_str(), DEFAULT_CDX_ENDPOINT);
        assert_eq!(config.user_agent, "PlaysTV Scraper 1.0");
        assert_eq!(config.resolution, "720");
        assert_eq!(config.date_format, "%b %d %Y");
        assert_eq!(config.profile_url("someone"), "https://plays.tv/u/someone");
    }

    #[test]
    fn archive_root_gains_trailing_slash() {
        let config = build(
            &[
                (ARCHIVE_ROOT_KEY, "http://127.0.0.1:9000/archive"),
                (PROFILE_HOST_KEY, "plays.test"),
            ],
            ConfigOverrides::default(),
        )
        .unwrap();
        assert_eq!(config.archive_root.as_str(), "http://127.0.0.1:9000/archive/");
        assert_eq!(config.profile_url("x"), "https://plays.test/u/x");
        assert_eq!(config.cdx_endpoint.as_str(), DEFAULT_CDX_ENDPOINT);
    }

    #[test]
    fn override_beats_env_beats_file() {
        let file = vars(&[(PROFILE_HOST_KEY, "file.host")]);
        let env = |key: &str| (key == PROFILE_HOST_KEY).then(|| "env.host".to_string());

        let config = build_config_with_overrides(&file, env, ConfigOverrides::default()).unwrap();
        assert_eq!(config.profile_host, "env.host");

        let overrides = ConfigOverrides {
            profile_host: Some("override.host".into()),
            ..ConfigOverrides::default()
        };
        let config = build_config_with_overrides(&file, env, overrides).unwrap();
        assert_eq!(config.profile_host, "override.host");
    }

    #[test]
    fn blank_values_fall_through_to_the_next_source() {
        let file = vars(&[(PROFILE_HOST_KEY, "file.host")]);
        let overrides = ConfigOverrides {
            profile_host: Some("   ".into()),
            ..ConfigOverrides::default()
        };
        let config =
            build_config_with_overrides(&file, |_| Some(String::new()), overrides).unwrap();
        assert_eq!(config.profile_host, "file.host");

        let config = build(&[(PROFILE_HOST_KEY, "")], ConfigOverrides::default()).unwrap();
        assert_eq!(config.profile_host, DEFAULT_PROFILE_HOST);
    }

    #[test]
    fn relative_archive_root_is_rejected() {
        let overrides = ConfigOverrides {
            archive_root: Some("web.archive.org".into()),
            ..ConfigOverrides::default()
        };
        let err = build(&[], overrides).unwrap_err();
        assert!(err.to_string().contains(ARCHIVE_ROOT_KEY));
    }

    #[test]
    fn env_lines_accept_export_quotes_and_comments() {
        assert_eq!(
            parse_env_line("export PLAYSTV_ARCHIVE_ROOT=\"https://mirror.example/\""),
            Some((ARCHIVE_ROOT_KEY, "https://mirror.example/"))
        );
        assert_eq!(
            parse_env_line("  PLAYSTV_PROFILE_HOST = 'plays.tv' "),
            Some((PROFILE_HOST_KEY, "plays.tv"))
        );
        assert_eq!(parse_env_line("KEY=\"unbalanced"), Some(("KEY", "\"unbalanced")));
        assert_eq!(parse_env_line("# PLAYSTV_PROFILE_HOST=x"), None);
        assert_eq!(parse_env_line("NO_EQUALS_SIGN"), None);
        assert_eq!(parse_env_line("=value"), None);
        assert_eq!(parse_env_line(""), None);
    }

    #[test]
    fn unknown_playstv_keys_are_reported() {
        let file = vars(&[
            (PROFILE_HOST_KEY, "plays.tv"),
            ("PLAYSTV_ARCHIVE_RO0T", "typo"),
            ("PLAYSTV_RESOLUTION", "1080"),
            ("RUST_LOG", "debug"),
        ]);
        assert_eq!(
            unknown_keys(&file),
            vec!["PLAYSTV_ARCHIVE_RO0T", "PLAYSTV_RESOLUTION"]
        );
    }

    #[test]
    fn env_file_feeds_resolution() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("playstv.env");
        fs::write(
            &path,
            "# mirror\nexport PLAYSTV_PROFILE_HOST=\"plays.mirror\"\nRUST_LOG=debug\n",
        )
        .unwrap();

        let file = read_env_file(&path).unwrap();
        assert_eq!(file.len(), 2);
        let config = build_config_with_overrides(&file, |_| None, ConfigOverrides::default())
            .unwrap();
        assert_eq!(config.profile_host, "plays.mirror");
    }

    #[test]
    fn missing_env_file_is_empty() {
        let dir = tempdir().unwrap();
        assert!(read_env_file(&dir.path().join("missing.env")).unwrap().is_empty());
    }
}
