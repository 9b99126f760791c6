use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use toml::Value;

pub const CONFIG_FILE_NAME: &str = "netprof.toml";

/// Rates and payload sizes behind the bandwidth model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorConfig {
    pub continuous_rate_hz: f64,
    pub manual_rate_hz: f64,
    pub built_in_rate_hz: f64,
    pub managed_rate_hz: f64,
    pub base_bytes_per_update: f64,
    pub bytes_per_synced_var: f64,
    /// Continuous behaviours above this count raise the traffic advisory.
    pub continuous_warning_threshold: u32,
}

pub const DEFAULT_ESTIMATOR: EstimatorConfig = EstimatorConfig {
    continuous_rate_hz: 10.0,
    manual_rate_hz: 0.2,
    built_in_rate_hz: 5.0,
    managed_rate_hz: 1.0,
    base_bytes_per_update: 24.0,
    bytes_per_synced_var: 12.0,
    continuous_warning_threshold: 10,
};

impl Default for EstimatorConfig {
    fn default() -> Self {
        DEFAULT_ESTIMATOR
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticClassifierConfig {
    pub primary_type: &'static str,
    pub framework_prefix: &'static str,
    pub built_in_families: &'static [&'static str],
    pub sync_property_names: &'static [&'static str],
    pub program_source_names: &'static [&'static str],
    pub synced_array_names: &'static [&'static str],
    pub synced_tag: &'static str,
}

impl StaticClassifierConfig {
    pub fn to_runtime(self) -> ClassifierConfig {
        fn owned(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }
        ClassifierConfig {
            primary_type: self.primary_type.to_string(),
            framework_prefix: self.framework_prefix.to_string(),
            built_in_families: owned(self.built_in_families),
            sync_property_names: owned(self.sync_property_names),
            program_source_names: owned(self.program_source_names),
            synced_array_names: owned(self.synced_array_names),
            synced_tag: self.synced_tag.to_string(),
        }
    }
}

pub const DEFAULT_CLASSIFIER: StaticClassifierConfig = StaticClassifierConfig {
    primary_type: "UdonBehaviour",
    framework_prefix: "VRC",
    built_in_families: &["Pickup", "ObjectSync", "PlayerAudio", "Station"],
    sync_property_names: &[
        "syncMethod",
        "SyncMethod",
        "Synchronization",
        "synchronization",
    ],
    program_source_names: &[
        "programSource",
        "m_ProgramSource",
        "serializedProgramAsset",
        "m_SerializedProgramAsset",
    ],
    synced_array_names: &[
        "syncedVariables",
        "syncedVariableNames",
        "syncedVariableTable",
    ],
    synced_tag: "UdonSynced",
};

/// Names the classifier probes and the rules that route component types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierConfig {
    pub primary_type: String,
    pub framework_prefix: String,
    pub built_in_families: Vec<String>,
    pub sync_property_names: Vec<String>,
    pub program_source_names: Vec<String>,
    pub synced_array_names: Vec<String>,
    pub synced_tag: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        DEFAULT_CLASSIFIER.to_runtime()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfilerConfig {
    pub estimator: EstimatorConfig,
    pub classifier: ClassifierConfig,
}

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("invalid field `{0}`: {1}")]
    InvalidField(&'static str, String),
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE_NAME)
}

/// Writes the default config next to the scene files unless one already exists.
/// Returns whether a file was written.
pub fn ensure_config_toml(root: &Path) -> std::io::Result<bool> {
    let path = config_path(root);
    if path.exists() {
        return Ok(false);
    }
    fs::create_dir_all(root)?;
    fs::write(path, default_config_toml())?;
    Ok(true)
}

pub fn default_config_toml() -> String {
    let e = DEFAULT_ESTIMATOR;
    let c = DEFAULT_CLASSIFIER;
    format!(
        r#"[estimator]
continuous_rate_hz = {:?}
manual_rate_hz = {:?}
built_in_rate_hz = {:?}
managed_rate_hz = {:?}
base_bytes_per_update = {:?}
bytes_per_synced_var = {:?}
continuous_warning_threshold = {}

[classifier]
primary_type = "{}"
framework_prefix = "{}"
built_in_families = {}
sync_property_names = {}
program_source_names = {}
synced_array_names = {}
synced_tag = "{}"
"#,
        e.continuous_rate_hz,
        e.manual_rate_hz,
        e.built_in_rate_hz,
        e.managed_rate_hz,
        e.base_bytes_per_update,
        e.bytes_per_synced_var,
        e.continuous_warning_threshold,
        c.primary_type,
        c.framework_prefix,
        toml_string_list(c.built_in_families),
        toml_string_list(c.sync_property_names),
        toml_string_list(c.program_source_names),
        toml_string_list(c.synced_array_names),
        c.synced_tag,
    )
}

/// Loads `netprof.toml` from `root`; a missing file yields the defaults.
pub fn load_config(root: &Path) -> Result<ProfilerConfig, ProjectError> {
    load_config_file(&config_path(root))
}

pub fn load_config_file(path: &Path) -> Result<ProfilerConfig, ProjectError> {
    if !path.exists() {
        return Ok(ProfilerConfig::default());
    }
    let contents = fs::read_to_string(path)?;
    parse_config_toml(&contents)
}

pub fn parse_config_toml(contents: &str) -> Result<ProfilerConfig, ProjectError> {
    let value: Value = contents.parse::<Value>()?;

    let mut config = ProfilerConfig::default();

    if let Some(raw) = value.get("estimator") {
        let table = raw.as_table().ok_or(ProjectError::InvalidField(
            "estimator",
            "must be a table".to_string(),
        ))?;
        let e = &mut config.estimator;
        read_rate(table, "estimator.continuous_rate_hz", &mut e.continuous_rate_hz)?;
        read_rate(table, "estimator.manual_rate_hz", &mut e.manual_rate_hz)?;
        read_rate(table, "estimator.built_in_rate_hz", &mut e.built_in_rate_hz)?;
        read_rate(table, "estimator.managed_rate_hz", &mut e.managed_rate_hz)?;
        read_rate(table, "estimator.base_bytes_per_update", &mut e.base_bytes_per_update)?;
        read_rate(table, "estimator.bytes_per_synced_var", &mut e.bytes_per_synced_var)?;
        if let Some(raw) = table.get("continuous_warning_threshold") {
            let n = raw.as_integer().ok_or(ProjectError::InvalidField(
                "estimator.continuous_warning_threshold",
                "must be an integer".to_string(),
            ))?;
            e.continuous_warning_threshold = u32::try_from(n).map_err(|_| {
                ProjectError::InvalidField(
                    "estimator.continuous_warning_threshold",
                    "must be a non-negative integer".to_string(),
                )
            })?;
        }
    }

    if let Some(raw) = value.get("classifier") {
        let table = raw.as_table().ok_or(ProjectError::InvalidField(
            "classifier",
            "must be a table".to_string(),
        ))?;
        let c = &mut config.classifier;
        read_name(table, "classifier.primary_type", &mut c.primary_type)?;
        read_name(table, "classifier.framework_prefix", &mut c.framework_prefix)?;
        read_name(table, "classifier.synced_tag", &mut c.synced_tag)?;
        read_names(table, "classifier.built_in_families", &mut c.built_in_families)?;
        read_names(table, "classifier.sync_property_names", &mut c.sync_property_names)?;
        read_names(table, "classifier.program_source_names", &mut c.program_source_names)?;
        read_names(table, "classifier.synced_array_names", &mut c.synced_array_names)?;
    }

    Ok(config)
}

fn read_rate(
    table: &toml::Table,
    field: &'static str,
    out: &mut f64,
) -> Result<(), ProjectError> {
    let Some(raw) = table.get(field_key(field)) else {
        return Ok(());
    };
    // Integers are accepted so `base_bytes_per_update = 24` works.
    let value = match raw {
        Value::Float(f) => *f,
        Value::Integer(i) => *i as f64,
        _ => {
            return Err(ProjectError::InvalidField(
                field,
                "must be a number".to_string(),
            ));
        }
    };
    if !value.is_finite() || value < 0.0 {
        return Err(ProjectError::InvalidField(
            field,
            "must be a finite, non-negative number".to_string(),
        ));
    }
    *out = value;
    Ok(())
}

fn read_name(
    table: &toml::Table,
    field: &'static str,
    out: &mut String,
) -> Result<(), ProjectError> {
    let Some(raw) = table.get(field_key(field)) else {
        return Ok(());
    };
    let value = raw
        .as_str()
        .ok_or(ProjectError::InvalidField(field, "must be a string".to_string()))?
        .trim();
    if value.is_empty() {
        return Err(ProjectError::InvalidField(
            field,
            "must not be empty".to_string(),
        ));
    }
    *out = value.to_string();
    Ok(())
}

fn read_names(
    table: &toml::Table,
    field: &'static str,
    out: &mut Vec<String>,
) -> Result<(), ProjectError> {
    let Some(raw) = table.get(field_key(field)) else {
        return Ok(());
    };
    let items = raw.as_array().ok_or(ProjectError::InvalidField(
        field,
        "must be an array of strings".to_string(),
    ))?;
    let mut names = Vec::with_capacity(items.len());
    for item in items {
        let name = item.as_str().map(str::trim).unwrap_or_default();
        if name.is_empty() {
            return Err(ProjectError::InvalidField(
                field,
                "entries must be non-empty strings".to_string(),
            ));
        }
        names.push(name.to_string());
    }
    *out = names;
    Ok(())
}

/// `estimator.manual_rate_hz` -> `manual_rate_hz`
fn field_key(field: &str) -> &str {
    field.rsplit('.').next().unwrap_or(field)
}

fn toml_string_list(items: &[&str]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| format!("\"{s}\"")).collect();
    format!("[{}]", quoted.join(", "))
}
