//! Configuration loading and typed settings for rollstat pipelines.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use rollstat_core::MovingAverage;
use serde::{Deserialize, Serialize};

/// Prefix for environment overrides, e.g. `ROLLSTAT__INPUT__COLUMN=open`.
pub const ENV_PREFIX: &str = "ROLLSTAT";

/// Complete description of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Where observations come from.
    #[serde(default)]
    pub input: InputConfig,
    /// How derived columns are written.
    #[serde(default)]
    pub output: OutputConfig,
    /// Statistics computed over the input column, in output order.
    #[serde(default)]
    pub statistics: Vec<StatisticConfig>,
}

/// Input column selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    /// Header of the primary numeric column.
    #[serde(default = "default_column")]
    pub column: String,
    /// Header of the second series used by correlation statistics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paired_column: Option<String>,
    /// Single-byte field delimiter.
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            column: default_column(),
            paired_column: None,
            delimiter: default_delimiter(),
        }
    }
}

impl InputConfig {
    /// The delimiter as the byte expected by CSV readers.
    pub fn delimiter_byte(&self) -> Result<u8> {
        match self.delimiter.as_bytes() {
            [byte] => Ok(*byte),
            _ => bail!(
                "input.delimiter must be a single byte, got {:?}",
                self.delimiter
            ),
        }
    }
}

fn default_column() -> String {
    "close".to_string()
}

fn default_delimiter() -> String {
    ",".to_string()
}

/// Output encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Comma-separated values with a header row.
    #[default]
    Csv,
    /// A JSON object mapping column names to arrays.
    Json,
}

/// Output settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Encoding used when the output path does not imply one.
    #[serde(default)]
    pub format: OutputFormat,
    /// Decimal places written to CSV; full precision when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<usize>,
}

/// Which window statistic to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatisticKind {
    /// Trailing sum.
    Sum,
    /// Trailing mean.
    Average,
    /// Trailing population variance.
    Variance,
    /// Trailing population standard deviation.
    StdDev,
    /// Trailing maximum.
    Max,
    /// Trailing minimum.
    Min,
    /// Pearson correlation against the paired column.
    Correlation,
    /// Covariance against the paired column.
    Covariance,
    /// Fraction of the window at or below the newest value.
    PercentRank,
    /// Trailing median.
    Median,
    /// Spearman correlation of the window against time.
    Spearman,
    /// Batch moving-average kernel selected by `method`.
    MovingAverage,
}

impl StatisticKind {
    /// Snake-case name used in labels.
    pub fn name(self) -> &'static str {
        match self {
            StatisticKind::Sum => "sum",
            StatisticKind::Average => "average",
            StatisticKind::Variance => "variance",
            StatisticKind::StdDev => "std_dev",
            StatisticKind::Max => "max",
            StatisticKind::Min => "min",
            StatisticKind::Correlation => "correlation",
            StatisticKind::Covariance => "covariance",
            StatisticKind::PercentRank => "percent_rank",
            StatisticKind::Median => "median",
            StatisticKind::Spearman => "spearman",
            StatisticKind::MovingAverage => "moving_average",
        }
    }

    /// Returns `true` when the statistic consumes the paired column.
    pub fn is_paired(self) -> bool {
        matches!(self, StatisticKind::Correlation | StatisticKind::Covariance)
    }
}

impl fmt::Display for StatisticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Moving-average family for `moving_average` statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AverageMethod {
    /// Simple moving average.
    Sma,
    /// Linearly weighted moving average.
    Wma,
    /// Exponential moving average.
    Ema,
    /// Wilder's smoothing.
    Wilder,
}

impl From<AverageMethod> for MovingAverage {
    fn from(method: AverageMethod) -> Self {
        match method {
            AverageMethod::Sma => MovingAverage::Simple,
            AverageMethod::Wma => MovingAverage::Weighted,
            AverageMethod::Ema => MovingAverage::Exponential,
            AverageMethod::Wilder => MovingAverage::Wilder,
        }
    }
}

/// One derived output column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticConfig {
    /// Output column name; defaults to `<kind>_<length>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Statistic to compute.
    pub kind: StatisticKind,
    /// Trailing window length (the period for moving averages).
    pub length: usize,
    /// Moving-average family, required for `moving_average`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<AverageMethod>,
}

impl StatisticConfig {
    /// Builds an unnamed statistic.
    pub fn new(kind: StatisticKind, length: usize) -> Self {
        Self {
            name: None,
            kind,
            length,
            method: None,
        }
    }

    /// Builds a moving-average statistic.
    pub fn moving_average(method: AverageMethod, period: usize) -> Self {
        Self {
            method: Some(method),
            ..Self::new(StatisticKind::MovingAverage, period)
        }
    }

    /// Output column name.
    pub fn label(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        match (self.kind, self.method) {
            (StatisticKind::MovingAverage, Some(method)) => {
                format!("{}_{}", MovingAverage::from(method), self.length)
            }
            (kind, _) => format!("{kind}_{}", self.length),
        }
    }
}

impl PipelineConfig {
    /// Checks cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.input.column.trim().is_empty(),
            "input.column must name a CSV header"
        );
        self.input.delimiter_byte()?;
        ensure!(
            !self.statistics.is_empty(),
            "configure at least one [[statistics]] entry"
        );

        let mut labels = HashSet::new();
        for (index, statistic) in self.statistics.iter().enumerate() {
            let label = statistic.label();
            ensure!(
                statistic.length > 0,
                "statistic #{index} ({label}) needs a length greater than zero"
            );
            if statistic.kind.is_paired() {
                ensure!(
                    self.input.paired_column.is_some(),
                    "statistic #{index} ({label}) requires input.paired_column"
                );
            }
            match (statistic.kind, statistic.method) {
                (StatisticKind::MovingAverage, None) => {
                    bail!("statistic #{index} ({label}) requires a method (sma, wma, ema, wilder)")
                }
                (kind, Some(_)) if kind != StatisticKind::MovingAverage => {
                    bail!("statistic #{index} ({label}) does not take a method")
                }
                _ => {}
            }
            ensure!(
                label != self.input.column && labels.insert(label.clone()),
                "duplicate output column {label:?}"
            );
        }
        Ok(())
    }

    /// Renders the configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to render configuration as TOML")
    }

    /// A small configuration exercising each family of statistics.
    pub fn example() -> Self {
        Self {
            input: InputConfig {
                paired_column: Some("volume".to_string()),
                ..InputConfig::default()
            },
            output: OutputConfig::default(),
            statistics: vec![
                StatisticConfig::new(StatisticKind::Sum, 3),
                StatisticConfig::new(StatisticKind::Max, 14),
                StatisticConfig::new(StatisticKind::Min, 14),
                StatisticConfig::new(StatisticKind::Correlation, 20),
                StatisticConfig::new(StatisticKind::PercentRank, 50),
                StatisticConfig::new(StatisticKind::Spearman, 10),
                StatisticConfig::moving_average(AverageMethod::Ema, 12),
                StatisticConfig::moving_average(AverageMethod::Wilder, 14),
            ],
        }
    }
}

fn deserialize(builder: ConfigBuilder<DefaultState>) -> Result<PipelineConfig> {
    let settings = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("failed to assemble configuration sources")?;
    let config: PipelineConfig = settings
        .try_deserialize()
        .context("configuration does not match the expected layout")?;
    config.validate()?;
    Ok(config)
}

/// Loads and validates a configuration file, applying environment overrides.
pub fn load_config(path: &Path) -> Result<PipelineConfig> {
    ensure!(
        path.exists(),
        "configuration file {} does not exist",
        path.display()
    );
    let builder = Config::builder().add_source(File::from(path).format(FileFormat::Toml));
    deserialize(builder).with_context(|| format!("invalid configuration in {}", path.display()))
}

/// Parses and validates a configuration held in memory.
pub fn parse_config(raw: &str) -> Result<PipelineConfig> {
    let builder = Config::builder().add_source(File::from_str(raw, FileFormat::Toml));
    deserialize(builder)
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::sync::{Mutex, MutexGuard};

    use super::*;

    // Environment overrides are process-wide; tests reading them take this lock.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn env_lock() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    const SAMPLE: &str = r#"
        [input]
        column = "close"
        paired_column = "volume"

        [output]
        format = "json"
        precision = 4

        [[statistics]]
        kind = "sum"
        length = 3

        [[statistics]]
        name = "slow"
        kind = "moving_average"
        method = "wilder"
        length = 14

        [[statistics]]
        kind = "correlation"
        length = 20
    "#;

    #[test]
    fn parses_a_full_configuration() {
        let _env = env_lock();
        let config = parse_config(SAMPLE).unwrap();
        assert_eq!(config.input.paired_column.as_deref(), Some("volume"));
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.output.precision, Some(4));
        assert_eq!(config.statistics.len(), 3);
        assert_eq!(config.statistics[0].label(), "sum_3");
        assert_eq!(config.statistics[1].label(), "slow");
        assert_eq!(
            MovingAverage::from(config.statistics[1].method.unwrap()),
            MovingAverage::Wilder
        );
    }

    #[test]
    fn defaults_fill_missing_sections() {
        let _env = env_lock();
        let config = parse_config(
            r#"
            [[statistics]]
            kind = "max"
            length = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.input, InputConfig::default());
        assert_eq!(config.output.format, OutputFormat::Csv);
    }

    #[test]
    fn rejects_zero_length() {
        let err = parse_config(
            r#"
            [[statistics]]
            kind = "sum"
            length = 0
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("greater than zero"));
    }

    #[test]
    fn correlation_requires_a_paired_column() {
        let mut config = PipelineConfig::example();
        config.input.paired_column = None;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("paired_column"));
    }

    #[test]
    fn moving_average_requires_a_method() {
        let mut config = PipelineConfig::example();
        config.statistics = vec![StatisticConfig::new(StatisticKind::MovingAverage, 5)];
        assert!(config.validate().is_err());

        config.statistics = vec![StatisticConfig {
            method: Some(AverageMethod::Sma),
            ..StatisticConfig::new(StatisticKind::Sum, 5)
        }];
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_duplicate_labels() {
        let mut config = PipelineConfig::example();
        config.statistics = vec![
            StatisticConfig::new(StatisticKind::Sum, 3),
            StatisticConfig::new(StatisticKind::Sum, 3),
        ];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn rejects_multi_byte_delimiters() {
        let mut config = PipelineConfig::example();
        config.input.delimiter = "::".to_string();
        assert!(config.validate().is_err());
        config.input.delimiter = ";".to_string();
        assert_eq!(config.input.delimiter_byte().unwrap(), b';');
    }

    #[test]
    fn example_round_trips_through_toml() {
        let _env = env_lock();
        let example = PipelineConfig::example();
        example.validate().unwrap();
        let rendered = example.to_toml().unwrap();
        assert_eq!(parse_config(&rendered).unwrap(), example);
    }

    #[test]
    fn environment_overrides_file_values() {
        let _env = env_lock();
        env::set_var("ROLLSTAT__INPUT__COLUMN", "open");
        env::set_var("ROLLSTAT__OUTPUT__PRECISION", "2");
        let parsed = parse_config(SAMPLE);
        env::remove_var("ROLLSTAT__INPUT__COLUMN");
        env::remove_var("ROLLSTAT__OUTPUT__PRECISION");

        let config = parsed.unwrap();
        assert_eq!(config.input.column, "open");
        assert_eq!(config.input.paired_column.as_deref(), Some("volume"));
        assert_eq!(config.output.precision, Some(2));
        assert_eq!(config.statistics.len(), 3);

        let config = parse_config(SAMPLE).unwrap();
        assert_eq!(config.input.column, "close");
    }
}
