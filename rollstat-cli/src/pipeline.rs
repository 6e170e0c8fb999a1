//! Runs every configured statistic over a dataset in one sequential pass.

use anyhow::{anyhow, ensure, Result};
use tracing::{debug, info};

use rollstat_config::{PipelineConfig, StatisticConfig, StatisticKind};
use rollstat_core::{
    Indicator, MovingAverage, PercentRank, RollingCorrelation, RollingMax, RollingMin, RollingSum,
    RollingVariance, SlidingOrderStatistics, WindowedSpearman,
};

use crate::dataset::{Column, Dataset};

/// Engine behind one output column.
enum Engine {
    Sum(RollingSum),
    Average(RollingSum),
    Variance(RollingVariance),
    StdDev(RollingVariance),
    Max(RollingMax),
    Min(RollingMin),
    Correlation(RollingCorrelation),
    Covariance(RollingCorrelation),
    PercentRank(PercentRank),
    Median(SlidingOrderStatistics),
    Spearman(WindowedSpearman),
    Kernel(MovingAverage),
}

impl Engine {
    fn build(statistic: &StatisticConfig) -> Result<Self> {
        let length = statistic.length;
        let engine = match statistic.kind {
            StatisticKind::Sum => Engine::Sum(RollingSum::bounded(length)),
            StatisticKind::Average => Engine::Average(RollingSum::bounded(length)),
            StatisticKind::Variance => Engine::Variance(RollingVariance::bounded(length)),
            StatisticKind::StdDev => Engine::StdDev(RollingVariance::bounded(length)),
            StatisticKind::Max => Engine::Max(RollingMax::new(length)?),
            StatisticKind::Min => Engine::Min(RollingMin::new(length)?),
            StatisticKind::Correlation => {
                Engine::Correlation(RollingCorrelation::bounded(length))
            }
            StatisticKind::Covariance => Engine::Covariance(RollingCorrelation::bounded(length)),
            StatisticKind::PercentRank => Engine::PercentRank(PercentRank::new(length)?),
            StatisticKind::Median => Engine::Median(SlidingOrderStatistics::new(length)?),
            StatisticKind::Spearman => Engine::Spearman(WindowedSpearman::new(length)?),
            StatisticKind::MovingAverage => {
                let method = statistic
                    .method
                    .ok_or_else(|| anyhow!("{} has no moving-average method", statistic.label()))?;
                Engine::Kernel(method.into())
            }
        };
        Ok(engine)
    }
}

/// One configured statistic with its output buffer.
struct Stage {
    label: String,
    length: usize,
    engine: Engine,
    values: Vec<f64>,
}

impl Stage {
    /// Feeds the step's observation, then queries; `y` is the paired value.
    fn observe(&mut self, x: f64, y: f64) {
        let length = self.length;
        let value = match &mut self.engine {
            Engine::Sum(sum) => {
                sum.add(x);
                sum.sum(length)
            }
            Engine::Average(sum) => {
                sum.add(x);
                sum.average(length)
            }
            Engine::Variance(variance) => {
                variance.add(x);
                variance.variance(length)
            }
            Engine::StdDev(variance) => {
                variance.add(x);
                variance.std_dev(length)
            }
            Engine::Max(max) => max.next(x),
            Engine::Min(min) => min.next(x),
            Engine::Correlation(correlation) => {
                correlation.add(x, y);
                correlation.r(length)
            }
            Engine::Covariance(correlation) => {
                correlation.add(x, y);
                correlation.covariance(length)
            }
            Engine::PercentRank(rank) => rank.next(x),
            Engine::Median(window) => {
                window.add(x);
                window.median()
            }
            Engine::Spearman(rho) => rho.next(x),
            Engine::Kernel(_) => return,
        };
        self.values.push(value);
    }

    fn finish(self, input: &[f64]) -> Column {
        let values = match self.engine {
            Engine::Kernel(kind) => kind.apply(input, self.length),
            _ => self.values,
        };
        Column::new(self.label, values)
    }
}

/// Computes every statistic, returning the input column followed by one column per statistic.
pub fn compute(config: &PipelineConfig, dataset: &Dataset) -> Result<Vec<Column>> {
    let mut stages = config
        .statistics
        .iter()
        .map(|statistic| {
            Ok(Stage {
                label: statistic.label(),
                length: statistic.length,
                engine: Engine::build(statistic)?,
                values: Vec::with_capacity(dataset.len()),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let needs_pair = config.statistics.iter().any(|s| s.kind.is_paired());
    let paired = dataset.paired.as_ref().map(|column| column.values.as_slice());
    if needs_pair {
        let paired = paired.ok_or_else(|| anyhow!("paired statistics need a paired column"))?;
        ensure!(
            paired.len() == dataset.len(),
            "paired column has {} rows, expected {}",
            paired.len(),
            dataset.len()
        );
    }

    info!(
        rows = dataset.len(),
        statistics = stages.len(),
        column = %dataset.primary.name,
        "running statistics"
    );
    for (index, &x) in dataset.primary.values.iter().enumerate() {
        let y = paired.and_then(|values| values.get(index)).copied().unwrap_or(f64::NAN);
        for stage in &mut stages {
            stage.observe(x, y);
        }
    }

    let mut columns = Vec::with_capacity(stages.len() + 1);
    columns.push(dataset.primary.clone());
    for stage in stages {
        debug!(label = %stage.label, length = stage.length, "statistic complete");
        columns.push(stage.finish(&dataset.primary.values));
    }
    Ok(columns)
}
