//! Parameter sweep utilities for grid search over strategy parameters.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::config::RunConfig;
use crate::runner::{BacktestResult, RunError, Runner};

/// Parameter grid for the crossover strategies: every (fast, slow) pair
/// with fast < slow is one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamGrid {
    pub fast_periods: Vec<usize>,
    pub slow_periods: Vec<usize>,
}

impl ParamGrid {
    pub fn new(fast_periods: Vec<usize>, slow_periods: Vec<usize>) -> Self {
        Self {
            fast_periods,
            slow_periods,
        }
    }

    /// Conventional daily-bar grid: fast 5-20 against slow 20-100.
    pub fn crossover_default() -> Self {
        Self {
            fast_periods: vec![5, 10, 15, 20],
            slow_periods: vec![20, 30, 50, 100],
        }
    }

    /// Upper bound on grid size, before invalid pairs are skipped.
    pub fn size(&self) -> usize {
        self.fast_periods.len() * self.slow_periods.len()
    }

    /// All valid configurations: the base config with each (fast, slow)
    /// pair substituted in. Pairs with fast >= slow are skipped.
    pub fn generate_configs(&self, base: &RunConfig) -> Vec<RunConfig> {
        let mut configs = Vec::new();
        for &fast in &self.fast_periods {
            for &slow in &self.slow_periods {
                if fast >= slow {
                    continue;
                }
                let mut config = base.clone();
                config.strategy = config
                    .strategy
                    .with_param("fast_period", fast as f64)
                    .with_param("slow_period", slow as f64);
                configs.push(config);
            }
        }
        configs
    }
}

/// Which metric orders sweep results. "Best" is always the maximum of
/// the ranking key; drawdown is negative, so the shallowest drawdown
/// naturally ranks first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankMetric {
    Sharpe,
    TotalReturn,
    MaxDrawdown,
    ProfitFactor,
}

impl RankMetric {
    fn key(&self, result: &BacktestResult) -> f64 {
        match self {
            RankMetric::Sharpe => result.metrics.sharpe,
            RankMetric::TotalReturn => result.metrics.total_return,
            RankMetric::MaxDrawdown => result.metrics.max_drawdown,
            RankMetric::ProfitFactor => result.metrics.profit_factor,
        }
    }
}

/// Parameter sweep executor: runs every configuration in a grid against
/// one runner, optionally in parallel via rayon.
pub struct ParamSweep<'a> {
    runner: &'a Runner,
    parallel: bool,
}

impl<'a> ParamSweep<'a> {
    pub fn new(runner: &'a Runner) -> Self {
        Self {
            runner,
            parallel: true,
        }
    }

    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Run every configuration in the grid. The first failing run aborts
    /// the sweep; a sweep over a validated grid normally cannot fail.
    pub fn sweep(&self, grid: &ParamGrid, base: &RunConfig) -> Result<SweepResults, RunError> {
        let configs = grid.generate_configs(base);

        let results: Vec<BacktestResult> = if self.parallel {
            configs
                .par_iter()
                .map(|config| self.runner.run(config))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            configs
                .iter()
                .map(|config| self.runner.run(config))
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(SweepResults::new(results))
    }
}

/// Results from a parameter sweep, addressable by RunId.
#[derive(Debug)]
pub struct SweepResults {
    results: Vec<BacktestResult>,
    by_run_id: HashMap<String, usize>,
}

impl SweepResults {
    fn new(results: Vec<BacktestResult>) -> Self {
        let by_run_id = results
            .iter()
            .enumerate()
            .map(|(i, r)| (r.run_id.clone(), i))
            .collect();
        Self { results, by_run_id }
    }

    pub fn all(&self) -> &[BacktestResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn get(&self, run_id: &str) -> Option<&BacktestResult> {
        self.by_run_id.get(run_id).map(|&i| &self.results[i])
    }

    /// Results ordered best-first by the given metric. NaN keys sink to
    /// the bottom so a degenerate run can never rank best.
    pub fn ranked_by(&self, metric: RankMetric) -> Vec<&BacktestResult> {
        let mut sorted: Vec<&BacktestResult> = self.results.iter().collect();
        sorted.sort_by(|a, b| compare_keys(metric.key(b), metric.key(a)));
        sorted
    }

    /// The single best run by the given metric, if any runs exist.
    pub fn best_by(&self, metric: RankMetric) -> Option<&BacktestResult> {
        self.results
            .iter()
            .filter(|r| !metric.key(r).is_nan())
            .max_by(|a, b| compare_keys(metric.key(a), metric.key(b)))
    }
}

fn compare_keys(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}
