//! Strategy chain with an early-exit quality gate.

use std::path::Path;

use crate::config::RunConfig;
use crate::error::{Error, Result};
use crate::extractors::{default_strategies, run_contained, TextStrategy};
use crate::text::word_count_of;

/// What happened when one strategy ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Strategy produced text with this many words
    Counted(usize),
    /// Strategy ran but could not read the document (malformed, encrypted,
    /// parser panic); counts as zero words
    Unreadable(String),
    /// Strategy could not run at all (tool missing, I/O failure)
    Failed(String),
}

/// One strategy attempt within a cascade run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyAttempt {
    /// Strategy name
    pub strategy: &'static str,
    /// Result of the attempt
    pub outcome: AttemptOutcome,
}

/// Full trace of a cascade run for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeOutcome {
    /// Highest word count observed across attempts
    pub word_count: usize,
    /// Attempts in the order they ran
    pub attempts: Vec<StrategyAttempt>,
}

impl CascadeOutcome {
    /// Name of the first strategy that produced the winning count, if any succeeded.
    pub fn best_strategy(&self) -> Option<&'static str> {
        self.attempts
            .iter()
            .find(|a| a.outcome == AttemptOutcome::Counted(self.word_count))
            .map(|a| a.strategy)
    }
}

/// Ordered extraction strategies plus the threshold that stops escalation.
///
/// # Algorithm
///
/// 1. Run strategies in order, normalizing and counting each output
/// 2. Keep the maximum count seen; a lower count never replaces a higher one
/// 3. Stop as soon as the best count reaches `threshold`
/// 4. A strategy that cannot read the document counts as zero words and
///    escalation continues
///
/// A corrupt or encrypted document therefore resolves to a count of zero. Only
/// when no strategy could run at all does the document fail with
/// [`Error::AllStrategiesFailed`].
pub struct Cascade {
    strategies: Vec<Box<dyn TextStrategy>>,
    threshold: usize,
}

impl Cascade {
    /// Create a cascade from an explicit strategy list.
    pub fn new(strategies: Vec<Box<dyn TextStrategy>>, threshold: usize) -> Self {
        Self {
            strategies,
            threshold,
        }
    }

    /// The production cascade for a run configuration.
    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(default_strategies(config), config.ocr_threshold)
    }

    /// Escalation threshold.
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Strategy names in escalation order.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Best available word count for one document.
    pub fn extract_word_count(&self, path: &Path) -> Result<usize> {
        self.run(path).map(|outcome| outcome.word_count)
    }

    /// Run the cascade and return the full attempt trace.
    pub fn run(&self, path: &Path) -> Result<CascadeOutcome> {
        // A vanished or unreadable file is a document failure, not a strategy failure
        std::fs::metadata(path)?;

        let mut best = 0usize;
        let mut attempts = Vec::with_capacity(self.strategies.len());

        for (i, strategy) in self.strategies.iter().enumerate() {
            if i > 0 && best >= self.threshold {
                break;
            }
            if i > 0 {
                log::debug!(
                    "{}: {} words < {}, escalating to {}",
                    path.display(),
                    best,
                    self.threshold,
                    strategy.name()
                );
            }

            let outcome = match run_contained(strategy.as_ref(), path) {
                Ok(raw) => {
                    let count = word_count_of(&raw);
                    best = best.max(count);
                    AttemptOutcome::Counted(count)
                },
                Err(e) if e.is_execution_failure() => {
                    log::debug!("{} could not run on {}: {}", strategy.name(), path.display(), e);
                    AttemptOutcome::Failed(e.to_string())
                },
                Err(e) => {
                    log::debug!("{} failed on {}: {}", strategy.name(), path.display(), e);
                    AttemptOutcome::Unreadable(e.to_string())
                },
            };
            attempts.push(StrategyAttempt {
                strategy: strategy.name(),
                outcome,
            });
        }

        let all_failed = !attempts.is_empty()
            && attempts
                .iter()
                .all(|a| matches!(a.outcome, AttemptOutcome::Failed(_)));
        if all_failed {
            let failures = attempts
                .iter()
                .filter_map(|a| match &a.outcome {
                    AttemptOutcome::Failed(reason) => Some(format!("{}: {}", a.strategy, reason)),
                    AttemptOutcome::Counted(_) | AttemptOutcome::Unreadable(_) => None,
                })
                .collect::<Vec<_>>()
                .join("; ");
            return Err(Error::AllStrategiesFailed {
                path: path.to_path_buf(),
                failures,
            });
        }

        Ok(CascadeOutcome {
            word_count: best,
            attempts,
        })
    }
}
