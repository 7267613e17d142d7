use std::fmt;

use serde::Serialize;

/// What happened to one key of a batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PairOutcome {
    Written,
    Failed { error: String },
    MissingTable,
    MissingMetadata,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PairReport {
    pub key: String,
    #[serde(flatten)]
    pub outcome: PairOutcome,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub written: usize,
    pub failed: usize,
    pub missing_table: usize,
    pub missing_metadata: usize,
}

/// Per-key outcomes of a batch, in key order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub dry_run: bool,
    pub counts: Counts,
    pub pairs: Vec<PairReport>,
}

impl BatchReport {
    pub(crate) fn push(&mut self, key: &str, outcome: PairOutcome) {
        match &outcome {
            PairOutcome::Written => self.counts.written += 1,
            PairOutcome::Failed { .. } => self.counts.failed += 1,
            PairOutcome::MissingTable => self.counts.missing_table += 1,
            PairOutcome::MissingMetadata => self.counts.missing_metadata += 1,
        }
        self.pairs.push(PairReport {
            key: key.to_string(),
            outcome,
        });
    }

    pub fn has_failures(&self) -> bool {
        self.counts.failed > 0
    }

    pub fn outcome(&self, key: &str) -> Option<&PairOutcome> {
        self.pairs
            .iter()
            .find(|pair| pair.key == key)
            .map(|pair| &pair.outcome)
    }
}

impl fmt::Display for PairReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            PairOutcome::Written => write!(f, "  ok       {}", self.key),
            PairOutcome::Failed { error } => write!(f, "  FAILED   {}: {error}", self.key),
            PairOutcome::MissingTable => write!(f, "  skipped  {}: no table", self.key),
            PairOutcome::MissingMetadata => write!(f, "  skipped  {}: no metadata", self.key),
        }
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Counts {
            written,
            failed,
            missing_table,
            missing_metadata,
        } = self.counts;
        writeln!(
            f,
            "Summary: written={written} failed={failed} missing_table={missing_table} missing_metadata={missing_metadata}{}",
            if self.dry_run { " (dry run)" } else { "" }
        )?;
        for pair in &self.pairs {
            writeln!(f, "{pair}")?;
        }
        Ok(())
    }
}
