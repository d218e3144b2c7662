//! DatasetNode: one level of the Domain → Trial → Episode sampling hierarchy.

use crate::domain::describe::DataSummary;
use crate::domain::error::EpisamplerError;
use crate::domain::interval::RowInterval;
use crate::domain::params::SampleType;
use crate::domain::policy::{HierarchyPolicy, NodeKind, Partition};
use crate::domain::row::Row;
use crate::domain::sampler::{IntervalSampler, SampleRequest};
use crate::domain::store::TimeSeriesStore;
use crate::ports::diagnostic_port::DiagnosticSink;
use crate::ports::feed_port::FeedPort;
use chrono::TimeDelta;
use rand::Rng;
use std::fmt;
use std::sync::Arc;

/// How a sample was positioned inside its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOrigin {
    /// Drawn from the parent's train or test interval.
    Interval,
    /// Drawn from anywhere in the parent's data.
    Random,
}

/// Provenance stamped on a node when its parent produces it.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleMetadata {
    pub sample_type: SampleType,
    pub sample_num: usize,
    /// Ordinals of every ancestor sample from the root down, ending with
    /// `sample_num`.
    pub lineage: Vec<usize>,
    /// Row offset of the sample's first row inside the parent's data.
    pub first_row: usize,
    pub origin: SampleOrigin,
}

/// A dataset that can be reset and sampled into smaller child datasets.
///
/// `sample()` takes `&mut self` because it advances the sample counter; to
/// sample from several threads, either guard one node with a mutex or give
/// each worker its own clone.
#[derive(Clone)]
pub struct DatasetNode {
    kind: NodeKind,
    policy: Arc<HierarchyPolicy>,
    sink: Arc<dyn DiagnosticSink>,
    name: String,
    store: Option<TimeSeriesStore>,
    partition: Option<Partition>,
    sample_num: usize,
    metadata: Option<SampleMetadata>,
}

impl DatasetNode {
    pub fn new(kind: NodeKind, policy: Arc<HierarchyPolicy>, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            kind,
            policy,
            sink,
            name: kind.as_str().to_string(),
            store: None,
            partition: None,
            sample_num: 0,
            metadata: None,
        }
    }

    pub fn domain(policy: Arc<HierarchyPolicy>, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self::new(NodeKind::Domain, policy, sink)
    }

    /// Replaces the node's data with `rows` and gets it ready for sampling.
    pub fn reset(&mut self, rows: Vec<Row>) -> Result<(), EpisamplerError> {
        self.partition = None;
        self.store = Some(TimeSeriesStore::load(rows, self.sink.as_ref())?);
        self.reset_loaded()
    }

    /// Gets the node ready using the data it already holds.
    pub fn reset_loaded(&mut self) -> Result<(), EpisamplerError> {
        self.partition = None;
        let rows = self
            .store
            .as_ref()
            .map(|s| s.row_count())
            .ok_or_else(no_data)?;
        self.partition = Some(self.policy.partition(self.kind, rows)?);
        self.sample_num = 0;
        Ok(())
    }

    /// Draws a child from the train (Beta-shaped) or test (uniform) interval.
    pub fn sample<R: Rng + ?Sized>(
        &mut self,
        sample_type: SampleType,
        b_alpha: f64,
        b_beta: f64,
        rng: &mut R,
    ) -> Result<DatasetNode, EpisamplerError> {
        let partition = self.partition.ok_or(EpisamplerError::NotReady)?;
        let (interval, alpha, beta) = match sample_type {
            SampleType::Train => (partition.train, b_alpha, b_beta),
            SampleType::Test => (partition.test, 1.0, 1.0),
            SampleType::Random => {
                return Err(EpisamplerError::invalid_parameter(
                    "sample_type",
                    "expected train or test, use sample_random() for whole-range samples",
                ));
            }
        };
        self.draw(interval, alpha, beta, sample_type, SampleOrigin::Interval, rng)
    }

    /// Draws a child uniformly from the whole data range, ignoring the split.
    pub fn sample_random<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<DatasetNode, EpisamplerError> {
        let rows = self.row_count();
        if rows == 0 {
            return Err(no_data());
        }
        self.draw(
            RowInterval::new(0, rows),
            1.0,
            1.0,
            SampleType::Random,
            SampleOrigin::Random,
            rng,
        )
    }

    fn draw<R: Rng + ?Sized>(
        &mut self,
        interval: RowInterval,
        alpha: f64,
        beta: f64,
        sample_type: SampleType,
        origin: SampleOrigin,
        rng: &mut R,
    ) -> Result<DatasetNode, EpisamplerError> {
        let level = self.policy.level(self.kind).ok_or_else(|| {
            EpisamplerError::invalid_parameter(
                "child_kind",
                format!("{} nodes are leaves and cannot be sampled", self.kind),
            )
        })?;
        let store = self.store.as_ref().ok_or_else(no_data)?;
        let mut lineage = self
            .metadata
            .as_ref()
            .map(|m| m.lineage.clone())
            .unwrap_or_default();
        lineage.push(self.sample_num);
        let ordinals: Vec<String> = lineage.iter().map(usize::to_string).collect();

        let request = SampleRequest {
            interval,
            target_records: level.target_records,
            target_duration: level.sample_duration.to_delta(),
            max_gap: level.time_gap.to_delta(),
            start_weekdays: level.start_weekdays,
            start_00: level.start_00,
            alpha,
            beta,
            name_prefix: format!("{}_{}", sample_type, level.sample_name),
            name_suffix: format!("_{}", ordinals.join("-")),
        };
        let sampled = IntervalSampler::new(store, self.sink.as_ref()).sample(&request, rng)?;

        let mut child = DatasetNode::new(level.child_kind, self.policy.clone(), self.sink.clone());
        child.name = sampled.name;
        child.store = Some(TimeSeriesStore::from_ordered(store.slice(sampled.rows), 0));
        child.metadata = Some(SampleMetadata {
            sample_type,
            sample_num: self.sample_num,
            lineage,
            first_row: sampled.rows.start,
            origin,
        });
        self.sample_num += 1;
        Ok(child)
    }

    /// Descriptive statistics of the loaded rows.
    pub fn describe(&self) -> Result<DataSummary, EpisamplerError> {
        let store = self.store.as_ref().ok_or_else(no_data)?;
        Ok(DataSummary::compute(store.rows()))
    }

    /// Hands the node's rows to a feed sink without giving up ownership.
    pub fn to_feed(&self, port: &dyn FeedPort) -> Result<(), EpisamplerError> {
        let store = self.store.as_ref().ok_or_else(no_data)?;
        port.write(&self.name, store.rows())
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn child_kind(&self) -> Option<NodeKind> {
        self.policy.child_kind(self.kind)
    }

    pub fn policy(&self) -> &HierarchyPolicy {
        &self.policy
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> Option<&[Row]> {
        self.store.as_ref().map(|s| s.rows())
    }

    pub fn row_count(&self) -> usize {
        self.store.as_ref().map_or(0, |s| s.row_count())
    }

    /// Wall-clock span of the loaded data, `None` before loading.
    pub fn span(&self) -> Option<TimeDelta> {
        self.store.as_ref().map(|s| s.span())
    }

    pub fn duplicates_removed(&self) -> usize {
        self.store.as_ref().map_or(0, |s| s.duplicates_removed())
    }

    pub fn is_ready(&self) -> bool {
        self.partition.is_some()
    }

    pub fn train_interval(&self) -> Option<RowInterval> {
        self.partition.map(|p| p.train)
    }

    pub fn test_interval(&self) -> Option<RowInterval> {
        self.partition.map(|p| p.test)
    }

    pub fn sample_num(&self) -> usize {
        self.sample_num
    }

    pub fn metadata(&self) -> Option<&SampleMetadata> {
        self.metadata.as_ref()
    }
}

impl fmt::Debug for DatasetNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasetNode")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("rows", &self.row_count())
            .field("partition", &self.partition)
            .field("sample_num", &self.sample_num)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

fn no_data() -> EpisamplerError {
    EpisamplerError::DataUnavailable {
        reason: "instance holds no data, load rows with reset() first".into(),
    }
}
