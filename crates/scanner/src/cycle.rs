//! 사이클 집계기 -- 한 번의 스캔 사이클을 구동합니다.
//!
//! 설정된 모든 소스(로컬 경로 확장 후, 원격 경로 나열 후)에 대해
//! 테일 → 분류 → 이벤트 저장 → 체크포인트 갱신을 차례로 수행하고,
//! 카테고리별 카운트와 제한된 샘플을 담은 [`CycleSummary`]를 만듭니다.
//!
//! # 순서 보장
//! - 소스 안에서 이벤트는 파일 순서를 따릅니다.
//! - 이벤트 저장이 성공한 뒤에만 체크포인트를 전진시킵니다.
//! - 한 소스의 실패는 그 소스만 건너뛰며 사이클은 계속됩니다.

use std::sync::Arc;
use std::time::Instant;

use tailguard_core::config::RemoteHostConfig;
use tailguard_core::event::{CycleReport, IncidentEvent};
use tailguard_core::metrics as m;
use tailguard_core::pipeline::{CheckpointStore, EventStore};
use tailguard_core::types::{Category, SourceId};

use crate::config::ScannerConfig;
use crate::error::ScannerError;
use crate::rule::{IncidentClassifier, PatternRegistry};
use crate::source::{
    FilenameFilter, LocalReader, SessionPool, SourceReader, expand_local_paths,
    expand_remote_paths,
};
use crate::tailer::{self, TailOutcome};

/// 카테고리 하나의 사이클 집계
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySummary {
    /// 카테고리
    pub category: Category,
    /// 이번 사이클의 이벤트 수
    pub count: u64,
    /// 이벤트를 만든 소스 (처음 관찰된 순서, 최대 `sample_limit`개)
    pub samples: Vec<SourceId>,
}

/// 한 사이클의 카테고리별 카운트와 샘플
///
/// 레지스트리의 모든 카테고리를 레지스트리 순서로 포함합니다 (카운트 0 포함).
#[derive(Debug, Clone, PartialEq)]
pub struct CycleSummary {
    categories: Vec<CategorySummary>,
    sample_limit: usize,
}

impl CycleSummary {
    /// 레지스트리의 카테고리로 빈 요약을 만듭니다.
    pub fn new(registry: &PatternRegistry, sample_limit: usize) -> Self {
        Self {
            categories: registry
                .categories()
                .map(|category| CategorySummary {
                    category: category.clone(),
                    count: 0,
                    samples: Vec::new(),
                })
                .collect(),
            sample_limit,
        }
    }

    /// 저장된 이벤트를 집계에 반영합니다.
    pub fn record(&mut self, events: &[IncidentEvent]) {
        for event in events {
            let Some(entry) = self
                .categories
                .iter_mut()
                .find(|entry| entry.category == event.category)
            else {
                continue;
            };

            entry.count += 1;
            if entry.samples.len() < self.sample_limit
                && !entry
                    .samples
                    .iter()
                    .any(|s| s.host == event.host && s.path == event.filepath)
            {
                entry.samples.push(event.source_id());
            }
        }
    }

    /// 카테고리별 집계 (레지스트리 순서)
    pub fn categories(&self) -> &[CategorySummary] {
        &self.categories
    }

    /// 카테고리의 카운트. 알 수 없는 카테고리는 0입니다.
    pub fn count_for(&self, category: &str) -> u64 {
        self.get(category).map(|e| e.count).unwrap_or(0)
    }

    /// 카테고리의 샘플 소스
    pub fn samples_for(&self, category: &str) -> &[SourceId] {
        self.get(category).map(|e| e.samples.as_slice()).unwrap_or(&[])
    }

    /// 전체 이벤트 수
    pub fn total(&self) -> u64 {
        self.categories.iter().map(|e| e.count).sum()
    }

    fn get(&self, category: &str) -> Option<&CategorySummary> {
        self.categories
            .iter()
            .find(|e| e.category.as_str() == category)
    }
}

/// 사이클 실행 결과
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    /// 이번 사이클에 저장된 새 이벤트 (소스 처리 순서, 소스 안에서는 파일 순서)
    pub events: Vec<IncidentEvent>,
    /// 알림 평가용 요약
    pub summary: CycleSummary,
    /// 스케줄러 로깅/메트릭용 보고서
    pub report: CycleReport,
}

#[derive(Debug, Default)]
struct CycleStats {
    scanned: usize,
    skipped: usize,
    failed: usize,
    bytes_read: u64,
    lines_read: u64,
}

/// 사이클 집계기
///
/// 레지스트리와 설정은 생성 시 고정되며 사이클 사이에 변하지 않습니다.
pub struct CycleAggregator {
    config: ScannerConfig,
    classifier: IncidentClassifier,
    filter: FilenameFilter,
    local: LocalReader,
}

impl CycleAggregator {
    /// 설정과 레지스트리로 집계기를 생성합니다.
    pub fn new(config: ScannerConfig, registry: Arc<PatternRegistry>) -> Result<Self, ScannerError> {
        config.validate()?;
        let filter = FilenameFilter::new(&config.filename_globs)?;
        Ok(Self {
            config,
            classifier: IncidentClassifier::new(registry),
            filter,
            local: LocalReader,
        })
    }

    /// 사용 중인 설정
    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// 사용 중인 패턴 레지스트리
    pub fn registry(&self) -> &PatternRegistry {
        self.classifier.registry()
    }

    /// 스캔 사이클 하나를 실행합니다.
    ///
    /// 소스 단위 실패는 로그로 남기고 건너뜁니다. 이 메서드는 실패하지 않습니다.
    /// `pool`이 `None`이면 원격 호스트를 건너뜁니다.
    pub fn run_cycle(
        &self,
        checkpoints: &dyn CheckpointStore,
        events: &dyn EventStore,
        pool: Option<&SessionPool>,
    ) -> CycleOutcome {
        let cycle_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!("scan_cycle", cycle_id = %cycle_id);
        let _entered = span.enter();
        let started = Instant::now();

        let mut summary = CycleSummary::new(self.registry(), self.config.sample_limit);
        let mut stats = CycleStats::default();
        let mut new_events = Vec::new();

        if self.config.scan_local {
            let paths = expand_local_paths(&self.config.local_paths, &self.filter);
            tracing::debug!(sources = paths.len(), "scanning local sources");
            for path in &paths {
                self.scan_one(
                    &self.local,
                    path,
                    checkpoints,
                    events,
                    &mut stats,
                    &mut summary,
                    &mut new_events,
                );
            }
        }

        if self.config.scan_remote && !self.config.remote_hosts.is_empty() {
            match pool {
                Some(pool) => {
                    for host in &self.config.remote_hosts {
                        self.scan_host(
                            pool,
                            host,
                            checkpoints,
                            events,
                            &mut stats,
                            &mut summary,
                            &mut new_events,
                        );
                    }
                }
                None => tracing::warn!(
                    hosts = self.config.remote_hosts.len(),
                    "remote scanning enabled without a session pool, skipping remote hosts"
                ),
            }
        }

        let report = CycleReport {
            cycle_id,
            new_event_count: new_events.len(),
            per_category_counts: summary
                .categories()
                .iter()
                .map(|e| (e.category.clone(), e.count))
                .collect(),
            sources_scanned: stats.scanned,
            sources_skipped: stats.skipped,
            sources_failed: stats.failed,
            bytes_read: stats.bytes_read,
            lines_read: stats.lines_read,
        };

        let elapsed = started.elapsed();
        metrics::counter!(m::SCAN_CYCLES_TOTAL).increment(1);
        metrics::histogram!(m::SCAN_CYCLE_DURATION_SECONDS).record(elapsed.as_secs_f64());
        metrics::gauge!(m::SCAN_SOURCES_ACTIVE).set(stats.scanned as f64);
        for entry in summary.categories().iter().filter(|e| e.count > 0) {
            metrics::counter!(
                m::SCAN_EVENTS_TOTAL,
                m::LABEL_CATEGORY => entry.category.as_str().to_owned()
            )
            .increment(entry.count);
        }

        tracing::info!(
            new_events = report.new_event_count,
            sources = report.sources_scanned,
            skipped = report.sources_skipped,
            failed = report.sources_failed,
            elapsed_ms = elapsed.as_millis() as u64,
            "scan cycle completed"
        );

        CycleOutcome {
            events: new_events,
            summary,
            report,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn scan_host(
        &self,
        pool: &SessionPool,
        host: &RemoteHostConfig,
        checkpoints: &dyn CheckpointStore,
        events: &dyn EventStore,
        stats: &mut CycleStats,
        summary: &mut CycleSummary,
        new_events: &mut Vec<IncidentEvent>,
    ) {
        let Some(mut reader) = Self::acquire_host(pool, host, stats) else {
            return;
        };

        let paths = expand_remote_paths(reader.as_ref(), &host.paths, &self.filter);
        tracing::debug!(host = %host.label(), sources = paths.len(), "scanning remote sources");

        let mut remaining = paths.iter().peekable();
        while let Some(path) = remaining.next() {
            let interrupted = self.scan_one(
                reader.as_ref(),
                path,
                checkpoints,
                events,
                stats,
                summary,
                new_events,
            );
            if !interrupted {
                continue;
            }

            // 끊긴 세션은 버리고 남은 경로는 새 세션으로 읽음
            pool.evict(host);
            if remaining.peek().is_none() {
                break;
            }
            match Self::acquire_host(pool, host, stats) {
                Some(fresh) => reader = fresh,
                None => return,
            }
        }
    }

    /// 호스트 세션을 가져옵니다. 실패하면 호스트 하나를 실패로 집계합니다.
    fn acquire_host(
        pool: &SessionPool,
        host: &RemoteHostConfig,
        stats: &mut CycleStats,
    ) -> Option<Arc<dyn SourceReader>> {
        match pool.acquire(host) {
            Ok(reader) => Some(reader),
            Err(e) => {
                stats.failed += 1;
                metrics::counter!(m::SCAN_SOURCE_FAILURES_TOTAL, m::LABEL_KIND => e.kind())
                    .increment(1);
                tracing::warn!(host = %host.label(), error = %e, "skipping remote host");
                None
            }
        }
    }

    /// 소스 하나를 처리합니다. 읽기 중단이 발생하면 `true`를 반환합니다.
    #[allow(clippy::too_many_arguments)]
    fn scan_one(
        &self,
        reader: &dyn SourceReader,
        path: &str,
        checkpoints: &dyn CheckpointStore,
        events: &dyn EventStore,
        stats: &mut CycleStats,
        summary: &mut CycleSummary,
        new_events: &mut Vec<IncidentEvent>,
    ) -> bool {
        let source = reader.source_id(path);
        stats.scanned += 1;

        match self.process_source(reader, &source, path, checkpoints, events) {
            Ok((outcome, persisted)) => {
                stats.bytes_read += outcome.bytes_read;
                stats.lines_read += outcome.lines.len() as u64;
                metrics::counter!(m::SCAN_BYTES_READ_TOTAL).increment(outcome.bytes_read);
                metrics::counter!(m::SCAN_LINES_READ_TOTAL).increment(outcome.lines.len() as u64);
                if outcome.rotated {
                    metrics::counter!(m::SCAN_ROTATIONS_TOTAL).increment(1);
                    tracing::info!(
                        source = %source,
                        previous_offset = outcome.previous_offset,
                        "rotation or truncation detected, reading from start"
                    );
                }

                summary.record(&persisted);
                new_events.extend(persisted);
                false
            }
            Err(e) if e.is_vanished() => {
                stats.skipped += 1;
                tracing::debug!(source = %source, "source vanished, skipping");
                false
            }
            Err(e) => {
                match e {
                    ScannerError::SourceUnavailable { .. } => stats.skipped += 1,
                    _ => stats.failed += 1,
                }
                if matches!(e, ScannerError::Persistence(_)) {
                    metrics::counter!(m::STORE_APPEND_FAILURES_TOTAL).increment(1);
                }
                metrics::counter!(m::SCAN_SOURCE_FAILURES_TOTAL, m::LABEL_KIND => e.kind())
                    .increment(1);
                tracing::warn!(source = %source, error = %e, "source skipped this cycle");
                matches!(e, ScannerError::SourceReadInterrupted { .. })
            }
        }
    }

    /// 테일 → 분류 → 저장 → 체크포인트 순서로 소스 하나를 처리합니다.
    ///
    /// 이벤트 저장에 실패하면 체크포인트를 바꾸지 않습니다.
    fn process_source(
        &self,
        reader: &dyn SourceReader,
        source: &SourceId,
        path: &str,
        checkpoints: &dyn CheckpointStore,
        events: &dyn EventStore,
    ) -> Result<(TailOutcome, Vec<IncidentEvent>), ScannerError> {
        let previous = checkpoints.get(source)?;
        let outcome = tailer::tail(reader, path, previous)?;
        let classified = self.classifier.classify_lines(source, &outcome.lines);

        if !classified.is_empty() {
            events.append_many(&classified)?;
        }

        if outcome.checkpoint != previous {
            if let Err(e) = checkpoints.set(source, outcome.checkpoint) {
                // 이벤트는 이미 저장됨. 다음 사이클에서 같은 구간을 다시 읽습니다.
                metrics::counter!(m::SCAN_SOURCE_FAILURES_TOTAL, m::LABEL_KIND => "persistence")
                    .increment(1);
                tracing::warn!(
                    source = %source,
                    error = %e,
                    "checkpoint write failed, range will be re-read next cycle"
                );
            }
        }

        Ok((outcome, classified))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;

    use tailguard_core::error::StorageError;
    use tailguard_core::types::Checkpoint;

    use crate::config::ScannerConfigBuilder;
    use crate::store::MemoryStore;

    fn aggregator(paths: Vec<String>, sample_limit: usize) -> CycleAggregator {
        let config = ScannerConfigBuilder::new()
            .local_paths(paths)
            .sample_limit(sample_limit)
            .build()
            .unwrap();
        let registry = PatternRegistry::compile(&config.patterns).unwrap();
        CycleAggregator::new(config, Arc::new(registry)).unwrap()
    }

    fn write_lines(path: &std::path::Path, lines: &[&str]) {
        let mut f = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .unwrap();
        for line in lines {
            writeln!(f, "{line}").unwrap();
        }
    }

    struct FailingEvents;

    impl EventStore for FailingEvents {
        fn append_many(&self, _events: &[IncidentEvent]) -> Result<(), StorageError> {
            Err(StorageError::Query("database is locked".to_owned()))
        }
    }

    #[test]
    fn summary_lists_all_categories_in_registry_order() {
        let agg = aggregator(Vec::new(), 5);
        let store = MemoryStore::new();
        let outcome = agg.run_cycle(&store, &store, None);

        let names: Vec<_> = outcome
            .summary
            .categories()
            .iter()
            .map(|e| e.category.as_str())
            .collect();
        assert_eq!(names, vec!["FAILED_LOGIN", "CRASH", "SUSPICIOUS"]);
        assert_eq!(outcome.summary.total(), 0);
        assert_eq!(outcome.report.sources_scanned, 0);
    }

    #[test]
    fn counts_and_persists_new_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.log");
        write_lines(
            &path,
            &[
                "sshd[1]: Invalid user a from 10.0.0.1",
                "sshd[1]: session opened",
                "sshd[2]: Failed password for root from 10.0.0.2 port 22",
            ],
        );

        let agg = aggregator(vec![path.display().to_string()], 5);
        let store = MemoryStore::new();
        let outcome = agg.run_cycle(&store, &store, None);

        assert_eq!(outcome.summary.count_for("FAILED_LOGIN"), 2);
        assert_eq!(outcome.report.new_event_count, 2);
        assert_eq!(outcome.report.lines_read, 3);
        assert_eq!(store.event_count().unwrap(), 2);

        let second = agg.run_cycle(&store, &store, None);
        assert_eq!(second.summary.total(), 0);
        assert_eq!(store.event_count().unwrap(), 2);
    }

    #[test]
    fn samples_are_distinct_and_capped() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = Vec::new();
        for i in 0..4 {
            let path = dir.path().join(format!("app{i}.log"));
            write_lines(&path, &["kernel panic", "kernel panic"]);
            paths.push(path.display().to_string());
        }

        let agg = aggregator(paths.clone(), 3);
        let store = MemoryStore::new();
        let outcome = agg.run_cycle(&store, &store, None);

        assert_eq!(outcome.summary.count_for("CRASH"), 8);
        let samples = outcome.summary.samples_for("CRASH");
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].path, paths[0]);
        assert_eq!(samples[2].path, paths[2]);
    }

    #[test]
    fn persistence_failure_keeps_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.log");
        write_lines(&path, &["Invalid user x from 10.0.0.9"]);

        let agg = aggregator(vec![path.display().to_string()], 5);
        let checkpoints = MemoryStore::new();
        let outcome = agg.run_cycle(&checkpoints, &FailingEvents, None);

        assert_eq!(outcome.report.sources_failed, 1);
        assert_eq!(outcome.summary.count_for("FAILED_LOGIN"), 0);
        assert!(outcome.events.is_empty());
        let cp = checkpoints
            .get(&SourceId::local(path.display().to_string()))
            .unwrap();
        assert_eq!(cp, Checkpoint::default());

        let retry = agg.run_cycle(&checkpoints, &checkpoints, None);
        assert_eq!(retry.summary.count_for("FAILED_LOGIN"), 1);
    }

    #[test]
    fn vanished_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.log");
        write_lines(&path, &["kernel panic"]);

        let agg = aggregator(vec![path.display().to_string()], 5);
        let store = MemoryStore::new();
        agg.run_cycle(&store, &store, None);

        fs::remove_file(&path).unwrap();
        let outcome = agg.run_cycle(&store, &store, None);
        assert_eq!(outcome.summary.total(), 0);

        let cp = store.get(&SourceId::local(path.display().to_string())).unwrap();
        assert!(cp.offset > 0);
    }

    #[test]
    fn summary_ignores_unknown_category() {
        let registry = PatternRegistry::compile(&ScannerConfig::default().patterns).unwrap();
        let mut summary = CycleSummary::new(&registry, 5);
        let source = SourceId::local("/a.log");
        summary.record(&[IncidentEvent::new(&source, Category::new("OTHER"), "p", "l")]);
        assert_eq!(summary.total(), 0);
        assert!(summary.samples_for("OTHER").is_empty());
    }
}
