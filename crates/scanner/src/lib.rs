#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`rule`]: 카테고리별 정규식 레지스트리, 인시던트 분류기, YAML 패턴 로더
//! - [`source`]: 로컬/원격 소스 리더, 경로 확장, 원격 세션 풀
//! - [`tailer`]: 체크포인트 기반 증분 테일러 (로테이션 복구)
//! - [`cycle`]: 스캔 사이클 집계기 (카운트, 제한된 샘플, 저장 순서)
//! - [`alert`]: 임계값 알림 평가기
//! - [`store`]: 체크포인트/이벤트 저장소 (메모리, SQLite, CSV 미러)
//! - [`notify`]: 알림 전송 채널 (로그, 웹훅, 이메일)
//! - [`config`]: 스캐너 설정 (core 설정에서 파생)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! SourceReader -> Tailer -> Classifier -> EventStore -> CheckpointStore
//!                                 |
//!                           CycleSummary -> AlertEvaluator -> NotifierSet
//! ```

pub mod alert;
pub mod config;
pub mod cycle;
pub mod error;
pub mod tailer;

pub mod notify;
pub mod rule;
pub mod source;
pub mod store;

// --- 주요 타입 re-export ---

// 사이클
pub use cycle::{CategorySummary, CycleAggregator, CycleOutcome, CycleSummary};

// 설정
pub use config::{ScannerConfig, ScannerConfigBuilder};

// 에러
pub use error::ScannerError;

// 패턴/분류
pub use rule::{IncidentClassifier, PatternLoader, PatternRegistry};

// 소스
pub use source::{LocalReader, SessionPool, SourceReader};

// 테일러
pub use tailer::{TailOutcome, tail};

// 알림
pub use alert::{Alert, AlertEvaluator};
pub use notify::{DispatchReport, NotifierSet};

// 저장소
pub use store::{CsvMirror, MemoryStore, SqliteStore};
