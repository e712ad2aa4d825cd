//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `tailguard_`
//! - 모듈명: `scan_`, `store_`, `alert_`, `daemon_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(tailguard_core::metrics::SCAN_LINES_READ_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 카테고리 레이블 키 (FAILED_LOGIN, CRASH, ...)
pub const LABEL_CATEGORY: &str = "category";

/// 알림 채널 레이블 키 (log, webhook, email)
pub const LABEL_CHANNEL: &str = "channel";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

/// 실패 종류 레이블 키 (unavailable, interrupted, connection, persistence)
pub const LABEL_KIND: &str = "kind";

// ─── Scan 메트릭 ────────────────────────────────────────────────────

/// Scan: 완료된 사이클 수 (counter)
pub const SCAN_CYCLES_TOTAL: &str = "tailguard_scan_cycles_total";

/// Scan: 사이클 소요 시간 (histogram, 초)
pub const SCAN_CYCLE_DURATION_SECONDS: &str = "tailguard_scan_cycle_duration_seconds";

/// Scan: 읽은 라인 수 (counter)
pub const SCAN_LINES_READ_TOTAL: &str = "tailguard_scan_lines_read_total";

/// Scan: 읽은 바이트 수 (counter)
pub const SCAN_BYTES_READ_TOTAL: &str = "tailguard_scan_bytes_read_total";

/// Scan: 분류된 이벤트 수 (counter, label: category)
pub const SCAN_EVENTS_TOTAL: &str = "tailguard_scan_events_total";

/// Scan: 실패한 소스 수 (counter, label: kind)
pub const SCAN_SOURCE_FAILURES_TOTAL: &str = "tailguard_scan_source_failures_total";

/// Scan: 로테이션/트렁케이션 감지 수 (counter)
pub const SCAN_ROTATIONS_TOTAL: &str = "tailguard_scan_rotations_total";

/// Scan: 마지막 사이클에서 스캔한 소스 수 (gauge)
pub const SCAN_SOURCES_ACTIVE: &str = "tailguard_scan_sources_active";

// ─── Store 메트릭 ───────────────────────────────────────────────────

/// Store: 이벤트 저장 실패 수 (counter)
pub const STORE_APPEND_FAILURES_TOTAL: &str = "tailguard_store_append_failures_total";

/// Store: 유지보수(VACUUM/ANALYZE) 실행 수 (counter)
pub const STORE_MAINTENANCE_TOTAL: &str = "tailguard_store_maintenance_total";

// ─── Alert 메트릭 ───────────────────────────────────────────────────

/// Alert: 발생한 알림 수 (counter)
pub const ALERT_FIRED_TOTAL: &str = "tailguard_alert_fired_total";

/// Alert: 채널별 전송 결과 (counter, labels: channel, result)
pub const ALERT_DELIVERIES_TOTAL: &str = "tailguard_alert_deliveries_total";

// ─── Daemon 메트릭 ──────────────────────────────────────────────────

/// Daemon: 가동 시간 (gauge, 초)
pub const DAEMON_UPTIME_SECONDS: &str = "tailguard_daemon_uptime_seconds";

/// Daemon: 빌드 정보 (gauge, 항상 1, label: version)
pub const DAEMON_BUILD_INFO: &str = "tailguard_daemon_build_info";

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// 사이클 소요 시간 히스토그램 버킷 (초)
///
/// 1ms ~ 60s 범위 (원격 소스 포함)
pub const CYCLE_DURATION_BUCKETS: [f64; 10] =
    [0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 60.0];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
/// 일반적으로 `tailguard-daemon`의 시작 시점에서 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    // Scan
    describe_counter!(SCAN_CYCLES_TOTAL, "Total number of completed scan cycles");
    describe_histogram!(
        SCAN_CYCLE_DURATION_SECONDS,
        "Time to complete a single scan cycle in seconds"
    );
    describe_counter!(
        SCAN_LINES_READ_TOTAL,
        "Total number of log lines read from all sources"
    );
    describe_counter!(
        SCAN_BYTES_READ_TOTAL,
        "Total number of bytes read from all sources"
    );
    describe_counter!(
        SCAN_EVENTS_TOTAL,
        "Total number of classified incident events per category"
    );
    describe_counter!(
        SCAN_SOURCE_FAILURES_TOTAL,
        "Total number of sources that failed to read or persist"
    );
    describe_counter!(
        SCAN_ROTATIONS_TOTAL,
        "Total number of detected rotations or truncations"
    );
    describe_gauge!(
        SCAN_SOURCES_ACTIVE,
        "Number of sources scanned in the last cycle"
    );

    // Store
    describe_counter!(
        STORE_APPEND_FAILURES_TOTAL,
        "Total number of failed event batch appends"
    );
    describe_counter!(
        STORE_MAINTENANCE_TOTAL,
        "Total number of storage maintenance runs"
    );

    // Alert
    describe_counter!(ALERT_FIRED_TOTAL, "Total number of threshold alerts fired");
    describe_counter!(
        ALERT_DELIVERIES_TOTAL,
        "Alert delivery attempts per channel and result"
    );

    // Daemon
    describe_gauge!(DAEMON_UPTIME_SECONDS, "tailguard daemon uptime in seconds");
    describe_gauge!(
        DAEMON_BUILD_INFO,
        "Build information (always 1, with version label)"
    );
}
