//! Health statistics and monitoring for the exporter.
//!
//! Tracks collection passes (duration, record counts, success/failure),
//! descriptor cache growth and HTTP request rates. Rendered by `/health`.

use std::collections::VecDeque;
use std::fmt::Write as FmtWrite;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock as StdRwLock};
use std::time::{Instant, SystemTime};

/// Running statistics for a single metric.
#[derive(Clone, Copy, Default)]
pub struct RunningStat {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
    last: f64,
}

impl RunningStat {
    pub fn add(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
            self.last = value;
            self.sum = value;
            self.count = 1;
            return;
        }
        self.count += 1;
        self.sum += value;
        self.last = value;
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / (self.count as f64)
        }
    }
}

/// Thread-safe wrapper for running statistics.
#[derive(Default)]
pub struct Stat {
    inner: Mutex<RunningStat>,
}

impl Stat {
    pub fn add_sample(&self, value: f64) {
        if let Ok(mut s) = self.inner.lock() {
            s.add(value);
        }
    }

    /// (last, avg, max, min, count)
    pub fn snapshot(&self) -> (f64, f64, f64, f64, u64) {
        if let Ok(s) = self.inner.lock() {
            (s.last, s.avg(), s.max, s.min, s.count)
        } else {
            (0.0, 0.0, 0.0, 0.0, 0)
        }
    }
}

/// Thread-safe circular buffer for tracking HTTP request timestamps.
pub struct RequestTimestamps {
    inner: Mutex<VecDeque<Instant>>,
}

impl Default for RequestTimestamps {
    fn default() -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(1024)),
        }
    }
}

impl RequestTimestamps {
    pub fn record(&self) {
        if let Ok(mut guard) = self.inner.lock() {
            guard.push_back(Instant::now());
            // Keep only the last 10 minutes.
            let cutoff = Instant::now() - std::time::Duration::from_secs(600);
            while guard.front().is_some_and(|&t| t < cutoff) {
                guard.pop_front();
            }
        }
    }

    pub fn count_last_minute(&self) -> u64 {
        if let Ok(guard) = self.inner.lock() {
            let cutoff = Instant::now() - std::time::Duration::from_secs(60);
            guard.iter().filter(|&&t| t >= cutoff).count() as u64
        } else {
            0
        }
    }
}

/// Exporter health statistics.
pub struct HealthStats {
    // Collection passes
    pub pass_duration_seconds: Stat,
    pub records_per_pass: Stat,
    pub total_passes: AtomicU64,
    pub pass_success_count: AtomicU64,
    pub pass_failure_count: AtomicU64,

    // Descriptor cache
    pub descriptor_cache_size: Stat,

    // HTTP server stats
    pub http_request_timestamps: RequestTimestamps,
    pub metrics_endpoint_calls: AtomicU64,
    pub metrics_response_size_kb: Stat,

    // Timing
    pub start_time: Instant,
    pub last_pass_time: StdRwLock<Option<Instant>>,
    pub last_error: StdRwLock<Option<String>>,
}

impl Default for HealthStats {
    fn default() -> Self {
        Self {
            pass_duration_seconds: Stat::default(),
            records_per_pass: Stat::default(),
            total_passes: AtomicU64::new(0),
            pass_success_count: AtomicU64::new(0),
            pass_failure_count: AtomicU64::new(0),
            descriptor_cache_size: Stat::default(),
            http_request_timestamps: RequestTimestamps::default(),
            metrics_endpoint_calls: AtomicU64::new(0),
            metrics_response_size_kb: Stat::default(),
            start_time: Instant::now(),
            last_pass_time: StdRwLock::new(None),
            last_error: StdRwLock::new(None),
        }
    }
}

impl HealthStats {
    pub fn new() -> Self {
        Default::default()
    }

    /// Records a successful pass that produced `records` records.
    pub fn record_pass_success(&self, records: u64, duration_seconds: f64) {
        self.records_per_pass.add_sample(records as f64);
        self.pass_duration_seconds.add_sample(duration_seconds);
        self.total_passes.fetch_add(1, Ordering::Relaxed);
        self.pass_success_count.fetch_add(1, Ordering::Relaxed);
        self.update_last_pass_time();
        if let Ok(mut guard) = self.last_error.write() {
            *guard = None;
        }
    }

    /// Records a failed pass; failed passes produce no records.
    pub fn record_pass_failure(&self, error: &str, duration_seconds: f64) {
        self.pass_duration_seconds.add_sample(duration_seconds);
        self.total_passes.fetch_add(1, Ordering::Relaxed);
        self.pass_failure_count.fetch_add(1, Ordering::Relaxed);
        self.update_last_pass_time();
        if let Ok(mut guard) = self.last_error.write() {
            *guard = Some(error.to_string());
        }
    }

    pub fn record_descriptor_cache_size(&self, size: u64) {
        self.descriptor_cache_size.add_sample(size as f64);
    }

    pub fn record_http_request(&self) {
        self.http_request_timestamps.record();
    }

    pub fn record_metrics_endpoint_call(&self) {
        self.metrics_endpoint_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_metrics_response_size_kb(&self, size_kb: f64) {
        self.metrics_response_size_kb.add_sample(size_kb);
    }

    fn update_last_pass_time(&self) {
        if let Ok(mut guard) = self.last_pass_time.write() {
            *guard = Some(Instant::now());
        }
    }

    /// True once a pass ran and the most recent one succeeded.
    pub fn last_pass_succeeded(&self) -> bool {
        let ran = self
            .last_pass_time
            .read()
            .map(|g| g.is_some())
            .unwrap_or(false);
        ran && self.get_last_error().is_none()
    }

    pub fn get_last_error(&self) -> Option<String> {
        self.last_error.read().ok().and_then(|g| g.clone())
    }

    pub fn get_pass_success_rate(&self) -> f64 {
        let success = self.pass_success_count.load(Ordering::Relaxed);
        let failure = self.pass_failure_count.load(Ordering::Relaxed);
        let total = success + failure;
        if total == 0 {
            100.0
        } else {
            (success as f64 / total as f64) * 100.0
        }
    }

    pub fn get_uptime_hours(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64() / 3600.0
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Wall-clock time (UTC, HH:MM:SS) of the last pass, or "N/A".
    pub fn get_last_pass_time_str(&self) -> String {
        const SECS_PER_DAY: u64 = 86400;
        const SECS_PER_HOUR: u64 = 3600;
        const SECS_PER_MINUTE: u64 = 60;

        if let Ok(guard) = self.last_pass_time.read() {
            if let Some(last_pass) = *guard {
                let elapsed_since_pass = last_pass.elapsed();
                if let Ok(duration) = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH) {
                    let pass_time_secs = duration
                        .as_secs()
                        .saturating_sub(elapsed_since_pass.as_secs());
                    let hours = (pass_time_secs % SECS_PER_DAY) / SECS_PER_HOUR;
                    let minutes = (pass_time_secs % SECS_PER_HOUR) / SECS_PER_MINUTE;
                    let seconds = pass_time_secs % SECS_PER_MINUTE;
                    return format!("{:02}:{:02}:{:02}", hours, minutes, seconds);
                }
            }
        }
        "N/A".to_string()
    }

    pub fn render_table(&self) -> String {
        let (pd_cur, pd_avg, pd_max, pd_min, _) = self.pass_duration_seconds.snapshot();
        let (rc_cur, rc_avg, rc_max, rc_min, _) = self.records_per_pass.snapshot();
        let (dc_cur, dc_avg, dc_max, dc_min, _) = self.descriptor_cache_size.snapshot();
        let (rs_cur, rs_avg, rs_max, rs_min, _) = self.metrics_response_size_kb.snapshot();

        let total = self.total_passes.load(Ordering::Relaxed);
        let failures = self.pass_failure_count.load(Ordering::Relaxed);
        let success_rate = self.get_pass_success_rate();
        let http_requests_last_minute = self.http_request_timestamps.count_last_minute();
        let metrics_calls = self.metrics_endpoint_calls.load(Ordering::Relaxed);
        let uptime_hours = self.get_uptime_hours();
        let last_pass = self.get_last_pass_time_str();

        let left_col = 26usize;
        let col_w = 12usize;

        let mut out = String::new();

        writeln!(out, "HEALTH ENDPOINT - EXPORTER INTERNAL STATS").ok();
        writeln!(out, "==========================================").ok();
        writeln!(out).ok();

        writeln!(
            out,
            "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
            "",
            "current",
            "average",
            "max",
            "min",
            left = left_col,
            col = col_w
        )
        .ok();
        writeln!(out, "{}", "-".repeat(left_col + 4 * (col_w + 3))).ok();

        let rows = [
            ("pass duration (s)", pd_cur, pd_avg, pd_max, pd_min, 4usize),
            ("records per pass", rc_cur, rc_avg, rc_max, rc_min, 0),
            ("descriptor cache size", dc_cur, dc_avg, dc_max, dc_min, 0),
            ("metrics response (KB)", rs_cur, rs_avg, rs_max, rs_min, 1),
        ];
        for (name, cur, avg, max, min, prec) in rows {
            writeln!(
                out,
                "{:left$} | {:>col$.prec$} | {:>col$.prec$} | {:>col$.prec$} | {:>col$.prec$}",
                name,
                cur,
                avg,
                max,
                min,
                left = left_col,
                col = col_w,
                prec = prec
            )
            .ok();
        }

        writeln!(out).ok();
        writeln!(out, "{:left$} : {}", "total passes", total, left = left_col).ok();
        writeln!(out, "{:left$} : {}", "failed passes", failures, left = left_col).ok();
        writeln!(
            out,
            "{:left$} : {:.1}%",
            "pass success rate",
            success_rate,
            left = left_col
        )
        .ok();
        writeln!(out, "{:left$} : {}", "last pass (UTC)", last_pass, left = left_col).ok();
        writeln!(
            out,
            "{:left$} : {}",
            "/metrics calls",
            metrics_calls,
            left = left_col
        )
        .ok();
        writeln!(
            out,
            "{:left$} : {}",
            "http requests (1m)",
            http_requests_last_minute,
            left = left_col
        )
        .ok();
        writeln!(
            out,
            "{:left$} : {:.2}",
            "uptime (hours)",
            uptime_hours,
            left = left_col
        )
        .ok();
        if let Some(err) = self.get_last_error() {
            writeln!(out, "{:left$} : {}", "last error", err, left = left_col).ok();
        }

        out
    }
}
