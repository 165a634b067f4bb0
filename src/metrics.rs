//! Prometheus metrics for the worker

use prometheus::{Encoder, Gauge, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,
    pub jobs_processed_total: IntCounter,
    pub jobs_dropped_total: IntCounter,
    pub jobs_failed_total: IntCounter,
    pub emails_sent_total: IntCounter,
    pub job_duration_seconds: Histogram,
    pub database_connected: Gauge,
    pub queue_connected: Gauge,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let jobs_processed_total =
            IntCounter::new("jobs_processed_total", "Jobs that completed successfully")?;
        let jobs_dropped_total = IntCounter::new(
            "jobs_dropped_total",
            "Jobs acknowledged without delivery (bad payload, missing record, permanent failure)",
        )?;
        let jobs_failed_total = IntCounter::new(
            "jobs_failed_total",
            "Jobs failed back to the queue for retry",
        )?;
        let emails_sent_total = IntCounter::new("emails_sent_total", "Emails handed to the mail provider")?;
        let job_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "job_duration_seconds",
            "Time spent dispatching a single job",
        ))?;
        let database_connected = Gauge::new("database_connected", "Database connection status (1 = connected)")?;
        let queue_connected = Gauge::new("queue_connected", "Redis queue connection status (1 = connected)")?;

        registry.register(Box::new(jobs_processed_total.clone()))?;
        registry.register(Box::new(jobs_dropped_total.clone()))?;
        registry.register(Box::new(jobs_failed_total.clone()))?;
        registry.register(Box::new(emails_sent_total.clone()))?;
        registry.register(Box::new(job_duration_seconds.clone()))?;
        registry.register(Box::new(database_connected.clone()))?;
        registry.register(Box::new(queue_connected.clone()))?;

        Ok(Self {
            registry,
            jobs_processed_total,
            jobs_dropped_total,
            jobs_failed_total,
            emails_sent_total,
            job_duration_seconds,
            database_connected,
            queue_connected,
        })
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
