use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::time::Instant;

use crate::errors::Result;

pub struct MetricsService {
    registry: Registry,
    projects_created: IntCounter,
    review_decisions: IntCounterVec,
    versions_uploaded: IntCounter,
    versions_deleted: IntCounter,
    quota_rejections: IntCounterVec,
    notifications_enqueued: IntCounterVec,
    request_duration: HistogramVec,
}

impl MetricsService {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let projects_created = IntCounter::new("projects_created_total", "Projects created")
            .map_err(anyhow::Error::from)?;
        let review_decisions = IntCounterVec::new(
            Opts::new("review_decisions_total", "Project review decisions"),
            &["outcome"],
        )
        .map_err(anyhow::Error::from)?;
        let versions_uploaded = IntCounter::new("versions_uploaded_total", "Versions uploaded")
            .map_err(anyhow::Error::from)?;
        let versions_deleted = IntCounter::new("versions_deleted_total", "Versions deleted")
            .map_err(anyhow::Error::from)?;
        let quota_rejections = IntCounterVec::new(
            Opts::new("quota_rejections_total", "Actions rejected by a quota limit"),
            &["limit"],
        )
        .map_err(anyhow::Error::from)?;
        let notifications_enqueued = IntCounterVec::new(
            Opts::new("notifications_enqueued_total", "Notifications handed to the sink"),
            &["kind"],
        )
        .map_err(anyhow::Error::from)?;
        let request_duration = HistogramVec::new(
            HistogramOpts::new("request_duration_seconds", "HTTP request duration"),
            &["endpoint"],
        )
        .map_err(anyhow::Error::from)?;

        registry
            .register(Box::new(projects_created.clone()))
            .map_err(anyhow::Error::from)?;
        registry
            .register(Box::new(review_decisions.clone()))
            .map_err(anyhow::Error::from)?;
        registry
            .register(Box::new(versions_uploaded.clone()))
            .map_err(anyhow::Error::from)?;
        registry
            .register(Box::new(versions_deleted.clone()))
            .map_err(anyhow::Error::from)?;
        registry
            .register(Box::new(quota_rejections.clone()))
            .map_err(anyhow::Error::from)?;
        registry
            .register(Box::new(notifications_enqueued.clone()))
            .map_err(anyhow::Error::from)?;
        registry
            .register(Box::new(request_duration.clone()))
            .map_err(anyhow::Error::from)?;

        Ok(Self {
            registry,
            projects_created,
            review_decisions,
            versions_uploaded,
            versions_deleted,
            quota_rejections,
            notifications_enqueued,
            request_duration,
        })
    }

    pub fn record_project_created(&self) {
        self.projects_created.inc();
    }

    pub fn record_review_decision(&self, outcome: &str) {
        self.review_decisions.with_label_values(&[outcome]).inc();
    }

    pub fn record_version_uploaded(&self) {
        self.versions_uploaded.inc();
    }

    pub fn record_version_deleted(&self) {
        self.versions_deleted.inc();
    }

    pub fn record_quota_rejection(&self, limit: &str) {
        self.quota_rejections.with_label_values(&[limit]).inc();
    }

    pub fn record_notification(&self, kind: &str) {
        self.notifications_enqueued.with_label_values(&[kind]).inc();
    }

    pub fn start_timer(&self, endpoint: String) -> RequestTimer {
        RequestTimer {
            start: Instant::now(),
            endpoint,
            histogram: self.request_duration.clone(),
        }
    }

    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(anyhow::Error::from)?;
        Ok(String::from_utf8(buffer).map_err(anyhow::Error::from)?)
    }
}

pub struct RequestTimer {
    start: Instant,
    endpoint: String,
    histogram: HistogramVec,
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        self.histogram
            .with_label_values(&[self.endpoint.as_str()])
            .observe(duration.as_secs_f64());
    }
}
