//! Counter catalog for the discovery pipeline. All counters go through the
//! `metrics` facade; `serve` mode installs a Prometheus exporter.

use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;
use std::net::SocketAddr;
use tracing::{info, warn};

static EXPORTER: OnceCell<()> = OnceCell::new();

/// Install the Prometheus recorder once; later calls are no-ops.
pub fn install_exporter(port: u16) {
    EXPORTER.get_or_init(|| {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        match PrometheusBuilder::new().with_http_listener(addr).install() {
            Ok(()) => info!(%addr, "prometheus exporter listening"),
            Err(e) => warn!(error = %e, "failed to install prometheus exporter"),
        }
    });
}

pub mod discovery {
    pub fn preview_succeeded(venue: &str, count: usize) {
        metrics::counter!("showcal_previews_total", "venue" => venue.to_string()).increment(1);
        metrics::counter!("showcal_previewed_events_total", "venue" => venue.to_string())
            .increment(count as u64);
    }

    pub fn preview_failed(venue: &str) {
        metrics::counter!("showcal_preview_failures_total", "venue" => venue.to_string())
            .increment(1);
    }

    pub fn scrape_succeeded(venue: &str, count: usize) {
        metrics::counter!("showcal_scrapes_total", "venue" => venue.to_string()).increment(1);
        metrics::counter!("showcal_scraped_events_total", "venue" => venue.to_string())
            .increment(count as u64);
    }
}

pub mod import {
    pub fn target_succeeded(target: &str) {
        metrics::counter!("showcal_imports_total", "target" => target.to_string(), "outcome" => "ok")
            .increment(1);
    }

    pub fn target_failed(target: &str) {
        metrics::counter!("showcal_imports_total", "target" => target.to_string(), "outcome" => "error")
            .increment(1);
    }
}
