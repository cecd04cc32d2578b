//! Install/event analytics document
//!
//! One JSON object holds every install and event. Appends patch the
//! dashboard counters in the same locked mutation; everything else is
//! computed on read.

use crate::document::JsonDocument;
use crate::error::{StoreError, StoreResult};
use crate::repository::{AnalyticsRepository, SampleReport};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use ramp_domain::analytics::{event_names, AnalyticsSummary, Dashboard};
use ramp_domain::{
    AnalyticsData, EventRecord, InstallRecord, NewEvent, NewInstall, UtmQuery, UtmStats,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use serde_json::{json, Map, Value};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

const SAMPLE_INSTALLS: usize = 50;
const SAMPLE_EVENTS: usize = 80;
const SAMPLE_USERS: u32 = 50;
const SAMPLE_DAYS: i64 = 30;
const SAMPLE_SOURCES: [&str; 4] = ["facebook", "telegram", "tiktok", "organic"];
const SAMPLE_CAMPAIGNS: [&str; 3] = ["crypto_launch", "defi_promo", "community_growth"];
const SAMPLE_EVENT_NAMES: [&str; 4] = [
    event_names::WALLET_CREATED,
    event_names::FIRST_DEPOSIT,
    event_names::TOKEN_SWAP,
    event_names::HIGH_VALUE_ACTION,
];

/// File-backed analytics document
pub struct AnalyticsStore {
    doc: JsonDocument<AnalyticsData>,
}

impl AnalyticsStore {
    /// Document under `data_dir`
    pub fn new(data_dir: &Path, timeout: Duration) -> Self {
        Self {
            doc: JsonDocument::new("analytics_data", data_dir.join(AnalyticsData::FILE_NAME), timeout),
        }
    }

    async fn load(&self, operation: &str) -> StoreResult<AnalyticsData> {
        self.doc.read_or(operation, || AnalyticsData::empty(Utc::now())).await
    }

    /// Write an empty document if none exists
    pub(crate) async fn initialize(&self) -> StoreResult<Vec<&'static str>> {
        let created = self.doc.init_if_missing(|| AnalyticsData::empty(Utc::now())).await?;
        Ok(if created { vec![AnalyticsData::FILE_NAME] } else { Vec::new() })
    }
}

#[async_trait]
impl AnalyticsRepository for AnalyticsStore {
    async fn record_install(&self, install: NewInstall) -> StoreResult<InstallRecord> {
        let record = self
            .doc
            .mutate(
                "record_install",
                || AnalyticsData::empty(Utc::now()),
                move |data| Ok(data.push_install(install, Uuid::now_v7(), Utc::now())),
            )
            .await?;

        info!(install_id = %record.id, source = record.source(), "Install recorded");
        Ok(record)
    }

    async fn record_event(&self, event: NewEvent) -> StoreResult<EventRecord> {
        if event.event_name.trim().is_empty() {
            return Err(StoreError::Validation("event_name is required".to_string()));
        }

        let record = self
            .doc
            .mutate(
                "record_event",
                || AnalyticsData::empty(Utc::now()),
                move |data| Ok(data.push_event(event, Uuid::now_v7(), Utc::now())),
            )
            .await?;

        debug!(
            event_id = %record.id,
            event_name = %record.event_name,
            source = record.source(),
            "Event recorded"
        );
        Ok(record)
    }

    async fn utm_stats(&self, query: UtmQuery) -> StoreResult<UtmStats> {
        Ok(self.load("utm_stats").await?.utm_stats(&query, Utc::now()))
    }

    async fn dashboard(&self) -> StoreResult<Dashboard> {
        Ok(self.load("dashboard").await?.dashboard(Utc::now()))
    }

    async fn summary(&self) -> StoreResult<AnalyticsSummary> {
        Ok(self.load("summary").await?.summary())
    }

    async fn snapshot(&self) -> StoreResult<AnalyticsData> {
        self.load("snapshot").await
    }

    async fn clear(&self) -> StoreResult<()> {
        self.doc.replace("clear", &AnalyticsData::empty(Utc::now())).await?;
        warn!("Analytics data cleared");
        Ok(())
    }

    async fn seed_sample_data(&self, seed: Option<u64>) -> StoreResult<SampleReport> {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let report = self
            .doc
            .mutate(
                "seed_sample_data",
                || AnalyticsData::empty(Utc::now()),
                move |data| {
                    *data = generate_sample(rng, Utc::now());
                    Ok(SampleReport {
                        installs: data.installs.len(),
                        events: data.events.len(),
                        total_revenue: sample_revenue(data),
                    })
                },
            )
            .await?;

        info!(
            installs = report.installs,
            events = report.events,
            total_revenue = %report.total_revenue,
            "Sample analytics generated"
        );
        Ok(report)
    }
}

// =============================================================================
// Sample Data
// =============================================================================

fn pick<'a, R: Rng>(rng: &mut R, items: &[&'a str]) -> &'a str {
    items[rng.gen_range(0..items.len())]
}

fn platform<R: Rng>(rng: &mut R) -> &'static str {
    if rng.gen_bool(0.5) {
        "android"
    } else {
        "ios"
    }
}

fn backdated<R: Rng>(rng: &mut R, now: DateTime<Utc>) -> DateTime<Utc> {
    now - ChronoDuration::days(rng.gen_range(0..SAMPLE_DAYS))
}

/// Sum of every event's `value` parameter
fn sample_revenue(data: &AnalyticsData) -> Decimal {
    data.events.iter().filter_map(EventRecord::value).sum()
}

fn sample_params<R: Rng>(rng: &mut R, event_name: &str) -> Map<String, Value> {
    let params = match event_name {
        event_names::FIRST_DEPOSIT => json!({
            "deposit_amount": rng.gen_range(50..550u32),
            "deposit_token": "USDT",
            "event_category": "monetization",
            "value": rng.gen_range(50..550u32),
        }),
        event_names::TOKEN_SWAP => json!({
            "from_token": "USDT",
            "to_token": "BNB",
            "swap_amount": rng.gen_range(25..225u32),
            "event_category": "trading",
            "value": rng.gen_range(25..225u32),
        }),
        event_names::HIGH_VALUE_ACTION => json!({
            "action_type": "large_deposit",
            "value": rng.gen_range(500..1500u32),
            "event_category": "monetization",
        }),
        _ => json!({
            "wallet_type": "new",
            "event_category": "onboarding",
        }),
    };
    match params {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Fresh document with sample installs and events spread over the last 30 days
fn generate_sample(mut rng: StdRng, now: DateTime<Utc>) -> AnalyticsData {
    let mut data = AnalyticsData::empty(now);

    for _ in 0..SAMPLE_INSTALLS {
        let source = pick(&mut rng, &SAMPLE_SOURCES);
        let campaign = pick(&mut rng, &SAMPLE_CAMPAIGNS);
        let installed_at = backdated(&mut rng, now);
        let organic = source == "organic";

        let mut extra = Map::new();
        extra.insert(
            "device_info".to_string(),
            json!({
                "platform": platform(&mut rng),
                "app_version": "1.0.0",
                "device_model": "Sample Device",
                "os_version": "12.0",
            }),
        );
        extra.insert("event_type".to_string(), json!("app_install"));

        let install = NewInstall {
            utm_source: Some(source.to_string()),
            utm_medium: Some(if organic { "organic" } else { "cpc" }.to_string()),
            utm_campaign: Some(if organic { "organic" } else { campaign }.to_string()),
            utm_content: Some(if source == "facebook" { "video_ad" } else { "social_post" }.to_string()),
            platform: Some(platform(&mut rng).to_string()),
            extra,
        };
        data.push_install(install, Uuid::now_v7(), installed_at);
    }

    for _ in 0..SAMPLE_EVENTS {
        let event_name = pick(&mut rng, &SAMPLE_EVENT_NAMES);
        let source = pick(&mut rng, &SAMPLE_SOURCES);
        let campaign = pick(&mut rng, &SAMPLE_CAMPAIGNS);
        let occurred_at = backdated(&mut rng, now);
        let organic = source == "organic";

        let event = NewEvent {
            event_name: event_name.to_string(),
            event_params: sample_params(&mut rng, event_name),
            user_id: Some(format!("sample_user_{}", rng.gen_range(1..=SAMPLE_USERS))),
            utm_source: Some(source.to_string()),
            utm_medium: Some(if organic { "organic" } else { "cpc" }.to_string()),
            utm_campaign: Some(if organic { "organic" } else { campaign }.to_string()),
            platform: Some(platform(&mut rng).to_string()),
            extra: Map::new(),
        };
        data.push_event(event, Uuid::now_v7(), occurred_at);
    }

    data.dashboard.total_users = data.installs.len() as u64;
    data.dashboard.avg_revenue_per_user = if data.installs.is_empty() {
        Decimal::ZERO
    } else {
        sample_revenue(&data) / Decimal::from(data.installs.len() as u64)
    };
    data.last_updated = now;
    data
}

// =============================================================================
// Tests
// =============================================================================
