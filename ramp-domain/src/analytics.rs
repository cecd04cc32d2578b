//! Install/event analytics
//!
//! Records are append-only. Aggregates (UTM attribution, funnel, active
//! users) are derived on read from the full record lists; only the
//! `dashboard` block is patched incrementally as records arrive.

use crate::value_objects::DomainError;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Source assigned to records without a `utm_source`
pub const ORGANIC_SOURCE: &str = "organic";

/// Actor assigned to events without a `user_id`
pub const ANONYMOUS_USER: &str = "anonymous";

/// Flat acquisition cost assumed per install when computing campaign ROI
pub const COST_PER_INSTALL: Decimal = dec!(2.5);

/// Retention rate shown until a real cohort computation exists
pub const DEFAULT_RETENTION_RATE: Decimal = dec!(0.65);

/// Event names with special meaning
pub mod event_names {
    pub const WALLET_CREATED: &str = "wallet_created";
    pub const FIRST_DEPOSIT: &str = "first_deposit";
    pub const TOKEN_SWAP: &str = "token_swap";
    pub const HIGH_VALUE_ACTION: &str = "high_value_action";
}

// =============================================================================
// Records
// =============================================================================

/// Install attribution submitted by the mobile client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewInstall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_medium: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_campaign: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    /// Any other client-supplied attributes (device info, app version, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Persisted install
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallRecord {
    pub id: Uuid,
    pub install_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_medium: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_campaign: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InstallRecord {
    /// Stamp a submission with an id and server time
    pub fn new(install: NewInstall, id: Uuid, install_date: DateTime<Utc>) -> Self {
        Self {
            id,
            install_date,
            utm_source: install.utm_source,
            utm_medium: install.utm_medium,
            utm_campaign: install.utm_campaign,
            utm_content: install.utm_content,
            platform: install.platform,
            extra: without_keys(install.extra, INSTALL_FIELDS),
        }
    }

    /// Attribution source, `organic` when absent
    pub fn source(&self) -> &str {
        self.utm_source.as_deref().unwrap_or(ORGANIC_SOURCE)
    }
}

/// Behavioural event submitted by the mobile client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub event_name: String,
    #[serde(default)]
    pub event_params: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_medium: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_campaign: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NewEvent {
    /// Event with no parameters or attribution
    pub fn named(event_name: impl Into<String>) -> Self {
        Self {
            event_name: event_name.into(),
            ..Default::default()
        }
    }

    /// Set a numeric/string parameter
    pub fn param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.event_params.insert(key.to_string(), value.into());
        self
    }
}

/// Persisted event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub event_name: String,
    #[serde(default)]
    pub event_params: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_medium: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_campaign: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EventRecord {
    /// Stamp a submission with an id and server time
    pub fn new(event: NewEvent, id: Uuid, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            timestamp,
            event_name: event.event_name,
            event_params: event.event_params,
            user_id: event.user_id,
            utm_source: event.utm_source,
            utm_medium: event.utm_medium,
            utm_campaign: event.utm_campaign,
            platform: event.platform,
            extra: without_keys(event.extra, EVENT_FIELDS),
        }
    }

    /// Attribution source, `organic` when absent
    pub fn source(&self) -> &str {
        self.utm_source.as_deref().unwrap_or(ORGANIC_SOURCE)
    }

    /// Actor identifier, `anonymous` when absent
    pub fn actor(&self) -> &str {
        self.user_id.as_deref().unwrap_or(ANONYMOUS_USER)
    }

    /// Whether this event counts as a conversion for attribution
    pub fn is_conversion(&self) -> bool {
        self.event_name == event_names::FIRST_DEPOSIT
            || self.event_name == event_names::HIGH_VALUE_ACTION
    }

    /// `event_params.deposit_amount`, zero when absent or not numeric
    pub fn deposit_amount(&self) -> Decimal {
        param_decimal(&self.event_params, "deposit_amount").unwrap_or(Decimal::ZERO)
    }

    /// `event_params.value` when present and numeric
    pub fn value(&self) -> Option<Decimal> {
        param_decimal(&self.event_params, "value")
    }

    /// Amount shown in the recent-events feed: `deposit_amount`, else `value`
    pub fn recent_value(&self) -> Decimal {
        let deposit = self.deposit_amount();
        if deposit.is_zero() {
            self.value().unwrap_or(Decimal::ZERO)
        } else {
            deposit
        }
    }

    /// Revenue attributed to this event: `value`, else `deposit_amount`, else zero
    pub fn revenue(&self) -> Decimal {
        self.value().filter(|v| !v.is_zero()).unwrap_or_else(|| self.deposit_amount())
    }
}

/// Named `InstallRecord` keys; an `extra` entry with one of these would
/// serialize the key twice and make the document unreadable.
const INSTALL_FIELDS: &[&str] = &[
    "id",
    "install_date",
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_content",
    "platform",
];

/// Named `EventRecord` keys
const EVENT_FIELDS: &[&str] = &[
    "id",
    "timestamp",
    "event_name",
    "event_params",
    "user_id",
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "platform",
];

/// Drop client attributes that collide with server-assigned fields
fn without_keys(mut extra: Map<String, Value>, keys: &[&str]) -> Map<String, Value> {
    for key in keys {
        extra.remove(*key);
    }
    extra
}

/// Read a numeric parameter that may have been sent as a number or a string
fn param_decimal(params: &Map<String, Value>, key: &str) -> Option<Decimal> {
    match params.get(key)? {
        Value::Number(n) => {
            let raw = n.to_string();
            Decimal::from_str(&raw).or_else(|_| Decimal::from_scientific(&raw)).ok()
        },
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

// =============================================================================
// Analytics Document
// =============================================================================

/// Incrementally maintained dashboard block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_users: u64,
    #[serde(default)]
    pub active_users_30d: u64,
    pub retention_rate: Decimal,
    pub avg_revenue_per_user: Decimal,
}

impl Default for DashboardSummary {
    fn default() -> Self {
        Self {
            total_users: 0,
            active_users_30d: 0,
            retention_rate: DEFAULT_RETENTION_RATE,
            avg_revenue_per_user: Decimal::ZERO,
        }
    }
}

/// The whole analytics document as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsData {
    #[serde(default)]
    pub installs: Vec<InstallRecord>,
    #[serde(default)]
    pub events: Vec<EventRecord>,
    #[serde(default)]
    pub utm_stats: Map<String, Value>,
    #[serde(default)]
    pub dashboard: DashboardSummary,
    pub last_updated: DateTime<Utc>,
}

impl AnalyticsData {
    /// File name under the data directory
    pub const FILE_NAME: &'static str = "analytics_data.json";

    /// Empty document
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            installs: Vec::new(),
            events: Vec::new(),
            utm_stats: Map::new(),
            dashboard: DashboardSummary::default(),
            last_updated: now,
        }
    }

    /// Append an install and count the new user
    pub fn push_install(&mut self, install: NewInstall, id: Uuid, now: DateTime<Utc>) -> InstallRecord {
        let record = InstallRecord::new(install, id, now);
        self.installs.push(record.clone());
        self.dashboard.total_users += 1;
        self.last_updated = now;
        record
    }

    /// Append an event, patching the running revenue average on `first_deposit`.
    ///
    /// The average is `(prev_avg * total_users + deposit) / max(total_users, 1)`.
    /// It is an estimate and can drift from a full recomputation.
    pub fn push_event(&mut self, event: NewEvent, id: Uuid, now: DateTime<Utc>) -> EventRecord {
        let record = EventRecord::new(event, id, now);

        if record.event_name == event_names::FIRST_DEPOSIT {
            let users = Decimal::from(self.dashboard.total_users);
            let prev = self.dashboard.avg_revenue_per_user;
            self.dashboard.avg_revenue_per_user =
                (prev * users + record.deposit_amount()) / users.max(Decimal::ONE);
        }

        self.events.push(record.clone());
        self.last_updated = now;
        record
    }

    /// UTM attribution over the records selected by `query`
    pub fn utm_stats(&self, query: &UtmQuery, now: DateTime<Utc>) -> UtmStats {
        let installs: Vec<&InstallRecord> =
            self.installs.iter().filter(|i| query.contains(i.install_date, now)).collect();
        let events: Vec<&EventRecord> =
            self.events.iter().filter(|e| query.contains(e.timestamp, now)).collect();

        let mut sources: BTreeMap<String, SourceStats> = BTreeMap::new();
        for install in &installs {
            sources.entry(install.source().to_string()).or_default().installs += 1;
        }

        // Conversions only count toward sources that produced installs in range
        for event in events.iter().filter(|e| e.is_conversion()) {
            if let Some(stats) = sources.get_mut(event.source()) {
                stats.conversions += 1;
                stats.revenue += event.revenue();
            }
        }

        let mut campaigns: BTreeMap<String, CampaignStats> = BTreeMap::new();
        for install in &installs {
            if let Some(campaign) = install.utm_campaign.as_deref().filter(|c| !c.is_empty()) {
                let stats = campaigns.entry(campaign.to_string()).or_default();
                stats.installs += 1;
                stats.cost = Decimal::from(stats.installs) * COST_PER_INSTALL;
            }
        }
        for (campaign, stats) in campaigns.iter_mut() {
            let revenue: Decimal = events
                .iter()
                .filter(|e| e.utm_campaign.as_deref() == Some(campaign.as_str()))
                .map(|e| e.revenue())
                .sum();
            stats.roi = if stats.cost.is_zero() {
                Decimal::ZERO
            } else {
                (revenue / stats.cost).round_dp(4)
            };
        }

        UtmStats {
            total_installs: installs.len() as u64,
            sources,
            campaigns,
            time_range: query.label(),
        }
    }

    /// Distinct actors with at least one event in the trailing 30 days
    pub fn active_users_30d(&self, now: DateTime<Utc>) -> u64 {
        let cutoff = now - Duration::days(30);
        self.events
            .iter()
            .filter(|e| e.timestamp >= cutoff)
            .map(|e| e.actor())
            .collect::<HashSet<_>>()
            .len() as u64
    }

    /// Install → wallet → first deposit → swap funnel over all records
    pub fn funnel(&self) -> ConversionFunnel {
        let count = |name: &str| self.events.iter().filter(|e| e.event_name == name).count() as u64;

        let installs = self.installs.len() as u64;
        let wallet_created = count(event_names::WALLET_CREATED);
        let first_deposit = count(event_names::FIRST_DEPOSIT);
        let token_swap = count(event_names::TOKEN_SWAP);

        ConversionFunnel {
            installs,
            wallet_created,
            first_deposit,
            token_swap,
            conversion_rates: FunnelRates {
                install_to_wallet: stage_rate(wallet_created, installs),
                wallet_to_deposit: stage_rate(first_deposit, wallet_created),
                deposit_to_swap: stage_rate(token_swap, first_deposit),
            },
        }
    }

    /// Full dashboard view
    pub fn dashboard(&self, now: DateTime<Utc>) -> Dashboard {
        let utm_stats = self.utm_stats(&UtmQuery::Range(TimeRange::Last30Days), now);

        let mut top_sources: Vec<TopSource> = utm_stats
            .sources
            .iter()
            .map(|(source, stats)| TopSource {
                source: source.clone(),
                installs: stats.installs,
                conversions: stats.conversions,
                revenue: stats.revenue,
            })
            .collect();
        top_sources.sort_by(|a, b| b.installs.cmp(&a.installs));
        top_sources.truncate(5);

        let mut recent: Vec<&EventRecord> = self.events.iter().collect();
        recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        let recent_events = recent
            .into_iter()
            .take(10)
            .map(|e| RecentEvent {
                event_name: e.event_name.clone(),
                timestamp: e.timestamp,
                utm_source: e.source().to_string(),
                value: e.recent_value(),
            })
            .collect();

        Dashboard {
            overview: DashboardOverview {
                total_users: self.dashboard.total_users,
                active_users_30d: self.active_users_30d(now),
                retention_rate: self.dashboard.retention_rate,
                avg_revenue_per_user: self.dashboard.avg_revenue_per_user.round_dp(2),
            },
            top_sources,
            recent_events,
            conversion_funnel: self.funnel(),
            utm_stats,
        }
    }

    /// Counts plus the five most recently appended records of each kind
    pub fn summary(&self) -> AnalyticsSummary {
        let tail = |len: usize| len.saturating_sub(5);
        AnalyticsSummary {
            installs: self.installs.len(),
            events: self.events.len(),
            recent_installs: self.installs[tail(self.installs.len())..].to_vec(),
            recent_events: self.events[tail(self.events.len())..].to_vec(),
        }
    }
}

/// `part / whole` in percent, one decimal place; zero when `whole` is zero
fn stage_rate(part: u64, whole: u64) -> Decimal {
    if whole == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(part) * dec!(100) / Decimal::from(whole)).round_dp(1)
}

// =============================================================================
// Time Windows
// =============================================================================

/// Trailing window selected by a short code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    /// Since UTC midnight
    Today,
    Last7Days,
    Last30Days,
    Last90Days,
}

impl TimeRange {
    /// Map a range code; unrecognised codes select the widest window
    pub fn from_code(code: &str) -> Self {
        match code {
            "today" => TimeRange::Today,
            "7d" => TimeRange::Last7Days,
            "30d" => TimeRange::Last30Days,
            _ => TimeRange::Last90Days,
        }
    }

    /// Short code
    pub fn code(&self) -> &'static str {
        match self {
            TimeRange::Today => "today",
            TimeRange::Last7Days => "7d",
            TimeRange::Last30Days => "30d",
            TimeRange::Last90Days => "90d",
        }
    }

    /// Earliest timestamp inside the window
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            TimeRange::Today => now.date_naive().and_time(NaiveTime::MIN).and_utc(),
            TimeRange::Last7Days => now - Duration::days(7),
            TimeRange::Last30Days => now - Duration::days(30),
            TimeRange::Last90Days => now - Duration::days(90),
        }
    }
}

impl Default for TimeRange {
    fn default() -> Self {
        TimeRange::Last30Days
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Inclusive calendar-date window (UTC)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Build a window, rejecting `start > end`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DomainError> {
        if start > end {
            return Err(DomainError::InvalidDateRange(format!("{} is after {}", start, end)));
        }
        Ok(Self { start, end })
    }

    /// Parse `YYYY-MM-DD` bounds
    pub fn parse(start: &str, end: &str) -> Result<Self, DomainError> {
        let parse = |s: &str| {
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map_err(|_| DomainError::InvalidDateRange(format!("expected YYYY-MM-DD, got {}", s)))
        };
        Self::new(parse(start)?, parse(end)?)
    }

    /// First instant of `start`
    pub fn starts_at(&self) -> DateTime<Utc> {
        self.start.and_time(NaiveTime::MIN).and_utc()
    }

    /// Last millisecond of `end`
    pub fn ends_at(&self) -> DateTime<Utc> {
        let last_ms = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
        self.end.and_time(last_ms).and_utc()
    }

    /// Whether `ts` falls inside the window
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.starts_at() && ts <= self.ends_at()
    }
}

/// Record selection for UTM statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtmQuery {
    Range(TimeRange),
    Window(DateWindow),
}

impl UtmQuery {
    fn contains(&self, ts: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            UtmQuery::Range(range) => ts >= range.cutoff(now),
            UtmQuery::Window(window) => window.contains(ts),
        }
    }

    fn label(&self) -> String {
        match self {
            UtmQuery::Range(range) => range.code().to_string(),
            UtmQuery::Window(window) => format!("custom ({} to {})", window.start, window.end),
        }
    }
}

impl Default for UtmQuery {
    fn default() -> Self {
        UtmQuery::Range(TimeRange::default())
    }
}

// =============================================================================
// Derived Views
// =============================================================================

/// Per-source attribution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceStats {
    pub installs: u64,
    pub conversions: u64,
    pub revenue: Decimal,
}

/// Per-campaign cost and return
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CampaignStats {
    pub installs: u64,
    pub cost: Decimal,
    pub roi: Decimal,
}

/// UTM attribution result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UtmStats {
    pub total_installs: u64,
    pub sources: BTreeMap<String, SourceStats>,
    pub campaigns: BTreeMap<String, CampaignStats>,
    pub time_range: String,
}

/// Funnel stage conversion rates, in percent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunnelRates {
    pub install_to_wallet: Decimal,
    pub wallet_to_deposit: Decimal,
    pub deposit_to_swap: Decimal,
}

/// Stage counts and stage-to-stage rates
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionFunnel {
    pub installs: u64,
    pub wallet_created: u64,
    pub first_deposit: u64,
    pub token_swap: u64,
    pub conversion_rates: FunnelRates,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardOverview {
    pub total_users: u64,
    pub active_users_30d: u64,
    pub retention_rate: Decimal,
    pub avg_revenue_per_user: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopSource {
    pub source: String,
    pub installs: u64,
    pub conversions: u64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentEvent {
    pub event_name: String,
    pub timestamp: DateTime<Utc>,
    pub utm_source: String,
    pub value: Decimal,
}

/// Dashboard computed on read
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub overview: DashboardOverview,
    pub top_sources: Vec<TopSource>,
    pub recent_events: Vec<RecentEvent>,
    pub conversion_funnel: ConversionFunnel,
    pub utm_stats: UtmStats,
}

/// Raw-data overview for debugging
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSummary {
    pub installs: usize,
    pub events: usize,
    pub recent_installs: Vec<InstallRecord>,
    pub recent_events: Vec<EventRecord>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn install(source: Option<&str>, campaign: Option<&str>) -> NewInstall {
        NewInstall {
            utm_source: source.map(str::to_string),
            utm_campaign: campaign.map(str::to_string),
            ..Default::default()
        }
    }

    fn event(name: &str, source: &str, campaign: Option<&str>) -> NewEvent {
        NewEvent {
            utm_source: Some(source.to_string()),
            utm_campaign: campaign.map(str::to_string),
            ..NewEvent::named(name)
        }
    }

    #[test]
    fn test_push_install_counts_users() {
        let mut data = AnalyticsData::empty(now());
        let record = data.push_install(install(None, None), Uuid::now_v7(), now());

        assert_eq!(record.install_date, now());
        assert_eq!(record.source(), ORGANIC_SOURCE);
        assert_eq!(data.dashboard.total_users, 1);
        assert_eq!(data.installs.len(), 1);
    }

    #[test]
    fn test_running_average_on_first_deposit() {
        let mut data = AnalyticsData::empty(now());
        for _ in 0..4 {
            data.push_install(install(None, None), Uuid::now_v7(), now());
        }
        data.dashboard.avg_revenue_per_user = dec!(10);

        let deposit = NewEvent::named(event_names::FIRST_DEPOSIT).param("deposit_amount", 60);
        data.push_event(deposit, Uuid::now_v7(), now());

        // (10 * 4 + 60) / 4
        assert_eq!(data.dashboard.avg_revenue_per_user, dec!(25));

        // Non-deposit events leave it alone
        data.push_event(NewEvent::named(event_names::TOKEN_SWAP), Uuid::now_v7(), now());
        assert_eq!(data.dashboard.avg_revenue_per_user, dec!(25));
    }

    #[test]
    fn test_running_average_with_no_users() {
        let mut data = AnalyticsData::empty(now());
        let deposit = NewEvent::named(event_names::FIRST_DEPOSIT).param("deposit_amount", 80);
        data.push_event(deposit, Uuid::now_v7(), now());
        assert_eq!(data.dashboard.avg_revenue_per_user, dec!(80));
    }

    #[test]
    fn test_revenue_prefers_value_then_deposit_amount() {
        let both = EventRecord::new(
            NewEvent::named("x").param("value", 120).param("deposit_amount", 50),
            Uuid::now_v7(),
            now(),
        );
        assert_eq!(both.revenue(), dec!(120));

        let zero_value = EventRecord::new(
            NewEvent::named("x").param("value", 0).param("deposit_amount", 50),
            Uuid::now_v7(),
            now(),
        );
        assert_eq!(zero_value.revenue(), dec!(50));

        let string_value =
            EventRecord::new(NewEvent::named("x").param("value", "7.5"), Uuid::now_v7(), now());
        assert_eq!(string_value.revenue(), dec!(7.5));

        let none = EventRecord::new(NewEvent::named("x"), Uuid::now_v7(), now());
        assert_eq!(none.revenue(), Decimal::ZERO);
    }

    #[test]
    fn test_utm_stats_grouping_and_roi() {
        let mut data = AnalyticsData::empty(now());
        data.push_install(install(Some("facebook"), Some("defi_promo")), Uuid::now_v7(), now());
        data.push_install(install(Some("facebook"), Some("defi_promo")), Uuid::now_v7(), now());
        data.push_install(install(None, None), Uuid::now_v7(), now());

        data.push_event(
            event(event_names::FIRST_DEPOSIT, "facebook", Some("defi_promo")).param("deposit_amount", 100),
            Uuid::now_v7(),
            now(),
        );
        data.push_event(
            event(event_names::HIGH_VALUE_ACTION, "facebook", Some("defi_promo")).param("value", 500),
            Uuid::now_v7(),
            now(),
        );
        // Source with no installs in range is ignored for conversions
        data.push_event(
            event(event_names::FIRST_DEPOSIT, "tiktok", None).param("deposit_amount", 999),
            Uuid::now_v7(),
            now(),
        );
        // Non-conversion event still counts toward campaign revenue
        data.push_event(
            event(event_names::TOKEN_SWAP, "facebook", Some("defi_promo")).param("value", 25),
            Uuid::now_v7(),
            now(),
        );

        let stats = data.utm_stats(&UtmQuery::Range(TimeRange::Last30Days), now());
        assert_eq!(stats.total_installs, 3);
        assert_eq!(stats.time_range, "30d");

        let facebook = &stats.sources["facebook"];
        assert_eq!(facebook.installs, 2);
        assert_eq!(facebook.conversions, 2);
        assert_eq!(facebook.revenue, dec!(600));

        assert_eq!(stats.sources["organic"].installs, 1);
        assert!(!stats.sources.contains_key("tiktok"));

        let campaign = &stats.campaigns["defi_promo"];
        assert_eq!(campaign.installs, 2);
        assert_eq!(campaign.cost, dec!(5));
        // (100 + 500 + 25) / 5
        assert_eq!(campaign.roi, dec!(125));
    }

    #[test]
    fn test_utm_stats_respects_window() {
        let mut data = AnalyticsData::empty(now());
        data.push_install(install(Some("telegram"), None), Uuid::now_v7(), now() - Duration::days(10));
        data.push_install(install(Some("telegram"), None), Uuid::now_v7(), now() - Duration::days(2));

        let week = data.utm_stats(&UtmQuery::Range(TimeRange::Last7Days), now());
        assert_eq!(week.total_installs, 1);

        let window = DateWindow::parse("2024-06-05", "2024-06-05").unwrap();
        let custom = data.utm_stats(&UtmQuery::Window(window), now());
        assert_eq!(custom.total_installs, 1);
        assert_eq!(custom.time_range, "custom (2024-06-05 to 2024-06-05)");
    }

    #[test]
    fn test_time_range_codes() {
        assert_eq!(TimeRange::from_code("today"), TimeRange::Today);
        assert_eq!(TimeRange::from_code("7d"), TimeRange::Last7Days);
        assert_eq!(TimeRange::from_code("30d"), TimeRange::Last30Days);
        assert_eq!(TimeRange::from_code("1y"), TimeRange::Last90Days);
        assert_eq!(
            TimeRange::Today.cutoff(now()),
            Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_date_window_bounds() {
        let window = DateWindow::parse("2024-06-01", "2024-06-03").unwrap();
        assert!(window.contains(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()));
        assert!(window.contains(Utc.with_ymd_and_hms(2024, 6, 3, 23, 59, 59).unwrap()));
        assert!(!window.contains(Utc.with_ymd_and_hms(2024, 6, 4, 0, 0, 0).unwrap()));

        assert!(DateWindow::parse("2024-06-03", "2024-06-01").is_err());
        assert!(DateWindow::parse("06/01/2024", "2024-06-03").is_err());
    }

    #[test]
    fn test_funnel_rates() {
        let mut data = AnalyticsData::empty(now());
        for _ in 0..4 {
            data.push_install(install(None, None), Uuid::now_v7(), now());
        }
        for name in [
            event_names::WALLET_CREATED,
            event_names::WALLET_CREATED,
            event_names::WALLET_CREATED,
            event_names::FIRST_DEPOSIT,
        ] {
            data.push_event(NewEvent::named(name), Uuid::now_v7(), now());
        }

        let funnel = data.funnel();
        assert_eq!(funnel.installs, 4);
        assert_eq!(funnel.wallet_created, 3);
        assert_eq!(funnel.first_deposit, 1);
        assert_eq!(funnel.token_swap, 0);
        assert_eq!(funnel.conversion_rates.install_to_wallet, dec!(75));
        assert_eq!(funnel.conversion_rates.wallet_to_deposit, dec!(33.3));
        assert_eq!(funnel.conversion_rates.deposit_to_swap, Decimal::ZERO);
    }

    #[test]
    fn test_funnel_empty_is_zero() {
        let funnel = AnalyticsData::empty(now()).funnel();
        assert_eq!(funnel.conversion_rates.install_to_wallet, Decimal::ZERO);
        assert_eq!(funnel.conversion_rates.wallet_to_deposit, Decimal::ZERO);
    }

    #[test]
    fn test_active_users_distinct_in_window() {
        let mut data = AnalyticsData::empty(now());
        let by = |user: Option<&str>| NewEvent {
            user_id: user.map(str::to_string),
            ..NewEvent::named("app_open")
        };

        data.push_event(by(Some("u1")), Uuid::now_v7(), now());
        data.push_event(by(Some("u1")), Uuid::now_v7(), now());
        data.push_event(by(Some("u2")), Uuid::now_v7(), now() - Duration::days(5));
        data.push_event(by(None), Uuid::now_v7(), now());
        data.push_event(by(None), Uuid::now_v7(), now());
        data.push_event(by(Some("u3")), Uuid::now_v7(), now() - Duration::days(31));

        assert_eq!(data.active_users_30d(now()), 3);
    }

    #[test]
    fn test_dashboard_top_sources_and_recent_events() {
        let mut data = AnalyticsData::empty(now());
        let sources = ["a", "b", "b", "c", "c", "c", "d", "e", "f"];
        for source in sources {
            data.push_install(install(Some(source), None), Uuid::now_v7(), now());
        }
        for i in 0..12 {
            data.push_event(
                NewEvent::named("app_open"),
                Uuid::now_v7(),
                now() - Duration::minutes(i),
            );
        }

        let dashboard = data.dashboard(now());
        assert_eq!(dashboard.top_sources.len(), 5);
        assert_eq!(dashboard.top_sources[0].source, "c");
        assert_eq!(dashboard.top_sources[1].source, "b");
        assert_eq!(dashboard.recent_events.len(), 10);
        assert_eq!(dashboard.recent_events[0].timestamp, now());
        assert_eq!(dashboard.overview.total_users, 9);
        assert_eq!(dashboard.overview.retention_rate, DEFAULT_RETENTION_RATE);
    }

    #[test]
    fn test_recent_events_prefer_deposit_amount() {
        let mut data = AnalyticsData::empty(now());
        data.push_event(
            NewEvent::named(event_names::FIRST_DEPOSIT)
                .param("deposit_amount", 80)
                .param("value", 5),
            Uuid::now_v7(),
            now(),
        );
        data.push_event(
            NewEvent::named(event_names::HIGH_VALUE_ACTION).param("value", 12),
            Uuid::now_v7(),
            now() - Duration::minutes(1),
        );

        let dashboard = data.dashboard(now());
        assert_eq!(dashboard.recent_events[0].value, dec!(80));
        assert_eq!(dashboard.recent_events[1].value, dec!(12));
        assert_eq!(data.events[0].revenue(), dec!(5));
    }

    #[test]
    fn test_client_keys_cannot_shadow_server_fields() {
        let event: NewEvent = serde_json::from_value(serde_json::json!({
            "event_name": "wallet_created",
            "id": "client-generated",
            "timestamp": "yesterday",
            "user_id": "u1",
            "app_version": "2.1.0"
        }))
        .unwrap();
        let install: NewInstall = serde_json::from_value(serde_json::json!({
            "utm_source": "telegram",
            "id": 7,
            "install_date": "never",
            "device_id": "d-1"
        }))
        .unwrap();

        let mut data = AnalyticsData::empty(now());
        let event_id = Uuid::now_v7();
        data.push_event(event, event_id, now());
        data.push_install(install, Uuid::now_v7(), now());

        let back: AnalyticsData =
            serde_json::from_value(serde_json::to_value(&data).unwrap()).unwrap();
        assert_eq!(back.events[0].id, event_id);
        assert_eq!(back.events[0].timestamp, now());
        assert_eq!(back.events[0].extra.get("app_version"), Some(&serde_json::json!("2.1.0")));
        assert!(!back.events[0].extra.contains_key("id"));
        assert_eq!(back.installs[0].extra.get("device_id"), Some(&serde_json::json!("d-1")));
        assert!(!back.installs[0].extra.contains_key("install_date"));
    }

    #[test]
    fn test_summary_tails() {
        let mut data = AnalyticsData::empty(now());
        for _ in 0..7 {
            data.push_install(install(None, None), Uuid::now_v7(), now());
        }
        data.push_event(NewEvent::named("x"), Uuid::now_v7(), now());

        let summary = data.summary();
        assert_eq!(summary.installs, 7);
        assert_eq!(summary.events, 1);
        assert_eq!(summary.recent_installs.len(), 5);
        assert_eq!(summary.recent_installs[4].id, data.installs[6].id);
        assert_eq!(summary.recent_events.len(), 1);
    }

    #[test]
    fn test_document_reads_legacy_shape() {
        let json = serde_json::json!({
            "installs": [{
                "id": Uuid::now_v7(),
                "install_date": "2024-06-01T00:00:00.000Z",
                "utm_source": "facebook",
                "device_info": { "platform": "ios" },
                "install_id": "abc"
            }],
            "events": [],
            "utmStats": {},
            "dashboard": {
                "totalUsers": 1,
                "activeUsers30d": 0,
                "retentionRate": 0.65,
                "avgRevenuePerUser": 0
            },
            "lastUpdated": "2024-06-01T00:00:00.000Z"
        });

        let data: AnalyticsData = serde_json::from_value(json).unwrap();
        assert_eq!(data.installs[0].source(), "facebook");
        assert_eq!(data.installs[0].extra["install_id"], "abc");
        assert_eq!(data.dashboard.retention_rate, dec!(0.65));
    }
}
