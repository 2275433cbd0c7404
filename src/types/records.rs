//! Row records and their defensive typed views
//!
//! Remote rows are open-shaped JSON objects. The typed views here read only
//! the fields the aggregation rules need and never fail: a missing or
//! non-numeric amount reads as 0, a missing day record reads as absent.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use super::DayName;

/// One fetched record from a named table
pub type Row = Map<String, Value>;

/// Read a JSON value as a decimal amount, defaulting to 0.
///
/// Numbers are taken as-is; strings are parsed from their leading numeric
/// prefix (`"12.5 USD"` → 12.5). Everything else, and any non-finite result,
/// reads as 0.
pub fn amount(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => parse_decimal_prefix(s).unwrap_or(0.0),
        _ => 0.0,
    };
    if parsed.is_finite() {
        parsed
    } else {
        0.0
    }
}

/// Read a named field of a row as an amount
pub fn field_amount(row: &Row, key: &str) -> f64 {
    amount(row.get(key))
}

/// Read the first present, non-null field among `keys` as an amount
fn field_amount_any(row: &Row, keys: &[&str]) -> f64 {
    keys.iter()
        .find_map(|k| row.get(*k).filter(|v| !v.is_null()))
        .map(|v| amount(Some(v)))
        .unwrap_or(0.0)
}

/// Parse the longest leading decimal literal of `s` (after leading whitespace)
fn parse_decimal_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }
    // Optional exponent, only consumed when complete
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse().ok()
}

/// Read a scalar field as display text
fn field_text(row: &Row, key: &str) -> Option<String> {
    match row.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Resolve a date field to its calendar date as written.
///
/// Accepts RFC 3339 timestamps, `YYYY-MM-DD[ HH:MM:SS]`, `YYYY-MM-DDTHH:MM:SS`,
/// `MM/DD/YYYY`, and epoch milliseconds. Anything else is unresolvable.
pub fn calendar_date(value: Option<&Value>) -> Option<NaiveDate> {
    match value? {
        Value::String(s) => parse_date_text(s.trim()),
        Value::Number(n) => {
            let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            DateTime::from_timestamp_millis(millis).map(|dt| dt.date_naive())
        }
        _ => None,
    }
}

fn parse_date_text(s: &str) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    // Date with an unrecognized time suffix
    s.get(..10)
        .and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok())
}

/// Fixed-shape per-day record inside a weekly cost row
pub trait DayRecord: Sized {
    /// Build from the nested day object
    fn from_object(obj: &Row) -> Self;

    /// Revenue this day contributes
    fn cost(&self) -> f64;
}

/// Email usage for one day
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EmailDay {
    pub emails: f64,
    pub email_threshold: f64,
    pub email_cost_overage: f64,
}

impl DayRecord for EmailDay {
    fn from_object(obj: &Row) -> Self {
        Self {
            emails: field_amount_any(obj, &["emails", "emails_count"]),
            email_threshold: field_amount(obj, "email_threshold"),
            email_cost_overage: field_amount(obj, "email_cost_overage"),
        }
    }

    /// Only emails above the free threshold are billed
    fn cost(&self) -> f64 {
        let overage = (self.emails - self.email_threshold).max(0.0);
        overage * self.email_cost_overage
    }
}

/// Chat usage for one day
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChatDay {
    pub daily_cost: f64,
    pub chats: f64,
    pub chat_per_conversation_cost: f64,
}

impl DayRecord for ChatDay {
    fn from_object(obj: &Row) -> Self {
        Self {
            daily_cost: field_amount(obj, "daily_cost"),
            chats: field_amount_any(obj, &["chats", "chats_count"]),
            chat_per_conversation_cost: field_amount(obj, "chat_per_conversation_cost"),
        }
    }

    /// A recorded daily cost wins; otherwise bill per conversation
    fn cost(&self) -> f64 {
        if self.daily_cost != 0.0 {
            self.daily_cost
        } else {
            self.chats * self.chat_per_conversation_cost
        }
    }
}

/// Call usage for one day
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CallDay {
    pub cost: f64,
    pub daily_cost: f64,
}

impl DayRecord for CallDay {
    fn from_object(obj: &Row) -> Self {
        Self {
            cost: field_amount(obj, "cost"),
            daily_cost: field_amount(obj, "daily_cost"),
        }
    }

    fn cost(&self) -> f64 {
        if self.cost != 0.0 {
            self.cost
        } else {
            self.daily_cost
        }
    }
}

/// One week of per-day records, keyed by day name
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyRecord<D> {
    days: [Option<D>; 7],
}

impl<D: DayRecord> WeeklyRecord<D> {
    /// Read the nested object for each day name. Days that are missing or not
    /// shaped as an object are absent.
    pub fn from_row(row: &Row) -> Self {
        let days = DayName::ALL.map(|day| {
            day_object(row, day).map(D::from_object)
        });
        Self { days }
    }

    /// Present days in Sunday..Saturday order
    pub fn days(&self) -> impl Iterator<Item = (DayName, &D)> {
        DayName::ALL
            .into_iter()
            .zip(self.days.iter())
            .filter_map(|(day, rec)| rec.as_ref().map(|r| (day, r)))
    }
}

/// Find the nested object for `day`: exact key first, then any key that
/// matches ignoring case.
fn day_object(row: &Row, day: DayName) -> Option<&Row> {
    let value = row.get(day.name()).or_else(|| {
        row.iter()
            .find(|(k, _)| DayName::from_name(k) == Some(day))
            .map(|(_, v)| v)
    })?;
    value.as_object()
}

/// Flat recurring charge (`manual_charges` row)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PackageCharge {
    pub name: Option<String>,
    pub frequency: Option<String>,
    pub cost: f64,
}

impl PackageCharge {
    pub fn from_row(row: &Row) -> Self {
        Self {
            name: field_text(row, "name"),
            frequency: field_text(row, "frequency"),
            cost: field_amount(row, "cost"),
        }
    }
}

/// One payment event (`Invoices_Pending` row)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PendingInvoice {
    pub payment_amount: f64,
    pub date_ended: Option<NaiveDate>,
}

impl PendingInvoice {
    pub fn from_row(row: &Row) -> Self {
        Self {
            payment_amount: field_amount(row, "paymentamount"),
            date_ended: calendar_date(row.get("dateended")),
        }
    }

    /// Day of week the invoice ended on, if the date resolved
    pub fn weekday(&self) -> Option<DayName> {
        use chrono::Datelike;
        self.date_ended.map(|d| DayName::from_weekday(d.weekday()))
    }
}

/// User identifier as the remote side returned it (number or string).
///
/// Kept as the original JSON scalar so equality filters match the column type.
#[derive(Debug, Clone, PartialEq)]
pub struct UserId(Value);

impl UserId {
    /// Interpret command-line text: integers become numbers, anything else a string
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        match text.parse::<i64>() {
            Ok(n) => Self(Value::from(n)),
            Err(_) => Self(Value::String(text.to_string())),
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(_) => Some(Self(value.clone())),
            Value::String(s) if !s.trim().is_empty() => Some(Self(value.clone())),
            _ => None,
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Value::String(s) => f.pad(s),
            other => f.pad(&other.to_string()),
        }
    }
}

impl Serialize for UserId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

/// Selectable user (`users` row)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: UserId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl User {
    /// Rows without a usable id are not selectable
    pub fn from_row(row: &Row) -> Option<Self> {
        let id = row.get("id").and_then(UserId::from_value)?;
        Some(Self {
            id,
            first_name: field_text(row, "first_name"),
            last_name: field_text(row, "last_name"),
            email: field_text(row, "email"),
        })
    }

    /// "First Last", falling back to email, then id
    pub fn display_name(&self) -> String {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        if !full.is_empty() {
            return full;
        }
        match &self.email {
            Some(email) => email.clone(),
            None => self.id.to_string(),
        }
    }
}
