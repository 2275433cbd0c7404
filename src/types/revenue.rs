//! Revenue table types: day names, categories, per-day buckets

use chrono::Weekday;
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};

/// Fixed day names, ordered Sunday (0) through Saturday (6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DayName {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl DayName {
    /// All days in table order
    pub const ALL: [DayName; 7] = [
        Self::Sunday,
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
    ];

    /// Full name, also the key used in nested weekly records
    pub fn name(self) -> &'static str {
        match self {
            Self::Sunday => "Sunday",
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
        }
    }

    /// Three-letter label for chart axes
    pub fn short(self) -> &'static str {
        &self.name()[..3]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Case-insensitive lookup by full name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn from_weekday(weekday: Weekday) -> Self {
        Self::ALL[weekday.num_days_from_sunday() as usize]
    }
}

impl std::fmt::Display for DayName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.name())
    }
}

impl Serialize for DayName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Revenue category, one per bucket field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Packages,
    Emails,
    Chats,
    Calls,
    Invoices,
}

impl Category {
    /// Stacking order, bottom to top
    pub const ALL: [Category; 5] = [
        Self::Packages,
        Self::Emails,
        Self::Chats,
        Self::Calls,
        Self::Invoices,
    ];

    /// Display label
    pub fn label(self) -> &'static str {
        match self {
            Self::Packages => "Packages",
            Self::Emails => "Emails",
            Self::Chats => "Chats",
            Self::Calls => "Calls",
            Self::Invoices => "Invoices",
        }
    }

    /// Field name in serialized output
    pub fn key(self) -> &'static str {
        match self {
            Self::Packages => "packages",
            Self::Emails => "emails",
            Self::Chats => "chats",
            Self::Calls => "calls",
            Self::Invoices => "invoices",
        }
    }
}

/// Per-day, per-category revenue accumulator
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct DayBucket {
    pub packages: f64,
    pub emails: f64,
    pub chats: f64,
    pub calls: f64,
    pub invoices: f64,
}

impl DayBucket {
    pub fn get(&self, category: Category) -> f64 {
        match category {
            Category::Packages => self.packages,
            Category::Emails => self.emails,
            Category::Chats => self.chats,
            Category::Calls => self.calls,
            Category::Invoices => self.invoices,
        }
    }

    fn slot_mut(&mut self, category: Category) -> &mut f64 {
        match category {
            Category::Packages => &mut self.packages,
            Category::Emails => &mut self.emails,
            Category::Chats => &mut self.chats,
            Category::Calls => &mut self.calls,
            Category::Invoices => &mut self.invoices,
        }
    }

    /// Add a signed amount to a category. Non-finite amounts are ignored.
    pub fn add(&mut self, category: Category, amount: f64) {
        if amount.is_finite() {
            *self.slot_mut(category) += amount;
        }
    }

    /// Floor every category at zero
    pub fn clamp_non_negative(&mut self) {
        for category in Category::ALL {
            let slot = self.slot_mut(category);
            *slot = slot.max(0.0);
        }
    }

    /// Sum of all five categories
    pub fn total(&self) -> f64 {
        Category::ALL.iter().map(|&c| self.get(c)).sum()
    }
}

/// Seven-day, five-category revenue breakdown for one user.
///
/// Every day is always present; a fresh table is all zeros.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RevenueTable {
    days: [DayBucket; 7],
}

impl RevenueTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn day(&self, day: DayName) -> &DayBucket {
        &self.days[day.index()]
    }

    pub fn day_mut(&mut self, day: DayName) -> &mut DayBucket {
        &mut self.days[day.index()]
    }

    /// Floor every bucket at zero once all contributions are in
    pub fn clamp_non_negative(&mut self) {
        for bucket in &mut self.days {
            bucket.clamp_non_negative();
        }
    }

    /// Iterate days in Sunday..Saturday order
    pub fn iter(&self) -> impl Iterator<Item = (DayName, &DayBucket)> {
        DayName::ALL.into_iter().zip(self.days.iter())
    }

    /// One category as a series aligned with `DayName::ALL`
    pub fn series(&self, category: Category) -> [f64; 7] {
        self.days.map(|b| b.get(category))
    }

    /// Grand total for one day (display annotation)
    pub fn day_total(&self, day: DayName) -> f64 {
        self.day(day).total()
    }

    /// Per-day totals aligned with `DayName::ALL`
    pub fn daily_totals(&self) -> [f64; 7] {
        self.days.map(|b| b.total())
    }

    pub fn week_total(&self) -> f64 {
        self.days.iter().map(DayBucket::total).sum()
    }

    /// Largest per-day total, used to scale stacked bars
    pub fn max_day_total(&self) -> f64 {
        self.days.iter().map(DayBucket::total).fold(0.0, f64::max)
    }
}

impl Serialize for RevenueTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.days.len()))?;
        for (day, bucket) in self.iter() {
            map.serialize_entry(day.name(), bucket)?;
        }
        map.end()
    }
}

/// One labeled category series, ready for charting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySeries {
    pub category: &'static str,
    pub label: &'static str,
    pub values: [f64; 7],
}

/// Aggregation result for one user plus its chart-ready views
#[derive(Debug, Clone, PartialEq)]
pub struct RevenueReport {
    /// Display form of the user id the report was built for
    pub user_id: String,
    pub table: RevenueTable,
}

impl RevenueReport {
    pub fn new(user_id: impl Into<String>, table: RevenueTable) -> Self {
        Self {
            user_id: user_id.into(),
            table,
        }
    }

    /// Five category series in stacking order
    pub fn series(&self) -> Vec<CategorySeries> {
        Category::ALL
            .iter()
            .map(|&c| CategorySeries {
                category: c.key(),
                label: c.label(),
                values: self.table.series(c),
            })
            .collect()
    }
}

impl Serialize for RevenueReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let days: Vec<&str> = DayName::ALL.iter().map(|d| d.name()).collect();
        let mut state = serializer.serialize_struct("RevenueReport", 6)?;
        state.serialize_field("user_id", &self.user_id)?;
        state.serialize_field("days", &days)?;
        state.serialize_field("table", &self.table)?;
        state.serialize_field("series", &self.series())?;
        state.serialize_field("daily_totals", &self.table.daily_totals())?;
        state.serialize_field("week_total", &self.table.week_total())?;
        state.end()
    }
}
