//! Revenue aggregator: five row sequences → seven-day revenue table
//!
//! Pure fold, no state between calls. Malformed fields read as zero and never
//! fail the aggregation.

use crate::types::{
    CallDay, Category, ChatDay, DayName, DayRecord, EmailDay, PackageCharge, PendingInvoice,
    RevenueTable, Row, WeeklyRecord,
};

/// Days a weekly amount is spread over
const DAYS_PER_WEEK: f64 = 7.0;

/// The five per-user source tables, as fetched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RevenueSources {
    pub packages: Vec<Row>,
    pub email_weeks: Vec<Row>,
    pub chat_weeks: Vec<Row>,
    pub call_weeks: Vec<Row>,
    pub invoices: Vec<Row>,
}

impl RevenueSources {
    pub fn aggregate(&self) -> RevenueTable {
        Aggregator::aggregate(
            &self.packages,
            &self.email_weeks,
            &self.chat_weeks,
            &self.call_weeks,
            &self.invoices,
        )
    }

    /// Total number of fetched rows across all five tables
    pub fn row_count(&self) -> usize {
        self.packages.len()
            + self.email_weeks.len()
            + self.chat_weeks.len()
            + self.call_weeks.len()
            + self.invoices.len()
    }
}

/// Aggregator for per-weekday revenue
pub struct Aggregator;

impl Aggregator {
    /// Fold all five sources, already scoped to one user, into a fresh table
    pub fn aggregate(
        packages: &[Row],
        email_weeks: &[Row],
        chat_weeks: &[Row],
        call_weeks: &[Row],
        invoices: &[Row],
    ) -> RevenueTable {
        let mut table = RevenueTable::new();

        Self::spread_packages(&mut table, packages);
        Self::accumulate_weekly::<EmailDay>(&mut table, Category::Emails, email_weeks);
        Self::accumulate_weekly::<ChatDay>(&mut table, Category::Chats, chat_weeks);
        Self::accumulate_weekly::<CallDay>(&mut table, Category::Calls, call_weeks);
        Self::credit_invoices(&mut table, invoices);

        // Credits may offset charges, but no bucket ends below zero
        table.clamp_non_negative();
        table
    }

    /// Weekly package total, before spreading. Credit rows offset charges; a
    /// net credit counts as zero.
    pub fn weekly_package_total(packages: &[Row]) -> f64 {
        packages
            .iter()
            .map(|row| PackageCharge::from_row(row).cost)
            .sum::<f64>()
            .max(0.0)
    }

    /// Package charges are not tied to a day: the weekly total is split evenly
    /// across all seven.
    fn spread_packages(table: &mut RevenueTable, packages: &[Row]) {
        let per_day = Self::weekly_package_total(packages) / DAYS_PER_WEEK;
        for day in DayName::ALL {
            table.day_mut(day).add(Category::Packages, per_day);
        }
    }

    /// Add each present day of each weekly row into `category`. Multiple weeks
    /// add up.
    fn accumulate_weekly<D: DayRecord>(table: &mut RevenueTable, category: Category, weeks: &[Row]) {
        for row in weeks {
            let week = WeeklyRecord::<D>::from_row(row);
            for (day, record) in week.days() {
                table.day_mut(day).add(category, record.cost());
            }
        }
    }

    /// Each invoice credits one seventh of its amount to the weekday it ended
    /// on. Invoices whose date does not resolve are dropped.
    fn credit_invoices(table: &mut RevenueTable, invoices: &[Row]) {
        for row in invoices {
            let invoice = PendingInvoice::from_row(row);
            if let Some(day) = invoice.weekday() {
                table
                    .day_mut(day)
                    .add(Category::Invoices, invoice.payment_amount / DAYS_PER_WEEK);
            }
        }
    }
}
