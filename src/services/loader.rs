//! Revenue loading: user listing and the five-table fan-out for one user

use tracing::{debug, info};

use crate::config::{Config, TableNames};
use crate::gateway::{Filter, RowSource, TableQuery};
use crate::services::aggregator::RevenueSources;
use crate::types::{Result, RevenueReport, User, UserId};

const USER_COLUMNS: &[&str] = &["id", "first_name", "last_name", "email"];
const PACKAGE_COLUMNS: &[&str] = &["user_id", "frequency", "cost", "name"];
const INVOICE_COLUMNS: &[&str] = &["user_id", "paymentamount", "dateended"];
const WEEKLY_COLUMNS: &[&str] = &[
    "user_id",
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "week_total",
];

/// Column every per-user table is filtered on
const USER_ID_COLUMN: &str = "user_id";

/// Loads users and per-user revenue through a row source
pub struct RevenueLoader<S> {
    source: S,
    tables: TableNames,
    user_filter: Filter,
}

impl<S: RowSource> RevenueLoader<S> {
    pub fn new(source: S, config: &Config) -> Self {
        Self {
            source,
            tables: config.tables.clone(),
            user_filter: config.user_filter.clone(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Selectable users, in the order the endpoint returned them
    pub async fn list_users(&self) -> Result<Vec<User>> {
        let query = TableQuery::new(&self.tables.users)
            .columns(USER_COLUMNS)
            .filters(&self.user_filter);
        let rows = self.source.fetch_rows(&query).await?;

        let users: Vec<User> = rows.iter().filter_map(User::from_row).collect();
        if users.len() < rows.len() {
            debug!(skipped = rows.len() - users.len(), "user rows without id");
        }
        Ok(users)
    }

    /// Fetch the five source tables for one user concurrently. Any failure
    /// fails the whole load.
    pub async fn fetch_sources(&self, user_id: &UserId) -> Result<RevenueSources> {
        let per_user = |table: &str, columns: &[&str]| {
            TableQuery::new(table)
                .columns(columns)
                .filter(USER_ID_COLUMN, user_id.as_value().clone())
        };

        let packages_q = per_user(&self.tables.packages, PACKAGE_COLUMNS);
        let emails_q = per_user(&self.tables.email_costs, WEEKLY_COLUMNS);
        let chats_q = per_user(&self.tables.chat_costs, WEEKLY_COLUMNS);
        let calls_q = per_user(&self.tables.call_costs, WEEKLY_COLUMNS);
        let invoices_q = per_user(&self.tables.invoices, INVOICE_COLUMNS);

        let (packages, email_weeks, chat_weeks, call_weeks, invoices) = tokio::try_join!(
            self.source.fetch_rows(&packages_q),
            self.source.fetch_rows(&emails_q),
            self.source.fetch_rows(&chats_q),
            self.source.fetch_rows(&calls_q),
            self.source.fetch_rows(&invoices_q),
        )?;

        Ok(RevenueSources {
            packages,
            email_weeks,
            chat_weeks,
            call_weeks,
            invoices,
        })
    }

    /// Fetch and aggregate revenue for one user
    pub async fn load_revenue(&self, user_id: &UserId) -> Result<RevenueReport> {
        let sources = self.fetch_sources(user_id).await?;
        let table = sources.aggregate();
        info!(
            user = %user_id,
            rows = sources.row_count(),
            week_total = table.week_total(),
            "aggregated revenue"
        );
        Ok(RevenueReport::new(user_id.to_string(), table))
    }
}
