use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{self, Config};
use crate::gateway::HttpGateway;
use crate::logging;
use crate::services::RevenueLoader;
use crate::tui;
use crate::tui::widgets::revenue_chart::format_currency;
use crate::types::{Category, RevenueReport, User, UserId};

/// Per-weekday revenue dashboard
#[derive(Parser)]
#[command(name = "revdash")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Data endpoint URL (overrides the config file)
    #[arg(long, global = true, env = "REVDASH_ENDPOINT")]
    endpoint: Option<String>,

    /// Config file path [default: ~/.revdash/config.json]
    #[arg(long, global = true, env = "REVDASH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch interactive TUI (default)
    Tui,

    /// List selectable users
    Users {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the weekday revenue breakdown for one user
    Revenue {
        /// User id as stored in the users table
        user_id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        let config = self.load_config()?;

        match self.command {
            None | Some(Commands::Tui) => {
                logging::init_file(&config::data_dir()?.join("revdash.log"))?;
                tui::run(config)
            }
            Some(Commands::Users { json }) => {
                logging::init_stderr();
                let loader = Self::loader(&config)?;
                let users = runtime()?.block_on(loader.list_users())?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&users)?);
                } else {
                    print!("{}", format_users(&users));
                }
                Ok(())
            }
            Some(Commands::Revenue { user_id, json }) => {
                logging::init_stderr();
                let loader = Self::loader(&config)?;
                let user_id = UserId::parse(&user_id);
                let report = runtime()?.block_on(loader.load_revenue(&user_id))?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    print!("{}", format_report(&report));
                }
                Ok(())
            }
        }
    }

    fn load_config(&self) -> anyhow::Result<Config> {
        let config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::load_default()?,
        };
        Ok(config.with_endpoint(self.endpoint.clone()))
    }

    fn loader(config: &Config) -> anyhow::Result<RevenueLoader<HttpGateway>> {
        let gateway = HttpGateway::new(config.endpoint()?)?;
        Ok(RevenueLoader::new(gateway, config))
    }
}

fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}

/// Plain-text user listing: id, name, email
fn format_users(users: &[User]) -> String {
    if users.is_empty() {
        return "No users found\n".to_string();
    }
    let mut out = String::new();
    for user in users {
        out.push_str(&format!(
            "{:>8}  {:<32}  {}\n",
            user.id,
            user.display_name(),
            user.email.as_deref().unwrap_or("-")
        ));
    }
    out
}

/// Plain-text revenue table: one row per day, one column per category
fn format_report(report: &RevenueReport) -> String {
    let mut out = format!("Revenue for user {}\n\n", report.user_id);

    out.push_str(&format!("{:<10}", "Day"));
    for category in Category::ALL {
        out.push_str(&format!("{:>12}", category.label()));
    }
    out.push_str(&format!("{:>12}\n", "Total"));

    for (day, bucket) in report.table.iter() {
        out.push_str(&format!("{:<10}", day.name()));
        for category in Category::ALL {
            out.push_str(&format!("{:>12}", format_currency(bucket.get(category))));
        }
        out.push_str(&format!("{:>12}\n", format_currency(bucket.total())));
    }

    out.push_str(&format!(
        "\nWeek total: {}\n",
        format_currency(report.table.week_total())
    ));
    out
}
