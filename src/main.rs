//! Equb Ledger CLI
//!
//! Headless driver for the ledger engine: create or join an equb, record
//! contributions and payouts, and move equbs between ledgers as export
//! files. The state document lives at `EQUB_STORE_PATH` (or the platform
//! data directory by default).

use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use equb_ledger::models::{Equb, EqubParams, Frequency};
use equb_ledger::{AppConfig, EqubApp, EqubError, FileBackend};

#[derive(Parser)]
#[command(name = "equb", about = "Local rotating savings club ledger", version)]
struct Cli {
    /// Path of the state document (overrides EQUB_STORE_PATH)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Set up the owner profile of this ledger
    Init {
        /// Your name
        name: String,
        /// Phone number or email
        #[arg(long)]
        contact: Option<String>,
    },
    /// Show the selected equb: roster, progress, and payment standing
    Status,
    /// List every equb in this ledger
    List,
    /// Create a new equb
    Create {
        name: String,
        #[arg(long)]
        frequency: Frequency,
        /// Fixed group size
        #[arg(long)]
        target: u32,
        /// Pool amount distributed per payout (ETB)
        #[arg(long)]
        goal: Decimal,
        /// Per-cycle contribution per member; defaults to goal / target
        #[arg(long)]
        contribution: Option<Decimal>,
        /// First cycle date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        start: Option<NaiveDate>,
    },
    /// Join an equb by its shareable code
    Join { code: String },
    /// Select which equb later commands apply to
    Select { equb: String },
    /// Add a member to the selected equb (creator only)
    AddMember {
        name: String,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Remove a member from the selected equb
    RemoveMember { name: String },
    /// Record a contribution for a member
    Contribute {
        member: String,
        /// Defaults to the computed requirement for the member
        amount: Option<Decimal>,
        /// Accept a payment below the computed requirement
        #[arg(long)]
        yes: bool,
    },
    /// Distribute the pool to a member (creator only)
    Payout { recipient: String },
    /// Move a payout-order entry (creator only)
    Reorder { from: usize, to: usize },
    /// Write the selected equb to a portable export file
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Import an equb from an export file
    Import { file: PathBuf },
    /// Show the activity feed of the selected equb
    Activity,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let config = AppConfig::from_env().map_err(|e| anyhow!("Configuration error: {}", e))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("equb_ledger={}", config.log_level).into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store_path = cli.store.unwrap_or(config.store.path);
    info!("Using store at {}", store_path.display());

    let mut app = EqubApp::open(Box::new(FileBackend::new(store_path)))?;

    match cli.command {
        Command::Init { name, contact } => {
            app.set_owner(&name, contact, None)?;
            println!("Ledger initialized for {}", name);
        }
        Command::Status => {
            let equb = selected_equb(&app)?;
            print_status(&app, equb)?;
        }
        Command::List => {
            if app.equbs().is_empty() {
                println!("No equbs yet. Create or join one.");
            }
            for equb in app.equbs() {
                println!(
                    "{}  {}  [{}]  {}/{} members  {}% collected",
                    equb.code,
                    equb.name,
                    equb.status.as_str(),
                    equb.members.len(),
                    equb.target_members,
                    equb.progress.round_dp(0),
                );
            }
        }
        Command::Create {
            name,
            frequency,
            target,
            goal,
            contribution,
            start,
        } => {
            let start_date = start.unwrap_or_else(|| chrono::Utc::now().date_naive());
            let contribution_amount = contribution
                .unwrap_or_else(|| EqubParams::suggested_contribution(goal, target));
            let equb_id = app.create_equb(EqubParams {
                name,
                frequency,
                target_members: target,
                goal_amount: goal,
                contribution_amount,
                start_date,
            })?;
            let equb = app.equb(equb_id)?;
            println!("Created {}. Share code: {}", equb.name, equb.code);
        }
        Command::Join { code } => {
            let equb_id = app.join_equb(&code)?;
            let equb = app.equb(equb_id)?;
            println!("Joined {} ({})", equb.name, equb.status.as_str());
        }
        Command::Select { equb } => {
            let equb_id = resolve_equb(&app, &equb)?;
            app.select_equb(equb_id)?;
            println!("Selected {}", app.equb(equb_id)?.name);
        }
        Command::AddMember { name, phone } => {
            let equb_id = selected_equb(&app)?.id;
            app.add_member(equb_id, &name, phone)?;
            let equb = app.equb(equb_id)?;
            println!(
                "Added {} ({}/{} members, {})",
                name,
                equb.members.len(),
                equb.target_members,
                equb.status.as_str(),
            );
        }
        Command::RemoveMember { name } => {
            let equb_id = selected_equb(&app)?.id;
            let member_id = resolve_member(selected_equb(&app)?, &name)?;
            app.remove_member(equb_id, member_id)?;
            println!("Removed {}", name);
        }
        Command::Contribute { member, amount, yes } => {
            let equb = selected_equb(&app)?;
            let equb_id = equb.id;
            let member_id = resolve_member(equb, &member)?;
            let missed = app.missed_cycles(equb_id, member_id)?;
            let amount = amount.unwrap_or_else(|| {
                equb.contribution_amount * Decimal::from(missed as u64 + 1)
            });
            match app.contribute(equb_id, member_id, amount, yes) {
                Ok(receipt) => {
                    println!(
                        "{} paid {} ETB ({}% collected)",
                        member,
                        receipt.amount,
                        receipt.progress.round_dp(0)
                    );
                    if receipt.goal_reached {
                        println!("Goal reached for this round!");
                    }
                }
                Err(EqubError::BelowRequired { required, offered }) => {
                    bail!(
                        "{} owes {} ETB but offered {}. Re-run with --yes to accept the shortfall.",
                        member,
                        required,
                        offered
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
        Command::Payout { recipient } => {
            let equb = selected_equb(&app)?;
            let equb_id = equb.id;
            let recipient_id = resolve_member(equb, &recipient)?;
            let receipt = app.payout(equb_id, recipient_id)?;
            println!(
                "Round {} payout of {} ETB to {}",
                receipt.round, receipt.amount, recipient
            );
            if receipt.completed {
                println!("Every member has been paid. The equb is complete.");
            }
        }
        Command::Reorder { from, to } => {
            let equb_id = selected_equb(&app)?.id;
            app.reorder_payout(equb_id, from, to)?;
            println!("Payout order updated.");
        }
        Command::Export { out } => {
            let equb = selected_equb(&app)?;
            let equb_id = equb.id;
            let path = out.unwrap_or_else(|| default_export_path(equb));
            let document = app.export_equb(equb_id)?;
            fs::write(&path, document)
                .with_context(|| format!("Could not write {}", path.display()))?;
            println!("Exported to {}", path.display());
        }
        Command::Import { file } => {
            let raw = fs::read_to_string(&file)
                .with_context(|| format!("Could not read {}", file.display()))?;
            let equb_id = app.import_equb(&raw)?;
            let equb = app.equb(equb_id)?;
            println!("Imported {}. New share code: {}", equb.name, equb.code);
        }
        Command::Activity => {
            let equb_id = selected_equb(&app)?.id;
            for entry in app.activity(Some(equb_id)) {
                println!("{}  {}", entry.date.format("%Y-%m-%d %H:%M"), entry.message);
            }
        }
    }

    Ok(())
}

/// The equb later commands operate on: the selected one, falling back to
/// the only equb in the store
fn selected_equb(app: &EqubApp) -> Result<&Equb> {
    if let Some(equb) = app.current_equb() {
        return Ok(equb);
    }
    match app.equbs() {
        [only] => Ok(only),
        [] => bail!("No equbs yet. Create or join one first."),
        _ => bail!("Multiple equbs in this ledger. Run `equb select <code-or-name>` first."),
    }
}

/// Resolve a user-supplied code or name to an equb id
fn resolve_equb(app: &EqubApp, needle: &str) -> Result<Uuid> {
    if let Some(equb) = app.equbs().iter().find(|e| e.matches_code(needle)) {
        return Ok(equb.id);
    }
    let matches: Vec<&Equb> = app
        .equbs()
        .iter()
        .filter(|e| e.name.eq_ignore_ascii_case(needle))
        .collect();
    match matches.as_slice() {
        [equb] => Ok(equb.id),
        [] => bail!("No equb matches '{}'", needle),
        _ => bail!("'{}' is ambiguous; use the join code instead", needle),
    }
}

/// Resolve a member name within an equb
fn resolve_member(equb: &Equb, name: &str) -> Result<Uuid> {
    let matches: Vec<Uuid> = equb
        .members
        .iter()
        .filter(|m| m.name.eq_ignore_ascii_case(name))
        .map(|m| m.id)
        .collect();
    match matches.as_slice() {
        [id] => Ok(*id),
        [] => bail!("No member named '{}' in {}", name, equb.name),
        _ => bail!("Multiple members named '{}'; this needs the admin UI", name),
    }
}

fn default_export_path(equb: &Equb) -> PathBuf {
    let slug = equb.name.replace(char::is_whitespace, "-");
    let date = chrono::Utc::now().date_naive();
    PathBuf::from(format!("equb-{}-{}.json", slug, date))
}

fn print_status(app: &EqubApp, equb: &Equb) -> Result<()> {
    println!("{}  ({})", equb.name, equb.code);
    println!(
        "  {} | goal {} ETB | {} ETB per {} | {}/{} members",
        equb.status.as_str(),
        equb.goal_amount,
        equb.contribution_amount,
        equb.frequency.period_label(),
        equb.members.len(),
        equb.target_members,
    );
    println!(
        "  round {} of {} | {}% collected",
        equb.payout_history.len() + 1,
        equb.target_members,
        equb.progress.round_dp(0),
    );

    let statuses = app.payment_status(equb.id)?;
    if !statuses.is_empty() {
        println!("  members:");
        for status in statuses {
            let standing = if status.paid_this_period {
                "paid".to_string()
            } else if status.missed_cycles > 0 {
                format!(
                    "missed {} {}(s), owes {} ETB",
                    status.missed_cycles,
                    equb.frequency.period_label(),
                    status.outstanding
                )
            } else {
                "not paid yet".to_string()
            };
            println!("    {:<20} {}", status.member_name, standing);
        }
    }
    Ok(())
}
