//! proofdesk CLI: operator interface to issue resolution, review decisions
//! and the worklist.

use clap::{Parser, Subcommand, ValueEnum};
use opentelemetry::KeyValue;
use proofdesk::config::{Config, ReviewSettings};
use proofdesk::db::Db;
use proofdesk::model::{
    BatchDecisionType, IssueId, NewDecision, PlainTextPosition, ProofreadingIssue, WorklistId,
    WorklistItem, WorklistStatus,
};
use proofdesk::projector::PlainText;
use proofdesk::resolver::{PositionSource, Tolerance};
use proofdesk::review::ReviewStats;
use proofdesk::sequencer;
use proofdesk::telemetry::metrics;
use proofdesk::telemetry::review::{record_issue_count, start_review_span};
use proofdesk::telemetry::{TelemetryConfig, TelemetryGuard, init_telemetry};
use proofdesk::worklist::retry_target;
use secrecy::ExposeSecret;
use std::path::PathBuf;
use std::time::Instant;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "proofdesk", about = "Proofreading review pipeline")]
struct Cli {
    /// Who is acting, recorded in status history
    #[arg(long, global = true, env = "USER", default_value = "cli")]
    actor: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Locate issues in an article and print them in render order
    Resolve {
        /// Article HTML file
        #[arg(long)]
        html: PathBuf,
        /// JSON array of issues
        #[arg(long)]
        issues: PathBuf,
        /// Treat stale precomputed positions as not found
        #[arg(long)]
        strict: bool,
        /// Require exact matches for precomputed positions
        #[arg(long)]
        exact: bool,
    },
    /// Review decision operations
    Review {
        #[command(subcommand)]
        action: ReviewAction,
    },
    /// Worklist operations
    Worklist {
        #[command(subcommand)]
        action: WorklistAction,
    },
}

#[derive(Subcommand)]
enum ReviewAction {
    /// Store detected issues for an article
    Import {
        article: Uuid,
        /// JSON array of issues
        #[arg(long)]
        issues: PathBuf,
    },
    /// Locate an article's stored issues and save positions found by search
    Locate {
        article: Uuid,
        /// Current article HTML
        #[arg(long)]
        html: PathBuf,
    },
    /// Show decision counts for an article
    Summary { article: Uuid },
    /// Record a decision for one issue
    Decide {
        article: Uuid,
        issue: Uuid,
        decision: DecisionArg,
        /// Replacement text (required for modify)
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        rationale: Option<String>,
        /// Feedback category for rule tuning
        #[arg(long)]
        feedback: Option<String>,
        #[arg(long, requires = "feedback")]
        notes: Option<String>,
    },
    /// Accept or reject many issues at once
    Batch {
        article: Uuid,
        decision: BatchArg,
        #[arg(required = true)]
        issues: Vec<Uuid>,
        #[arg(long)]
        rationale: Option<String>,
    },
}

#[derive(Subcommand)]
enum WorklistAction {
    /// Create a worklist item for an article
    Create { article: Uuid },
    /// Show a worklist item and its history
    Show { id: Uuid },
    /// List worklist items
    List {
        #[arg(long)]
        status: Option<WorklistStatus>,
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Move an item forward (or to failed)
    Transition {
        id: Uuid,
        from: WorklistStatus,
        to: WorklistStatus,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Send a review stage back to its automated stage
    Retry {
        id: Uuid,
        from: WorklistStatus,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Finish proofreading review once every issue is decided
    CompleteReview { id: Uuid },
}

#[derive(Clone, Copy, ValueEnum)]
enum DecisionArg {
    Accept,
    Reject,
    Modify,
}

#[derive(Clone, Copy, ValueEnum)]
enum BatchArg {
    Accept,
    Reject,
}

impl From<BatchArg> for BatchDecisionType {
    fn from(arg: BatchArg) -> Self {
        match arg {
            BatchArg::Accept => BatchDecisionType::Accepted,
            BatchArg::Reject => BatchDecisionType::Rejected,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Command::Resolve {
            html,
            issues,
            strict,
            exact,
        } => {
            let _guard = init_local_logging()?;
            cmd_resolve(html, issues, strict, exact)
        }
        Command::Review { action } => {
            let (db, config, _guard) = connect().await?;
            match action {
                ReviewAction::Import { article, issues } => {
                    cmd_review_import(&db, article, issues).await
                }
                ReviewAction::Locate { article, html } => {
                    cmd_review_locate(&db, &config.review, article, html).await
                }
                ReviewAction::Summary { article } => cmd_review_summary(&db, article).await,
                ReviewAction::Decide {
                    article,
                    issue,
                    decision,
                    content,
                    rationale,
                    feedback,
                    notes,
                } => {
                    let mut new = match decision {
                        DecisionArg::Accept => NewDecision::accepted(),
                        DecisionArg::Reject => NewDecision::rejected(),
                        DecisionArg::Modify => {
                            NewDecision::modified(content.unwrap_or_default())
                        }
                    };
                    if let Some(r) = rationale {
                        new = new.rationale(r);
                    }
                    if let Some(category) = feedback {
                        new = new.feedback(category, notes);
                    }
                    cmd_review_decide(&db, article, IssueId(issue), new).await
                }
                ReviewAction::Batch {
                    article,
                    decision,
                    issues,
                    rationale,
                } => cmd_review_batch(&db, article, decision.into(), issues, rationale).await,
            }
        }
        Command::Worklist { action } => {
            let (db, _config, _guard) = connect().await?;
            let actor = cli.actor.as_str();
            match action {
                WorklistAction::Create { article } => {
                    let item = db.create_worklist_item(article).await?;
                    println!("Created: {} (status: {})", item.id.0, item.status);
                    Ok(())
                }
                WorklistAction::Show { id } => {
                    let item = db.get_worklist_item(WorklistId(id)).await?;
                    print_worklist_item(&item);
                    Ok(())
                }
                WorklistAction::List { status, limit } => cmd_worklist_list(&db, status, limit).await,
                WorklistAction::Transition {
                    id,
                    from,
                    to,
                    reason,
                } => {
                    let item = db
                        .transition_status(WorklistId(id), from, to, actor, reason.as_deref())
                        .await?;
                    println!("{}: {from} → {}", item.id, item.status);
                    Ok(())
                }
                WorklistAction::Retry { id, from, reason } => {
                    let Some(to) = retry_target(from) else {
                        anyhow::bail!("{from} cannot be retried");
                    };
                    let item = db
                        .retry_status(WorklistId(id), from, to, actor, reason.as_deref())
                        .await?;
                    println!("{}: {from} → {} (retry)", item.id, item.status);
                    Ok(())
                }
                WorklistAction::CompleteReview { id } => {
                    let item = db.complete_review(WorklistId(id), actor).await?;
                    println!("{}: review complete, now {}", item.id, item.status);
                    Ok(())
                }
            }
        }
    }
}

/// Logging only, for commands that never reach the database.
fn init_local_logging() -> anyhow::Result<TelemetryGuard> {
    Ok(init_telemetry(TelemetryConfig {
        endpoint: None,
        service_name: "proofdesk".to_string(),
        log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "warn".to_string()),
    })?)
}

async fn connect() -> anyhow::Result<(Db, Config, TelemetryGuard)> {
    let config = Config::from_env()?;
    let guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "proofdesk".to_string(),
        log_level: config.log_level.clone(),
    })?;

    let db = Db::connect(config.database_url.expose_secret()).await?;
    db.migrate().await?;
    Ok((db, config, guard))
}

fn cmd_resolve(html: PathBuf, issues: PathBuf, strict: bool, exact: bool) -> anyhow::Result<()> {
    let mut options = ReviewSettings::from_env()?.resolve_options();
    if strict {
        options = options.strict(true);
    }
    if exact {
        options = options.tolerance(Tolerance::Exact);
    }

    let html = std::fs::read_to_string(&html)?;
    let issues: Vec<ProofreadingIssue> = serde_json::from_str(&std::fs::read_to_string(&issues)?)?;
    let text = PlainText::from_html(&html);

    let sequence = sequencer::sequence(&issues, &text, &options);

    println!(
        "{:<6}  {:<6}  {:<19}  {:<8}  {:<20}  TEXT",
        "START", "END", "SOURCE", "SEVERITY", "RULE"
    );
    println!("{}", "-".repeat(90));
    for r in &sequence {
        let snippet = text.slice(r.position.start, r.position.end).unwrap_or("");
        println!(
            "{:<6}  {:<6}  {:<19}  {:<8}  {:<20}  {}",
            r.position.start, r.position.end, r.source, r.issue.severity, r.issue.rule_id, snippet
        );
    }

    println!(
        "\n{} of {} issue(s) placed ({} chars of plain text)",
        sequence.len(),
        issues.len(),
        text.char_len()
    );
    Ok(())
}

async fn cmd_review_import(db: &Db, article: Uuid, issues: PathBuf) -> anyhow::Result<()> {
    let issues: Vec<ProofreadingIssue> = serde_json::from_str(&std::fs::read_to_string(&issues)?)?;
    for issue in &issues {
        db.insert_issue(article, issue).await?;
    }
    println!("Imported {} issue(s) for {article}", issues.len());
    Ok(())
}

async fn cmd_review_locate(
    db: &Db,
    settings: &ReviewSettings,
    article: Uuid,
    html: PathBuf,
) -> anyhow::Result<()> {
    let options = settings.resolve_options();
    let span = start_review_span(&article);
    let issues = db.load_issues(article).await?;
    record_issue_count(&span, issues.len());

    let started = Instant::now();
    let text = PlainText::from_html(&std::fs::read_to_string(&html)?);
    let sequence = sequencer::sequence(&issues, &text, &options);
    metrics::operation_duration_ms().record(
        started.elapsed().as_secs_f64() * 1000.0,
        &[KeyValue::new("operation", "issues.locate")],
    );

    let searched: Vec<(IssueId, PlainTextPosition)> = sequence
        .iter()
        .filter(|r| r.source == PositionSource::TextSearch)
        .map(|r| (r.issue.id, r.position))
        .collect();
    db.store_plain_positions(&searched).await?;

    println!(
        "{} of {} issue(s) placed, {} position(s) updated",
        sequence.len(),
        issues.len(),
        searched.len()
    );
    Ok(())
}

async fn cmd_review_summary(db: &Db, article: Uuid) -> anyhow::Result<()> {
    let span = start_review_span(&article);
    let store = db.load_review(article).await?;
    record_issue_count(&span, store.issues().len());
    print_stats(&store.summary());
    Ok(())
}

async fn cmd_review_decide(
    db: &Db,
    article: Uuid,
    issue: IssueId,
    decision: NewDecision,
) -> anyhow::Result<()> {
    let mut store = db.load_review(article).await?;
    let saved = store.record_decision(issue, decision)?;
    db.save_decisions(std::slice::from_ref(&saved)).await?;
    println!("{}: {}", saved.issue_id, saved.decision_type);
    print_stats(&store.summary());
    Ok(())
}

async fn cmd_review_batch(
    db: &Db,
    article: Uuid,
    decision: BatchDecisionType,
    issues: Vec<Uuid>,
    rationale: Option<String>,
) -> anyhow::Result<()> {
    let ids: Vec<IssueId> = issues.into_iter().map(IssueId).collect();
    let mut store = db.load_review(article).await?;
    let outcome = store.record_batch(&ids, decision, rationale.as_deref());
    db.save_decisions(&outcome.saved_decisions).await?;

    println!("Processed: {}", outcome.processed_count);
    if !outcome.failed.is_empty() {
        println!("Failed:");
        for id in &outcome.failed {
            println!("  {}", id.0);
        }
    }
    print_stats(&store.summary());
    Ok(())
}

async fn cmd_worklist_list(
    db: &Db,
    status: Option<WorklistStatus>,
    limit: i64,
) -> anyhow::Result<()> {
    let items = db.list_worklist_items(status, limit).await?;
    if items.is_empty() {
        println!("No worklist items found.");
        return Ok(());
    }

    println!("{:<8}  {:<36}  {:<20}  UPDATED", "ID", "ARTICLE", "STATUS");
    println!("{}", "-".repeat(90));
    for item in &items {
        println!(
            "{:<8}  {:<36}  {:<20}  {}",
            item.id,
            item.article_id,
            item.status,
            item.updated_at.format("%Y-%m-%d %H:%M")
        );
    }
    println!("\n{} item(s)", items.len());
    Ok(())
}

fn print_worklist_item(item: &WorklistItem) {
    println!("ID:         {}", item.id.0);
    println!("Article:    {}", item.article_id);
    if item.status.awaits_review() {
        println!("Status:     {} (awaiting review)", item.status);
    } else {
        println!("Status:     {}", item.status);
    }
    println!("Created:    {}", item.created_at);
    println!("Updated:    {}", item.updated_at);
    if item.status_history.is_empty() {
        return;
    }
    println!("---");
    for change in &item.status_history {
        println!(
            "{}  {} → {}  by {}{}",
            change.at.format("%Y-%m-%d %H:%M:%S"),
            change.from,
            change.to,
            change.changed_by,
            change
                .reason
                .as_deref()
                .map(|r| format!(" ({r})"))
                .unwrap_or_default()
        );
    }
}

fn print_stats(stats: &ReviewStats) {
    let c = &stats.counts;
    println!(
        "Issues: {}  pending {}  accepted {}  rejected {}  modified {}",
        stats.total, c.pending, c.accepted, c.rejected, c.modified
    );
    for (severity, counts) in &stats.by_severity {
        println!(
            "  {:<9} {} decided / {}",
            severity.as_str(),
            counts.decided(),
            counts.total()
        );
    }
    for (engine, counts) in &stats.by_engine {
        println!(
            "  {:<13} {} decided / {}",
            engine.as_str(),
            counts.decided(),
            counts.total()
        );
    }
}
