//! Enqueue a single email job by hand
//!
//! ```text
//! enqueue welcome --name Ada --email ada@example.com --confirm-url https://...
//! enqueue signal --task-id 42 --signal BUY --strategy macd-cross
//! ```

use chrono::Utc;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tracing::info;
use tradesignal::config::{get_environment, redis_url_from_env};
use tradesignal::jobs::{JobPayload, JobProducer, SignalEmailPayload, WelcomeEmailPayload};
use tradesignal::logging;

#[derive(Parser)]
#[command(name = "enqueue", about = "Push an email job onto the TradeSignal queue")]
struct Cli {
    /// Redis URL (defaults to REDIS_URL or REDIS_ADDR/REDIS_PASSWORD)
    #[arg(long)]
    redis_url: Option<String>,

    #[command(subcommand)]
    job: Job,
}

#[derive(Subcommand)]
enum Job {
    /// Welcome email for a newly registered user
    Welcome {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        confirm_url: String,
    },
    /// Trade-signal notification for a task's owner
    Signal {
        #[arg(long)]
        task_id: i32,
        /// Unix seconds; defaults to now
        #[arg(long)]
        event_time: Option<i64>,
        #[arg(long)]
        signal: String,
        #[arg(long)]
        strategy: String,
    },
}

impl Job {
    fn into_payload(self) -> JobPayload {
        match self {
            Job::Welcome {
                name,
                email,
                confirm_url,
            } => JobPayload::WelcomeEmail(WelcomeEmailPayload {
                user_name: name,
                user_email: email,
                confirm_url,
            }),
            Job::Signal {
                task_id,
                event_time,
                signal,
                strategy,
            } => JobPayload::SignalEmail(SignalEmailPayload {
                task_id,
                event_time: event_time.unwrap_or_else(|| Utc::now().timestamp()),
                signal,
                strategy,
            }),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    logging::init_logging(&get_environment());

    let cli = Cli::parse();
    let redis_url = cli.redis_url.unwrap_or_else(redis_url_from_env);

    let producer = JobProducer::connect(&redis_url).await?;
    let payload = cli.job.into_payload();
    let task_type = payload.task_type();
    producer.enqueue(payload).await?;

    info!(task_type, "Enqueued {} job", task_type);
    Ok(())
}
