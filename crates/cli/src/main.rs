use anyhow::Context;
use clap::{Parser, Subcommand};
use invest_profile_core::context::AppContext;
use invest_profile_core::domain::questionnaire::{normalize_answer_key, normalize_answers};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "invest_profile")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Log in and store the session locally.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Create an account. Does not log in.
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        username: String,
    },

    /// Drop the session and every cached profile record.
    Logout,

    /// Save questionnaire answers, replacing any earlier run.
    Submit {
        /// Answer as QUESTION=OPTION, e.g. `q1=b` or `1=b`. Repeatable.
        #[arg(long = "answer", value_parser = parse_answer, required = true)]
        answers: Vec<(String, String)>,

        /// Amount the user plans to invest each month.
        #[arg(long, default_value_t = 0.0)]
        monthly: f64,

        /// Continue straight through analysis and recommendations.
        #[arg(long)]
        run: bool,
    },

    /// Score the saved questionnaire.
    Analyze,

    /// Fetch recommendations for the saved analysis.
    Recommend,

    /// Show which pipeline records are cached.
    Status,

    /// Print the cached records as JSON.
    Show,

    /// Delete the cached questionnaire, analysis and recommendations.
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = invest_profile_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let ctx = AppContext::from_settings(&settings)
        .await
        .context("failed to initialize profile context")?;

    if let Err(err) = run(&ctx, args.command).await {
        sentry_anyhow::capture_anyhow(&err);
        return Err(err);
    }
    Ok(())
}

async fn run(ctx: &AppContext, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Login { email, password } => {
            let session = ctx
                .sessions
                .login(&ctx.auth, email.trim(), &password)
                .await?;
            tracing::info!(user_id = %session.user_id, "logged in");
            print_json(&serde_json::json!({
                "userId": session.user_id,
                "email": session.email,
                "username": session.username,
                "loginTime": session.login_time,
            }))
        }
        Command::Register {
            email,
            password,
            username,
        } => {
            let account = ctx
                .auth
                .register(email.trim(), &password, username.trim())
                .await?;
            print_json(&account)
        }
        Command::Logout => {
            ctx.logout().await?;
            tracing::info!("logged out");
            Ok(())
        }
        Command::Submit {
            answers,
            monthly,
            run,
        } => {
            let answers = normalize_answers(answers)?;
            if run {
                let outcome = ctx.orchestrator.run_pipeline(answers, monthly).await?;
                print_json(&outcome.recommendations)
            } else {
                let submission = ctx.orchestrator.save_submission(answers, monthly).await?;
                print_json(&submission)
            }
        }
        Command::Analyze => print_json(&ctx.orchestrator.analyze_profile().await?),
        Command::Recommend => print_json(&ctx.orchestrator.load_recommendations().await?),
        Command::Status => {
            let status = ctx.orchestrator.status().await?;
            print_json(&serde_json::json!({
                "hasQuestionnaire": status.has_questionnaire,
                "hasAnalysis": status.has_analysis,
                "hasRecommendations": status.has_recommendations,
                "state": status.stage(),
            }))
        }
        Command::Show => print_json(&serde_json::json!({
            "questionnaire": ctx.orchestrator.questionnaire().await?,
            "analysis": ctx.orchestrator.classification().await?,
            "recommendations": ctx.orchestrator.recommendations().await?,
        })),
        Command::Clear => {
            ctx.orchestrator.clear_all().await?;
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_answer(raw: &str) -> Result<(String, String), String> {
    let (question, option) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected QUESTION=OPTION, got {raw:?}"))?;
    let question = normalize_answer_key(question);
    let option = option.trim().to_string();
    if question.is_empty() || option.is_empty() {
        return Err(format!("expected QUESTION=OPTION, got {raw:?}"));
    }
    Ok((question, option))
}

fn init_sentry(settings: &invest_profile_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
