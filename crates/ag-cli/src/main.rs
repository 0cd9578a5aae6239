//! AloeGuard CLI

use ag_client::{Backend, ClientConfig, HttpBackend, MemoryBackend};
use ag_core::validation::ImageSelection;
use ag_core::ReportSeverity;
use ag_screens::screens::history::{display_status, EMPTY_STATE_ACTION, EMPTY_STATE_MESSAGE};
use ag_screens::screens::mapping::REPORT_ACTION;
use ag_screens::{
    AnalysisScreen, Context, FeedbackScreen, HistoryScreen, MappingScreen, Notice, Preference,
    ProfileScreen, ScreenError, Session, SettingsScreen, SignInScreen, SignUpScreen, SubmitGate,
};
use anyhow::{anyhow, Context as _, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEMO_USERNAME: &str = "demo";
const DEMO_PASSWORD: &str = "aloeguard";

#[derive(Parser)]
#[command(name = "aloeguard")]
#[command(about = "Plant health companion: analyze, track and report aloe diseases")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Backend base URL
    #[arg(long, global = true, env = "ALOEGUARD_API_URL")]
    api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Account username
    #[arg(short, long, global = true, env = "ALOEGUARD_USERNAME")]
    username: Option<String>,

    /// Account password
    #[arg(short, long, global = true, env = "ALOEGUARD_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Use a seeded in-memory backend instead of the network
    #[arg(long, global = true)]
    offline: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and show the account
    SignIn,

    /// Create an account
    SignUp {
        /// Repeated password (defaults to --password)
        #[arg(long)]
        confirm_password: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,
    },

    /// Analyze a plant photo
    Analyze {
        /// Path to the image file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// List past analyses
    History,

    /// List community disease reports
    Reports,

    /// Report a disease case
    Report {
        #[arg(long)]
        location: String,

        #[arg(long)]
        disease: String,

        /// Severity (low, medium, high)
        #[arg(long)]
        severity: ReportSeverity,

        #[arg(long, allow_hyphen_values = true)]
        latitude: Option<String>,

        #[arg(long, allow_hyphen_values = true)]
        longitude: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Rate an analysis
    Feedback {
        /// Analysis id
        #[arg(short, long)]
        analysis: i64,

        /// Stars from 1 to 5
        #[arg(short, long)]
        rating: u8,

        #[arg(short, long)]
        comment: Option<String>,
    },

    /// Show the profile and activity stats
    Profile,

    /// Show preferences and app version
    Settings {
        /// Toggle a preference before showing the list
        #[arg(long, value_parser = parse_preference)]
        toggle: Vec<Preference>,

        /// Sign out afterwards
        #[arg(long)]
        sign_out: bool,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    if std::env::var("RUST_LOG").is_ok() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .with_target(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");
    } else {
        let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_target(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");
    }

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let backend = connect(&cli)?;
    let ctx = Context::new(backend, Arc::new(Session::new()));

    match cli.command {
        Commands::SignIn => {
            sign_in(cli.username.as_deref(), cli.password.as_deref(), cli.offline, &ctx).await?;
        }
        Commands::SignUp {
            ref confirm_password,
            ref email,
            ref first_name,
            ref last_name,
        } => {
            let username = cli.username.clone().context("--username is required")?;
            let password = cli.password.clone().context("--password is required")?;
            let screen = SignUpScreen::new(ctx.clone());
            screen.edit(|form| {
                form.confirm_password = confirm_password.clone().unwrap_or_else(|| password.clone());
                form.username = username;
                form.password = password;
                form.email = email.clone().unwrap_or_default();
                form.first_name = first_name.clone().unwrap_or_default();
                form.last_name = last_name.clone().unwrap_or_default();
            });
            let result = screen.submit().await;
            report_gate(screen.gate());
            let profile = result.map_err(explain)?;
            println!("Signed up as {} (id {})", profile.username, profile.id);
        }
        Commands::Analyze { ref file } => {
            sign_in(cli.username.as_deref(), cli.password.as_deref(), cli.offline, &ctx).await?;
            cmd_analyze(&ctx, file).await?;
        }
        Commands::History => {
            sign_in(cli.username.as_deref(), cli.password.as_deref(), cli.offline, &ctx).await?;
            cmd_history(&ctx).await?;
        }
        Commands::Reports => {
            cmd_reports(&ctx).await?;
        }
        Commands::Report {
            ref location,
            ref disease,
            severity,
            ref latitude,
            ref longitude,
            ref description,
        } => {
            sign_in(cli.username.as_deref(), cli.password.as_deref(), cli.offline, &ctx).await?;
            let screen = MappingScreen::new(ctx.clone());
            screen.edit(|form| {
                form.location = location.clone();
                form.disease = disease.clone();
                form.severity = Some(severity);
                form.latitude = latitude.clone().unwrap_or_default();
                form.longitude = longitude.clone().unwrap_or_default();
                form.description = description.clone().unwrap_or_default();
            });
            let result = screen.submit_report().await;
            report_gate(screen.gate());
            let created = result.map_err(explain)?;
            println!("Report #{} recorded", created.id);
        }
        Commands::Feedback {
            analysis,
            rating,
            ref comment,
        } => {
            sign_in(cli.username.as_deref(), cli.password.as_deref(), cli.offline, &ctx).await?;
            let screen = FeedbackScreen::new(ctx.clone(), analysis);
            screen.set_rating(rating);
            screen.set_comment(comment.clone().unwrap_or_default());
            let result = screen.submit().await;
            report_gate(screen.gate());
            let stored = result.map_err(explain)?;
            println!("Feedback #{} saved for analysis #{}", stored.id, stored.analysis_id);
        }
        Commands::Profile => {
            sign_in(cli.username.as_deref(), cli.password.as_deref(), cli.offline, &ctx).await?;
            cmd_profile(&ctx).await?;
        }
        Commands::Settings {
            ref toggle,
            sign_out,
        } => {
            sign_in(cli.username.as_deref(), cli.password.as_deref(), cli.offline, &ctx).await?;
            cmd_settings(&ctx, toggle, sign_out).await?;
        }
    }

    Ok(())
}

fn connect(cli: &Cli) -> Result<Arc<dyn Backend>> {
    if cli.offline {
        info!("Using seeded in-memory backend");
        return Ok(Arc::new(MemoryBackend::seeded_demo()));
    }

    let mut config = ClientConfig::default();
    if let Some(url) = &cli.api_url {
        config.base_url = url.clone();
    }
    if let Some(secs) = cli.timeout_secs {
        config.timeout_secs = secs;
    }
    debug!("Backend {} (timeout {}s)", config.base_url, config.timeout_secs);

    let backend = HttpBackend::new(&config).context("Failed to build HTTP client")?;
    Ok(Arc::new(backend))
}

async fn sign_in(
    username: Option<&str>,
    password: Option<&str>,
    offline: bool,
    ctx: &Context,
) -> Result<()> {
    let (username, password) = match (username, password) {
        (Some(u), Some(p)) => (u.to_string(), p.to_string()),
        (None, None) if offline => (DEMO_USERNAME.to_string(), DEMO_PASSWORD.to_string()),
        (None, None) => {
            return match ctx.session.restore(ctx.backend.as_ref()).await {
                Ok(Some(_)) => Ok(()),
                Ok(None) => Err(anyhow!(
                    "Not signed in: pass --username and --password (or set ALOEGUARD_USERNAME and ALOEGUARD_PASSWORD)"
                )),
                Err(e) => Err(explain(e)),
            };
        }
        _ => return Err(anyhow!("--username and --password must be given together")),
    };

    let screen = SignInScreen::new(ctx.clone());
    screen.set_username(username);
    screen.set_password(password);
    let result = screen.submit().await;
    report_gate(screen.gate());
    let profile = result.map_err(explain)?;
    info!("Signed in as {} (id {})", profile.username, profile.id);
    Ok(())
}

async fn cmd_analyze(ctx: &Context, file: &Path) -> Result<()> {
    let metadata = tokio::fs::metadata(file)
        .await
        .with_context(|| format!("File not found: {}", file.display()))?;
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| anyhow!("Not a file: {}", file.display()))?;

    let screen = AnalysisScreen::new(ctx.clone());
    let image = ImageSelection::new(file_name, metadata.len());
    println!("Selected {} ({:.2} MB)", image.file_name, image.size_mb());
    screen.select_image(image);
    report_gate(screen.gate());

    let result = screen.submit().await;
    report_gate(screen.gate());
    let outcome = result.map_err(explain)?;

    println!("\nAnalysis Result\n{}", "=".repeat(50));
    println!("Diagnosis:  {}", outcome.diagnosis.diagnosis);
    println!("Confidence: {}%", outcome.diagnosis.confidence);
    println!("Status:     {}", outcome.diagnosis.status);
    if !outcome.diagnosis.notes.is_empty() {
        println!("Notes:      {}", outcome.diagnosis.notes);
    }
    println!("Saved as analysis #{}", outcome.record.id);
    Ok(())
}

async fn cmd_history(ctx: &Context) -> Result<()> {
    let screen = HistoryScreen::new(ctx.clone());
    let entries = screen.load().await.map_err(explain)?;

    if screen.shows_empty_state() {
        println!("{}", EMPTY_STATE_MESSAGE);
        println!("-> {}", EMPTY_STATE_ACTION);
        return Ok(());
    }

    println!("\nAnalysis History\n{}", "=".repeat(50));
    for entry in &entries {
        let date = entry
            .created_at
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "#{:<4} {}  {:<20} {:>3}%  [{}]  {}",
            entry.id,
            date,
            entry.diagnosis,
            entry.rounded_confidence(),
            display_status(entry),
            entry.image_path
        );
    }
    Ok(())
}

async fn cmd_reports(ctx: &Context) -> Result<()> {
    let screen = MappingScreen::new(ctx.clone());
    let reports = screen.load().await.map_err(explain)?;

    println!("\nDisease Reports\n{}", "=".repeat(50));
    for report in &reports {
        let coordinates = report
            .coordinates()
            .map(|(lat, lon)| format!(" ({:.4}, {:.4})", lat, lon))
            .unwrap_or_default();
        println!(
            "#{:<4} {:<8} {} in {}{}",
            report.id, report.severity, report.disease, report.location, coordinates
        );
    }
    for (severity, count) in screen.severity_counts() {
        println!("  {}: {}", severity, count);
    }
    println!("-> {}", REPORT_ACTION);
    Ok(())
}

async fn cmd_profile(ctx: &Context) -> Result<()> {
    let screen = ProfileScreen::new(ctx.clone());
    let stats = screen.load_stats().await.map_err(explain)?;

    println!("\n[{}] {}", screen.avatar_initial(), screen.display_name());
    if let Some(user) = screen.user() {
        if let Some(email) = user.email {
            println!("{}", email);
        }
    }
    if let Some(since) = screen.member_since() {
        println!("Member since {}", since);
    }
    println!("\nPlants Analyzed:   {}", stats.plants_analyzed);
    println!("Diseases Detected: {}", stats.diseases_detected);
    println!("Healthy Plants:    {}", stats.healthy_plants);
    println!("Days Active:       {}", stats.days_active);
    Ok(())
}

async fn cmd_settings(ctx: &Context, toggles: &[Preference], sign_out: bool) -> Result<()> {
    let screen = SettingsScreen::new(ctx.clone());
    for preference in toggles {
        screen.toggle(*preference);
    }

    let preferences = screen.preferences();
    println!("\nSettings\n{}", "=".repeat(50));
    for preference in Preference::ALL {
        let state = if preferences.get(preference) { "on" } else { "off" };
        println!("{:<24} {}", preference.label(), state);
    }
    println!("\nAloeGuard v{}", screen.app_version());

    if sign_out {
        let result = screen.sign_out().await;
        report_gate(screen.sign_out_action().gate());
        result.map_err(explain)?;
    }
    Ok(())
}

fn parse_preference(raw: &str) -> std::result::Result<Preference, String> {
    let wanted = raw.trim().to_lowercase().replace(['-', '_'], " ");
    Preference::ALL
        .into_iter()
        .find(|p| p.label().to_lowercase() == wanted)
        .ok_or_else(|| format!("unknown preference '{}'", raw))
}

/// Print the notice and field errors a screen ended with
fn report_gate(gate: &SubmitGate) {
    if let Some(notice) = gate.notice() {
        print_notice(&notice);
    }
    for error in gate.errors().iter() {
        println!("  {}: {}", error.field, error.message);
    }
}

fn print_notice(notice: &Notice) {
    if notice.is_destructive() {
        eprintln!("{}: {}", notice.title, notice.description);
    } else {
        println!("{}: {}", notice.title, notice.description);
    }
}

fn explain(err: ScreenError) -> anyhow::Error {
    match err {
        ScreenError::NotSignedIn => anyhow!("Not signed in"),
        other => anyhow::Error::new(other),
    }
}
