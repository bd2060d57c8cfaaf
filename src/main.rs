mod api;
mod devto_api;
mod llm;
mod server;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use blog_insights::config::AppConfig;
use blog_insights::export::{self, CsvSection};
use blog_insights::insights::{Insights, TopicIdea};
use blog_insights::{format_float, format_number, format_percent, Report};

use crate::api::{run_analysis, AnalysisJob, ReportEnvelope};

#[derive(Parser)]
#[command(name = "blog-insights", about = "Engagement analytics for Dev.to blog posts")]
struct Cli {
    /// Config file (defaults to INSIGHTS_CONFIG_PATH or config/insights.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    Analyze(AnalyzeArgs),
    Serve(ServeArgs),
    InitConfig(InitConfigArgs),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Csv,
}

#[derive(Args, Debug, Clone)]
struct AnalyzeArgs {
    /// Dev.to username to fetch published articles for.
    #[arg(long, conflicts_with = "input")]
    username: Option<String>,
    /// JSON file holding an array of article records; `-` reads stdin.
    #[arg(long)]
    input: Option<PathBuf>,
    #[arg(long)]
    api_key: Option<String>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// CSV section: tags, days, hours, combinations, reading_time, posts, series, recommendations.
    #[arg(long, default_value = "tags")]
    section: String,
    #[arg(long)]
    output: Option<PathBuf>,
    /// Ask the LLM provider for insights.
    #[arg(long)]
    ai: bool,
    #[arg(long)]
    llm_provider: Option<String>,
    /// Number of topic ideas to generate.
    #[arg(long, default_value_t = 0)]
    ideas: usize,
    /// Fail instead of printing an empty report.
    #[arg(long)]
    strict: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    #[arg(long, default_value_t = 8787)]
    port: u16,
}

#[derive(Args, Debug, Clone)]
struct InitConfigArgs {
    #[arg(long, default_value = "config/insights.toml")]
    path: PathBuf,
    #[arg(long)]
    force: bool,
}

#[tokio::main]
async fn main() {
    load_dotenv();
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let cli = Cli::parse();
    let (config, config_path) = AppConfig::load(cli.config).map_err(|err| err.to_string())?;
    if let Some(path) = config_path.as_ref().filter(|path| path.exists()) {
        info!(path = %path.display(), "loaded config");
    }

    match cli.command {
        Command::Analyze(args) => run_analyze(args, config).await,
        Command::Serve(args) => server::serve(args, config).await,
        Command::InitConfig(args) => run_init_config(args, &config),
    }
}

async fn run_analyze(args: AnalyzeArgs, config: AppConfig) -> Result<(), String> {
    let posts = match args.input.as_deref() {
        Some(path) => Some(read_posts(path)?),
        None if args.username.is_none() => {
            return Err("pass --username or --input".to_string());
        }
        None => None,
    };

    let job = AnalysisJob {
        username: args.username,
        api_key: args.api_key,
        posts,
        llm_provider: args.llm_provider,
        insights: args.ai,
        topic_ideas: args.ideas,
        strict: args.strict,
    };
    let envelope = run_analysis(&config, job).await.map_err(|err| err.to_string())?;

    let rendered = match args.format {
        OutputFormat::Text => render_text(&envelope),
        OutputFormat::Json => export::to_json(&envelope).map_err(|err| err.to_string())?,
        OutputFormat::Csv => {
            let section = CsvSection::from_str(&args.section).map_err(|err| err.to_string())?;
            export::to_csv(&envelope.report, section)
        }
    };

    match args.output {
        Some(path) => {
            std::fs::write(&path, rendered)
                .map_err(|err| format!("failed writing {}: {}", path.display(), err))?;
            info!(path = %path.display(), "wrote report");
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

fn run_init_config(args: InitConfigArgs, config: &AppConfig) -> Result<(), String> {
    if args.path.exists() && !args.force {
        return Err(format!(
            "{} already exists (pass --force to overwrite)",
            args.path.display()
        ));
    }
    config.write(&args.path).map_err(|err| err.to_string())?;
    println!("Wrote config to {}", args.path.display());
    Ok(())
}

fn read_posts(path: &Path) -> Result<Vec<Value>, String> {
    let contents = if path == Path::new("-") {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|err| format!("failed reading stdin: {}", err))?;
        buffer
    } else {
        std::fs::read_to_string(path)
            .map_err(|err| format!("failed reading {}: {}", path.display(), err))?
    };

    let value: Value = serde_json::from_str(&contents)
        .map_err(|err| format!("invalid JSON in {}: {}", path.display(), err))?;
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut object) => match object.remove("posts").or_else(|| object.remove("articles")) {
            Some(Value::Array(items)) => Ok(items),
            _ => Err("expected a JSON array of posts or an object with `posts`".to_string()),
        },
        _ => Err("expected a JSON array of posts".to_string()),
    }
}

fn render_text(envelope: &ReportEnvelope) -> String {
    let mut out = String::new();
    let report = &envelope.report;
    push_line(&mut out, format!("Blog insights for {}", envelope.username));

    if !report.has_data() {
        push_line(
            &mut out,
            format!(
                "No analyzable posts ({} records, {} skipped).",
                report.diagnostics.input_records,
                report.diagnostics.skipped.len()
            ),
        );
        render_warnings(&mut out, &envelope.warnings);
        return out;
    }

    render_overview(&mut out, report);
    render_top_posts(&mut out, report);
    render_tags(&mut out, report);
    render_times(&mut out, report);
    render_series(&mut out, report);

    if !report.recommendations.is_empty() {
        push_line(&mut out, "\nRecommendations:".to_string());
        for recommendation in &report.recommendations {
            push_line(
                &mut out,
                format!("- {}: {}", recommendation.title, recommendation.description),
            );
        }
    }

    if let Some(insights) = &envelope.insights {
        render_insights(&mut out, insights);
    }
    if let Some(ideas) = &envelope.topic_ideas {
        render_ideas(&mut out, ideas);
    }

    if !report.diagnostics.skipped.is_empty() {
        push_line(
            &mut out,
            format!("\nSkipped {} records:", report.diagnostics.skipped.len()),
        );
        for skipped in &report.diagnostics.skipped {
            push_line(
                &mut out,
                format!(
                    "  #{} {}: {}",
                    skipped.index,
                    skipped.id.as_deref().unwrap_or("-"),
                    skipped.reason
                ),
            );
        }
    }
    render_warnings(&mut out, &envelope.warnings);
    out
}

fn render_overview(out: &mut String, report: &Report) {
    let stats = &report.overall_stats;
    push_line(
        out,
        format!(
            "Articles: {} | reactions {} | comments {} | views {}",
            format_number(stats.total_articles as f64),
            format_number(stats.total_reactions as f64),
            format_number(stats.total_comments as f64),
            format_number(stats.total_views as f64)
        ),
    );
    push_line(
        out,
        format!(
            "Averages: reactions {} | comments {} | views {} | reading time {} min",
            format_float(stats.average_reactions, 1),
            format_float(stats.average_comments, 1),
            stats
                .average_views
                .map(|views| format_float(views, 1))
                .unwrap_or_else(|| "n/a".to_string()),
            format_float(stats.average_reading_time, 1)
        ),
    );
    if !stats.most_used_tags.is_empty() {
        let tags: Vec<String> = stats
            .most_used_tags
            .iter()
            .map(|tag| format!("#{} ({})", tag.tag, tag.count))
            .collect();
        push_line(out, format!("Most used tags: {}", tags.join(", ")));
    }
}

fn render_top_posts(out: &mut String, report: &Report) {
    push_line(out, "\nTop posts by engagement:".to_string());
    for (index, post) in report.top_posts.by_engagement.iter().enumerate() {
        push_line(
            out,
            format!(
                "  {}. {} ({} reactions, {} comments, {} min)",
                index + 1,
                post.title,
                format_number(post.reactions_count as f64),
                format_number(post.comments_count as f64),
                post.reading_time_minutes
            ),
        );
    }
}

fn render_tags(out: &mut String, report: &Report) {
    push_line(out, "\nTag performance:".to_string());
    for stat in report.tag_performance.iter().take(10) {
        push_line(
            out,
            format!(
                "  #{}: {} posts | avg reactions {} | avg comments {} | score {}",
                stat.tag,
                stat.metrics.post_count,
                format_float(stat.metrics.average_reactions, 1),
                format_float(stat.metrics.average_comments, 1),
                format_float(stat.metrics.engagement_score, 1)
            ),
        );
    }
}

fn render_times(out: &mut String, report: &Report) {
    let times = &report.best_times;
    if let Some(day) = times.best_day() {
        push_line(
            out,
            format!(
                "\nBest day: {} ({} avg reactions over {} posts)",
                day.label,
                format_float(day.metrics.average_reactions, 1),
                day.metrics.post_count
            ),
        );
    }
    if let Some(hour) = times.best_hour() {
        push_line(
            out,
            format!(
                "Best hour: {} ({} avg reactions over {} posts)",
                hour.label,
                format_float(hour.metrics.average_reactions, 1),
                hour.metrics.post_count
            ),
        );
    }
    if !times.combinations.is_empty() {
        let slots: Vec<String> = times
            .combinations
            .iter()
            .map(|slot| format!("{} ({})", slot.label, format_float(slot.average_engagement, 1)))
            .collect();
        push_line(out, format!("Best slots: {}", slots.join(", ")));
    }
    if let Some(bucket) = report.reading_time_performance.first() {
        push_line(
            out,
            format!(
                "Best reading time: {} (score {})",
                bucket.label,
                format_float(bucket.metrics.engagement_score, 1)
            ),
        );
    }
}

fn render_series(out: &mut String, report: &Report) {
    if report.series.is_empty() {
        return;
    }
    push_line(out, "\nSeries:".to_string());
    for series in &report.series {
        push_line(
            out,
            format!(
                "  {}: {} parts | completion {}{} | avg reactions {}",
                series.base_title,
                series.parts_found,
                format_percent(series.completion_ratio),
                if series.completion_is_estimate { " (est.)" } else { "" },
                format_float(series.average_reactions, 1)
            ),
        );
    }
    let comparison = &report.series_comparison;
    push_line(
        out,
        format!(
            "  Series posts average {} reactions vs {} for standalone posts",
            format_float(comparison.series_average_reactions, 1),
            format_float(comparison.standalone_average_reactions, 1)
        ),
    );
}

fn render_insights(out: &mut String, insights: &Insights) {
    push_line(out, "\nAI insights:".to_string());
    push_line(out, format!("  {}", insights.performance_summary));
    for pattern in &insights.key_patterns {
        push_line(out, format!("  * {}", pattern));
    }
    for recommendation in &insights.content_recommendations {
        push_line(out, format!("  > {}", recommendation));
    }
}

fn render_ideas(out: &mut String, ideas: &[TopicIdea]) {
    push_line(out, "\nTopic ideas:".to_string());
    for idea in ideas {
        push_line(
            out,
            format!(
                "  - {} [{}] ~{} min",
                idea.title,
                idea.suggested_tags.join(", "),
                idea.estimated_reading_time
            ),
        );
    }
}

fn render_warnings(out: &mut String, warnings: &[String]) {
    for warning in warnings {
        push_line(out, format!("Warning: {}", warning));
    }
}

fn push_line(out: &mut String, line: String) {
    out.push_str(&line);
    out.push('\n');
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_dotenv() {
    let _ = dotenvy::dotenv();
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let manifest_path = Path::new(manifest_dir).join(".env");
    let _ = dotenvy::from_path(manifest_path);
}
