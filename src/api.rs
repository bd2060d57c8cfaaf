use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use blog_insights::config::AppConfig;
use blog_insights::insights::{Insights, LlmAnalysisData, TopicIdea};
use blog_insights::{analyze, Report};

use crate::devto_api::DevToClient;
use crate::llm::LlmClient;

/// Where the posts of one run come from and which LLM extras to add.
#[derive(Debug, Clone, Default)]
pub struct AnalysisJob {
    pub username: Option<String>,
    pub api_key: Option<String>,
    pub posts: Option<Vec<Value>>,
    pub llm_provider: Option<String>,
    pub insights: bool,
    pub topic_ideas: usize,
    pub strict: bool,
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Upstream(String),
    #[error(transparent)]
    NoData(#[from] blog_insights::AnalysisError),
}

/// A report plus the run metadata that must stay out of the report itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEnvelope {
    pub username: String,
    pub analysis_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_provider: Option<String>,
    pub report: Report,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insights: Option<Insights>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_ideas: Option<Vec<TopicIdea>>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Fetch (or take inline posts), analyze, then optionally ask the LLM for extras.
/// LLM failures become warnings; they never fail the run.
pub async fn run_analysis(config: &AppConfig, job: AnalysisJob) -> Result<ReportEnvelope, RunError> {
    let username = job
        .username
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    let records = match (job.posts, username.as_deref()) {
        (Some(posts), _) => posts,
        (None, Some(name)) => {
            let client = DevToClient::from_config(&config.fetch, job.api_key).map_err(RunError::Upstream)?;
            client.fetch_articles(name).await.map_err(RunError::Upstream)?
        }
        (None, None) => {
            return Err(RunError::BadRequest(
                "username or posts is required".to_string(),
            ))
        }
    };
    let username = username.unwrap_or_else(|| "anonymous".to_string());

    let report = analyze(&records, &config.analysis);
    if job.strict {
        report.ensure_analyzable()?;
    }

    let mut envelope = ReportEnvelope {
        username,
        analysis_date: Utc::now().to_rfc3339(),
        llm_provider: None,
        report,
        insights: None,
        topic_ideas: None,
        warnings: Vec::new(),
    };

    if !(job.insights || job.topic_ideas > 0) {
        return Ok(envelope);
    }
    if !envelope.report.has_data() {
        envelope
            .warnings
            .push("AI insights skipped: no analyzable posts".to_string());
        return Ok(envelope);
    }

    let client = match LlmClient::from_config(&config.llm, job.llm_provider.as_deref()) {
        Ok(Some(client)) => client,
        Ok(None) => {
            envelope.llm_provider = Some("none".to_string());
            return Ok(envelope);
        }
        Err(err) => {
            envelope.warnings.push(format!("AI insights unavailable: {}", err));
            return Ok(envelope);
        }
    };
    envelope.llm_provider = Some(client.provider().label().to_string());

    let data = LlmAnalysisData::from_report(&envelope.username, &envelope.report, &config.analysis);
    if job.insights {
        match client.generate_insights(&data).await {
            Ok(insights) => envelope.insights = Some(insights),
            Err(err) => {
                warn!(error = %err, "insight generation failed");
                envelope.warnings.push(format!("AI insights failed: {}", err));
            }
        }
    }
    if job.topic_ideas > 0 {
        match client.generate_topic_ideas(&data, job.topic_ideas).await {
            Ok(ideas) => envelope.topic_ideas = Some(ideas),
            Err(err) => {
                warn!(error = %err, "topic idea generation failed");
                envelope.warnings.push(format!("topic ideas failed: {}", err));
            }
        }
    }

    Ok(envelope)
}

#[derive(Debug, Deserialize)]
pub struct ApiAnalyzeRequest {
    pub username: Option<String>,
    pub api_key: Option<String>,
    pub posts: Option<Vec<Value>>,
    pub llm_provider: Option<String>,
    pub include_insights: Option<bool>,
    pub topic_ideas: Option<usize>,
    pub strict: Option<bool>,
}

impl ApiAnalyzeRequest {
    pub fn into_job(self) -> AnalysisJob {
        AnalysisJob {
            username: self.username,
            api_key: self.api_key,
            posts: self.posts,
            llm_provider: self.llm_provider,
            insights: self.include_insights.unwrap_or(false),
            topic_ideas: self.topic_ideas.unwrap_or(0),
            strict: self.strict.unwrap_or(true),
        }
    }
}

/// Accepts either a full report or an already projected `analysis_data` payload.
#[derive(Debug, Deserialize)]
pub struct ApiGenerateRequest {
    pub username: Option<String>,
    pub report: Option<Report>,
    pub analysis_data: Option<LlmAnalysisData>,
    pub llm_provider: Option<String>,
    pub count: Option<usize>,
}

impl ApiGenerateRequest {
    pub fn analysis_data(&self, config: &AppConfig) -> Result<LlmAnalysisData, String> {
        if let Some(data) = &self.analysis_data {
            return Ok(data.clone());
        }
        let report = self
            .report
            .as_ref()
            .ok_or_else(|| "report or analysis_data is required".to_string())?;
        let username = self.username.as_deref().unwrap_or("anonymous");
        Ok(LlmAnalysisData::from_report(username, report, &config.analysis))
    }
}

#[derive(Debug, Serialize)]
pub struct ApiInsightsResponse {
    pub llm_provider: String,
    pub insights: Insights,
}

#[derive(Debug, Serialize)]
pub struct ApiTopicIdeasResponse {
    pub llm_provider: String,
    pub topic_ideas: Vec<TopicIdea>,
}

#[derive(Debug, Deserialize)]
pub struct ApiExportRequest {
    pub report: Report,
    /// `json` or `csv`.
    pub format: Option<String>,
    pub section: Option<String>,
}
