//! Support for the LLM collaborator: the report projection handed to the model, prompt text,
//! response parsing, and an offline generator used when no provider is configured.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::config::AnalysisConfig;
use crate::error::InsightsError;
use crate::grouping::{PostSummary, TimeSlotStat};
use crate::post::ReadingTimeBucket;
use crate::recommend::RecommendationKind;
use crate::report::Report;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmPost {
    pub title: String,
    pub views: Option<u64>,
    pub reactions: u64,
    pub comments: u64,
    pub tags: Vec<String>,
    pub reading_time: u32,
    pub engagement_ratio: f64,
}

impl From<&PostSummary> for LlmPost {
    fn from(post: &PostSummary) -> Self {
        Self {
            title: post.title.clone(),
            views: post.page_views_count,
            reactions: post.reactions_count,
            comments: post.comments_count,
            tags: post.tags.iter().cloned().collect(),
            reading_time: post.reading_time_minutes,
            engagement_ratio: post.engagement_ratio,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmTag {
    pub tag: String,
    pub posts: usize,
    pub avg_views: Option<f64>,
    pub avg_reactions: f64,
    pub avg_comments: f64,
    pub engagement_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmTimeSlot {
    pub slot: String,
    pub posts: usize,
    pub avg_reactions: f64,
    pub avg_comments: f64,
}

impl From<&TimeSlotStat> for LlmTimeSlot {
    fn from(slot: &TimeSlotStat) -> Self {
        Self {
            slot: slot.label.clone(),
            posts: slot.metrics.post_count,
            avg_reactions: slot.metrics.average_reactions,
            avg_comments: slot.metrics.average_comments,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmSeries {
    pub title: String,
    pub parts: usize,
    pub completion_ratio: f64,
    pub completion_is_estimate: bool,
    pub avg_reactions: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmRecommendation {
    #[serde(rename = "type")]
    pub kind: String,
    pub tags: Vec<String>,
    pub description: String,
}

/// The subset of a report that is serialized into LLM prompts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmAnalysisData {
    pub username: String,
    pub total_articles: usize,
    pub top_performing_posts: Vec<LlmPost>,
    pub highest_engagement_posts: Vec<LlmPost>,
    pub top_tags: Vec<LlmTag>,
    pub best_days: Vec<LlmTimeSlot>,
    pub best_hours: Vec<LlmTimeSlot>,
    pub best_combinations: Vec<LlmTimeSlot>,
    pub best_reading_time: Option<ReadingTimeBucket>,
    pub series_performance: Vec<LlmSeries>,
    pub tag_recommendations: Vec<LlmRecommendation>,
}

const PROMPT_HOURS: usize = 5;

impl LlmAnalysisData {
    pub fn from_report(username: &str, report: &Report, config: &AnalysisConfig) -> Self {
        Self {
            username: username.to_string(),
            total_articles: report.overall_stats.total_articles,
            top_performing_posts: report.top_posts.by_views.iter().map(LlmPost::from).collect(),
            highest_engagement_posts: report
                .top_posts
                .by_engagement
                .iter()
                .map(LlmPost::from)
                .collect(),
            top_tags: report
                .tag_performance
                .iter()
                .take(config.llm_top_tags)
                .map(|stat| LlmTag {
                    tag: stat.tag.clone(),
                    posts: stat.metrics.post_count,
                    avg_views: stat.metrics.average_views,
                    avg_reactions: stat.metrics.average_reactions,
                    avg_comments: stat.metrics.average_comments,
                    engagement_score: stat.metrics.engagement_score,
                })
                .collect(),
            best_days: preferred_slots(&report.best_times.by_day, usize::MAX),
            best_hours: preferred_slots(&report.best_times.by_hour, PROMPT_HOURS),
            best_combinations: report
                .best_times
                .combinations
                .iter()
                .map(LlmTimeSlot::from)
                .collect(),
            best_reading_time: report
                .reading_time_performance
                .first()
                .map(|stat| stat.bucket),
            series_performance: report
                .series
                .iter()
                .map(|series| LlmSeries {
                    title: series.base_title.clone(),
                    parts: series.parts_found,
                    completion_ratio: series.completion_ratio,
                    completion_is_estimate: series.completion_is_estimate,
                    avg_reactions: series.average_reactions,
                })
                .collect(),
            tag_recommendations: report
                .recommendations
                .iter()
                .map(|recommendation| LlmRecommendation {
                    kind: recommendation.kind().label().to_string(),
                    tags: recommendation
                        .detail
                        .tags()
                        .into_iter()
                        .map(str::to_string)
                        .collect(),
                    description: recommendation.description.clone(),
                })
                .collect(),
        }
    }

    fn recommended_tags(&self, kind: RecommendationKind) -> Vec<String> {
        self.tag_recommendations
            .iter()
            .filter(|recommendation| recommendation.kind == kind.label())
            .flat_map(|recommendation| recommendation.tags.iter().cloned())
            .collect()
    }
}

/// Significant slots when there are any, otherwise every slot, in report order.
fn preferred_slots(slots: &[TimeSlotStat], limit: usize) -> Vec<LlmTimeSlot> {
    let significant: Vec<&TimeSlotStat> = slots.iter().filter(|slot| slot.significant).collect();
    let chosen: Vec<&TimeSlotStat> = if significant.is_empty() {
        slots.iter().collect()
    } else {
        significant
    };
    chosen.into_iter().take(limit).map(LlmTimeSlot::from).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostingStrategy {
    pub best_days: Vec<String>,
    pub best_hours: Vec<String>,
    pub recommended_tags: Vec<String>,
    pub content_type: String,
    pub style_tips: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Insights {
    pub performance_summary: String,
    pub key_patterns: Vec<String>,
    pub content_recommendations: Vec<String>,
    pub optimal_posting_strategy: PostingStrategy,
    pub series_strategy: String,
    pub engagement_boosters: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicIdea {
    pub title: String,
    pub description: String,
    pub suggested_tags: Vec<String>,
    pub estimated_reading_time: u32,
    pub performance_rationale: String,
    pub series_potential: String,
}

pub fn insight_prompt(data: &LlmAnalysisData) -> String {
    let mut prompt = String::from(
        r#"You are a content strategist reviewing engagement data for a developer's blog posts.
Using the analysis data below, write:
1. A short summary of how the content performs overall.
2. The patterns that separate strong posts from weak ones.
3. Concrete, actionable ways to raise engagement.
4. A posting strategy covering timing, topics and style.
When the data includes series, compare series posts with standalone posts.
When it includes tag recommendations, assess them and add your own.
When it includes best publishing times, use them in the strategy.

Reply with JSON only, shaped exactly like this:
{
  "performance_summary": "one paragraph",
  "key_patterns": ["pattern", "..."],
  "content_recommendations": ["recommendation", "..."],
  "optimal_posting_strategy": {
    "best_days": ["Tuesday"],
    "best_hours": ["09:00"],
    "recommended_tags": ["tag"],
    "content_type": "what kind of post performs best",
    "style_tips": "length, structure and tone advice"
  },
  "series_strategy": "advice on series",
  "engagement_boosters": "tactics to get more reactions and comments"
}

Analysis data:
"#,
    );
    prompt.push_str(&pretty_json(data));
    prompt
}

pub fn topic_ideas_prompt(data: &LlmAnalysisData, count: usize) -> String {
    let top_tags: Vec<&str> = data.top_tags.iter().take(5).map(|tag| tag.tag.as_str()).collect();
    let mut prompt = format!(
        r#"You help developers plan blog posts that their audience will engage with.
Suggest {count} specific post ideas for this author based on their history.
Their strongest tags are: {tags}.
Take into account their highest-engagement posts, the tag recommendations,
how their series perform, and when their posts do best.

For each idea give a title, a two or three sentence description, suggested tags drawn from
their strongest and recommended tags, an estimated reading time in minutes, why it should
perform well given the data, and whether it stands alone or fits a series.

Reply with a JSON array only, each element shaped like this:
{{
  "title": "post title",
  "description": "what the post covers",
  "suggested_tags": ["tag"],
  "estimated_reading_time": 7,
  "performance_rationale": "why it should work for this audience",
  "series_potential": "Standalone post"
}}

Analysis data:
"#,
        count = count,
        tags = if top_tags.is_empty() {
            "none yet".to_string()
        } else {
            top_tags.join(", ")
        },
    );
    prompt.push_str(&pretty_json(data));
    prompt
}

fn pretty_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

pub fn parse_insights(completion: &str) -> Result<Insights, InsightsError> {
    let json = extract_json(completion, '{', '}').ok_or(InsightsError::MissingJson("object"))?;
    Ok(serde_json::from_str(json)?)
}

/// Accepts a bare array or an object wrapping it under `ideas`.
pub fn parse_topic_ideas(completion: &str) -> Result<Vec<TopicIdea>, InsightsError> {
    #[derive(Deserialize)]
    struct Wrapped {
        ideas: Vec<TopicIdea>,
    }

    let prefer_array = match (completion.find('['), completion.find('{')) {
        (Some(array), Some(object)) => array < object,
        (Some(_), None) => true,
        _ => false,
    };
    if prefer_array {
        if let Some(array) = extract_json(completion, '[', ']') {
            return Ok(serde_json::from_str(array)?);
        }
    }
    let object = extract_json(completion, '{', '}').ok_or(InsightsError::MissingJson("array"))?;
    Ok(serde_json::from_str::<Wrapped>(object)?.ideas)
}

/// The span from the first `open` to the last `close`, which strips markdown fences and prose.
pub fn extract_json(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    if start >= end {
        return None;
    }
    Some(&text[start..=end])
}

/// Deterministic insights derived from the data alone.
pub fn mock_insights(data: &LlmAnalysisData) -> Insights {
    let top_tags: Vec<String> = {
        let tags: Vec<String> = data.top_tags.iter().take(3).map(|tag| tag.tag.clone()).collect();
        if tags.is_empty() {
            vec!["webdev".to_string(), "programming".to_string()]
        } else {
            tags
        }
    };
    let best_days: Vec<String> = data.best_days.iter().take(2).map(|slot| slot.slot.clone()).collect();
    let best_hours: Vec<String> = data.best_hours.iter().take(2).map(|slot| slot.slot.clone()).collect();

    let mut recommended_tags = data.recommended_tags(RecommendationKind::TopPerforming);
    if recommended_tags.is_empty() {
        recommended_tags = top_tags.clone();
    }

    let tag_list = top_tags.iter().map(|tag| display_tag(tag)).collect::<Vec<_>>().join(", ");
    let reading_time = data
        .best_reading_time
        .map(|bucket| bucket.label())
        .unwrap_or("5-10 min");

    let mut key_patterns = vec![format!("Posts tagged {} draw the most engagement.", tag_list)];
    if !best_days.is_empty() {
        key_patterns.push(format!(
            "Posts published on {} collect more reactions than other days.",
            best_days.join(" and ")
        ));
    }
    key_patterns.push(format!("Posts with a reading time of {} perform best.", reading_time));
    if let Some(post) = data.highest_engagement_posts.first() {
        key_patterns.push(format!(
            "\"{}\" leads on engagement per reading minute ({:.1}).",
            post.title, post.engagement_ratio
        ));
    }

    let mut content_recommendations = vec![
        format!("Write more posts around {}.", tag_list),
        format!("Aim for a {} read.", reading_time),
        "Close each post with a question to invite comments.".to_string(),
    ];
    for recommendation in data.tag_recommendations.iter().take(3) {
        content_recommendations.push(recommendation.description.clone());
    }

    let series_strategy = if data.series_performance.is_empty() {
        "You have not published a multi-part series yet. Splitting a larger topic into a short series can bring readers back for each part.".to_string()
    } else {
        let best = &data.series_performance[0];
        format!(
            "Your series \"{}\" averages {:.1} reactions per part. Keep series to a few focused parts and finish the ones you start.",
            best.title, best.avg_reactions
        )
    };

    Insights {
        performance_summary: format!(
            "Across {} posts, your content on {} performs best.",
            data.total_articles, tag_list
        ),
        key_patterns,
        content_recommendations,
        optimal_posting_strategy: PostingStrategy {
            best_days,
            best_hours,
            recommended_tags,
            content_type: "Practical, example-driven posts on your strongest tags".to_string(),
            style_tips: format!(
                "Keep posts to a {} read, use headings and code samples, and end with a question.",
                reading_time
            ),
        },
        series_strategy,
        engagement_boosters: "Reply to comments quickly, share posts where your readers already gather, and ask a concrete question at the end of each post.".to_string(),
    }
}

const IDEA_PATTERNS: [(&str, &[&str]); 3] = [
    (
        "tutorial",
        &[
            "Building {tag} Applications: A Step-by-Step Guide",
            "How to Get Productive with {tag}",
            "Practical {tag} Tips for Real Projects",
        ],
    ),
    (
        "best-practices",
        &[
            "{tag} Best Practices for Working Developers",
            "Writing Better {tag} Code",
            "{tag} Patterns Worth Knowing",
        ],
    ),
    (
        "deep-dive",
        &[
            "Deep Dive: How {tag} Works Under the Hood",
            "Understanding {tag} Internals",
            "Advanced {tag} Architecture",
        ],
    ),
];

/// Deterministic topic ideas; the same data always yields the same ideas.
pub fn mock_topic_ideas(data: &LlmAnalysisData, count: usize) -> Vec<TopicIdea> {
    let mut rng = StdRng::seed_from_u64(stable_hash64(&pretty_json(data)));

    let mut tag_sets: Vec<Vec<String>> = data
        .tag_recommendations
        .iter()
        .filter(|recommendation| recommendation.kind == RecommendationKind::Combination.label())
        .map(|recommendation| recommendation.tags.clone())
        .filter(|tags| !tags.is_empty())
        .collect();
    tag_sets.extend(data.top_tags.iter().map(|tag| vec![tag.tag.clone()]));
    if tag_sets.is_empty() {
        tag_sets.push(vec!["programming".to_string()]);
    }

    let reading_time = match data.best_reading_time {
        Some(ReadingTimeBucket::UnderFive) => 4,
        Some(ReadingTimeBucket::OverTen) => 12,
        _ => 7,
    };

    let mut seen = BTreeSet::new();
    let mut ideas = Vec::with_capacity(count);
    for index in 0..count {
        let tags = &tag_sets[index % tag_sets.len()];
        let (pattern, templates) = IDEA_PATTERNS[index % IDEA_PATTERNS.len()];
        let primary = display_tag(&tags[0]);
        let subject = match tags.get(1) {
            Some(second) => format!("{} with {}", primary, display_tag(second)),
            None => primary,
        };
        let template = templates.choose(&mut rng).copied().unwrap_or(templates[0]);
        let mut title = template.replace("{tag}", &subject);
        if !seen.insert(title.clone()) {
            title = format!("{} (Part {})", title, index + 1);
        }

        let series_potential = if pattern == "deep-dive" {
            format!("Would work well as a 3-part series on {}", subject)
        } else {
            "Standalone post".to_string()
        };

        ideas.push(TopicIdea {
            title,
            description: format!(
                "A {} post on {} aimed at readers who already engage with your {} content.",
                pattern.replace('-', " "),
                subject,
                display_tag(&tags[0])
            ),
            suggested_tags: tags.clone(),
            estimated_reading_time: reading_time,
            performance_rationale: format!(
                "{} is among your best-performing topics, and {}-minute reads match your strongest posts.",
                subject, reading_time
            ),
            series_potential,
        });
    }
    ideas
}

/// Conventional casing for a lowercase tag, e.g. `javascript` becomes `JavaScript`.
pub fn display_tag(tag: &str) -> String {
    const SPECIAL: [(&str, &str); 30] = [
        ("javascript", "JavaScript"),
        ("typescript", "TypeScript"),
        ("nodejs", "Node.js"),
        ("nextjs", "Next.js"),
        ("reactjs", "React.js"),
        ("vuejs", "Vue.js"),
        ("aws", "AWS"),
        ("dotnet", ".NET"),
        ("csharp", "C#"),
        ("cpp", "C++"),
        ("devops", "DevOps"),
        ("ai", "AI"),
        ("ml", "ML"),
        ("api", "API"),
        ("graphql", "GraphQL"),
        ("postgresql", "PostgreSQL"),
        ("mysql", "MySQL"),
        ("mongodb", "MongoDB"),
        ("php", "PHP"),
        ("css", "CSS"),
        ("html", "HTML"),
        ("ios", "iOS"),
        ("macos", "macOS"),
        ("cicd", "CI/CD"),
        ("iot", "IoT"),
        ("ui", "UI"),
        ("ux", "UX"),
        ("jwt", "JWT"),
        ("webdev", "WebDev"),
        ("seo", "SEO"),
    ];

    let lower = tag.trim().to_lowercase();
    if let Some((_, display)) = SPECIAL.iter().find(|(key, _)| *key == lower) {
        return display.to_string();
    }
    lower
        .split('-')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join("-")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn stable_hash64(value: &str) -> u64 {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_json_strips_fences() {
        let text = "```json\n{\"a\": 1}\n```";
        assert_eq!(extract_json(text, '{', '}'), Some("{\"a\": 1}"));
        assert_eq!(extract_json("no json here", '{', '}'), None);
    }

    #[test]
    fn display_tag_handles_special_and_hyphenated_tags() {
        assert_eq!(display_tag("javascript"), "JavaScript");
        assert_eq!(display_tag("machine-learning"), "Machine-Learning");
        assert_eq!(display_tag("rust"), "Rust");
    }
}
