use serde_json::Value;
use std::env;
use std::time::Duration;
use tracing::{debug, info, warn};

use blog_insights::config::FetchConfig;

#[derive(Clone)]
pub struct DevToClient {
    client: reqwest::Client,
    api_base: String,
    api_key: Option<String>,
    max_pages: u32,
    per_page: u32,
    fetch_details: bool,
}

impl DevToClient {
    /// `api_key` wins over `DEVTO_API_KEY`; both are optional for public articles.
    pub fn from_config(config: &FetchConfig, api_key: Option<String>) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(concat!("blog-insights/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| format!("failed to build dev.to client: {}", err))?;
        let api_key = api_key
            .or_else(|| env::var("DEVTO_API_KEY").ok())
            .filter(|key| !key.trim().is_empty());
        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
            max_pages: config.max_pages.max(1),
            per_page: config.per_page.clamp(1, 1000),
            fetch_details: config.fetch_details,
        })
    }

    /// Raw article records for `username`, detail fields merged over the list fields.
    /// A failed first page is an error. A later failure ends pagination with what was
    /// collected so far.
    pub async fn fetch_articles(&self, username: &str) -> Result<Vec<Value>, String> {
        let username = username.trim();
        if username.is_empty() {
            return Err("username is required".to_string());
        }

        let mut articles = Vec::new();
        for page in 1..=self.max_pages {
            let batch = match self.fetch_page(username, page).await {
                Ok(batch) => batch,
                Err(err) if page == 1 => return Err(err),
                Err(err) => {
                    warn!(page, error = %err, "stopping pagination");
                    break;
                }
            };
            debug!(page, count = batch.len(), "fetched article page");
            if batch.is_empty() {
                break;
            }
            let full_page = batch.len() as u32 >= self.per_page;
            articles.extend(batch);
            if !full_page {
                break;
            }
        }

        if self.fetch_details {
            let mut detailed = Vec::with_capacity(articles.len());
            for article in articles {
                detailed.push(self.with_details(article).await);
            }
            articles = detailed;
        }

        info!(username, count = articles.len(), "fetched articles");
        Ok(articles)
    }

    async fn fetch_page(&self, username: &str, page: u32) -> Result<Vec<Value>, String> {
        let response = self
            .request(&format!("{}/articles", self.api_base))
            .query(&[
                ("username", username.to_string()),
                ("page", page.to_string()),
                ("per_page", self.per_page.to_string()),
            ])
            .send()
            .await
            .map_err(|err| format!("dev.to request failed: {}", err))?;

        let body = read_json(response).await?;
        match body {
            Value::Array(items) => Ok(items),
            other => Err(format!("dev.to returned {} instead of an article list", kind_of(&other))),
        }
    }

    async fn with_details(&self, article: Value) -> Value {
        let Some(id) = article.get("id").and_then(id_string) else {
            return article;
        };
        match self.fetch_article(&id).await {
            Ok(detail) => merge_detail(article, detail),
            Err(err) => {
                warn!(article_id = %id, error = %err, "keeping list record without details");
                article
            }
        }
    }

    async fn fetch_article(&self, id: &str) -> Result<Value, String> {
        let response = self
            .request(&format!("{}/articles/{}", self.api_base, id))
            .send()
            .await
            .map_err(|err| format!("dev.to request failed: {}", err))?;
        read_json(response).await
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let builder = self.client.get(url);
        match &self.api_key {
            Some(key) => builder.header("api-key", key),
            None => builder,
        }
    }
}

async fn read_json(response: reqwest::Response) -> Result<Value, String> {
    let status = response.status();
    if !status.is_success() {
        let error_body = response.text().await.unwrap_or_default();
        let detail = error_body.trim();
        if detail.is_empty() {
            return Err(format!("dev.to API error: {}", status));
        }
        return Err(format!("dev.to API error: {} {}", status, detail));
    }
    response
        .json()
        .await
        .map_err(|err| format!("dev.to response parse failed: {}", err))
}

/// Detail fields overwrite list fields, except nulls, which never erase a list value.
fn merge_detail(list: Value, detail: Value) -> Value {
    match (list, detail) {
        (Value::Object(mut base), Value::Object(extra)) => {
            for (key, value) in extra {
                if !value.is_null() {
                    base.insert(key, value);
                }
            }
            Value::Object(base)
        }
        (list, _) => list,
    }
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::Number(number) => Some(number.to_string()),
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        _ => None,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detail_overrides_list_but_not_with_null() {
        let list = json!({"id": 1, "title": "Old", "page_views_count": 12});
        let detail = json!({"title": "New", "page_views_count": null, "body_markdown": "x"});
        let merged = merge_detail(list, detail);
        assert_eq!(merged["title"], "New");
        assert_eq!(merged["page_views_count"], 12);
        assert_eq!(merged["body_markdown"], "x");
    }

    #[test]
    fn ids_accept_numbers_and_strings() {
        assert_eq!(id_string(&json!(42)), Some("42".to_string()));
        assert_eq!(id_string(&json!(" 7 ")), Some("7".to_string()));
        assert_eq!(id_string(&json!(null)), None);
    }

    #[tokio::test]
    async fn unreachable_first_page_is_an_error() {
        let config = FetchConfig {
            api_base: "http://127.0.0.1:1/api".to_string(),
            timeout_ms: 2_000,
            ..FetchConfig::default()
        };
        let client = DevToClient::from_config(&config, Some("key".to_string())).unwrap();

        let err = client.fetch_articles("someone").await.unwrap_err();
        assert!(err.contains("dev.to request failed"));
    }
}
