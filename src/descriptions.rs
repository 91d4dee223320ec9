//! Attraction descriptions
//!
//! Lookup order: the record's own description, the persistent cache, the
//! text generator, and finally a fixed sentence built from the name and
//! first theme.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::PersistentCache;
use crate::generator::{GenerationRequest, TextGenerator};
use crate::models::Attraction;

/// Temperature used for description prompts unless configured otherwise
pub const DEFAULT_DESCRIPTION_TEMPERATURE: f32 = 0.3;

const CACHE_KEY_PREFIX: &str = "description:";

pub struct DescriptionService {
    generator: Arc<dyn TextGenerator>,
    cache: Option<PersistentCache>,
    ttl: Duration,
    temperature: f32,
}

impl DescriptionService {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            cache: None,
            ttl: Duration::from_secs(30 * 24 * 3600),
            temperature: DEFAULT_DESCRIPTION_TEMPERATURE,
        }
    }

    #[must_use]
    pub fn with_cache(mut self, cache: PersistentCache, ttl: Duration) -> Self {
        self.cache = Some(cache);
        self.ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// A description for the attraction; never fails
    pub async fn describe(&self, attraction: &Attraction) -> String {
        if let Some(description) = attraction
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
        {
            return description.to_string();
        }

        let key = format!("{CACHE_KEY_PREFIX}{}", attraction.name);
        if let Some(cache) = &self.cache {
            match cache.get::<String>(&key).await {
                Ok(Some(cached)) => {
                    debug!("Description for {} served from cache", attraction.name);
                    return cached;
                }
                Ok(None) => {}
                Err(e) => warn!("Description cache lookup failed: {:#}", e),
            }
        }

        let request = GenerationRequest::new(description_prompt(attraction), self.temperature);
        match self.generator.generate(&request).await {
            Ok(text) if !text.trim().is_empty() => {
                let description = polish(&text);
                if let Some(cache) = &self.cache
                    && let Err(e) = cache.put(&key, description.clone(), self.ttl).await
                {
                    warn!("Failed to cache description for {}: {:#}", attraction.name, e);
                }
                description
            }
            Ok(_) => {
                warn!("Generator returned an empty description for {}", attraction.name);
                fallback_description(attraction)
            }
            Err(e) => {
                warn!("Description generation failed for {}: {}", attraction.name, e);
                fallback_description(attraction)
            }
        }
    }
}

#[must_use]
pub fn description_prompt(attraction: &Attraction) -> String {
    let themes = attraction.theme_labels().join("、");
    format!(
        "作为徐州旅游专家，请用60字生动描述{}（特色：{}）：\n- 开头用1个四字成语概括\n- 突出2-3个最独特亮点\n- 结尾用\"推荐...人群体验\"句式",
        attraction.name, themes
    )
}

/// Collapse whitespace and make sure the text ends a sentence
#[must_use]
pub fn polish(text: &str) -> String {
    let mut polished = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if !polished.ends_with(['。', '!', '?']) {
        polished.push('。');
    }
    polished
}

#[must_use]
pub fn fallback_description(attraction: &Attraction) -> String {
    let theme = attraction
        .themes
        .first()
        .map_or("著名", |tag| tag.label.as_str());
    format!("{}是徐州{}景点，值得体验", attraction.name, theme)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Rating, Tag};
    use crate::{Result, TourPlanError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct CountingGenerator {
        reply: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl CountingGenerator {
        fn new(reply: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for CountingGenerator {
        async fn generate(&self, request: &GenerationRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!((request.temperature - 0.3).abs() < 1e-6);
            self.reply
                .map(str::to_string)
                .ok_or_else(|| TourPlanError::generation("offline"))
        }
    }

    fn attraction(description: Option<&str>, themes: &[&str]) -> Attraction {
        Attraction {
            name: "龟山汉墓".to_string(),
            rating: Rating::Rated(4.7),
            comment_count: 3000,
            address: "江苏省徐州市鼓楼区".to_string(),
            opening_hours: "全天开放".to_string(),
            description: description.map(str::to_string),
            themes: themes
                .iter()
                .map(|t| Tag {
                    label: t.to_string(),
                    weight: 1.0,
                })
                .collect(),
            audiences: Vec::new(),
            degree: themes.len(),
            area: "鼓楼区".to_string(),
        }
    }

    #[tokio::test]
    async fn test_record_description_wins() {
        let generator = CountingGenerator::new(Some("生成的描述"));
        let service = DescriptionService::new(generator.clone());
        let text = service.describe(&attraction(Some("西汉楚王墓"), &["两汉文化"])).await;
        assert_eq!(text, "西汉楚王墓");
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_generated_description_is_polished() {
        let generator = CountingGenerator::new(Some("  西汉楚王\n 夫妻合葬墓  "));
        let service = DescriptionService::new(generator);
        let text = service.describe(&attraction(None, &["两汉文化"])).await;
        assert_eq!(text, "西汉楚王 夫妻合葬墓。");
    }

    #[tokio::test]
    async fn test_failure_falls_back() {
        let service = DescriptionService::new(CountingGenerator::new(None));
        assert_eq!(
            service.describe(&attraction(None, &["两汉文化"])).await,
            "龟山汉墓是徐州两汉文化景点，值得体验"
        );
        assert_eq!(
            service.describe(&attraction(None, &[])).await,
            "龟山汉墓是徐州著名景点，值得体验"
        );
    }

    #[tokio::test]
    async fn test_cache_prevents_second_generation() {
        let dir = TempDir::new().unwrap();
        let cache = PersistentCache::open(dir.path()).unwrap();
        let generator = CountingGenerator::new(Some("汉代崖洞墓的代表"));
        let service =
            DescriptionService::new(generator.clone()).with_cache(cache, Duration::from_secs(600));

        let a = attraction(None, &["两汉文化"]);
        let first = service.describe(&a).await;
        let second = service.describe(&a).await;
        assert_eq!(first, "汉代崖洞墓的代表。");
        assert_eq!(first, second);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_polish_keeps_terminal_punctuation() {
        assert_eq!(polish("好地方!"), "好地方!");
        assert_eq!(polish("好地方？"), "好地方？。");
        assert_eq!(polish("好地方。"), "好地方。");
    }

    #[test]
    fn test_prompt_mentions_name_and_themes() {
        let prompt = description_prompt(&attraction(None, &["两汉文化", "历史遗迹"]));
        assert!(prompt.contains("龟山汉墓"));
        assert!(prompt.contains("两汉文化、历史遗迹"));
    }
}
