//! Itinerary composition
//!
//! Turns a list of chosen candidates into an ordered visiting plan with
//! generated narratives. Narrative generation failures degrade to fixed
//! fallback text; composing an itinerary never fails.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, instrument, warn};

use crate::descriptions::DescriptionService;
use crate::extras;
use crate::generator::{GenerationRequest, TextGenerator};
use crate::models::{AttractionDetail, Extras, Itinerary, ItineraryDay, Narrative, ScoredCandidate};
use crate::region::AreaMap;
use crate::route;

/// Temperature used for narrative prompts unless configured otherwise
pub const DEFAULT_NARRATIVE_TEMPERATURE: f32 = 0.7;

/// Hours budgeted for visiting a single attraction
pub const HOURS_PER_ATTRACTION: f64 = 2.0;

const NO_DATE: &str = "未指定日期";

pub struct ItineraryComposer {
    generator: Arc<dyn TextGenerator>,
    areas: Arc<AreaMap>,
    descriptions: DescriptionService,
    temperature: f32,
}

impl ItineraryComposer {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        areas: Arc<AreaMap>,
        descriptions: DescriptionService,
    ) -> Self {
        Self {
            generator,
            areas,
            descriptions,
            temperature: DEFAULT_NARRATIVE_TEMPERATURE,
        }
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Build the itinerary for `candidates`, split over `dates` when given
    #[instrument(skip_all, fields(attractions = candidates.len(), days = dates.map_or(0, <[NaiveDate]>::len)))]
    pub async fn compose(
        &self,
        candidates: &[ScoredCandidate],
        dates: Option<&[NaiveDate]>,
    ) -> Itinerary {
        let mut details = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            details.push(self.detail(candidate).await);
        }
        let stops = route::order_by_area(details, |detail| detail.area.as_str(), &self.areas);
        let total_hours = estimate_total_hours(&stops, &self.areas);
        let food = extras::food_recommendation();

        let dates = dates.filter(|dates| !dates.is_empty());
        let itinerary = match dates {
            Some(dates) => {
                let mut days = Vec::with_capacity(dates.len());
                for (date, attractions) in dates.iter().zip(assign_days(&stops, dates.len())) {
                    let (narrative, generated) = match self.narrate(&attractions, Some(*date)).await {
                        Some(text) => (text, true),
                        None => (
                            format!(
                                "无法生成{}的智能规划，请参考景点信息自行安排",
                                date.format("%Y年%m月%d日")
                            ),
                            false,
                        ),
                    };
                    days.push(ItineraryDay {
                        date: *date,
                        attractions,
                        narrative,
                        generated,
                    });
                }
                Itinerary {
                    summary: format!("{}个精选景点 · 预计总游览时间{:.1}小时", stops.len(), total_hours),
                    attractions: stops,
                    narrative: Narrative::Daily { days },
                    total_hours,
                    extras: Extras {
                        food,
                        weather_tip: Some(extras::weather_tip(dates[0]).to_string()),
                    },
                }
            }
            None => {
                let (text, generated) = match self.narrate(&stops, None).await {
                    Some(text) => (text, true),
                    None => ("无法生成智能规划，请参考景点信息自行安排".to_string(), false),
                };
                Itinerary {
                    summary: format!("{}个精选景点 · 预计游览时间{:.1}小时", stops.len(), total_hours),
                    attractions: stops,
                    narrative: Narrative::Single { text, generated },
                    total_hours,
                    extras: Extras {
                        food,
                        weather_tip: None,
                    },
                }
            }
        };

        info!("Composed itinerary: {}", itinerary.summary);
        itinerary
    }

    async fn detail(&self, candidate: &ScoredCandidate) -> AttractionDetail {
        let attraction = &candidate.attraction;
        AttractionDetail {
            name: attraction.name.clone(),
            address: attraction.address.clone(),
            opening_hours: attraction.opening_hours.clone(),
            themes: attraction.theme_labels(),
            description: self.descriptions.describe(attraction).await,
            score: candidate.score,
            area: attraction.area.clone(),
            comment_count: attraction.comment_count,
        }
    }

    /// Generated narrative text, or `None` when the generator fails
    async fn narrate(&self, stops: &[AttractionDetail], date: Option<NaiveDate>) -> Option<String> {
        let request = GenerationRequest::new(build_prompt(stops, date, &self.areas), self.temperature);
        match self.generator.generate(&request).await {
            Ok(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Ok(_) => {
                warn!("Generator returned an empty narrative for {:?}", date);
                None
            }
            Err(e) => {
                warn!("Narrative generation failed for {:?}: {}", date, e);
                None
            }
        }
    }
}

/// Round-robin split: stop `i` goes to day `i % days`
#[must_use]
pub fn assign_days<T: Clone>(stops: &[T], days: usize) -> Vec<Vec<T>> {
    let mut buckets = vec![Vec::new(); days];
    if days == 0 {
        return buckets;
    }
    for (i, stop) in stops.iter().enumerate() {
        buckets[i % days].push(stop.clone());
    }
    buckets
}

/// Visiting hours plus transfer time between consecutive stops, one decimal
#[must_use]
pub fn estimate_total_hours(stops: &[AttractionDetail], areas: &AreaMap) -> f64 {
    let transfer_minutes: u32 = stops
        .windows(2)
        .map(|pair| areas.transfer_cost(&pair[0].area, &pair[1].area))
        .sum();
    let hours = HOURS_PER_ATTRACTION * stops.len() as f64 + f64::from(transfer_minutes) / 60.0;
    (hours * 10.0).round() / 10.0
}

/// Narrative prompt for one day, or for the whole trip when `date` is `None`
#[must_use]
pub fn build_prompt(stops: &[AttractionDetail], date: Option<NaiveDate>, areas: &AreaMap) -> String {
    let date = date.map_or_else(|| NO_DATE.to_string(), |d| d.format("%Y-%m-%d").to_string());
    let names = stops
        .iter()
        .map(|stop| stop.name.as_str())
        .collect::<Vec<_>>()
        .join("、");

    let travel_times = stops
        .windows(2)
        .map(|pair| {
            format!(
                "{}到{}大约需要{}分钟",
                pair[0].name,
                pair[1].name,
                areas.travel_time(&pair[0].area, &pair[1].area)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let details = stops
        .iter()
        .enumerate()
        .map(|(i, stop)| {
            format!(
                "{}. {} (评分:{:.1}/5, 评论数:{})\n   地址: {}\n   开放时间: {}\n   特色: {}\n   简介: {}\n   所在区域: {}",
                i + 1,
                stop.name,
                stop.score,
                stop.comment_count,
                stop.address,
                stop.opening_hours,
                stop.themes.join("、"),
                stop.description,
                stop.area
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "你是一个专业的徐州旅游规划师。请根据以下景点信息生成一份详细的中文旅游计划：

旅行日期: {date}
景点列表: {names}

计划要求:
1. 按合理路线顺序排列景点，考虑区域间的通勤时间
2. 包含每个景点的特色介绍(50字左右)
3. 提供景点间的交通建议和预计时间
4. 给出合理的休息建议
5. 如果提供了具体日期，确保考虑开放时间
6. 不要包含餐饮建议，餐饮会单独推荐
7. 所有内容请使用中文

通勤时间参考:
{travel_times}

景点详细信息:
{details}

请按照以下格式生成计划:
【上午安排】
景点1名称 (预计游览时间)
- 特色介绍
- 交通建议

【下午安排】
景点2名称 (预计游览时间)
- 特色介绍
- 交通建议
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Attraction, CandidateInfo, Rating, ScoreBreakdown, Tag};
    use crate::{Result, TourPlanError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct ScriptedGenerator {
        fail: bool,
        prompts: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedGenerator {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                fail,
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn narrative_prompts(&self) -> Vec<GenerationRequest> {
            self.prompts
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.prompt.starts_with("你是一个专业的徐州旅游规划师"))
                .cloned()
                .collect()
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, request: &GenerationRequest) -> Result<String> {
            self.prompts.lock().unwrap().push(request.clone());
            if self.fail {
                Err(TourPlanError::generation("server down"))
            } else {
                Ok("【上午安排】\n参观".to_string())
            }
        }
    }

    fn candidate(name: &str, area: &str, score: f64) -> ScoredCandidate {
        let attraction = Arc::new(Attraction {
            name: name.to_string(),
            rating: Rating::Rated(4.5),
            comment_count: 1200,
            address: format!("江苏省徐州市{area}"),
            opening_hours: "全天开放".to_string(),
            description: Some(format!("{name}简介")),
            themes: vec![Tag {
                label: "两汉文化".to_string(),
                weight: 1.0,
            }],
            audiences: Vec::new(),
            degree: 1,
            area: area.to_string(),
        });
        ScoredCandidate {
            info: CandidateInfo {
                name: name.to_string(),
                rating: 4.5,
                comment_count: 1200,
                address: attraction.address.clone(),
                opening_hours: attraction.opening_hours.clone(),
                area: area.to_string(),
                breakdown: ScoreBreakdown::default(),
            },
            attraction,
            score,
        }
    }

    fn composer(generator: Arc<ScriptedGenerator>) -> ItineraryComposer {
        let descriptions = DescriptionService::new(generator.clone());
        ItineraryComposer::new(generator, Arc::new(AreaMap::xuzhou()), descriptions)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_round_robin_assignment() {
        let days = assign_days(&[0, 1, 2, 3, 4], 2);
        assert_eq!(days, vec![vec![0, 2, 4], vec![1, 3]]);
        let days = assign_days(&[0], 3);
        assert_eq!(days, vec![vec![0], vec![], vec![]]);
        assert!(assign_days(&[0, 1], 0).is_empty());
    }

    #[test]
    fn test_estimate_total_hours() {
        let areas = AreaMap::xuzhou();
        let detail = |area: &str| AttractionDetail {
            name: "x".to_string(),
            address: String::new(),
            opening_hours: String::new(),
            themes: Vec::new(),
            description: String::new(),
            score: 4.0,
            area: area.to_string(),
            comment_count: 0,
        };
        // 2h * 3 + (15 + 15 + 30) min
        let stops = [detail("云龙区"), detail("云龙区"), detail("鼓楼区")];
        assert_eq!(estimate_total_hours(&stops, &areas), 6.8);
        assert_eq!(estimate_total_hours(&[], &areas), 0.0);
        assert_eq!(estimate_total_hours(&stops[..1], &areas), 2.0);
    }

    #[test]
    fn test_prompt_lists_raw_travel_times() {
        let areas = AreaMap::xuzhou();
        let detail = |name: &str, area: &str| AttractionDetail {
            name: name.to_string(),
            address: "地址".to_string(),
            opening_hours: "全天开放".to_string(),
            themes: vec!["两汉文化".to_string()],
            description: "简介".to_string(),
            score: 4.3,
            area: area.to_string(),
            comment_count: 10,
        };
        let stops = [detail("龟山汉墓", "鼓楼区"), detail("云龙湖", "云龙区")];
        let prompt = build_prompt(&stops, None, &areas);
        assert!(prompt.contains("旅行日期: 未指定日期"));
        assert!(prompt.contains("景点列表: 龟山汉墓、云龙湖"));
        assert!(prompt.contains("龟山汉墓到云龙湖大约需要15分钟"));
        assert!(prompt.contains("1. 龟山汉墓 (评分:4.3/5, 评论数:10)"));
        assert!(prompt.contains("所在区域: 鼓楼区\n2. 云龙湖 (评分:4.3/5, 评论数:10)"));
        assert!(prompt.contains("所在区域: 云龙区\n\n请按照以下格式生成计划:"));

        let dated = build_prompt(&stops, Some(date(2024, 5, 1)), &areas);
        assert!(dated.contains("旅行日期: 2024-05-01"));
    }

    #[tokio::test]
    async fn test_dated_itinerary_has_one_narrative_per_day() {
        let generator = ScriptedGenerator::new(false);
        let composer = composer(generator.clone());
        let candidates = [
            candidate("龟山汉墓", "鼓楼区", 4.6),
            candidate("云龙湖", "云龙区", 4.4),
            candidate("汉画像石艺术馆", "云龙区", 4.2),
        ];
        let dates = [date(2025, 1, 1), date(2025, 1, 2)];

        let itinerary = composer.compose(&candidates, Some(&dates)).await;

        let Narrative::Daily { days } = &itinerary.narrative else {
            panic!("expected daily narratives");
        };
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].attractions.len(), 2);
        assert_eq!(days[1].attractions.len(), 1);
        assert!(days.iter().all(|day| day.generated));
        assert_eq!(itinerary.attractions[0].name, "龟山汉墓");
        assert!(itinerary.summary.starts_with("3个精选景点 · 预计总游览时间"));
        assert!(itinerary.extras.weather_tip.as_deref().unwrap().starts_with("冬季"));
        assert_eq!(itinerary.extras.food.foods.len(), 4);

        let prompts = generator.narrative_prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts.iter().all(|r| (r.temperature - 0.7).abs() < 1e-6));
        assert!(prompts[0].prompt.contains("2025-01-01"));
    }

    #[tokio::test]
    async fn test_failed_generation_uses_fallbacks() {
        let composer = composer(ScriptedGenerator::new(true));
        let candidates = [candidate("龟山汉墓", "鼓楼区", 4.6)];

        let dated = composer
            .compose(&candidates, Some(&[date(2024, 5, 1)]))
            .await;
        let Narrative::Daily { days } = &dated.narrative else {
            panic!("expected daily narratives");
        };
        assert_eq!(
            days[0].narrative,
            "无法生成2024年05月01日的智能规划，请参考景点信息自行安排"
        );
        assert!(!days[0].generated);

        let undated = composer.compose(&candidates, None).await;
        let Narrative::Single { text, generated } = &undated.narrative else {
            panic!("expected a single narrative");
        };
        assert_eq!(text, "无法生成智能规划，请参考景点信息自行安排");
        assert!(!generated);
        assert_eq!(undated.summary, "1个精选景点 · 预计游览时间2.0小时");
        assert!(undated.extras.weather_tip.is_none());
        assert_eq!(undated.attractions[0].description, "龟山汉墓简介");
    }

    #[tokio::test]
    async fn test_empty_date_list_is_undated() {
        let composer = composer(ScriptedGenerator::new(false));
        let candidates = [candidate("云龙湖", "云龙区", 4.4)];
        let itinerary = composer.compose(&candidates, Some(&[])).await;
        assert!(matches!(itinerary.narrative, Narrative::Single { generated: true, .. }));
    }
}
