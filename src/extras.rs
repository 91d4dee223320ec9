//! Static travel extras attached to every itinerary

use chrono::{Datelike, NaiveDate};

use crate::models::{Dish, FoodRecommendation, Restaurant};

const DISHES: [(&str, &str); 4] = [
    ("徐州地锅鸡", "徐州传统名菜，鸡肉鲜嫩，锅贴饼吸满汤汁"),
    ("沛县狗肉", "历史悠久的传统美食，肉质鲜美"),
    ("徐州羊肉汤", "冬季暖身佳品，汤白味鲜"),
    ("烙馍卷馓子", "徐州特色小吃，香脆可口"),
];

const RESTAURANTS: [(&str, &str, &str); 3] = [
    ("徐州印象", "云龙区和平路58号", "地锅鸡、羊肉汤"),
    ("老地方菜馆", "泉山区解放南路12号", "沛县狗肉、家常菜"),
    ("彭城风味", "鼓楼区中山北路32号", "徐州传统小吃"),
];

/// Local dishes and restaurants
#[must_use]
pub fn food_recommendation() -> FoodRecommendation {
    FoodRecommendation {
        foods: DISHES
            .iter()
            .map(|(name, description)| Dish {
                name: (*name).to_string(),
                description: (*description).to_string(),
            })
            .collect(),
        restaurants: RESTAURANTS
            .iter()
            .map(|(name, address, specialty)| Restaurant {
                name: (*name).to_string(),
                address: (*address).to_string(),
                specialty: (*specialty).to_string(),
            })
            .collect(),
    }
}

/// Seasonal clothing advice for a travel date
#[must_use]
pub fn weather_tip(date: NaiveDate) -> &'static str {
    match date.month() {
        12 | 1 | 2 => "冬季出行建议：徐州冬季较冷，建议穿着羽绒服等保暖衣物",
        3..=5 => "春季出行建议：徐州春季气候宜人，建议携带薄外套",
        6..=8 => "夏季出行建议：徐州夏季炎热，建议做好防晒措施",
        _ => "秋季出行建议：徐州秋季凉爽，适合户外活动",
    }
}
