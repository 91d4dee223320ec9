//! Itinerary model

use std::fmt::{self, Display};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Attraction details carried into an itinerary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttractionDetail {
    pub name: String,
    pub address: String,
    pub opening_hours: String,
    pub themes: Vec<String>,
    pub description: String,
    pub score: f64,
    pub area: String,
    pub comment_count: u64,
}

/// One day of a multi-day itinerary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItineraryDay {
    pub date: NaiveDate,
    pub attractions: Vec<AttractionDetail>,
    pub narrative: String,
    /// False when the narrative is the fallback text
    pub generated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Narrative {
    /// One narrative per requested date
    Daily { days: Vec<ItineraryDay> },
    /// A single combined narrative when no dates were given
    Single { text: String, generated: bool },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dish {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub name: String,
    pub address: String,
    pub specialty: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodRecommendation {
    pub foods: Vec<Dish>,
    pub restaurants: Vec<Restaurant>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Extras {
    pub food: FoodRecommendation,
    pub weather_tip: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Itinerary {
    pub summary: String,
    /// Attractions in visiting order
    pub attractions: Vec<AttractionDetail>,
    pub narrative: Narrative,
    pub total_hours: f64,
    pub extras: Extras,
}

impl Display for Itinerary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.summary)?;
        writeln!(f)?;

        for (i, attraction) in self.attractions.iter().enumerate() {
            writeln!(
                f,
                "{}. {} ({:.1}/5, {} comments)",
                i + 1,
                attraction.name,
                attraction.score,
                attraction.comment_count
            )?;
            writeln!(f, "   📍 {} [{}]", attraction.address, attraction.area)?;
            if !attraction.opening_hours.is_empty() {
                writeln!(f, "   ⏰ {}", attraction.opening_hours)?;
            }
            writeln!(f, "   {}", attraction.description)?;
        }
        writeln!(f)?;

        match &self.narrative {
            Narrative::Daily { days } => {
                for day in days {
                    writeln!(f, "📅 {}", day.date.format("%Y-%m-%d"))?;
                    writeln!(f, "{}", day.narrative)?;
                    writeln!(f)?;
                }
            }
            Narrative::Single { text, .. } => {
                writeln!(f, "{text}")?;
                writeln!(f)?;
            }
        }

        if let Some(tip) = &self.extras.weather_tip {
            writeln!(f, "🌤️ {tip}")?;
        }
        writeln!(f, "🍜 Local food:")?;
        for dish in &self.extras.food.foods {
            writeln!(f, "   - {}: {}", dish.name, dish.description)?;
        }
        for restaurant in &self.extras.food.restaurants {
            writeln!(
                f,
                "   - {} ({}) {}",
                restaurant.name, restaurant.address, restaurant.specialty
            )?;
        }
        Ok(())
    }
}
