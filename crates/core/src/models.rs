use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoodLabel {
    Stressed,
    Tired,
    Motivated,
    Neutral,
}

impl MoodLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stressed => "stressed",
            Self::Tired => "tired",
            Self::Motivated => "motivated",
            Self::Neutral => "neutral",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "stressed" => Some(Self::Stressed),
            "tired" => Some(Self::Tired),
            "motivated" => Some(Self::Motivated),
            "neutral" => Some(Self::Neutral),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodResult {
    pub score: f64,
    pub label: MoodLabel,
    pub suggestions: Vec<String>,
}

/// One questionnaire submission as it is written to the mood store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodRecord {
    pub uid: String,
    pub timestamp: String,
    pub answers: Vec<u8>,
    pub mood_score: f64,
    pub mood_label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Places,
    Career,
    Skill,
    Exam,
    General,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Places => "places",
            Self::Career => "career",
            Self::Skill => "skill",
            Self::Exam => "exam",
            Self::General => "general",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Flight,
    Hotel,
}

impl ItemType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "flight" | "flights" => Some(Self::Flight),
            "hotel" | "hotels" => Some(Self::Hotel),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flight {
    pub id: String,
    pub airline: String,
    pub flight_number: String,
    pub from: String,
    pub to: String,
    pub departure: String,
    pub arrival: String,
    pub duration: String,
    pub price: u32,
    pub seats: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotel {
    pub id: String,
    pub name: String,
    pub location: String,
    pub price: u32,
    pub rating: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum BookingItem {
    Flight(Flight),
    Hotel(Hotel),
}

impl BookingItem {
    pub fn item_type(&self) -> ItemType {
        match self {
            Self::Flight(_) => ItemType::Flight,
            Self::Hotel(_) => ItemType::Hotel,
        }
    }

    pub fn price(&self) -> u32 {
        match self {
            Self::Flight(flight) => flight.price,
            Self::Hotel(hotel) => hotel.price,
        }
    }

    pub fn title(&self) -> String {
        match self {
            Self::Flight(flight) => format!("{} {}", flight.airline, flight.flight_number),
            Self::Hotel(hotel) => hotel.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSelection {
    pub item_type: ItemType,
    pub item: BookingItem,
    pub price: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PassengerDetails {
    pub name: String,
    pub age: String,
    pub gender: String,
    pub meal_preference: String,
    pub email: String,
    pub phone: String,
    pub date: Option<String>,
}

impl Default for PassengerDetails {
    fn default() -> Self {
        Self {
            name: String::new(),
            age: String::new(),
            gender: "male".to_string(),
            meal_preference: "veg".to_string(),
            email: String::new(),
            phone: String::new(),
            date: None,
        }
    }
}

impl PassengerDetails {
    /// Required fields that are blank. `gender` always has a value and is
    /// never required.
    pub fn missing_required(&self) -> Vec<&'static str> {
        [
            ("name", &self.name),
            ("age", &self.age),
            ("email", &self.email),
            ("phone", &self.phone),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingState {
    None,
    Review,
    Processing,
    Success,
}

impl BookingState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Review => "review",
            Self::Processing => "processing",
            Self::Success => "success",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardingPass {
    pub passenger_name: String,
    pub date: String,
    pub gate: String,
    pub seat: String,
    pub meal_preference: String,
    pub item_type: ItemType,
    pub title: String,
    pub departure: Option<String>,
    pub arrival: Option<String>,
    pub from_code: Option<String>,
    pub to_code: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub price: u32,
    pub taxes: u32,
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentOrder {
    pub id: String,
    pub amount: u64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoResult {
    pub id: String,
    pub title: String,
    pub channel: String,
    pub thumbnail: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub name: String,
    #[serde(rename = "type")]
    pub place_type: String,
    pub rating: Option<f32>,
    pub address: String,
    pub maps_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatInput {
    pub text: String,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply_text: String,
    pub intent: Intent,
    pub parameter: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub videos: Vec<VideoResult>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub places: Vec<Place>,
}
