//! Seams to the third-party services the companion talks to.
//!
//! Each trait has an offline implementation here so the agent runs without
//! network access; HTTP-backed implementations live in the API crate.

use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use companion_core::{Flight, Hotel, PaymentOrder, Place, VideoResult};
use serde_json::Value;
use url::form_urlencoded;
use uuid::Uuid;

pub const DEFAULT_HOTEL_CITY: &str = "Mumbai";

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[async_trait]
pub trait VideoSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<VideoResult>>;
}

#[async_trait]
pub trait PlacesSearch: Send + Sync {
    async fn nearby(&self, place_type: &str) -> Result<Vec<Place>>;
}

#[async_trait]
pub trait FlightSearch: Send + Sync {
    async fn search(&self, from: &str, to: &str, date: Option<&str>) -> Result<Vec<Flight>>;
}

#[async_trait]
pub trait HotelCatalog: Send + Sync {
    async fn hotels_in(&self, city: &str) -> Result<Vec<Hotel>>;
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(&self, amount: u64) -> Result<PaymentOrder>;
}

#[derive(Clone)]
pub struct Collaborators {
    pub llm: Arc<dyn LlmClient>,
    pub videos: Arc<dyn VideoSearch>,
    pub places: Arc<dyn PlacesSearch>,
    pub flights: Arc<dyn FlightSearch>,
    pub hotels: Arc<dyn HotelCatalog>,
    pub payments: Arc<dyn PaymentGateway>,
}

impl Collaborators {
    pub fn offline() -> Self {
        Self {
            llm: Arc::new(CannedLlm),
            videos: Arc::new(VideoSearchLinks),
            places: Arc::new(MapsSearchLinks),
            flights: Arc::new(SampleFlightSearch),
            hotels: Arc::new(StaticHotelCatalog),
            payments: Arc::new(SimulatedPaymentGateway),
        }
    }
}

#[derive(Debug, Default)]
pub struct CannedLlm;

#[async_trait]
impl LlmClient for CannedLlm {
    async fn complete(&self, prompt: &str) -> Result<String> {
        Ok(format!(
            "I'm running offline right now, so here is a general tip for \"{}\": break it into small steps, note what you already know, and ask me about careers, skills, exams or nearby places for targeted resources.",
            prompt.trim()
        ))
    }
}

/// Returns a single link to the video site's own search page.
#[derive(Debug, Default)]
pub struct VideoSearchLinks;

#[async_trait]
impl VideoSearch for VideoSearchLinks {
    async fn search(&self, query: &str) -> Result<Vec<VideoResult>> {
        let encoded = encode(query);
        Ok(vec![VideoResult {
            id: format!("search-{}", encoded),
            title: format!("Search results: {}", query),
            channel: "YouTube".to_string(),
            thumbnail: String::new(),
            url: format!("https://www.youtube.com/results?search_query={}", encoded),
        }])
    }
}

#[derive(Debug, Default)]
pub struct MapsSearchLinks;

#[async_trait]
impl PlacesSearch for MapsSearchLinks {
    async fn nearby(&self, place_type: &str) -> Result<Vec<Place>> {
        Ok(vec![Place {
            name: format!("{}s around you", capitalize(place_type)),
            place_type: place_type.to_string(),
            rating: None,
            address: "Open the map to see results for your location".to_string(),
            maps_url: format!(
                "https://www.google.com/maps/search/{}",
                encode(&format!("{} near me", place_type))
            ),
        }])
    }
}

/// Deterministic schedule for a route; stands in for a live fare search.
#[derive(Debug, Default)]
pub struct SampleFlightSearch;

#[async_trait]
impl FlightSearch for SampleFlightSearch {
    async fn search(&self, from: &str, to: &str, _date: Option<&str>) -> Result<Vec<Flight>> {
        let schedule = [
            ("IndiGo", "6E", "06:10", "08:25", "2h 15m", 4_850_u32, 14_u32),
            ("Air India", "AI", "11:40", "14:05", "2h 25m", 5_620, 6),
            ("Vistara", "UK", "19:15", "21:20", "2h 05m", 6_340, 21),
        ];
        let seed = route_seed(from, to);

        Ok(schedule
            .iter()
            .enumerate()
            .map(
                |(index, (airline, prefix, departure, arrival, duration, base, seats))| {
                    let number = 100 + (seed + index as u32 * 37) % 900;
                    Flight {
                        id: format!("{}-{}", prefix, number),
                        airline: airline.to_string(),
                        flight_number: format!("{}-{}", prefix, number),
                        from: from.trim().to_string(),
                        to: to.trim().to_string(),
                        departure: departure.to_string(),
                        arrival: arrival.to_string(),
                        duration: duration.to_string(),
                        price: base + (seed % 10) * 50,
                        seats: *seats,
                    }
                },
            )
            .collect())
    }
}

#[derive(Debug, Default)]
pub struct StaticHotelCatalog;

#[async_trait]
impl HotelCatalog for StaticHotelCatalog {
    async fn hotels_in(&self, city: &str) -> Result<Vec<Hotel>> {
        let location = if city.trim().is_empty() {
            DEFAULT_HOTEL_CITY
        } else {
            city.trim()
        };

        Ok([
            ("1", "Taj Hotel", 8_500, 4.8),
            ("2", "Oberoi Grand", 12_000, 4.9),
            ("3", "ITC Maratha", 9_500, 4.7),
        ]
        .into_iter()
        .map(|(id, name, price, rating)| Hotel {
            id: id.to_string(),
            name: name.to_string(),
            location: location.to_string(),
            price,
            rating: Some(rating),
        })
        .collect())
    }
}

/// Issues local order handles in the gateway's minor-unit convention.
#[derive(Debug, Default)]
pub struct SimulatedPaymentGateway;

#[async_trait]
impl PaymentGateway for SimulatedPaymentGateway {
    async fn create_order(&self, amount: u64) -> Result<PaymentOrder> {
        if amount == 0 {
            bail!("order amount must be positive");
        }

        let minor_units = amount
            .checked_mul(100)
            .ok_or_else(|| anyhow!("order amount {} is too large", amount))?;

        Ok(PaymentOrder {
            id: format!("order_{}", Uuid::new_v4().simple()),
            amount: minor_units,
            currency: "INR".to_string(),
        })
    }
}

/// Coerces an untyped hotel listing into typed records. Anything that is not
/// an array is an empty listing, and entries missing a name or price are
/// skipped.
pub fn hotels_from_value(value: &Value) -> Vec<Hotel> {
    let Some(entries) = value.as_array() else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let name = entry.get("name")?.as_str()?.trim();
            if name.is_empty() {
                return None;
            }
            let price = match entry.get("price")? {
                Value::Number(number) => number
                    .as_u64()
                    .or_else(|| number.as_f64().filter(|v| *v >= 0.0).map(|v| v.round() as u64))?,
                Value::String(text) => text.trim().parse::<u64>().ok()?,
                _ => return None,
            };
            let id = match entry.get("id") {
                Some(Value::String(id)) => id.clone(),
                Some(Value::Number(id)) => id.to_string(),
                _ => name.to_lowercase().replace(' ', "-"),
            };

            Some(Hotel {
                id,
                name: name.to_string(),
                location: entry
                    .get("location")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                price: u32::try_from(price).ok()?,
                rating: entry
                    .get("rating")
                    .and_then(Value::as_f64)
                    .map(|rating| rating as f32),
            })
        })
        .collect()
}

fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn route_seed(from: &str, to: &str) -> u32 {
    format!("{}>{}", from.trim().to_lowercase(), to.trim().to_lowercase())
        .bytes()
        .fold(17_u32, |acc, byte| acc.wrapping_mul(31).wrapping_add(u32::from(byte)))
}
