use serde::{Deserialize, Serialize};

use crate::intent::{
    career_query, classify_intent, detect_place_type, extract_career, extract_skill, skill_query,
};
use crate::models::{ChatReply, Intent, Place, VideoResult};

pub const FAILURE_REPLY: &str = "Sorry, something went wrong. Please try again.";
pub const EXAM_REPLY: &str = "Here are some helpful exam preparation resources:";

/// What the chat layer should do with a message once it has been classified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "route", rename_all = "snake_case")]
pub enum ChatRoute {
    NearbyPlaces { place_type: String },
    CareerVideos { career: String, query: String },
    SkillVideos { skill: String, query: String },
    ExamVideos { query: String },
    Llm,
}

impl ChatRoute {
    pub fn parameter(&self) -> Option<&str> {
        match self {
            Self::NearbyPlaces { place_type } => Some(place_type.as_str()),
            Self::CareerVideos { career, .. } => Some(career.as_str()),
            Self::SkillVideos { skill, .. } => Some(skill.as_str()),
            Self::ExamVideos { .. } | Self::Llm => None,
        }
    }
}

pub fn route_message(text: &str) -> (Intent, ChatRoute) {
    let intent = classify_intent(text);

    let route = match intent {
        Intent::Places => match detect_place_type(text) {
            Some(place_type) => ChatRoute::NearbyPlaces {
                place_type: place_type.to_string(),
            },
            None => ChatRoute::Llm,
        },
        Intent::Career => match extract_career(text) {
            Some(career) => ChatRoute::CareerVideos {
                query: career_query(&career),
                career,
            },
            None => ChatRoute::Llm,
        },
        Intent::Skill => match extract_skill(text) {
            Some(skill) => ChatRoute::SkillVideos {
                query: skill_query(&skill),
                skill,
            },
            None => ChatRoute::Llm,
        },
        Intent::Exam => ChatRoute::ExamVideos {
            query: text.to_string(),
        },
        Intent::General => ChatRoute::Llm,
    };

    (intent, route)
}

pub fn places_reply(place_type: &str, count: usize) -> String {
    format!("Found {} {}s near you:", count, place_type)
}

pub fn career_reply(career: &str) -> String {
    format!("Here are some great resources to become a {}:", career)
}

pub fn skill_reply(skill: &str) -> String {
    format!("Here are tutorials to improve your {} skills:", skill)
}

pub fn compose_chat_reply(
    intent: Intent,
    route: &ChatRoute,
    reply_text: String,
    videos: Vec<VideoResult>,
    places: Vec<Place>,
) -> ChatReply {
    ChatReply {
        reply_text,
        intent,
        parameter: route.parameter().map(ToString::to_string),
        videos,
        places,
    }
}

pub fn failure_reply(intent: Intent) -> ChatReply {
    ChatReply {
        reply_text: FAILURE_REPLY.to_string(),
        intent,
        parameter: None,
        videos: Vec::new(),
        places: Vec::new(),
    }
}
