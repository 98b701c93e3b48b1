use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::{CatalogError, CatalogResult};

pub const MAX_RATING: u8 = 5;

/// One validated catalog entry.
///
/// Fields are private so every instance upholds `rating <= 5`, a non-blank
/// title and singer, and a non-negative play count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackRecord {
    title: String,
    singer: String,
    rating: u8,
    link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
    play_count: u64,
    /// Source fields this program does not know about, written back verbatim.
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Storage shape of a record, including the legacy field names older files use.
#[derive(Deserialize)]
struct StoredTrack {
    #[serde(alias = "song")]
    title: String,
    #[serde(alias = "artist")]
    singer: String,
    rating: Value,
    link: String,
    #[serde(default, alias = "image_path")]
    image_url: Option<String>,
    #[serde(default)]
    play_count: Value,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl TrackRecord {
    pub fn new(
        title: impl Into<String>,
        singer: impl Into<String>,
        rating: i64,
        link: impl Into<String>,
    ) -> CatalogResult<Self> {
        let title = title.into();
        let singer = singer.into();
        if title.trim().is_empty() {
            return Err(CatalogError::validation("title", "must not be blank"));
        }
        if singer.trim().is_empty() {
            return Err(CatalogError::validation("singer", "must not be blank"));
        }

        Ok(Self {
            title,
            singer,
            rating: validate_rating(rating)?,
            link: link.into(),
            image_url: None,
            play_count: 0,
            extra: Map::new(),
        })
    }

    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    pub fn with_play_count(mut self, play_count: i64) -> CatalogResult<Self> {
        self.play_count = validate_play_count(play_count)?;
        Ok(self)
    }

    /// Parse one entry of the storage file.
    pub fn from_json(value: Value) -> CatalogResult<Self> {
        let stored: StoredTrack = serde_json::from_value(value)
            .map_err(|e| CatalogError::validation("record", e.to_string()))?;

        let rating = integer_field("rating", &stored.rating)?;
        let play_count = match &stored.play_count {
            Value::Null => 0,
            v => integer_field("play_count", v)?,
        };

        let mut record = Self::new(stored.title, stored.singer, rating, stored.link)?
            .with_play_count(play_count)?;
        record.image_url = stored.image_url;
        record.extra = stored.extra;
        Ok(record)
    }

    /// Storage shape with canonical field names.
    pub fn to_json(&self) -> CatalogResult<Value> {
        serde_json::to_value(self).map_err(|e| CatalogError::validation("record", e.to_string()))
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn singer(&self) -> &str {
        &self.singer
    }

    pub fn rating(&self) -> u8 {
        self.rating
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn play_count(&self) -> u64 {
        self.play_count
    }

    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    pub(super) fn set_rating(&mut self, rating: u8) -> u8 {
        std::mem::replace(&mut self.rating, rating)
    }

    pub(super) fn set_play_count(&mut self, play_count: u64) {
        self.play_count = play_count;
    }

    pub(super) fn increment_play_count(&mut self) -> u64 {
        self.play_count = self.play_count.saturating_add(1);
        self.play_count
    }
}

pub fn validate_rating(rating: i64) -> CatalogResult<u8> {
    if (0..=i64::from(MAX_RATING)).contains(&rating) {
        Ok(rating as u8)
    } else {
        Err(CatalogError::validation(
            "rating",
            format!("{rating} is not an integer between 0 and {MAX_RATING}"),
        ))
    }
}

pub fn validate_play_count(play_count: i64) -> CatalogResult<u64> {
    u64::try_from(play_count).map_err(|_| {
        CatalogError::validation(
            "play_count",
            format!("{play_count} is not a non-negative integer"),
        )
    })
}

fn integer_field(field: &'static str, value: &Value) -> CatalogResult<i64> {
    value
        .as_i64()
        .ok_or_else(|| CatalogError::validation(field, format!("{value} is not an integer")))
}
