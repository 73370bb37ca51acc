use chrono::NaiveDate;
use thiserror::Error;

use crate::data::geo::is_valid_coordinate;
use crate::data::province::ProvinceClassifier;

#[derive(Debug, Error, PartialEq)]
pub enum ResourceError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
    #[error("{field} is not a number: '{value}'")]
    InvalidNumber { field: &'static str, value: String },
    #[error("coordinate ({lat}, {lon}) is out of range")]
    CoordinateOutOfRange { lat: f64, lon: f64 },
    #[error("capacity must be greater than zero")]
    ZeroCapacity,
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SafetyArticle {
    pub id: u32,
    pub title: String,
    pub summary: String,
    pub body: String,
    pub published: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvacuationPost {
    pub id: u32,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub capacity: u32,
    pub contact: String,
    /// Tagged with the same classifier as the earthquakes.
    pub province: String,
}

// ---------------------------------------------------------------------------
// Form drafts – raw text as typed
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ArticleDraft {
    pub title: String,
    pub summary: String,
    pub body: String,
    pub published: NaiveDate,
}

impl ArticleDraft {
    pub fn new(today: NaiveDate) -> Self {
        ArticleDraft {
            title: String::new(),
            summary: String::new(),
            body: String::new(),
            published: today,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostDraft {
    pub name: String,
    pub address: String,
    pub latitude: String,
    pub longitude: String,
    pub capacity: String,
    pub contact: String,
}

fn required(value: &str, field: &'static str) -> Result<String, ResourceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ResourceError::EmptyField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

fn number<T: std::str::FromStr>(value: &str, field: &'static str) -> Result<T, ResourceError> {
    value.trim().parse().map_err(|_| ResourceError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// In-memory articles and evacuation posts for the running session.
#[derive(Debug, Clone, Default)]
pub struct ResourceBoard {
    articles: Vec<SafetyArticle>,
    posts: Vec<EvacuationPost>,
    next_id: u32,
}

impl ResourceBoard {
    /// A board with the standard earthquake safety guidance.
    pub fn with_defaults(today: NaiveDate) -> Self {
        let mut board = ResourceBoard::default();
        let seeds = [
            (
                "Drop, Cover, Hold On",
                "What to do while the ground is shaking.",
                "Drop to your hands and knees. Cover your head and neck under a sturdy table. \
                 Hold on until the shaking stops. Stay away from windows and heavy furniture.",
            ),
            (
                "After the Shaking Stops",
                "Checks to make before moving.",
                "Expect aftershocks. Check for injuries and gas leaks, wear shoes, and move to \
                 the nearest evacuation post if your building is damaged. Near the coast, head \
                 to high ground at once: a strong or long quake can mean a tsunami.",
            ),
        ];
        for (title, summary, body) in seeds {
            let id = board.allocate_id();
            board.articles.push(SafetyArticle {
                id,
                title: title.to_string(),
                summary: summary.to_string(),
                body: body.to_string(),
                published: today,
            });
        }
        board
    }

    fn allocate_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    /// Newest first.
    pub fn articles(&self) -> impl Iterator<Item = &SafetyArticle> {
        self.articles.iter().rev()
    }

    pub fn posts(&self) -> &[EvacuationPost] {
        &self.posts
    }

    pub fn posts_in_province<'a>(
        &'a self,
        province: &'a str,
    ) -> impl Iterator<Item = &'a EvacuationPost> + 'a {
        self.posts.iter().filter(move |p| p.province == province)
    }

    pub fn add_article(&mut self, draft: &ArticleDraft) -> Result<u32, ResourceError> {
        let title = required(&draft.title, "title")?;
        let body = required(&draft.body, "body")?;
        let id = self.allocate_id();
        self.articles.push(SafetyArticle {
            id,
            title,
            summary: draft.summary.trim().to_string(),
            body,
            published: draft.published,
        });
        log::info!("Added safety article {id}");
        Ok(id)
    }

    pub fn add_post(
        &mut self,
        draft: &PostDraft,
        classifier: &ProvinceClassifier,
    ) -> Result<u32, ResourceError> {
        let name = required(&draft.name, "name")?;
        let latitude: f64 = number(&draft.latitude, "latitude")?;
        let longitude: f64 = number(&draft.longitude, "longitude")?;
        if !is_valid_coordinate(latitude, longitude) {
            return Err(ResourceError::CoordinateOutOfRange {
                lat: latitude,
                lon: longitude,
            });
        }
        let capacity: u32 = number(&draft.capacity, "capacity")?;
        if capacity == 0 {
            return Err(ResourceError::ZeroCapacity);
        }

        let id = self.allocate_id();
        self.posts.push(EvacuationPost {
            id,
            name,
            address: draft.address.trim().to_string(),
            latitude,
            longitude,
            capacity,
            contact: draft.contact.trim().to_string(),
            province: classifier.classify(latitude, longitude),
        });
        log::info!("Added evacuation post {id}");
        Ok(id)
    }

    /// Returns whether an article was removed.
    pub fn remove_article(&mut self, id: u32) -> bool {
        let before = self.articles.len();
        self.articles.retain(|a| a.id != id);
        self.articles.len() != before
    }

    /// Returns whether a post was removed.
    pub fn remove_post(&mut self, id: u32) -> bool {
        let before = self.posts.len();
        self.posts.retain(|p| p.id != id);
        self.posts.len() != before
    }
}
