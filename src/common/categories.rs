use serde::{Deserialize, Serialize};

/// Broad comic format. Learning samples are recomputed per comic category,
/// since e.g. webtoon strips and paged manga pace very differently.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComicCategory {
    Manga,
    Webtoon,
    Western,
    #[default]
    Unknown,
}

impl ComicCategory {
    pub fn from_str(category: &str) -> Option<Self> {
        match category.to_lowercase().as_str() {
            "manga" => Some(ComicCategory::Manga),
            "webtoon" => Some(ComicCategory::Webtoon),
            "western" => Some(ComicCategory::Western),
            "unknown" => Some(ComicCategory::Unknown),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComicCategory::Manga => "manga",
            ComicCategory::Webtoon => "webtoon",
            ComicCategory::Western => "western",
            ComicCategory::Unknown => "unknown",
        }
    }
}

/// What kind of content a frame held when an adjustment was recorded.
/// Partitions the learned baselines.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentCategory {
    DenseText,
    Action,
    PanelBoundary,
    #[default]
    Balanced,
}

impl ContentCategory {
    pub fn from_str(category: &str) -> Option<Self> {
        match category.to_lowercase().as_str() {
            "dense_text" => Some(ContentCategory::DenseText),
            "action" => Some(ContentCategory::Action),
            "panel_boundary" => Some(ContentCategory::PanelBoundary),
            "balanced" => Some(ContentCategory::Balanced),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentCategory::DenseText => "dense_text",
            ContentCategory::Action => "action",
            ContentCategory::PanelBoundary => "panel_boundary",
            ContentCategory::Balanced => "balanced",
        }
    }

    pub fn all() -> [ContentCategory; 4] {
        [
            ContentCategory::DenseText,
            ContentCategory::Action,
            ContentCategory::PanelBoundary,
            ContentCategory::Balanced,
        ]
    }
}
