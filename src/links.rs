use crate::models::MediaType;

pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/500x750?text=No+Image";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    Thumbnail,
    Medium,
    Large,
    Original,
}

impl ImageSize {
    pub fn token(&self) -> &'static str {
        match self {
            ImageSize::Thumbnail => "w200",
            ImageSize::Medium => "w500",
            ImageSize::Large => "w780",
            ImageSize::Original => "original",
        }
    }
}

pub fn image_url(base: &str, path: Option<&str>, size: ImageSize) -> String {
    match path.filter(|p| !p.is_empty()) {
        Some(p) => format!("{}/{}{}", base.trim_end_matches('/'), size.token(), p),
        None => PLACEHOLDER_IMAGE.to_string(),
    }
}

pub fn player_url(base: &str, media_type: MediaType, id: u64) -> String {
    format!(
        "{}/{}/{}",
        base.trim_end_matches('/'),
        media_type.as_path(),
        id
    )
}
