use crate::models::common::TimeRange;
use crate::models::video::Video;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SocialLinks {
    pub instagram: Option<String>,
    pub twitter: Option<String>,
    pub website: Option<String>,
    pub onlyfans: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorSummaryStats {
    pub avg_rating: f64,
    pub total_likes: u64,
    pub total_favorites: u64,
    pub latest_video_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    /// YYYY-MM-DD
    pub birth_date: Option<String>,
    pub nationality: Option<String>,
    /// cm
    pub height: Option<u16>,
    /// kg
    pub weight: Option<u16>,
    pub measurements: Option<String>,
    pub video_count: u64,
    pub total_views: u64,
    pub is_popular: bool,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
    pub social_links: Option<SocialLinks>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub stats: Option<ActorSummaryStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentVideo {
    pub id: String,
    pub title: String,
    pub thumbnail: String,
    pub duration: String,
    pub view_count: u64,
    pub is_vip: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaboratorRef {
    pub id: String,
    pub name: String,
    pub avatar: Option<String>,
    pub collaboration_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorDetail {
    #[serde(flatten)]
    pub actor: Actor,
    pub recent_videos: Option<Vec<RecentVideo>>,
    pub collaborators: Option<Vec<CollaboratorRef>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AgeRange {
    pub min: u8,
    pub max: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorSortBy {
    Relevance,
    Name,
    Popular,
    Videos,
    Latest,
    Views,
    Rating,
}

/// Filters of the actor listing
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    /// Sent as JSON text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_range: Option<AgeRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popular: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_videos: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<ActorSortBy>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularActorsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewActorsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Debut within this many days
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaboratorsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_collaborations: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorCollaboration {
    pub actor: Actor,
    pub collaboration_count: u32,
    pub latest_collaboration: String,
    #[serde(default)]
    pub popular_videos: Vec<Video>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityAlgorithm {
    Tags,
    Collaborations,
    Categories,
    Mixed,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SimilarActorsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<SimilarityAlgorithm>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorSearchFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_range: Option<AgeRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_videos: Option<bool>,
}

/// Keyword search over actors
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorSearchRequest {
    pub keyword: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Sent as JSON text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<ActorSearchFilters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<ActorSortBy>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryShare {
    pub category_id: String,
    pub category_name: String,
    pub video_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagShare {
    pub tag_id: String,
    pub tag_name: String,
    pub video_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorStats {
    pub total_videos: u64,
    pub total_views: u64,
    pub total_likes: u64,
    pub total_favorites: u64,
    pub avg_rating: f64,
    pub rating_count: u64,
    #[serde(default)]
    pub popular_categories: Vec<CategoryShare>,
    #[serde(default)]
    pub popular_tags: Vec<TagShare>,
    pub collaborator_count: u64,
    pub latest_video_date: Option<String>,
    pub career_start_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowState {
    pub is_following: bool,
    pub follower_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowedSortBy {
    Latest,
    Name,
    Videos,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowedActorsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<FollowedSortBy>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorTagsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_count: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorTagGroup {
    pub tag: String,
    pub count: u64,
    #[serde(default)]
    pub actors: Vec<Actor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NationalityGroup {
    pub nationality: String,
    pub count: u64,
    #[serde(default)]
    pub popular_actors: Vec<Actor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActorInfoField {
    Name,
    Bio,
    BirthDate,
    Nationality,
    Measurements,
    Other,
}

/// Correction suggested by a viewer
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorInfoReport {
    pub field: ActorInfoField,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_value: Option<String>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}
