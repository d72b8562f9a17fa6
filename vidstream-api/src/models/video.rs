use crate::models::common::{SortOrder, TimeRange};
use serde::{Deserialize, Serialize};

/// One HLS rendition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoQuality {
    /// "720p", "1080p", "4K"
    pub quality: String,
    pub url: String,
    pub bandwidth: u64,
    pub resolution: Option<String>,
    pub file_size: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub thumbnail: Option<String>,
    pub video_count: u64,
    pub order: u32,
    pub is_active: bool,
    /// Set on second-level categories
    pub parent_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub slug: String,
    /// Hex color
    pub color: Option<String>,
    pub description: Option<String>,
    pub video_count: u64,
    pub is_hot: bool,
    pub category_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoStatus {
    Published,
    Draft,
    Processing,
    Deleted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    /// Master m3u8 playlist
    pub stream_url: String,
    /// "01:23:45"
    pub duration: String,
    pub duration_seconds: u64,
    pub view_count: u64,
    pub like_count: u64,
    pub favorite_count: u64,
    pub comment_count: u64,
    pub is_vip: bool,
    pub vip_level: Option<u8>,
    pub category_id: String,
    pub category_name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub tag_names: Vec<String>,
    #[serde(default)]
    pub actors: Vec<String>,
    #[serde(default)]
    pub actor_names: Vec<String>,
    pub resolution: Option<String>,
    pub file_size: Option<u64>,
    pub codec: Option<String>,
    /// kbps
    pub bitrate: Option<u64>,
    pub frame_rate: Option<f64>,
    pub release_date: Option<String>,
    pub studio: Option<String>,
    pub series: Option<String>,
    pub director: Option<String>,
    pub status: VideoStatus,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
    pub published_at: Option<String>,
    pub qualities: Option<Vec<VideoQuality>>,
    pub previews: Option<Vec<String>>,
    pub rating: Option<f64>,
    pub rating_count: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorRef {
    pub id: String,
    pub name: String,
    pub avatar: Option<String>,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackPosition {
    /// Seconds
    pub position: f64,
    /// 0..=1
    pub progress: f64,
    pub updated_at: String,
}

/// Viewer-specific state, present when logged in
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInteraction {
    pub is_liked: bool,
    pub is_favorited: bool,
    pub rating: Option<u8>,
    pub play_history: Option<PlaybackPosition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendations {
    pub related_videos: Vec<Video>,
    pub same_actor_videos: Vec<Video>,
    pub same_category_videos: Vec<Video>,
    pub same_tag_videos: Vec<Video>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetail {
    #[serde(flatten)]
    pub video: Video,
    pub category: Category,
    #[serde(default)]
    pub tag_list: Vec<Tag>,
    #[serde(default)]
    pub actor_list: Vec<ActorRef>,
    pub user_interaction: Option<UserInteraction>,
    pub recommendations: Option<Recommendations>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoSortBy {
    Latest,
    Popular,
    Views,
    Likes,
    Duration,
    Rating,
    Random,
}

/// Filters of the main video listing
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vip_only: Option<bool>,
    /// Seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_year: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub studio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<VideoSortBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
}

/// Filters of the recommended, popular and latest feeds
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoFeedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelatedBy {
    Category,
    Tags,
    Actors,
    Mixed,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RelatedVideosParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub related_by: Option<RelatedBy>,
}

/// Filters of the videos of a category, tag or actor
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionVideosParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<VideoSortBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actors: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popular: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleTrack {
    pub language: String,
    pub label: String,
    pub url: String,
    #[serde(default)]
    pub is_default: bool,
}

/// Signed playback URLs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayUrlResponse {
    pub stream_url: String,
    pub qualities: Option<Vec<VideoQuality>>,
    pub subtitles: Option<Vec<SubtitleTrack>>,
    pub expires_at: Option<String>,
}

/// View beacon sent when playback starts or progresses
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoViewRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStats {
    pub view_count: u64,
    pub like_count: u64,
    pub favorite_count: u64,
    pub comment_count: u64,
    pub share_count: u64,
    pub rating: f64,
    pub rating_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportReason {
    Copyright,
    Inappropriate,
    Spam,
    Broken,
    Other,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportVideoRequest {
    pub reason: ReportReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailFrame {
    /// Seconds from the start
    pub time: f64,
    pub url: String,
}

/// Seek-bar preview frames
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoThumbnails {
    /// Seconds between frames
    pub interval: f64,
    pub thumbnails: Vec<ThumbnailFrame>,
}
