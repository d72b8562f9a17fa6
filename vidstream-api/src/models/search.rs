use crate::models::actor::{Actor, ActorSearchFilters};
use crate::models::common::{DateRange, PaginatedResponse, SortOrder, TimeRange};
use crate::models::video::{Tag, Video};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    All,
    Videos,
    Actors,
    Tags,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vip_only: Option<bool>,
    /// Only actors with at least one video
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_videos: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<f64>,
}

/// Global search across videos, actors and tags
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub keyword: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub scope: Option<SearchScope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    /// Sent as JSON text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<SearchFilters>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchTotals {
    pub videos: u64,
    pub actors: u64,
    pub tags: u64,
    pub all: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub videos: Vec<Video>,
    #[serde(default)]
    pub actors: Vec<Actor>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    pub total: SearchTotals,
    #[serde(default)]
    pub suggestions: Vec<String>,
    /// Spelling correction
    pub corrections: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchSortBy {
    Relevance,
    Latest,
    Popular,
    Views,
    Rating,
    Duration,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSearchFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vip_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_year: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSearchRequest {
    pub keyword: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SearchSortBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<VideoSearchFilters>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorKeywordSearch {
    pub keyword: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SearchSortBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<ActorSearchFilters>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagSearchRequest {
    pub keyword: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
}

/// `limit` plus result kind, shared by suggestion-style endpoints
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScopedLimitParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub scope: Option<SearchScope>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitledRef {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSuggestions {
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub videos: Vec<TitledRef>,
    #[serde(default)]
    pub actors: Vec<NamedRef>,
    #[serde(default)]
    pub tags: Vec<NamedRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotKeyword {
    pub keyword: String,
    pub search_count: u64,
    pub trend: Option<Trend>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotKeywordsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<SearchScope>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHistoryEntry {
    pub id: String,
    pub keyword: String,
    #[serde(rename = "type")]
    pub scope: SearchScope,
    pub result_count: u64,
    pub searched_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRecord {
    pub keyword: String,
    #[serde(rename = "type")]
    pub scope: SearchScope,
    pub result_count: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LimitParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionKind {
    Keyword,
    Video,
    Actor,
    Tag,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoCompleteEntry {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: CompletionKind,
    pub id: Option<String>,
    pub count: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedSearchParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_year: Option<u16>,
    /// Sent as JSON text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vip_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_subtitles: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_nationality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SearchSortBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedSearchResult {
    pub videos: PaginatedResponse<Video>,
    pub actors: PaginatedResponse<Actor>,
    pub total_results: u64,
    /// Milliseconds spent by the server
    pub search_time: u64,
    #[serde(default)]
    pub applied_filters: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordTrend {
    pub keyword: String,
    pub count: u64,
    pub trend: Trend,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySearchShare {
    pub category_id: String,
    pub category_name: String,
    pub search_count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStats {
    pub total_searches: u64,
    #[serde(default)]
    pub popular_keywords: Vec<KeywordTrend>,
    #[serde(default)]
    pub search_trends: Vec<DailyCount>,
    #[serde(default)]
    pub category_distribution: Vec<CategorySearchShare>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchIssue {
    NoResults,
    IrrelevantResults,
    MissingContent,
    Other,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchIssueReport {
    pub keyword: String,
    pub issue: SearchIssue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_results: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacetCount {
    pub id: String,
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NationalityCount {
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearCount {
    pub year: u16,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DurationBucket {
    /// "0-10min", "10-30min", ...
    pub range: String,
    pub min: u64,
    pub max: u64,
    pub count: u64,
}

/// Facets offered by the advanced search form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchFilterOptions {
    #[serde(default)]
    pub categories: Vec<FacetCount>,
    #[serde(default)]
    pub tags: Vec<FacetCount>,
    #[serde(default)]
    pub actors: Vec<FacetCount>,
    #[serde(default)]
    pub nationalities: Vec<NationalityCount>,
    #[serde(default)]
    pub years: Vec<YearCount>,
    #[serde(default)]
    pub durations: Vec<DurationBucket>,
}
