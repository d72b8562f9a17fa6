use crate::api::{require, segment};
use crate::client::{Client, RequestOptions};
use crate::error::ApiResult;
use crate::models::actor::Actor;
use crate::models::common::PaginatedResponse;
use crate::models::search::*;
use crate::models::video::{Tag, Video};
use crate::query::QueryParams;
use async_trait::async_trait;
use serde::de::IgnoredAny;

/// Search API methods
#[async_trait]
pub trait SearchApi {
    /// Search videos, actors and tags at once
    async fn search_all(&self, params: &SearchParams) -> ApiResult<SearchResult>;

    async fn search_videos(
        &self,
        request: &VideoSearchRequest,
    ) -> ApiResult<PaginatedResponse<Video>>;

    async fn search_actors_by_keyword(
        &self,
        request: &ActorKeywordSearch,
    ) -> ApiResult<PaginatedResponse<Actor>>;

    async fn search_tags(&self, request: &TagSearchRequest) -> ApiResult<PaginatedResponse<Tag>>;

    async fn get_search_suggestions(
        &self,
        keyword: &str,
        params: &ScopedLimitParams,
    ) -> ApiResult<SearchSuggestions>;

    async fn get_hot_keywords(&self, params: &HotKeywordsParams) -> ApiResult<Vec<HotKeyword>>;

    async fn get_search_history(
        &self,
        params: &ScopedLimitParams,
    ) -> ApiResult<Vec<SearchHistoryEntry>>;

    async fn clear_search_history(&self) -> ApiResult<()>;

    async fn delete_search_history(&self, history_id: &str) -> ApiResult<()>;

    async fn save_search_record(&self, record: &SearchRecord) -> ApiResult<()>;

    async fn get_related_keywords(
        &self,
        keyword: &str,
        params: &LimitParams,
    ) -> ApiResult<Vec<String>>;

    /// Completions for a partial keyword. An empty keyword yields no
    /// completions without contacting the server.
    async fn get_auto_complete(
        &self,
        keyword: &str,
        params: &ScopedLimitParams,
    ) -> ApiResult<Vec<AutoCompleteEntry>>;

    async fn advanced_search(&self, params: &AdvancedSearchParams)
        -> ApiResult<AdvancedSearchResult>;

    async fn get_search_stats(&self) -> ApiResult<SearchStats>;

    async fn report_search_issue(&self, report: &SearchIssueReport) -> ApiResult<()>;

    /// Facets for the advanced search form
    async fn get_search_filters(&self) -> ApiResult<SearchFilterOptions>;
}

fn keyword_query(keyword: &str, params: QueryParams) -> QueryParams {
    QueryParams::new().insert("keyword", keyword).extend(params)
}

#[async_trait]
impl SearchApi for Client {
    async fn search_all(&self, params: &SearchParams) -> ApiResult<SearchResult> {
        require("keyword", params.keyword.trim())?;
        self.get(
            "/search",
            &QueryParams::from_serialize(params)?,
            RequestOptions::new(),
        )
        .await
    }

    async fn search_videos(
        &self,
        request: &VideoSearchRequest,
    ) -> ApiResult<PaginatedResponse<Video>> {
        require("keyword", request.keyword.trim())?;
        self.get(
            "/search/videos",
            &QueryParams::from_serialize(request)?,
            RequestOptions::new(),
        )
        .await
    }

    async fn search_actors_by_keyword(
        &self,
        request: &ActorKeywordSearch,
    ) -> ApiResult<PaginatedResponse<Actor>> {
        require("keyword", request.keyword.trim())?;
        self.get(
            "/search/actors",
            &QueryParams::from_serialize(request)?,
            RequestOptions::new(),
        )
        .await
    }

    async fn search_tags(&self, request: &TagSearchRequest) -> ApiResult<PaginatedResponse<Tag>> {
        require("keyword", request.keyword.trim())?;
        self.get(
            "/search/tags",
            &QueryParams::from_serialize(request)?,
            RequestOptions::new(),
        )
        .await
    }

    async fn get_search_suggestions(
        &self,
        keyword: &str,
        params: &ScopedLimitParams,
    ) -> ApiResult<SearchSuggestions> {
        require("keyword", keyword)?;
        self.get(
            "/search/suggestions",
            &keyword_query(keyword, QueryParams::from_serialize(params)?),
            RequestOptions::new(),
        )
        .await
    }

    async fn get_hot_keywords(&self, params: &HotKeywordsParams) -> ApiResult<Vec<HotKeyword>> {
        self.get(
            "/search/hot",
            &QueryParams::from_serialize(params)?,
            RequestOptions::new(),
        )
        .await
    }

    async fn get_search_history(
        &self,
        params: &ScopedLimitParams,
    ) -> ApiResult<Vec<SearchHistoryEntry>> {
        self.get(
            "/search/history",
            &QueryParams::from_serialize(params)?,
            RequestOptions::new(),
        )
        .await
    }

    async fn clear_search_history(&self) -> ApiResult<()> {
        self.delete::<IgnoredAny>("/search/history", RequestOptions::new())
            .await
            .map(|_| ())
    }

    async fn delete_search_history(&self, history_id: &str) -> ApiResult<()> {
        require("search history id", history_id)?;
        self.delete::<IgnoredAny>(
            &format!("/search/history/{}", segment(history_id)),
            RequestOptions::new(),
        )
        .await
        .map(|_| ())
    }

    async fn save_search_record(&self, record: &SearchRecord) -> ApiResult<()> {
        require("keyword", record.keyword.trim())?;
        self.post::<IgnoredAny, _>("/search/history", record, RequestOptions::new())
            .await
            .map(|_| ())
    }

    async fn get_related_keywords(
        &self,
        keyword: &str,
        params: &LimitParams,
    ) -> ApiResult<Vec<String>> {
        require("keyword", keyword)?;
        self.get(
            "/search/related",
            &keyword_query(keyword, QueryParams::from_serialize(params)?),
            RequestOptions::new(),
        )
        .await
    }

    async fn get_auto_complete(
        &self,
        keyword: &str,
        params: &ScopedLimitParams,
    ) -> ApiResult<Vec<AutoCompleteEntry>> {
        if keyword.is_empty() {
            return Ok(Vec::new());
        }
        self.get(
            "/search/autocomplete",
            &keyword_query(keyword, QueryParams::from_serialize(params)?),
            RequestOptions::new(),
        )
        .await
    }

    async fn advanced_search(
        &self,
        params: &AdvancedSearchParams,
    ) -> ApiResult<AdvancedSearchResult> {
        self.get(
            "/search/advanced",
            &QueryParams::from_serialize(params)?,
            RequestOptions::new(),
        )
        .await
    }

    async fn get_search_stats(&self) -> ApiResult<SearchStats> {
        self.get("/search/stats", &QueryParams::new(), RequestOptions::new())
            .await
    }

    async fn report_search_issue(&self, report: &SearchIssueReport) -> ApiResult<()> {
        require("keyword", report.keyword.trim())?;
        self.post::<IgnoredAny, _>("/search/report", report, RequestOptions::new())
            .await
            .map(|_| ())
    }

    async fn get_search_filters(&self) -> ApiResult<SearchFilterOptions> {
        self.get("/search/filters", &QueryParams::new(), RequestOptions::new())
            .await
    }
}
