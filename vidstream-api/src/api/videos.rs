use crate::api::{require, segment};
use crate::client::{Client, RequestOptions};
use crate::error::ApiResult;
use crate::models::common::PaginatedResponse;
use crate::models::video::*;
use crate::query::QueryParams;
use async_trait::async_trait;
use serde::de::IgnoredAny;

/// Video, category and tag API methods
#[async_trait]
pub trait VideoApi {
    /// List videos matching the given filters
    async fn get_videos(&self, params: &VideoListParams) -> ApiResult<PaginatedResponse<Video>>;

    async fn get_video(&self, id: &str) -> ApiResult<VideoDetail>;

    /// Get signed playback URLs of a video
    async fn get_video_play_url(&self, id: &str) -> ApiResult<PlayUrlResponse>;

    /// Report that a video was watched
    async fn record_video_view(&self, id: &str, view: &VideoViewRequest) -> ApiResult<()>;

    async fn get_recommended_videos(&self, params: &VideoFeedParams) -> ApiResult<Vec<Video>>;

    async fn get_popular_videos(&self, params: &VideoFeedParams) -> ApiResult<Vec<Video>>;

    async fn get_latest_videos(&self, params: &VideoFeedParams) -> ApiResult<Vec<Video>>;

    async fn get_related_videos(
        &self,
        id: &str,
        params: &RelatedVideosParams,
    ) -> ApiResult<Vec<Video>>;

    async fn get_categories(&self) -> ApiResult<Vec<Category>>;

    async fn get_category(&self, id: &str) -> ApiResult<Category>;

    async fn get_category_videos(
        &self,
        id: &str,
        params: &CollectionVideosParams,
    ) -> ApiResult<PaginatedResponse<Video>>;

    async fn get_tags(&self, params: &TagListParams) -> ApiResult<Vec<Tag>>;

    async fn get_popular_tags(&self, params: &TagListParams) -> ApiResult<Vec<Tag>>;

    async fn get_tag(&self, id: &str) -> ApiResult<Tag>;

    async fn get_tag_videos(
        &self,
        id: &str,
        params: &CollectionVideosParams,
    ) -> ApiResult<PaginatedResponse<Video>>;

    async fn get_video_stats(&self, id: &str) -> ApiResult<VideoStats>;

    async fn report_video(&self, id: &str, report: &ReportVideoRequest) -> ApiResult<()>;

    /// Get the seek-bar preview frames of a video
    async fn get_video_thumbnails(&self, id: &str) -> ApiResult<VideoThumbnails>;

    async fn get_video_subtitles(&self, id: &str) -> ApiResult<Vec<SubtitleTrack>>;
}

#[async_trait]
impl VideoApi for Client {
    async fn get_videos(&self, params: &VideoListParams) -> ApiResult<PaginatedResponse<Video>> {
        self.get(
            "/videos",
            &QueryParams::from_serialize(params)?,
            RequestOptions::new(),
        )
        .await
    }

    async fn get_video(&self, id: &str) -> ApiResult<VideoDetail> {
        require("video id", id)?;
        self.get(
            &format!("/videos/{}", segment(id)),
            &QueryParams::new(),
            RequestOptions::new(),
        )
        .await
    }

    async fn get_video_play_url(&self, id: &str) -> ApiResult<PlayUrlResponse> {
        require("video id", id)?;
        self.get(
            &format!("/videos/{}/play", segment(id)),
            &QueryParams::new(),
            RequestOptions::new(),
        )
        .await
    }

    async fn record_video_view(&self, id: &str, view: &VideoViewRequest) -> ApiResult<()> {
        require("video id", id)?;
        self.post::<IgnoredAny, _>(
            &format!("/videos/{}/view", segment(id)),
            view,
            RequestOptions::new(),
        )
        .await
        .map(|_| ())
    }

    async fn get_recommended_videos(&self, params: &VideoFeedParams) -> ApiResult<Vec<Video>> {
        self.get(
            "/videos/recommended",
            &QueryParams::from_serialize(params)?,
            RequestOptions::new(),
        )
        .await
    }

    async fn get_popular_videos(&self, params: &VideoFeedParams) -> ApiResult<Vec<Video>> {
        self.get(
            "/videos/popular",
            &QueryParams::from_serialize(params)?,
            RequestOptions::new(),
        )
        .await
    }

    async fn get_latest_videos(&self, params: &VideoFeedParams) -> ApiResult<Vec<Video>> {
        self.get(
            "/videos/latest",
            &QueryParams::from_serialize(params)?,
            RequestOptions::new(),
        )
        .await
    }

    async fn get_related_videos(
        &self,
        id: &str,
        params: &RelatedVideosParams,
    ) -> ApiResult<Vec<Video>> {
        require("video id", id)?;
        self.get(
            &format!("/videos/{}/related", segment(id)),
            &QueryParams::from_serialize(params)?,
            RequestOptions::new(),
        )
        .await
    }

    async fn get_categories(&self) -> ApiResult<Vec<Category>> {
        self.get("/categories", &QueryParams::new(), RequestOptions::new())
            .await
    }

    async fn get_category(&self, id: &str) -> ApiResult<Category> {
        require("category id", id)?;
        self.get(
            &format!("/categories/{}", segment(id)),
            &QueryParams::new(),
            RequestOptions::new(),
        )
        .await
    }

    async fn get_category_videos(
        &self,
        id: &str,
        params: &CollectionVideosParams,
    ) -> ApiResult<PaginatedResponse<Video>> {
        require("category id", id)?;
        self.get(
            &format!("/categories/{}/videos", segment(id)),
            &QueryParams::from_serialize(params)?,
            RequestOptions::new(),
        )
        .await
    }

    async fn get_tags(&self, params: &TagListParams) -> ApiResult<Vec<Tag>> {
        self.get(
            "/tags",
            &QueryParams::from_serialize(params)?,
            RequestOptions::new(),
        )
        .await
    }

    async fn get_popular_tags(&self, params: &TagListParams) -> ApiResult<Vec<Tag>> {
        self.get(
            "/tags/popular",
            &QueryParams::from_serialize(params)?,
            RequestOptions::new(),
        )
        .await
    }

    async fn get_tag(&self, id: &str) -> ApiResult<Tag> {
        require("tag id", id)?;
        self.get(
            &format!("/tags/{}", segment(id)),
            &QueryParams::new(),
            RequestOptions::new(),
        )
        .await
    }

    async fn get_tag_videos(
        &self,
        id: &str,
        params: &CollectionVideosParams,
    ) -> ApiResult<PaginatedResponse<Video>> {
        require("tag id", id)?;
        self.get(
            &format!("/tags/{}/videos", segment(id)),
            &QueryParams::from_serialize(params)?,
            RequestOptions::new(),
        )
        .await
    }

    async fn get_video_stats(&self, id: &str) -> ApiResult<VideoStats> {
        require("video id", id)?;
        self.get(
            &format!("/videos/{}/stats", segment(id)),
            &QueryParams::new(),
            RequestOptions::new(),
        )
        .await
    }

    async fn report_video(&self, id: &str, report: &ReportVideoRequest) -> ApiResult<()> {
        require("video id", id)?;
        self.post::<IgnoredAny, _>(
            &format!("/videos/{}/report", segment(id)),
            report,
            RequestOptions::new(),
        )
        .await
        .map(|_| ())
    }

    async fn get_video_thumbnails(&self, id: &str) -> ApiResult<VideoThumbnails> {
        require("video id", id)?;
        self.get(
            &format!("/videos/{}/thumbnails", segment(id)),
            &QueryParams::new(),
            RequestOptions::new(),
        )
        .await
    }

    async fn get_video_subtitles(&self, id: &str) -> ApiResult<Vec<SubtitleTrack>> {
        require("video id", id)?;
        self.get(
            &format!("/videos/{}/subtitles", segment(id)),
            &QueryParams::new(),
            RequestOptions::new(),
        )
        .await
    }
}
