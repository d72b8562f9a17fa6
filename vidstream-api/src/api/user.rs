use crate::api::{require, segment};
use crate::client::{Client, RequestOptions};
use crate::error::{ApiError, ApiResult};
use crate::models::common::{LikeToggle, PageParams, PaginatedResponse};
use crate::models::user::*;
use crate::query::QueryParams;
use async_trait::async_trait;
use serde::de::IgnoredAny;

/// Personal data API methods: history, favorites, likes, ratings and comments
#[async_trait]
pub trait UserApi {
    async fn get_play_history(
        &self,
        params: &PlayHistoryParams,
    ) -> ApiResult<PaginatedResponse<PlayHistory>>;

    /// Record the playback position of a video
    async fn update_play_history(&self, request: &UpdatePlayHistoryRequest) -> ApiResult<()>;

    async fn delete_play_history(&self, history_id: &str) -> ApiResult<()>;

    async fn clear_play_history(&self) -> ApiResult<()>;

    async fn get_play_progress(&self, video_id: &str) -> ApiResult<PlayProgress>;

    async fn get_favorites(&self, params: &FavoriteParams) -> ApiResult<PaginatedResponse<Favorite>>;

    /// Add a video to the favorites, or remove it if already there
    async fn toggle_favorite(&self, request: &CreateFavoriteRequest) -> ApiResult<FavoriteToggle>;

    async fn check_favorite_status(&self, video_id: &str) -> ApiResult<FavoriteStatus>;

    async fn move_favorite(&self, favorite_id: &str, folder_id: &str) -> ApiResult<()>;

    /// Delete several favorites at once; `favorite_ids` must not be empty
    async fn delete_favorites(&self, favorite_ids: &[String]) -> ApiResult<()>;

    async fn get_favorite_folders(&self) -> ApiResult<Vec<FavoriteFolder>>;

    async fn create_favorite_folder(&self, request: &CreateFolderRequest)
        -> ApiResult<FavoriteFolder>;

    async fn update_favorite_folder(
        &self,
        folder_id: &str,
        request: &UpdateFolderRequest,
    ) -> ApiResult<FavoriteFolder>;

    async fn delete_favorite_folder(&self, folder_id: &str) -> ApiResult<()>;

    async fn toggle_like(&self, video_id: &str) -> ApiResult<LikeToggle>;

    async fn check_like_status(&self, video_id: &str) -> ApiResult<LikeStatus>;

    async fn get_liked_videos(&self, params: &PageParams)
        -> ApiResult<PaginatedResponse<LikedVideo>>;

    /// Rate a video from 1 to 5
    async fn rate_video(&self, video_id: &str, rating: u8) -> ApiResult<RatingResult>;

    async fn get_user_rating(&self, video_id: &str) -> ApiResult<UserRating>;

    async fn get_video_comments(&self, params: &CommentParams) -> ApiResult<PaginatedResponse<Comment>>;

    async fn create_comment(&self, request: &CreateCommentRequest) -> ApiResult<Comment>;

    async fn delete_comment(&self, comment_id: &str) -> ApiResult<()>;

    async fn toggle_comment_like(&self, comment_id: &str) -> ApiResult<LikeToggle>;

    async fn get_user_stats(&self) -> ApiResult<UserStats>;

    /// Activity feed of the current user
    async fn get_user_timeline(
        &self,
        params: &TimelineParams,
    ) -> ApiResult<PaginatedResponse<TimelineEntry>>;
}

#[async_trait]
impl UserApi for Client {
    async fn get_play_history(
        &self,
        params: &PlayHistoryParams,
    ) -> ApiResult<PaginatedResponse<PlayHistory>> {
        self.get(
            "/user/history",
            &QueryParams::from_serialize(params)?,
            RequestOptions::new(),
        )
        .await
    }

    async fn update_play_history(&self, request: &UpdatePlayHistoryRequest) -> ApiResult<()> {
        require("video id", &request.video_id)?;
        if !request.position.is_finite() || request.position < 0.0 {
            return Err(ApiError::validation("position", "must be a non-negative number"));
        }
        self.post::<IgnoredAny, _>("/user/history", request, RequestOptions::new())
            .await
            .map(|_| ())
    }

    async fn delete_play_history(&self, history_id: &str) -> ApiResult<()> {
        require("history id", history_id)?;
        self.delete::<IgnoredAny>(
            &format!("/user/history/{}", segment(history_id)),
            RequestOptions::new(),
        )
        .await
        .map(|_| ())
    }

    async fn clear_play_history(&self) -> ApiResult<()> {
        self.delete::<IgnoredAny>("/user/history", RequestOptions::new())
            .await
            .map(|_| ())
    }

    async fn get_play_progress(&self, video_id: &str) -> ApiResult<PlayProgress> {
        require("video id", video_id)?;
        self.get(
            &format!("/user/history/{}/progress", segment(video_id)),
            &QueryParams::new(),
            RequestOptions::new(),
        )
        .await
    }

    async fn get_favorites(&self, params: &FavoriteParams) -> ApiResult<PaginatedResponse<Favorite>> {
        self.get(
            "/user/favorites",
            &QueryParams::from_serialize(params)?,
            RequestOptions::new(),
        )
        .await
    }

    async fn toggle_favorite(&self, request: &CreateFavoriteRequest) -> ApiResult<FavoriteToggle> {
        require("video id", &request.video_id)?;
        self.post("/user/favorites", request, RequestOptions::new())
            .await
    }

    async fn check_favorite_status(&self, video_id: &str) -> ApiResult<FavoriteStatus> {
        require("video id", video_id)?;
        self.get(
            &format!("/user/favorites/{}/status", segment(video_id)),
            &QueryParams::new(),
            RequestOptions::new(),
        )
        .await
    }

    async fn move_favorite(&self, favorite_id: &str, folder_id: &str) -> ApiResult<()> {
        require("favorite id", favorite_id)?;
        self.patch::<IgnoredAny, _>(
            &format!("/user/favorites/{}", segment(favorite_id)),
            &MoveFavoriteRequest { folder_id },
            RequestOptions::new(),
        )
        .await
        .map(|_| ())
    }

    async fn delete_favorites(&self, favorite_ids: &[String]) -> ApiResult<()> {
        if favorite_ids.is_empty() {
            return Err(ApiError::validation("favorite ids", "must not be empty"));
        }
        self.delete_with_body::<IgnoredAny, _>(
            "/user/favorites/batch",
            &BatchIdsRequest { ids: favorite_ids },
            RequestOptions::new(),
        )
        .await
        .map(|_| ())
    }

    async fn get_favorite_folders(&self) -> ApiResult<Vec<FavoriteFolder>> {
        self.get("/user/folders", &QueryParams::new(), RequestOptions::new())
            .await
    }

    async fn create_favorite_folder(
        &self,
        request: &CreateFolderRequest,
    ) -> ApiResult<FavoriteFolder> {
        require("folder name", request.name.trim())?;
        self.post("/user/folders", request, RequestOptions::new())
            .await
    }

    async fn update_favorite_folder(
        &self,
        folder_id: &str,
        request: &UpdateFolderRequest,
    ) -> ApiResult<FavoriteFolder> {
        require("folder id", folder_id)?;
        self.put(
            &format!("/user/folders/{}", segment(folder_id)),
            request,
            RequestOptions::new(),
        )
        .await
    }

    async fn delete_favorite_folder(&self, folder_id: &str) -> ApiResult<()> {
        require("folder id", folder_id)?;
        self.delete::<IgnoredAny>(
            &format!("/user/folders/{}", segment(folder_id)),
            RequestOptions::new(),
        )
        .await
        .map(|_| ())
    }

    async fn toggle_like(&self, video_id: &str) -> ApiResult<LikeToggle> {
        require("video id", video_id)?;
        self.post_empty(
            &format!("/user/likes/{}", segment(video_id)),
            RequestOptions::new(),
        )
        .await
    }

    async fn check_like_status(&self, video_id: &str) -> ApiResult<LikeStatus> {
        require("video id", video_id)?;
        self.get(
            &format!("/user/likes/{}/status", segment(video_id)),
            &QueryParams::new(),
            RequestOptions::new(),
        )
        .await
    }

    async fn get_liked_videos(
        &self,
        params: &PageParams,
    ) -> ApiResult<PaginatedResponse<LikedVideo>> {
        self.get(
            "/user/likes",
            &QueryParams::from_serialize(params)?,
            RequestOptions::new(),
        )
        .await
    }

    async fn rate_video(&self, video_id: &str, rating: u8) -> ApiResult<RatingResult> {
        require("video id", video_id)?;
        if !(1..=5).contains(&rating) {
            return Err(ApiError::validation("rating", "must be between 1 and 5"));
        }
        self.post(
            &format!("/user/ratings/{}", segment(video_id)),
            &RateRequest { rating },
            RequestOptions::new(),
        )
        .await
    }

    async fn get_user_rating(&self, video_id: &str) -> ApiResult<UserRating> {
        require("video id", video_id)?;
        self.get(
            &format!("/user/ratings/{}", segment(video_id)),
            &QueryParams::new(),
            RequestOptions::new(),
        )
        .await
    }

    async fn get_video_comments(
        &self,
        params: &CommentParams,
    ) -> ApiResult<PaginatedResponse<Comment>> {
        require("video id", &params.video_id)?;
        self.get(
            "/comments",
            &QueryParams::from_serialize(params)?,
            RequestOptions::new(),
        )
        .await
    }

    async fn create_comment(&self, request: &CreateCommentRequest) -> ApiResult<Comment> {
        require("video id", &request.video_id)?;
        require("comment", request.content.trim())?;
        self.post("/comments", request, RequestOptions::new())
            .await
    }

    async fn delete_comment(&self, comment_id: &str) -> ApiResult<()> {
        require("comment id", comment_id)?;
        self.delete::<IgnoredAny>(
            &format!("/comments/{}", segment(comment_id)),
            RequestOptions::new(),
        )
        .await
        .map(|_| ())
    }

    async fn toggle_comment_like(&self, comment_id: &str) -> ApiResult<LikeToggle> {
        require("comment id", comment_id)?;
        self.post_empty(
            &format!("/comments/{}/like", segment(comment_id)),
            RequestOptions::new(),
        )
        .await
    }

    async fn get_user_stats(&self) -> ApiResult<UserStats> {
        self.get("/user/stats", &QueryParams::new(), RequestOptions::new())
            .await
    }

    async fn get_user_timeline(
        &self,
        params: &TimelineParams,
    ) -> ApiResult<PaginatedResponse<TimelineEntry>> {
        self.get(
            "/user/timeline",
            &QueryParams::from_serialize(params)?,
            RequestOptions::new(),
        )
        .await
    }
}
