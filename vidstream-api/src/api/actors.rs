use crate::api::{require, segment};
use crate::client::{Client, RequestOptions};
use crate::error::ApiResult;
use crate::models::actor::*;
use crate::models::common::PaginatedResponse;
use crate::models::video::{CollectionVideosParams, Video};
use crate::query::QueryParams;
use async_trait::async_trait;
use serde::de::IgnoredAny;

/// Actor API methods
#[async_trait]
pub trait ActorApi {
    async fn get_actors(&self, params: &ActorListParams) -> ApiResult<PaginatedResponse<Actor>>;

    async fn get_actor(&self, id: &str) -> ApiResult<ActorDetail>;

    /// Look up an actor by URL slug
    async fn get_actor_by_slug(&self, slug: &str) -> ApiResult<ActorDetail>;

    async fn get_popular_actors(&self, params: &PopularActorsParams) -> ApiResult<Vec<Actor>>;

    /// Actors who debuted recently
    async fn get_new_actors(&self, params: &NewActorsParams) -> ApiResult<Vec<Actor>>;

    async fn get_actor_videos(
        &self,
        actor_id: &str,
        params: &CollectionVideosParams,
    ) -> ApiResult<PaginatedResponse<Video>>;

    async fn get_actor_collaborators(
        &self,
        actor_id: &str,
        params: &CollaboratorsParams,
    ) -> ApiResult<Vec<ActorCollaboration>>;

    async fn get_similar_actors(
        &self,
        actor_id: &str,
        params: &SimilarActorsParams,
    ) -> ApiResult<Vec<Actor>>;

    /// Search actors by keyword; the keyword must not be empty
    async fn search_actors(
        &self,
        request: &ActorSearchRequest,
    ) -> ApiResult<PaginatedResponse<Actor>>;

    async fn get_actor_stats(&self, actor_id: &str) -> ApiResult<ActorStats>;

    /// Follow or unfollow an actor
    async fn toggle_actor_follow(&self, actor_id: &str) -> ApiResult<FollowState>;

    async fn get_followed_actors(
        &self,
        params: &FollowedActorsParams,
    ) -> ApiResult<PaginatedResponse<Actor>>;

    async fn get_actor_follower_count(&self, actor_id: &str) -> ApiResult<FollowState>;

    /// Tag cloud over all actors
    async fn get_actor_tags(&self, params: &ActorTagsParams) -> ApiResult<Vec<ActorTagGroup>>;

    async fn get_actors_by_nationality(
        &self,
        nationality: &str,
        params: &ActorListParams,
    ) -> ApiResult<PaginatedResponse<Actor>>;

    async fn get_actor_nationalities(&self) -> ApiResult<Vec<NationalityGroup>>;

    /// Suggest a correction to an actor's profile
    async fn report_actor_info(&self, actor_id: &str, report: &ActorInfoReport) -> ApiResult<()>;
}

#[async_trait]
impl ActorApi for Client {
    async fn get_actors(&self, params: &ActorListParams) -> ApiResult<PaginatedResponse<Actor>> {
        self.get(
            "/actors",
            &QueryParams::from_serialize(params)?,
            RequestOptions::new(),
        )
        .await
    }

    async fn get_actor(&self, id: &str) -> ApiResult<ActorDetail> {
        require("actor id", id)?;
        self.get(
            &format!("/actors/{}", segment(id)),
            &QueryParams::new(),
            RequestOptions::new(),
        )
        .await
    }

    async fn get_actor_by_slug(&self, slug: &str) -> ApiResult<ActorDetail> {
        require("actor slug", slug)?;
        self.get(
            &format!("/actors/slug/{}", segment(slug)),
            &QueryParams::new(),
            RequestOptions::new(),
        )
        .await
    }

    async fn get_popular_actors(&self, params: &PopularActorsParams) -> ApiResult<Vec<Actor>> {
        self.get(
            "/actors/popular",
            &QueryParams::from_serialize(params)?,
            RequestOptions::new(),
        )
        .await
    }

    async fn get_new_actors(&self, params: &NewActorsParams) -> ApiResult<Vec<Actor>> {
        self.get(
            "/actors/new",
            &QueryParams::from_serialize(params)?,
            RequestOptions::new(),
        )
        .await
    }

    async fn get_actor_videos(
        &self,
        actor_id: &str,
        params: &CollectionVideosParams,
    ) -> ApiResult<PaginatedResponse<Video>> {
        require("actor id", actor_id)?;
        self.get(
            &format!("/actors/{}/videos", segment(actor_id)),
            &QueryParams::from_serialize(params)?,
            RequestOptions::new(),
        )
        .await
    }

    async fn get_actor_collaborators(
        &self,
        actor_id: &str,
        params: &CollaboratorsParams,
    ) -> ApiResult<Vec<ActorCollaboration>> {
        require("actor id", actor_id)?;
        self.get(
            &format!("/actors/{}/collaborators", segment(actor_id)),
            &QueryParams::from_serialize(params)?,
            RequestOptions::new(),
        )
        .await
    }

    async fn get_similar_actors(
        &self,
        actor_id: &str,
        params: &SimilarActorsParams,
    ) -> ApiResult<Vec<Actor>> {
        require("actor id", actor_id)?;
        self.get(
            &format!("/actors/{}/similar", segment(actor_id)),
            &QueryParams::from_serialize(params)?,
            RequestOptions::new(),
        )
        .await
    }

    async fn search_actors(
        &self,
        request: &ActorSearchRequest,
    ) -> ApiResult<PaginatedResponse<Actor>> {
        require("keyword", request.keyword.trim())?;
        self.get(
            "/actors/search",
            &QueryParams::from_serialize(request)?,
            RequestOptions::new(),
        )
        .await
    }

    async fn get_actor_stats(&self, actor_id: &str) -> ApiResult<ActorStats> {
        require("actor id", actor_id)?;
        self.get(
            &format!("/actors/{}/stats", segment(actor_id)),
            &QueryParams::new(),
            RequestOptions::new(),
        )
        .await
    }

    async fn toggle_actor_follow(&self, actor_id: &str) -> ApiResult<FollowState> {
        require("actor id", actor_id)?;
        self.post_empty(
            &format!("/actors/{}/follow", segment(actor_id)),
            RequestOptions::new(),
        )
        .await
    }

    async fn get_followed_actors(
        &self,
        params: &FollowedActorsParams,
    ) -> ApiResult<PaginatedResponse<Actor>> {
        self.get(
            "/actors/followed",
            &QueryParams::from_serialize(params)?,
            RequestOptions::new(),
        )
        .await
    }

    async fn get_actor_follower_count(&self, actor_id: &str) -> ApiResult<FollowState> {
        require("actor id", actor_id)?;
        self.get(
            &format!("/actors/{}/followers/count", segment(actor_id)),
            &QueryParams::new(),
            RequestOptions::new(),
        )
        .await
    }

    async fn get_actor_tags(&self, params: &ActorTagsParams) -> ApiResult<Vec<ActorTagGroup>> {
        self.get(
            "/actors/tags",
            &QueryParams::from_serialize(params)?,
            RequestOptions::new(),
        )
        .await
    }

    async fn get_actors_by_nationality(
        &self,
        nationality: &str,
        params: &ActorListParams,
    ) -> ApiResult<PaginatedResponse<Actor>> {
        require("nationality", nationality)?;
        self.get(
            &format!("/actors/nationality/{}", segment(nationality)),
            &QueryParams::from_serialize(params)?,
            RequestOptions::new(),
        )
        .await
    }

    async fn get_actor_nationalities(&self) -> ApiResult<Vec<NationalityGroup>> {
        self.get(
            "/actors/nationalities",
            &QueryParams::new(),
            RequestOptions::new(),
        )
        .await
    }

    async fn report_actor_info(&self, actor_id: &str, report: &ActorInfoReport) -> ApiResult<()> {
        require("actor id", actor_id)?;
        self.post::<IgnoredAny, _>(
            &format!("/actors/{}/report", segment(actor_id)),
            report,
            RequestOptions::new(),
        )
        .await
        .map(|_| ())
    }
}
