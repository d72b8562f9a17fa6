use std::time::Duration;
use vidstream_api::api::{AuthApi, SearchApi, UserApi, VideoApi};
use vidstream_api::models::search::HotKeywordsParams;
use vidstream_api::models::video::{VideoFeedParams, VideoListParams, VideoSortBy};
use vidstream_api::{batch_request, with_retry, BatchOptions, Client, ClientConfig, RetryOptions};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Create client configuration
    let config = ClientConfig::new("https://vidstream.example.com")
        .with_timeout(Duration::from_secs(30));

    let client = Client::new(config);

    // Login; tokens are stored on the client
    println!("Logging in...");
    let auth = client.login("viewer", "secret123").await?;
    println!("Logged in as: {}", auth.user.username);

    // Popular videos, retried on transient failures
    println!("\nFetching popular videos...");
    let feed = VideoFeedParams::default();
    let popular = with_retry(
        || client.get_popular_videos(&feed),
        RetryOptions::new().with_max_retries(2),
    )
    .await?;
    for video in &popular {
        println!("  {} ({} views)", video.title, video.view_count);
    }

    // Cached category list
    let categories = client
        .cache()
        .with_cache("categories", Duration::from_secs(600), || {
            client.get_categories()
        })
        .await?;
    println!("\n{} categories", categories.len());

    // Latest videos of a tag pair
    let page = client
        .get_videos(&VideoListParams {
            tags: Some(vec!["travel".into(), "food".into()]),
            sort_by: Some(VideoSortBy::Latest),
            limit: Some(10),
            ..Default::default()
        })
        .await?;
    println!("\n{} matching videos", page.total);

    // Like status of every video on the page, three at a time
    let ids: Vec<String> = page.items.iter().map(|v| v.id.clone()).collect();
    let statuses = batch_request(
        ids.iter().map(|id| {
            let client = &client;
            move || client.check_like_status(id)
        }),
        BatchOptions::new()
            .with_concurrency(3)
            .on_progress(|done, total| println!("  checked {}/{}", done, total)),
    )
    .await;
    let liked = statuses.iter().flatten().filter(|s| s.is_liked).count();
    println!("{} of them liked", liked);

    let hot = client
        .get_hot_keywords(&HotKeywordsParams::default())
        .await?;
    println!("\nTrending searches:");
    for keyword in hot {
        println!("  {} ({})", keyword.keyword, keyword.search_count);
    }

    client.logout().await?;
    println!("\nLogged out");

    Ok(())
}
