use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiEndpoints {
    pub auth: String,
    pub video: String,
    pub user: String,
    pub vip: String,
    pub share: String,
    pub upload: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiSettings {
    pub base_url: String,
    /// Milliseconds
    pub timeout: u64,
    pub version: String,
    pub endpoints: ApiEndpoints,
}

/// Kind of CDN-hosted resource; each kind has its own bucket list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Video,
    #[default]
    Image,
    Audio,
    Document,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Video => "video",
            ResourceKind::Image => "image",
            ResourceKind::Audio => "audio",
            ResourceKind::Document => "document",
        }
    }
}

/// CDN bucket and domain layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CdnConfig {
    /// Bucket names per resource kind
    pub buckets: HashMap<String, Vec<String>>,
    pub domains: Vec<String>,
    pub default_bucket: String,
}

impl CdnConfig {
    /// Public URL of a resource.
    ///
    /// The bucket is picked from the sum of the path's UTF-16 code units and
    /// the domain from the bucket index, so a path always maps to the same
    /// location. Without buckets for `kind` the path is returned unchanged;
    /// without domains a root-relative URL is returned.
    pub fn resource_url(&self, path: &str, kind: ResourceKind) -> String {
        let buckets = match self.buckets.get(kind.as_str()) {
            Some(buckets) if !buckets.is_empty() => buckets,
            _ => return path.to_string(),
        };

        let sum: u64 = path.encode_utf16().map(u64::from).sum();
        let bucket_index = (sum % buckets.len() as u64) as usize;
        let bucket = &buckets[bucket_index];

        if self.domains.is_empty() {
            return format!("/{}/{}", bucket, path);
        }
        let domain = &self.domains[bucket_index % self.domains.len()];
        format!("https://{}/{}/{}", domain, bucket, path)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EncryptionSettings {
    pub image_decrypt_key: String,
    pub video_decrypt_key: String,
    pub audio_decrypt_key: String,
    pub algorithm: String,
    /// Hours
    pub key_rotation_interval: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeatureFlags {
    pub enable_vip: bool,
    pub enable_share: bool,
    pub enable_coins: bool,
    pub enable_download: bool,
    pub enable_offline: bool,
    pub enable_push: bool,
    pub enable_analytics: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BusinessSettings {
    pub max_free_videos: u32,
    pub vip_trial_days: u32,
    pub share_reward_coins: u32,
    pub invite_reward_coins: u32,
    pub coin_exchange_rate: f64,
    pub min_withdraw_amount: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SecuritySettings {
    /// Seconds
    pub token_expiry: u64,
    /// Seconds
    pub refresh_token_expiry: u64,
    pub max_login_attempts: u32,
    pub captcha_threshold: u32,
    pub allowed_domains: Vec<String>,
}

/// Site-wide configuration fetched at startup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SiteConfig {
    pub site_name: String,
    pub logo: String,
    pub domain: String,
    pub version: String,
    pub api: ApiSettings,
    pub cdn: CdnConfig,
    pub encryption: EncryptionSettings,
    pub features: FeatureFlags,
    pub business: BusinessSettings,
    /// Analytics, payment and push provider settings
    pub third_party: Value,
    pub security: SecuritySettings,
    /// Theme and layout settings
    pub ui: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptionKeys {
    pub image_key: String,
    pub video_key: String,
    pub audio_key: String,
    pub algorithm: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cdn(domains: &[&str]) -> CdnConfig {
        CdnConfig {
            buckets: HashMap::from([(
                "image".to_string(),
                vec!["b0".to_string(), "b1".to_string(), "b2".to_string()],
            )]),
            domains: domains.iter().map(|d| d.to_string()).collect(),
            default_bucket: "b0".to_string(),
        }
    }

    #[test]
    fn bucket_and_domain_follow_char_code_sum() {
        // 'a' + '.' + 'j' + 'p' + 'g' = 464; 464 % 3 = 2; 2 % 2 = 0
        let url = cdn(&["cdn0.example.com", "cdn1.example.com"])
            .resource_url("a.jpg", ResourceKind::Image);
        assert_eq!(url, "https://cdn0.example.com/b2/a.jpg");
    }

    #[test]
    fn without_domains_url_is_root_relative() {
        assert_eq!(cdn(&[]).resource_url("a.jpg", ResourceKind::Image), "/b2/a.jpg");
    }

    #[test]
    fn missing_buckets_return_path_unchanged() {
        assert_eq!(
            cdn(&["cdn0.example.com"]).resource_url("clips/1.m3u8", ResourceKind::Video),
            "clips/1.m3u8"
        );
    }

    #[test]
    fn partial_site_config_decodes_with_defaults() {
        let config: SiteConfig = serde_json::from_str(
            r#"{"siteName":"Demo","features":{"enableVip":true},"cdn":{"domains":["c.example.com"]}}"#,
        )
        .unwrap();
        assert_eq!(config.site_name, "Demo");
        assert!(config.features.enable_vip);
        assert!(!config.features.enable_share);
        assert_eq!(config.cdn.domains, vec!["c.example.com"]);
        assert!(config.third_party.is_null());
    }
}
