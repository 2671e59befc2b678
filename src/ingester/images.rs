/// Token logo resolution
///
/// New-token events carry a metadata URI (usually IPFS) whose JSON holds the
/// actual image URL. Resolution walks the configured gateway chain with a
/// bounded retry per gateway. Concurrent requests for the same address share
/// one in-flight future; results (including failures) are cached so a token
/// is resolved at most once per process.
use crate::config::with_config;
use crate::logger::{self, LogTag};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell};

#[derive(Debug, Clone, Deserialize)]
struct TokenMetadataJson {
    #[serde(default)]
    image: Option<String>,
}

/// One in-flight/completed resolution per address
type ResolutionCell = Arc<OnceCell<Option<String>>>;

pub struct ImageResolver {
    client: reqwest::Client,
    cells: Mutex<HashMap<String, ResolutionCell>>,
}

static RESOLVER: Lazy<Arc<ImageResolver>> = Lazy::new(|| Arc::new(ImageResolver::new()));

pub fn get_image_resolver() -> Arc<ImageResolver> {
    RESOLVER.clone()
}

impl ImageResolver {
    fn new() -> Self {
        let timeout_ms = with_config(|cfg| cfg.images.timeout_ms);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .unwrap_or_default();

        Self {
            client,
            cells: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve the logo for a token, coalescing concurrent callers
    ///
    /// Returns the image URL on success; `None` once every gateway failed
    /// (negative results are cached too, so failed tokens are not retried).
    pub async fn prefetch_logo(&self, address: &str, metadata_uri: &str) -> Option<String> {
        let cell = {
            let mut cells = self.cells.lock().await;
            cells
                .entry(address.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let uri = metadata_uri.to_string();
        let addr = address.to_string();
        cell.get_or_init(|| async move { self.resolve(&addr, &uri).await })
            .await
            .clone()
    }

    /// Cached result, if a resolution already completed
    pub async fn cached_logo(&self, address: &str) -> Option<String> {
        let cells = self.cells.lock().await;
        cells.get(address)?.get()?.clone()
    }

    async fn resolve(&self, address: &str, metadata_uri: &str) -> Option<String> {
        let (gateways, retries) =
            with_config(|cfg| (cfg.images.gateways.clone(), cfg.images.retries_per_gateway));

        // Direct HTTP metadata URIs skip the gateway chain
        let candidates: Vec<String> = match ipfs_cid(metadata_uri) {
            Some(cid) => gateways.iter().map(|g| format!("{}{}", g, cid)).collect(),
            None => vec![metadata_uri.to_string()],
        };

        for url in &candidates {
            for attempt in 0..=retries {
                match self.fetch_image_url(url).await {
                    Ok(Some(image)) => {
                        logger::debug(
                            LogTag::Images,
                            &format!("Resolved logo for {} via {}", address, url),
                        );
                        return Some(resolve_image_url(&image, &gateways));
                    }
                    Ok(None) => break, // metadata exists but has no image
                    Err(e) => {
                        logger::debug(
                            LogTag::Images,
                            &format!(
                                "Logo fetch failed for {} (attempt {}/{}): {}",
                                address,
                                attempt + 1,
                                retries + 1,
                                e
                            ),
                        );
                    }
                }
            }
        }

        logger::warning(
            LogTag::Images,
            &format!("All gateways failed resolving logo for {}", address),
        );
        None
    }

    async fn fetch_image_url(&self, url: &str) -> Result<Option<String>, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("HTTP {}", response.status()));
        }

        let metadata: TokenMetadataJson = response
            .json()
            .await
            .map_err(|e| format!("bad metadata JSON: {}", e))?;

        Ok(metadata.image)
    }
}

/// Extract the CID path from an `ipfs://` URI or a gateway URL
fn ipfs_cid(uri: &str) -> Option<String> {
    if let Some(rest) = uri.strip_prefix("ipfs://") {
        return Some(rest.trim_start_matches('/').to_string());
    }
    if let Some(idx) = uri.find("/ipfs/") {
        return Some(uri[idx + "/ipfs/".len()..].to_string());
    }
    None
}

/// Rewrite an ipfs image reference through the first configured gateway
fn resolve_image_url(image: &str, gateways: &[String]) -> String {
    match (ipfs_cid(image), gateways.first()) {
        (Some(cid), Some(gateway)) => format!("{}{}", gateway, cid),
        _ => image.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cid_extraction() {
        assert_eq!(ipfs_cid("ipfs://QmAbc/meta.json"), Some("QmAbc/meta.json".to_string()));
        assert_eq!(
            ipfs_cid("https://ipfs.io/ipfs/QmAbc"),
            Some("QmAbc".to_string())
        );
        assert_eq!(ipfs_cid("https://example.com/meta.json"), None);
    }

    #[test]
    fn image_url_rewritten_through_gateway() {
        let gateways = vec!["https://gw.one/ipfs/".to_string()];
        assert_eq!(
            resolve_image_url("ipfs://QmImg", &gateways),
            "https://gw.one/ipfs/QmImg"
        );
        assert_eq!(
            resolve_image_url("https://cdn.example.com/logo.png", &gateways),
            "https://cdn.example.com/logo.png"
        );
    }

    #[tokio::test]
    async fn concurrent_prefetches_share_one_resolution() {
        // Unroutable gateway: every resolution fails, but the OnceCell must
        // coalesce callers and cache the negative result
        let resolver = Arc::new(ImageResolver {
            client: reqwest::Client::builder()
                .timeout(Duration::from_millis(50))
                .build()
                .unwrap(),
            cells: Mutex::new(HashMap::new()),
        });

        let mut handles = Vec::new();
        for _ in 0..5 {
            let resolver = resolver.clone();
            handles.push(tokio::spawn(async move {
                resolver
                    .prefetch_logo("Mint1", "http://127.0.0.1:1/meta.json")
                    .await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_none());
        }

        // A later call hits the cached negative result without refetching
        assert!(resolver.cached_logo("Mint1").await.is_none());
        let cells = resolver.cells.lock().await;
        assert_eq!(cells.len(), 1);
        assert!(cells.get("Mint1").unwrap().get().is_some()); // completed cell
    }
}
