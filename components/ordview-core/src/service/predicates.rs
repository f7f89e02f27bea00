use reqwest::Client as HttpClient;
use serde_json::{json, Value as JsonValue};

use crate::{config::Config, try_info, try_warn, utils::Context};

/// `inscription_feed` predicate whose `http_post` action points back at our
/// `/chainhook/<uuid>` endpoint.
pub fn build_inscription_feed_predicate(config: &Config) -> JsonValue {
    let network = config.network.as_str();
    json!({
        "uuid": config.chainhook.predicate_uuid,
        "name": "ordview",
        "version": 1,
        "chain": "bitcoin",
        "networks": {
            network: {
                "start_block": config.network.first_inscription_height(),
                "if_this": {
                    "scope": "ordinals_protocol",
                    "operation": "inscription_feed",
                },
                "then_that": {
                    "http_post": {
                        "url": config.chainhook_ingestion_url(),
                        "authorization_header": format!("Bearer {}", config.chainhook.node_auth_token),
                    }
                }
            }
        }
    })
}

pub async fn register_inscription_feed_predicate(
    config: &Config,
    ctx: &Context,
) -> Result<(), String> {
    let predicate = build_inscription_feed_predicate(config);
    let url = format!(
        "{}/v1/chainhooks",
        config.chainhook.node_rpc_url.trim_end_matches('/')
    );
    let http_client = HttpClient::builder()
        .timeout(std::time::Duration::from_secs(15))
        .build()
        .map_err(|e| format!("unable to build http client: {e}"))?;

    let res = http_client
        .post(&url)
        .header("Content-Type", "application/json")
        .json(&predicate)
        .send()
        .await
        .map_err(|e| format!("unable to reach chainhook node at {url}: {e}"))?;

    if !res.status().is_success() {
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        return Err(format!(
            "chainhook node rejected predicate ({status}): {body}"
        ));
    }

    try_info!(
        ctx,
        "Predicate {} registered, chainhook node will post to {}",
        config.chainhook.predicate_uuid,
        config.chainhook_ingestion_url()
    );
    Ok(())
}

/// Registration failures leave the service running; the node can be pointed
/// at the endpoint manually.
pub async fn try_register_inscription_feed_predicate(config: &Config, ctx: &Context) {
    if let Err(e) = register_inscription_feed_predicate(config, ctx).await {
        try_warn!(ctx, "Unable to register predicate: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::build_inscription_feed_predicate;
    use crate::config::Config;

    #[test]
    fn predicate_targets_ingestion_endpoint() {
        let mut config = Config::mainnet_default();
        config.chainhook.predicate_uuid = "ordview-test".into();
        config.chainhook.node_auth_token = "token".into();
        config.chainhook.external_base_url = "http://ordview.local:20455/".into();

        let predicate = build_inscription_feed_predicate(&config);
        let network = &predicate["networks"]["mainnet"];
        assert_eq!(predicate["uuid"], "ordview-test");
        assert_eq!(network["start_block"], 767430);
        assert_eq!(network["if_this"]["operation"], "inscription_feed");
        assert_eq!(
            network["then_that"]["http_post"]["url"],
            "http://ordview.local:20455/chainhook/ordview-test"
        );
        assert_eq!(
            network["then_that"]["http_post"]["authorization_header"],
            "Bearer token"
        );
    }
}
