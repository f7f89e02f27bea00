use ordview::config::Config;

pub fn generate_config(config: &Config) -> String {
    let conf = format!(
        r#"[storage]
working_dir = "ordview"

# Chainhook payloads are received and inscriptions
# are served on the same port.
[http_api]
http_port = {http_port}
# workers = 4

[chainhook]
# Payloads are only accepted on /chainhook/<predicate_uuid>
predicate_uuid = "{predicate_uuid}"
# Expected in the Authorization header as "Bearer <token>".
# Leave empty to accept unauthenticated payloads.
node_auth_token = ""
# Register the inscription feed predicate on startup
auto_predicate_registration = false
node_rpc_url = "{node_rpc_url}"
# Base url the chainhook node can reach this service at
external_base_url = "{external_base_url}"

[ingestion]
# "sequence": numbers allocated locally, never reused.
# "upstream": numbers taken from the chainhook payload.
numbering = "sequence"

[network]
mode = "{network}"

[logs]
ordinals_internals = true
"#,
        http_port = config.http_api.http_port,
        predicate_uuid = config.chainhook.predicate_uuid,
        node_rpc_url = config.chainhook.node_rpc_url,
        external_base_url = config.chainhook.external_base_url,
        network = config.network,
    );
    conf
}
