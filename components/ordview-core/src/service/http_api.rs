use std::{
    net::{IpAddr, Ipv4Addr},
    str::FromStr,
};

use crossbeam_channel::Sender;
use rocket::config::{self as rocket_config, LogLevel};
use rocket::data::{Limits, ToByteUnit};
use rocket::http::Status;
use rocket::request::{self, FromRequest, Request};
use rocket::serde::json::{json, Json, Value as JsonValue};
use rocket::{Build, Rocket, State};
use rusqlite::Connection;

use crate::{
    config::Config,
    core::{
        pipeline::{submit_payload, ProcessorCommand},
        protocol::inscription_normalizing::parse_chainhook_payload,
    },
    db::{
        open_readonly_ordview_db_conn,
        queries::{get_inscription, get_inscriptions, get_transfers, InscriptionFilters, Pagination},
    },
    ord::{inscription_id::InscriptionId, rarity::Rarity},
    try_debug, try_error, try_info, try_warn,
    utils::Context,
    OrdviewError,
};

type ApiResponse = (Status, Json<JsonValue>);

pub fn build_http_api_server(
    config: &Config,
    processor_commands_tx: Sender<ProcessorCommand>,
    ctx: &Context,
) -> Rocket<Build> {
    let log_level = match config.http_api.display_logs {
        true => LogLevel::Critical,
        false => LogLevel::Off,
    };

    let mut shutdown_config = rocket_config::Shutdown::default();
    shutdown_config.grace = 5;
    shutdown_config.mercy = 5;

    let limits = Limits::default()
        .limit("bytes", 256.mebibytes())
        .limit("json", 256.mebibytes());

    let api_config = rocket_config::Config {
        port: config.http_api.http_port,
        workers: config.http_api.workers,
        address: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
        keep_alive: 5,
        temp_dir: std::env::temp_dir().into(),
        log_level,
        limits,
        shutdown: shutdown_config,
        ..rocket_config::Config::default()
    };

    let routes = routes![
        handle_ping,
        handle_chainhook_payload,
        handle_get_inscriptions,
        handle_get_inscription,
        handle_get_inscription_transfers,
    ];

    rocket::custom(api_config)
        .manage(config.clone())
        .manage(processor_commands_tx)
        .manage(ctx.clone())
        .mount("/", routes)
}

pub async fn start_http_api_server(
    config: &Config,
    processor_commands_tx: Sender<ProcessorCommand>,
    ctx: &Context,
) -> Result<(), String> {
    let ignite = build_http_api_server(config, processor_commands_tx, ctx)
        .ignite()
        .await
        .map_err(|e| format!("unable to ignite http server: {e}"))?;
    try_info!(
        ctx,
        "Listening for chainhook payloads and queries on port {}",
        config.http_api.http_port
    );
    let _ = ignite
        .launch()
        .await
        .map_err(|e| format!("http server stopped: {e}"))?;
    Ok(())
}

/// Bearer token the chainhook node was registered with. An empty configured
/// token disables the check.
pub struct ChainhookAuthorization;

#[rocket::async_trait]
impl<'r> FromRequest<'r> for ChainhookAuthorization {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let Some(config) = req.rocket().state::<Config>() else {
            return request::Outcome::Error((Status::InternalServerError, ()));
        };
        let expected_token = &config.chainhook.node_auth_token;
        if expected_token.is_empty() {
            return request::Outcome::Success(ChainhookAuthorization);
        }
        match req.headers().get_one("Authorization") {
            Some(header) if header == format!("Bearer {expected_token}") => {
                request::Outcome::Success(ChainhookAuthorization)
            }
            _ => request::Outcome::Error((Status::Unauthorized, ())),
        }
    }
}

fn error_response(e: &OrdviewError) -> ApiResponse {
    let status = Status::from_code(e.http_status_code()).unwrap_or(Status::InternalServerError);
    (
        status,
        Json(json!({
            "status": status.code,
            "error": e.to_string(),
        })),
    )
}

fn bad_request(error: String) -> ApiResponse {
    (
        Status::BadRequest,
        Json(json!({
            "status": 400,
            "error": error,
        })),
    )
}

/// Ids are stored lower-cased and without `0x`, as ingestion normalizes them.
fn normalize_genesis_id(raw: &str) -> Result<String, ApiResponse> {
    InscriptionId::from_str(raw)
        .map(|id| id.to_string())
        .map_err(|e| bad_request(format!("invalid inscription id {raw}: {e}")))
}

fn open_reader(config: &Config, ctx: &Context) -> Result<Connection, ApiResponse> {
    open_readonly_ordview_db_conn(&config.expected_cache_path(), ctx).map_err(|e| {
        try_error!(ctx, "Unable to open database: {}", e);
        error_response(&OrdviewError::Storage(e))
    })
}

#[get("/ping")]
fn handle_ping(ctx: &State<Context>) -> Json<JsonValue> {
    try_debug!(ctx, "Handling HTTP GET /ping");
    Json(json!({
        "status": 200,
        "result": "ordview service up and running",
    }))
}

#[post("/chainhook/<predicate_uuid>", data = "<body>")]
async fn handle_chainhook_payload(
    predicate_uuid: &str,
    _authorization: ChainhookAuthorization,
    body: Vec<u8>,
    config: &State<Config>,
    processor_commands_tx: &State<Sender<ProcessorCommand>>,
    ctx: &State<Context>,
) -> ApiResponse {
    try_info!(ctx, "Handling HTTP POST /chainhook/{}", predicate_uuid);
    if predicate_uuid != config.chainhook.predicate_uuid {
        return (
            Status::NotFound,
            Json(json!({
                "status": 404,
                "error": format!("unknown predicate {predicate_uuid}"),
            })),
        );
    }

    let payload = match parse_chainhook_payload(&body) {
        Ok(payload) => payload,
        Err(e) => {
            try_warn!(ctx, "Rejecting chainhook payload: {}", e.to_string());
            return error_response(&e);
        }
    };

    let commands_tx = processor_commands_tx.inner().clone();
    let result =
        rocket::tokio::task::spawn_blocking(move || submit_payload(&commands_tx, payload)).await;
    match result {
        Ok(Ok(report)) => (
            Status::Ok,
            Json(json!({
                "status": 200,
                "result": report,
            })),
        ),
        Ok(Err(e)) => error_response(&e),
        Err(e) => error_response(&OrdviewError::Storage(format!(
            "chain event processing task failed: {e}"
        ))),
    }
}

#[allow(clippy::too_many_arguments)]
#[get(
    "/ordinals/v1/inscriptions?<offset>&<limit>&<genesis_id>&<number>&<genesis_block_height_from>&<genesis_block_height_to>&<mime_type>&<rarity>&<address>"
)]
fn handle_get_inscriptions(
    offset: Option<u32>,
    limit: Option<u32>,
    genesis_id: Vec<String>,
    number: Vec<i64>,
    genesis_block_height_from: Option<u64>,
    genesis_block_height_to: Option<u64>,
    mime_type: Vec<String>,
    rarity: Vec<String>,
    address: Vec<String>,
    config: &State<Config>,
    ctx: &State<Context>,
) -> ApiResponse {
    try_debug!(ctx, "Handling HTTP GET /ordinals/v1/inscriptions");
    let mut rarities = vec![];
    for value in rarity.iter() {
        match Rarity::from_str(value) {
            Ok(parsed) => rarities.push(parsed.as_str().to_string()),
            Err(e) => return bad_request(e),
        }
    }
    let mut genesis_ids = vec![];
    for value in genesis_id.iter() {
        match normalize_genesis_id(value) {
            Ok(normalized) => genesis_ids.push(normalized),
            Err(response) => return response,
        }
    }
    let filters = InscriptionFilters {
        genesis_id: genesis_ids,
        number,
        genesis_block_height_from,
        genesis_block_height_to,
        mime_type,
        rarity: rarities,
        address,
    };

    let conn = match open_reader(config, ctx) {
        Ok(conn) => conn,
        Err(response) => return response,
    };
    match get_inscriptions(&Pagination::new(limit, offset), &filters, &conn) {
        Ok(page) => (Status::Ok, Json(json!(page))),
        Err(e) => error_response(&e),
    }
}

#[get("/ordinals/v1/inscriptions/<genesis_id>")]
fn handle_get_inscription(
    genesis_id: &str,
    config: &State<Config>,
    ctx: &State<Context>,
) -> ApiResponse {
    try_debug!(ctx, "Handling HTTP GET /ordinals/v1/inscriptions/{}", genesis_id);
    let genesis_id = match normalize_genesis_id(genesis_id) {
        Ok(genesis_id) => genesis_id,
        Err(response) => return response,
    };
    let conn = match open_reader(config, ctx) {
        Ok(conn) => conn,
        Err(response) => return response,
    };
    match get_inscription(&genesis_id, &conn) {
        Ok(Some(inscription)) => (Status::Ok, Json(json!(inscription))),
        Ok(None) => error_response(&OrdviewError::NotFound(format!(
            "inscription {genesis_id}"
        ))),
        Err(e) => error_response(&e),
    }
}

#[get("/ordinals/v1/inscriptions/<genesis_id>/transfers?<offset>&<limit>")]
fn handle_get_inscription_transfers(
    genesis_id: &str,
    offset: Option<u32>,
    limit: Option<u32>,
    config: &State<Config>,
    ctx: &State<Context>,
) -> ApiResponse {
    try_debug!(
        ctx,
        "Handling HTTP GET /ordinals/v1/inscriptions/{}/transfers",
        genesis_id
    );
    let genesis_id = match normalize_genesis_id(genesis_id) {
        Ok(genesis_id) => genesis_id,
        Err(response) => return response,
    };
    let conn = match open_reader(config, ctx) {
        Ok(conn) => conn,
        Err(response) => return response,
    };
    match get_transfers(&genesis_id, &Pagination::new(limit, offset), &conn) {
        Ok(page) => (Status::Ok, Json(json!(page))),
        Err(e) => error_response(&e),
    }
}
