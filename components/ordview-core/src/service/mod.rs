pub mod http_api;
pub mod predicates;

use crate::config::Config;
use crate::core::pipeline::processors::chain_event_processing::start_chain_event_processor;
use crate::db::{get_db_stats, initialize_ordview_db};
use crate::service::http_api::start_http_api_server;
use crate::service::predicates::try_register_inscription_feed_predicate;
use crate::utils::Context;

pub struct Service {
    pub config: Config,
    pub ctx: Context,
}

impl Service {
    pub fn new(config: Config, ctx: Context) -> Self {
        Self { config, ctx }
    }

    /// Serves chainhook ingestion and the read API until the HTTP server shuts down.
    pub async fn run(&mut self) -> Result<(), String> {
        let conn = initialize_ordview_db(Some(&self.config.expected_cache_path()), &self.ctx)?;
        match get_db_stats(&conn) {
            Ok(stats) => info!(
                self.ctx.expect_logger(),
                "Database ready at {}: {} inscriptions, {} locations ({} unlinked)",
                self.config.expected_db_file_path().display(),
                stats.inscriptions,
                stats.locations,
                stats.unlinked_locations
            ),
            Err(e) => return Err(format!("unable to read database: {e}")),
        }
        drop(conn);

        let processor = start_chain_event_processor(&self.config, &self.ctx)?;

        if self.config.chainhook.auto_predicate_registration {
            try_register_inscription_feed_predicate(&self.config, &self.ctx).await;
        } else {
            info!(
                self.ctx.expect_logger(),
                "Predicate registration disabled, expecting chainhook payloads on {}",
                self.config.chainhook_ingestion_url()
            );
        }

        let result =
            start_http_api_server(&self.config, processor.commands_tx.clone(), &self.ctx).await;
        processor.terminate();
        info!(self.ctx.expect_logger(), "Service stopped");
        result
    }
}
