pub mod chain_event_processing;
