//! Application State
//!
//! Shared state across all handlers.

use std::sync::Arc;

use supplier_voice_config::Settings;
use supplier_voice_engines::{
    EngineSet, GroqClient, GroqDialogueEngine, GroqExtractionEngine, GroqTranscriptionGateway,
};
use supplier_voice_persistence::PersistenceLayer;
use supplier_voice_search::SearchOrchestrator;
use supplier_voice_session::SessionRegistry;
use supplier_voice_telephony::TelephonyClient;

use crate::sink::RedirectSink;
use crate::ServerError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration
    pub config: Arc<Settings>,
    /// Live call sessions
    pub registry: Arc<SessionRegistry>,
    /// Telephony provider client
    pub telephony: TelephonyClient,
    /// Supplier search pipeline
    pub search: Arc<SearchOrchestrator>,
    /// Optional call and search log stores
    pub persistence: Option<Arc<PersistenceLayer>>,
}

impl AppState {
    /// Wire the engines, telephony client, registry and search pipeline
    pub fn new(
        config: Settings,
        persistence: Option<PersistenceLayer>,
    ) -> Result<Self, ServerError> {
        let groq = GroqClient::new(config.groq.clone())?;
        let engines = EngineSet {
            transcription: Arc::new(GroqTranscriptionGateway::new(groq.clone())),
            dialogue: Arc::new(GroqDialogueEngine::new(groq.clone())),
            extraction: Arc::new(GroqExtractionEngine::new(groq)),
        };

        let telephony = TelephonyClient::new(config.telephony.clone())?;
        let sink = Arc::new(RedirectSink::new(
            telephony.clone(),
            config.server.public_base_url.clone(),
            config.call.recording_max_secs,
        ));
        let registry = Arc::new(SessionRegistry::new(engines, config.call.clone(), sink));
        let search = Arc::new(SearchOrchestrator::new(config.search.clone())?);

        Ok(Self {
            config: Arc::new(config),
            registry,
            telephony,
            search,
            persistence: persistence.map(Arc::new),
        })
    }
}
