//! Shared application state

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{Mutex, RwLock};

use crate::application::ports::outbound::CatalogPort;
use crate::application::services::{AdventureSession, ProposalOrchestrator};
use crate::domain::entities::MonsterCatalog;
use crate::domain::value_objects::{ProposalId, SessionId};
use crate::infrastructure::catalog::FileCatalog;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::generator::OpenAiCompatClient;

/// Shared application state for HTTP handlers
pub struct AppState {
    pub config: AppConfig,
    pub orchestrator: ProposalOrchestrator<OpenAiCompatClient>,
    /// None when the catalog failed to load; monster-dependent routes
    /// degrade instead of taking the server down
    pub catalog: Option<MonsterCatalog>,
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<AdventureSession>>>>,
    /// Proposal-id routes carry no session id; this index recovers it
    proposal_index: RwLock<HashMap<ProposalId, SessionId>>,
}

impl AppState {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let catalog = match FileCatalog::new(&config.catalog_path).load().await {
            Ok(catalog) => {
                tracing::info!(
                    monsters = catalog.monsters.len(),
                    keywords = catalog.theme_keywords.len(),
                    "Monster catalog loaded"
                );
                Some(catalog)
            }
            Err(e) => {
                tracing::warn!(
                    "Monster catalog unavailable, encounter features disabled: {e:#}"
                );
                None
            }
        };

        let generator = Arc::new(OpenAiCompatClient::new(
            &config.generator_base_url,
            &config.generator_model,
        ));
        let orchestrator = ProposalOrchestrator::new(generator, config.proposal_retry_budget);

        Ok(Self {
            config,
            orchestrator,
            catalog,
            sessions: RwLock::new(HashMap::new()),
            proposal_index: RwLock::new(HashMap::new()),
        })
    }

    pub async fn create_session(&self, title: &str) -> SessionId {
        let session = AdventureSession::new(title);
        let id = session.id;
        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(session)));
        id
    }

    pub async fn session(&self, id: SessionId) -> Option<Arc<Mutex<AdventureSession>>> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn index_proposal(&self, proposal: ProposalId, session: SessionId) {
        self.proposal_index.write().await.insert(proposal, session);
    }

    pub async fn session_for_proposal(&self, proposal: ProposalId) -> Option<SessionId> {
        self.proposal_index.read().await.get(&proposal).copied()
    }
}
