use sch_api::{ApiClient, HttpAuthApi, HttpIncidentApi, HttpUserApi, NominatimGeocoder};
use sch_core::error::AppError;
use sch_core::store::{DraftStore, KvStore, SessionStore};
use sch_core::wizard::WizardController;

use crate::config::Config;

/// Everything a command needs: resolved configuration plus the open local store.
#[derive(Debug)]
pub struct AppContext {
    pub config: Config,
    kv: KvStore,
}

impl AppContext {
    pub fn open(config: Config) -> Result<Self, AppError> {
        let db_path = config.db_path();
        tracing::debug!(path = %db_path.display(), "opening local store");
        let kv = KvStore::open(&db_path)?;
        Ok(Self { config, kv })
    }

    #[cfg(test)]
    pub fn in_memory(config: Config) -> Result<Self, AppError> {
        Ok(Self {
            config,
            kv: KvStore::in_memory()?,
        })
    }

    pub fn sessions(&self) -> SessionStore<'_> {
        SessionStore::new(&self.kv)
    }

    pub fn drafts(&self) -> DraftStore<'_> {
        DraftStore::new(&self.kv)
    }

    pub fn wizard(&self) -> Result<WizardController<'_>, AppError> {
        WizardController::initialize(self.drafts(), self.config.wizard_config())
    }

    /// API client carrying the stored access token, if any.
    pub fn client(&self) -> Result<ApiClient, AppError> {
        let token = self.sessions().access_token()?;
        Ok(ApiClient::new(&self.config.api.base_url)?
            .with_timeout(self.config.timeout())
            .with_token(token))
    }

    pub fn incidents(&self) -> Result<HttpIncidentApi, AppError> {
        Ok(HttpIncidentApi::new(self.client()?))
    }

    pub fn auth(&self) -> Result<HttpAuthApi, AppError> {
        Ok(HttpAuthApi::new(self.client()?))
    }

    pub fn users(&self) -> Result<HttpUserApi, AppError> {
        Ok(HttpUserApi::new(self.client()?))
    }

    /// `None` when geocoding is switched off; addresses then stay as raw coordinates.
    pub fn geocoder(&self) -> Result<Option<NominatimGeocoder>, AppError> {
        if !self.config.geocoder.enabled {
            return Ok(None);
        }
        NominatimGeocoder::new(&self.config.geocoder.base_url)
            .map(|g| Some(g.with_timeout(self.config.timeout())))
    }
}
