//! Per-dealership settings document.

use crate::model::settings::{GitHubCredentials, TenantSettings};
use crate::model::tenant::TenantId;
use crate::repo::collection::{load_document, save_document};
use crate::repo::slot_repo::{RepoResult, SlotKey, SlotRepository};
use log::info;

pub struct SettingsService<R: SlotRepository> {
    repo: R,
}

impl<R: SlotRepository> SettingsService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Stored settings, or defaults when none were saved yet.
    pub fn get_settings(&self, tenant: &TenantId) -> RepoResult<TenantSettings> {
        Ok(load_document(&self.repo, tenant.into(), SlotKey::Settings)?.unwrap_or_default())
    }

    /// # Side effects
    /// - Overwrites the tenant's `settings` slot.
    /// - Emits a `settings_save` logging event that records only whether
    ///   GitHub is configured, never the token.
    pub fn save_settings(&self, tenant: &TenantId, settings: &TenantSettings) -> RepoResult<()> {
        save_document(&self.repo, tenant.into(), SlotKey::Settings, settings)?;
        info!(
            "event=settings_save module=settings status=ok tenant={} github_configured={}",
            tenant,
            settings.github.is_some()
        );
        Ok(())
    }

    pub fn set_github_credentials(
        &self,
        tenant: &TenantId,
        credentials: GitHubCredentials,
    ) -> RepoResult<TenantSettings> {
        let mut settings = self.get_settings(tenant)?;
        settings.github = Some(credentials);
        self.save_settings(tenant, &settings)?;
        Ok(settings)
    }

    pub fn clear_github_credentials(&self, tenant: &TenantId) -> RepoResult<TenantSettings> {
        let mut settings = self.get_settings(tenant)?;
        settings.github = None;
        self.save_settings(tenant, &settings)?;
        Ok(settings)
    }
}
