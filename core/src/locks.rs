//! Advisory per-site leases so only one consolidation runs per site.

use dashmap::DashSet;
use log::warn;

use crate::error::OpsError;
use crate::models::SiteId;

#[derive(Debug, Default)]
pub struct SiteLeases {
    held: DashSet<SiteId>,
}

impl SiteLeases {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, site_id: &SiteId) -> Result<SiteLease<'_>, OpsError> {
        if !self.held.insert(site_id.clone()) {
            warn!("lease for site {site_id} is already held");
            return Err(OpsError::SiteBusy(site_id.clone()));
        }
        Ok(SiteLease {
            leases: self,
            site_id: site_id.clone(),
        })
    }

    pub fn is_held(&self, site_id: &SiteId) -> bool {
        self.held.contains(site_id)
    }
}

/// Released on drop.
#[derive(Debug)]
pub struct SiteLease<'a> {
    leases: &'a SiteLeases,
    site_id: SiteId,
}

impl SiteLease<'_> {
    pub fn site_id(&self) -> &SiteId {
        &self.site_id
    }
}

impl Drop for SiteLease<'_> {
    fn drop(&mut self) {
        self.leases.held.remove(&self.site_id);
    }
}
