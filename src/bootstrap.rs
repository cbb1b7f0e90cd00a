use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_fake::*;
use crate::infra_fs::*;
use crate::infra_http::*;
use crate::infra_memory::*;
use crate::settings::Settings;
use std::sync::Arc;

/// Wire a ready-to-use auth service from settings, selecting the backend
/// for each collaborator independently.
pub fn build_auth_service(settings: &Settings) -> anyhow::Result<Arc<dyn AuthService>> {
    let store: Arc<dyn TokenStore> = match settings.storage.backend.as_str() {
        "memory" => Arc::new(MemoryTokenStore::new()),
        "fs" => Arc::new(FsTokenStore::new(&settings.storage.path)),
        other => return Err(anyhow::anyhow!("Unknown storage backend: {}", other)),
    };

    let identity: Arc<dyn IdentityClient> = match settings.identity.backend.as_str() {
        "fake" => Arc::new(FakeIdentityClient::seeded("demo@checkpoint.test")),
        "http" => Arc::new(HttpIdentityClient::try_new(
            &settings.identity,
            store.clone(),
        )?),
        other => return Err(anyhow::anyhow!("Unknown identity backend: {}", other)),
    };

    let bridge: Arc<dyn SessionBridge> = match settings.bridge.backend.as_str() {
        "fake" => Arc::new(FakeSessionBridge::new()),
        "http" => Arc::new(HttpSessionBridge::try_new(&settings.bridge)?),
        other => return Err(anyhow::anyhow!("Unknown bridge backend: {}", other)),
    };

    Ok(Arc::new(SessionAuthService::new(identity, bridge, store)))
}
