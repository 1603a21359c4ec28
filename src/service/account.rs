use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::blockchain::traits::{WalletAccount, WalletConnector};
use crate::core::domain::AccountRef;
use crate::core::errors::DappError;

/// Persists the connected account address under a single fixed key.
#[async_trait]
pub trait AddressStore: Send + Sync {
    async fn load(&self) -> Result<Option<AccountRef>, DappError>;
    async fn save(&self, account: &AccountRef) -> Result<(), DappError>;
    async fn clear(&self) -> Result<(), DappError>;
}

#[derive(Debug, Default)]
pub struct MemoryAddressStore {
    slot: RwLock<Option<AccountRef>>,
}

impl MemoryAddressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AddressStore for MemoryAddressStore {
    async fn load(&self) -> Result<Option<AccountRef>, DappError> {
        Ok(self.slot.read().clone())
    }

    async fn save(&self, account: &AccountRef) -> Result<(), DappError> {
        *self.slot.write() = Some(account.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), DappError> {
        *self.slot.write() = None;
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredAddress {
    account_address: String,
}

/// JSON file holding `{"accountAddress": "..."}`. Last write wins.
#[derive(Debug, Clone)]
pub struct FileAddressStore {
    path: PathBuf,
}

impl FileAddressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl AddressStore for FileAddressStore {
    async fn load(&self) -> Result<Option<AccountRef>, DappError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let stored: StoredAddress = serde_json::from_str(&content)?;
        Ok(AccountRef::new(stored.account_address))
    }

    async fn save(&self, account: &AccountRef) -> Result<(), DappError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let body = serde_json::to_string(&StoredAddress { account_address: account.as_str().to_string() })?;
        tokio::fs::write(&self.path, body).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), DappError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Resolves the account the user acts as.
///
/// The cache belongs to this resolver instance; there is no process-wide
/// singleton. The wallet is the source of truth and a changed account
/// replaces the cached one.
pub struct AccountResolver<W: WalletConnector + ?Sized> {
    wallet: Arc<W>,
    cached: RwLock<Option<AccountRef>>,
    store: Option<Arc<dyn AddressStore>>,
}

impl<W: WalletConnector + ?Sized> AccountResolver<W> {
    pub fn new(wallet: Arc<W>) -> Self {
        Self { wallet, cached: RwLock::new(None), store: None }
    }

    pub fn with_store(mut self, store: Arc<dyn AddressStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn wallet(&self) -> &Arc<W> {
        &self.wallet
    }

    /// Last known account without touching the wallet.
    pub fn current(&self) -> Option<AccountRef> {
        self.cached.read().clone()
    }

    /// Seeds the cache from the address store, if one is configured.
    pub async fn restore(&self) -> Result<Option<AccountRef>, DappError> {
        let Some(store) = &self.store else {
            return Ok(None);
        };
        let account = store.load().await?;
        if let Some(account) = &account {
            debug!(account = %account, "Restored account from store");
            *self.cached.write() = Some(account.clone());
        }
        Ok(account)
    }

    /// Asks the wallet for the current account.
    pub async fn resolve(&self) -> Result<AccountRef, DappError> {
        let accounts = self.wallet.accounts().await?;
        self.on_accounts_changed(&accounts).await?.ok_or(DappError::NotConnected)
    }

    /// Applies a wallet account update; the first non-empty address wins.
    pub async fn on_accounts_changed(&self, accounts: &[WalletAccount]) -> Result<Option<AccountRef>, DappError> {
        let next = accounts.iter().find_map(|a| AccountRef::new(a.address.clone()));
        let previous = std::mem::replace(&mut *self.cached.write(), next.clone());

        if previous != next {
            match &next {
                Some(account) => info!(account = %account, "Connected account changed"),
                None => info!("Wallet reports no connected account"),
            }
            if let Some(store) = &self.store {
                match &next {
                    Some(account) => store.save(account).await?,
                    None => store.clear().await?,
                }
            }
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::mock::MockWallet;

    #[tokio::test]
    async fn test_resolve_not_connected() {
        let resolver = AccountResolver::new(Arc::new(MockWallet::new()));
        assert!(matches!(resolver.resolve().await, Err(DappError::NotConnected)));
    }

    #[tokio::test]
    async fn test_blank_address_is_not_connected() {
        let resolver = AccountResolver::new(Arc::new(MockWallet::with_account("  ")));
        assert!(matches!(resolver.resolve().await, Err(DappError::NotConnected)));
    }

    #[tokio::test]
    async fn test_account_change_replaces_cache_and_store() {
        let wallet = Arc::new(MockWallet::with_account("account_tdx_2_1first"));
        let store = Arc::new(MemoryAddressStore::new());
        let resolver = AccountResolver::new(wallet.clone()).with_store(store.clone());

        assert_eq!(resolver.resolve().await.unwrap().as_str(), "account_tdx_2_1first");
        wallet.set_accounts(vec![WalletAccount { address: "account_tdx_2_1second".into(), label: None }]);
        assert_eq!(resolver.resolve().await.unwrap().as_str(), "account_tdx_2_1second");
        assert_eq!(store.load().await.unwrap().unwrap().as_str(), "account_tdx_2_1second");

        resolver.on_accounts_changed(&[]).await.unwrap();
        assert!(resolver.current().is_none());
        assert!(store.load().await.unwrap().is_none());
    }
}
