//! In-memory directory of companies, categories and marketers

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use affilink_domain::ports::{CompanyProfile, Directory, MarketerProfile};
use affilink_domain::{CategoryId, CompanyId, MarketerId, MarketplaceError, UserId};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Entries {
    companies: HashMap<CompanyId, CompanyProfile>,
    categories: HashSet<CategoryId>,
    marketers: HashMap<MarketerId, MarketerProfile>,
}

/// Directory backed by process memory; clones share the same entries
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    entries: Arc<RwLock<Entries>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a company with a fresh owning user
    pub async fn add_company(&self, is_verified: bool) -> CompanyProfile {
        let company = CompanyProfile {
            id: CompanyId::new(),
            user_id: UserId::new(),
            is_verified,
        };
        self.entries
            .write()
            .await
            .companies
            .insert(company.id, company.clone());
        company
    }

    pub async fn add_category(&self) -> CategoryId {
        let id = CategoryId::new();
        self.entries.write().await.categories.insert(id);
        id
    }

    /// Register a marketer with a fresh owning user
    pub async fn add_marketer(&self) -> MarketerProfile {
        let marketer = MarketerProfile {
            id: MarketerId::new(),
            user_id: UserId::new(),
        };
        self.entries
            .write()
            .await
            .marketers
            .insert(marketer.id, marketer.clone());
        marketer
    }
}

impl Directory for InMemoryDirectory {
    fn company(
        &self,
        id: CompanyId,
    ) -> impl Future<Output = Result<Option<CompanyProfile>, MarketplaceError>> + Send {
        let entries = self.entries.clone();
        async move { Ok(entries.read().await.companies.get(&id).cloned()) }
    }

    fn category_exists(
        &self,
        id: CategoryId,
    ) -> impl Future<Output = Result<bool, MarketplaceError>> + Send {
        let entries = self.entries.clone();
        async move { Ok(entries.read().await.categories.contains(&id)) }
    }

    fn marketer(
        &self,
        id: MarketerId,
    ) -> impl Future<Output = Result<Option<MarketerProfile>, MarketplaceError>> + Send {
        let entries = self.entries.clone();
        async move { Ok(entries.read().await.marketers.get(&id).cloned()) }
    }
}
