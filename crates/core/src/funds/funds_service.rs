//! Fund registry service implementation.

use async_trait::async_trait;
use log::warn;
use std::sync::Arc;

use super::funds_model::{normalize_fund_id, Fund, FundRegistry};
use super::funds_traits::{FundRepositoryTrait, FundServiceTrait};
use crate::errors::Result;

pub struct FundService {
    repository: Arc<dyn FundRepositoryTrait>,
}

impl FundService {
    pub fn new(repository: Arc<dyn FundRepositoryTrait>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl FundServiceTrait for FundService {
    fn get_registry(&self) -> Result<FundRegistry> {
        let funds = self.repository.load_all()?;
        Ok(FundRegistry::new(funds))
    }

    async fn save_registry(&self, funds: Vec<Fund>) -> Result<usize> {
        self.repository.replace_all(funds).await
    }
}

/// Normalizes raw registry entries before persistence.
///
/// Entries whose fund id does not normalize are dropped with a warning;
/// master references that do not normalize are cleared, which degrades the
/// fund to a plain (non-feeder) entry.
pub fn normalize_registry(raw: Vec<Fund>) -> Vec<Fund> {
    let mut funds = Vec::with_capacity(raw.len());
    for mut fund in raw {
        let Some(id) = normalize_fund_id(&fund.fund_id) else {
            warn!("Dropping registry entry with invalid fund id {:?}", fund.fund_id);
            continue;
        };
        fund.fund_id = id;
        fund.master_fund_id = fund.master_fund_id.as_deref().and_then(normalize_fund_id);
        funds.push(fund);
    }
    funds.sort_by(|a, b| a.fund_id.cmp(&b.fund_id));
    funds.dedup_by(|a, b| a.fund_id == b.fund_id);
    funds
}
