use async_trait::async_trait;
use models::partition::{self, PartitionKey};
use models::{domain, tenant};
use sea_orm::{DatabaseConnection, TransactionTrait};
use uuid::Uuid;

use crate::tenancy::domain::{DomainRecord, NewTenant, TenantSummary};
use crate::tenancy::errors::TenancyError;
use crate::tenancy::repository::TenancyRepository;

pub struct SeaOrmTenancyRepository {
    pub db: DatabaseConnection,
}

fn txn_err(e: sea_orm::DbErr) -> TenancyError { TenancyError::Repository(e.to_string()) }

#[async_trait]
impl TenancyRepository for SeaOrmTenancyRepository {
    async fn find_by_hostname(&self, hostname: &str) -> Result<Option<TenantSummary>, TenancyError> {
        match domain::find_with_tenant(&self.db, hostname).await? {
            Some((_, t)) => Ok(Some(TenantSummary::try_from(t)?)),
            None => Ok(None),
        }
    }

    async fn get_tenant(&self, id: Uuid) -> Result<Option<TenantSummary>, TenancyError> {
        match tenant::find_by_id(&self.db, id).await? {
            Some(t) => Ok(Some(TenantSummary::try_from(t)?)),
            None => Ok(None),
        }
    }

    async fn primary_domain(&self, tenant_id: Uuid) -> Result<Option<DomainRecord>, TenancyError> {
        Ok(domain::primary_for_tenant(&self.db, tenant_id).await?.map(DomainRecord::from))
    }

    async fn partition_taken(&self, key: &PartitionKey) -> Result<bool, TenancyError> {
        if tenant::find_by_schema(&self.db, key).await?.is_some() {
            return Ok(true);
        }
        Ok(partition::exists(&self.db, key).await?)
    }

    async fn create_tenant(&self, new: NewTenant, owner_id: Uuid) -> Result<(TenantSummary, DomainRecord), TenancyError> {
        let txn = self.db.begin().await.map_err(txn_err)?;
        let (t, d) = tenant::create_with_domain(&txn, &new.name, &new.key, &new.hostname, owner_id).await?;
        txn.commit().await.map_err(txn_err)?;
        Ok((TenantSummary::try_from(t)?, DomainRecord::from(d)))
    }

    async fn add_domain(&self, tenant_id: Uuid, hostname: &str, is_primary: bool) -> Result<DomainRecord, TenancyError> {
        let txn = self.db.begin().await.map_err(txn_err)?;
        let d = domain::create(&txn, hostname, tenant_id, is_primary).await?;
        txn.commit().await.map_err(txn_err)?;
        Ok(DomainRecord::from(d))
    }
}
