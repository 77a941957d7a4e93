//! Database model for fund registry entries.

use diesel::prelude::*;

use fundlens_core::funds::Fund;

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = crate::schema::funds)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FundDB {
    pub fund_id: String,
    pub fund_id_of_master: Option<String>,
    pub name: String,
    pub category: String,
    pub tier: String,
}

impl From<Fund> for FundDB {
    fn from(fund: Fund) -> Self {
        Self {
            fund_id: fund.fund_id,
            fund_id_of_master: fund.master_fund_id,
            name: fund.name,
            category: fund.category,
            tier: fund.tier,
        }
    }
}

impl From<FundDB> for Fund {
    fn from(db: FundDB) -> Self {
        Self {
            fund_id: db.fund_id,
            master_fund_id: db.fund_id_of_master,
            name: db.name,
            category: db.category,
            tier: db.tier,
        }
    }
}
