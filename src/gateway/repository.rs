//! Wallet queries against a registered `wallets` collection.
//!
//! Plain functions over a [`Collection`] handle; the gateway runs them on the
//! blocking pool once it is ready.

use crate::{
    database::Collection,
    error::Result,
    query::types::Query,
};

use super::wallet::Wallet;

/// Number of wallets in the collection.
pub fn count_all_documents(wallets: &Collection) -> Result<usize> {
    wallets.count()
}

/// Every wallet, ascending by name. Wallets with equal names keep insertion
/// order.
pub fn find_all_sorted_by_name(wallets: &Collection) -> Result<Vec<Wallet>> {
    wallets
        .find(&Query::all().sort_asc("name"))?
        .into_iter()
        .map(Wallet::from_document)
        .collect()
}

pub fn find_one_by_id(wallets: &Collection, id: &str) -> Result<Option<Wallet>> {
    wallets.find_one(id)?.map(Wallet::from_document).transpose()
}

/// Insert `wallet`, failing with a unique-constraint error if its id exists.
pub fn insert_wallet(wallets: &Collection, wallet: &Wallet) -> Result<Wallet> {
    let stored = wallets.insert(wallet.to_document()?)?;
    Wallet::from_document(stored)
}
