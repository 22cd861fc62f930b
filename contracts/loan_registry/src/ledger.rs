//! # Ledger adapter
//!
//! Value movement on behalf of the registry. The fungible leg goes through the
//! standard Soroban token interface; the non-fungible leg goes through any
//! collection contract implementing [`CollateralInterface`].
//!
//! Both helpers use the fallible `try_` client calls so a failing transfer
//! surfaces as `Error::TransferFailed` instead of trapping. Returning that
//! error from an entry point makes the host roll back every effect of the
//! invocation, including transfers that already succeeded.

use soroban_sdk::{contractclient, token, Address, Env};

use crate::Error;

/// Custody interface a collateral collection must expose. The registry
/// only ever moves assets; ownership is enforced by the collection itself.
#[contractclient(name = "CollateralClient")]
pub trait CollateralInterface {
    /// Move custody of `token_id` from `from` to `to`. `from` must authorise.
    fn transfer(env: Env, from: Address, to: Address, token_id: u32);
}

/// Move `amount` of the fungible `token` from `from` to `to`.
pub fn transfer_fungible(
    env: &Env,
    token: &Address,
    from: &Address,
    to: &Address,
    amount: i128,
) -> Result<(), Error> {
    let client = token::Client::new(env, token);
    match client.try_transfer(from, to, &amount) {
        Ok(Ok(())) => Ok(()),
        _ => Err(Error::TransferFailed),
    }
}

/// Move custody of `token_id` in `collection` from `from` to `to`.
pub fn transfer_asset(
    env: &Env,
    collection: &Address,
    from: &Address,
    to: &Address,
    token_id: u32,
) -> Result<(), Error> {
    let client = CollateralClient::new(env, collection);
    match client.try_transfer(from, to, &token_id) {
        Ok(Ok(())) => Ok(()),
        _ => Err(Error::TransferFailed),
    }
}

/// Fungible balance held by `owner`.
pub fn fungible_balance(env: &Env, token: &Address, owner: &Address) -> i128 {
    token::Client::new(env, token).balance(owner)
}
