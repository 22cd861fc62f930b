//! # Collateral NFT
//!
//! Minimal non-fungible collection that tracks custody of numbered assets.
//! It implements the two functions the loan registry consumes (`owner_of`,
//! `transfer`) and nothing more: no metadata, no approvals, no burning.
//!
//! Custody changes require the current owner's authorisation. When the owner
//! signs a registry call, that signature also covers the nested `transfer`
//! the registry makes to pull the asset into escrow.

#![no_std]

use soroban_sdk::{contract, contracterror, contractimpl, symbol_short, Address, Env};

mod storage;


#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    AlreadyInitialized = 1,
    NotInitialized     = 2,
    NotAuthorized      = 3,
    TokenExists        = 4,
    TokenNotFound      = 5,
    NotOwner           = 6,
}

#[contract]
pub struct CollateralNft;

#[contractimpl]
impl CollateralNft {
    /// Set the minting authority. Callable once.
    pub fn init(env: Env, admin: Address) -> Result<(), Error> {
        admin.require_auth();
        if storage::get_admin(&env).is_some() {
            return Err(Error::AlreadyInitialized);
        }
        storage::set_admin(&env, &admin);
        Ok(())
    }

    /// Create `token_id` in the custody of `to`.
    pub fn mint(env: Env, admin: Address, to: Address, token_id: u32) -> Result<(), Error> {
        admin.require_auth();
        let stored = storage::get_admin(&env).ok_or(Error::NotInitialized)?;
        if stored != admin {
            return Err(Error::NotAuthorized);
        }
        if storage::get_owner(&env, token_id).is_some() {
            return Err(Error::TokenExists);
        }

        storage::set_owner(&env, token_id, None, &to);
        env.events()
            .publish((symbol_short!("mint"), token_id), to);
        Ok(())
    }

    pub fn owner_of(env: Env, token_id: u32) -> Result<Address, Error> {
        storage::get_owner(&env, token_id).ok_or(Error::TokenNotFound)
    }

    /// Move custody of `token_id` from `from` to `to`.
    pub fn transfer(env: Env, from: Address, to: Address, token_id: u32) -> Result<(), Error> {
        from.require_auth();
        let owner = storage::get_owner(&env, token_id).ok_or(Error::TokenNotFound)?;
        if owner != from {
            return Err(Error::NotOwner);
        }

        storage::set_owner(&env, token_id, Some(&from), &to);
        env.events()
            .publish((symbol_short!("transfer"), from, to), token_id);
        Ok(())
    }

    /// Number of tokens in the custody of `owner`.
    pub fn balance(env: Env, owner: Address) -> u32 {
        storage::get_balance(&env, &owner)
    }
}
