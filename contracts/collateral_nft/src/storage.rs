//! # Storage
//!
//! | Key            | Tier       | Type      | Description             |
//! |----------------|------------|-----------|-------------------------|
//! | `Admin`        | Instance   | `Address` | Minting authority       |
//! | `Owner(id)`    | Persistent | `Address` | Current custodian       |
//! | `Balance(addr)`| Persistent | `u32`     | Tokens held by `addr`   |

use soroban_sdk::{contracttype, Address, Env};

const DAY_IN_LEDGERS: u32 = 17_280;

const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = DAY_IN_LEDGERS;

const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 7 * DAY_IN_LEDGERS;

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    Admin,
    Owner(u32),
    Balance(Address),
}

fn bump_persistent(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

pub fn get_admin(env: &Env) -> Option<Address> {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
    env.storage().instance().get(&DataKey::Admin)
}

pub fn set_admin(env: &Env, admin: &Address) {
    env.storage().instance().set(&DataKey::Admin, admin);
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

pub fn get_owner(env: &Env, token_id: u32) -> Option<Address> {
    let key = DataKey::Owner(token_id);
    let owner = env.storage().persistent().get(&key);
    if owner.is_some() {
        bump_persistent(env, &key);
    }
    owner
}

pub fn get_balance(env: &Env, owner: &Address) -> u32 {
    let key = DataKey::Balance(owner.clone());
    env.storage().persistent().get(&key).unwrap_or(0)
}

/// Record `to` as the custodian of `token_id`, moving one unit of balance
/// from the previous custodian if there was one.
pub fn set_owner(env: &Env, token_id: u32, previous: Option<&Address>, to: &Address) {
    if let Some(from) = previous {
        let key = DataKey::Balance(from.clone());
        let balance = get_balance(env, from).saturating_sub(1);
        env.storage().persistent().set(&key, &balance);
        bump_persistent(env, &key);
    }

    let balance_key = DataKey::Balance(to.clone());
    let balance = get_balance(env, to).saturating_add(1);
    env.storage().persistent().set(&balance_key, &balance);
    bump_persistent(env, &balance_key);

    let owner_key = DataKey::Owner(token_id);
    env.storage().persistent().set(&owner_key, to);
    bump_persistent(env, &owner_key);
}
