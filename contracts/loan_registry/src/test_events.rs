extern crate std;

use collateral_nft::{CollateralNft, CollateralNftClient};
use soroban_sdk::{
    symbol_short,
    testutils::{Address as _, Events},
    token, vec, Address, Env, IntoVal, TryIntoVal,
};

use crate::events::{LoanCollateralized, LoanRepaid, LoanRequested, ReserveFunded};
use crate::{LoanRegistry, LoanRegistryClient};

fn setup() -> (
    Env,
    LoanRegistryClient<'static>,
    token::StellarAssetClient<'static>,
    CollateralNftClient<'static>,
    Address,
) {
    let env = Env::default();
    env.mock_all_auths();

    let admin = Address::generate(&env);
    let token_addr = env.register_stellar_asset_contract_v2(admin.clone());
    let token_sac = token::StellarAssetClient::new(&env, &token_addr.address());

    let nft = CollateralNftClient::new(&env, &env.register(CollateralNft, ()));
    nft.init(&admin);

    let registry = LoanRegistryClient::new(&env, &env.register(LoanRegistry, ()));
    registry.init(&admin, &token_addr.address(), &nft.address);

    (env, registry, token_sac, nft, admin)
}

#[test]
fn test_reserve_funded_event() {
    let (env, client, token_sac, _nft, admin) = setup();
    token_sac.mint(&admin, &10_000);

    client.fund_reserve(&admin, &10_000);

    let all_events = env.events().all();
    let last_event = all_events.last().expect("No events found");

    assert_eq!(last_event.0, client.address);
    let expected_topics = vec![&env, symbol_short!("funded").into_val(&env)];
    assert_eq!(last_event.1, expected_topics);

    let event_data: ReserveFunded = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(
        event_data,
        ReserveFunded {
            funder: admin,
            amount: 10_000,
        }
    );
}

#[test]
fn test_loan_requested_event() {
    let (env, client, token_sac, _nft, _admin) = setup();
    let borrower = Address::generate(&env);
    token_sac.mint(&client.address, &10_000);

    let loan_id = client.request_loan(&borrower, &1_000, &5, &3_600);

    let all_events = env.events().all();
    let last_event = all_events.last().expect("No events found");

    // Topic: (symbol_short!("requested"), loan_id)
    assert_eq!(last_event.0, client.address);
    let expected_topics = vec![
        &env,
        symbol_short!("requested").into_val(&env),
        loan_id.into_val(&env),
    ];
    assert_eq!(last_event.1, expected_topics);

    let event_data: LoanRequested = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(
        event_data,
        LoanRequested {
            loan_id,
            borrower,
            amount: 1_000,
            interest_rate: 5,
            duration: 3_600,
        }
    );
}

#[test]
fn test_loan_collateralized_event() {
    let (env, client, token_sac, nft, admin) = setup();
    let borrower = Address::generate(&env);
    token_sac.mint(&client.address, &10_000);
    nft.mint(&admin, &borrower, &4);

    let loan_id = client.request_loan(&borrower, &1_000, &5, &3_600);
    client.collateralize_nft(&borrower, &loan_id, &4);

    let all_events = env.events().all();
    let last_event = all_events.last().expect("No events found");

    // Topic: (symbol_short!("collat"), loan_id)
    assert_eq!(last_event.0, client.address);
    let expected_topics = vec![
        &env,
        symbol_short!("collat").into_val(&env),
        loan_id.into_val(&env),
    ];
    assert_eq!(last_event.1, expected_topics);

    let event_data: LoanCollateralized = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(
        event_data,
        LoanCollateralized {
            loan_id,
            borrower,
            collection: nft.address.clone(),
            token_id: 4,
        }
    );
}

#[test]
fn test_loan_repaid_event() {
    let (env, client, token_sac, nft, admin) = setup();
    let borrower = Address::generate(&env);
    token_sac.mint(&client.address, &10_000);
    token_sac.mint(&borrower, &100);
    nft.mint(&admin, &borrower, &4);

    let loan_id = client.request_loan(&borrower, &2_000, &5, &3_600);
    client.collateralize_nft(&borrower, &loan_id, &4);
    client.repay_loan(&borrower, &loan_id);

    let all_events = env.events().all();
    let last_event = all_events.last().expect("No events found");

    // Topic: (symbol_short!("repaid"), loan_id)
    assert_eq!(last_event.0, client.address);
    let expected_topics = vec![
        &env,
        symbol_short!("repaid").into_val(&env),
        loan_id.into_val(&env),
    ];
    assert_eq!(last_event.1, expected_topics);

    let event_data: LoanRepaid = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(
        event_data,
        LoanRepaid {
            loan_id,
            borrower,
            amount: 2_100,
            token_id: 4,
        }
    );
}
