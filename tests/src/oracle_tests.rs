use crate::fixtures::{deploy_market, tokens, REFERENCE_ANSWER};
use amt_protocol_contracts::errors::ProtocolError;
use amt_protocol_contracts::math;
use amt_protocol_contracts::oracle::{TwapUpdated, MIN_UPDATE_PERIOD};
use odra::casper_types::U256;
use odra::prelude::Addressable;
use odra::host::HostRef;
use pretty_assertions::assert_eq;

/// 10 settlement / 100 000 AMT, `PRICE_SCALE` fixed point
fn seeded_amt_price() -> U256 {
    U256::exp10(14)
}

#[test]
fn test_oracle_reads_pool_pair() {
    let market = deploy_market();
    assert_eq!(market.oracle.get_pool(), market.protocol.pool.address().clone());
    assert_eq!(market.oracle.get_token0(), Some(market.amt_address()));
    assert_eq!(market.oracle.get_token1(), Some(market.protocol.settlement.address().clone()));
    assert_eq!(market.oracle.get_owner(), Some(market.protocol.owner));
    assert_eq!(market.oracle.get_price0_average(), U256::zero());
    assert_eq!(market.oracle.consult(market.amt_address(), tokens(1)), U256::zero());

    // 100 000 AMT : 10 settlement
    assert_eq!(market.protocol.pool.quote(tokens(10_000), market.amt_address()), tokens(1));
    assert_eq!(
        market.protocol.pool.quote(tokens(1), market.protocol.settlement.address().clone()),
        tokens(10_000)
    );
}

#[test]
fn test_update_waits_for_a_full_period() {
    let mut market = deploy_market();
    let env = market.protocol.env.clone();
    env.set_caller(market.protocol.owner);

    assert_eq!(market.oracle.try_update(), Err(ProtocolError::PeriodNotElapsed.into()));
    env.advance_block_time(MIN_UPDATE_PERIOD - 1);
    assert_eq!(market.oracle.try_update(), Err(ProtocolError::PeriodNotElapsed.into()));

    env.advance_block_time(1);
    market.oracle.update();
    assert_eq!(market.oracle.try_update(), Err(ProtocolError::PeriodNotElapsed.into()));
}

#[test]
fn test_update_is_owner_only() {
    let mut market = deploy_market();
    let env = market.protocol.env.clone();
    env.advance_block_time(MIN_UPDATE_PERIOD);
    env.set_caller(market.trader);
    assert_eq!(market.oracle.try_update(), Err(ProtocolError::NotOwner.into()));
}

#[test]
fn test_twap_matches_steady_spot_price() {
    let mut market = deploy_market();
    market.update_oracle();

    let price0 = seeded_amt_price();
    let price1 = math::spot_price(tokens(10), tokens(100_000)).unwrap();
    assert_eq!(market.oracle.get_price0_average(), price0);
    assert_eq!(market.oracle.get_price1_average(), price1);
    assert_eq!(market.oracle.consult(market.amt_address(), tokens(1)), price0);
    assert_eq!(
        market.oracle.consult(market.protocol.settlement.address().clone(), tokens(1)),
        price1
    );

    let observation = market.oracle.get_observation();
    assert!(market.protocol.env.emitted_event(
        &market.oracle,
        TwapUpdated {
            price0_average: price0,
            price1_average: price1,
            timestamp: observation.timestamp,
        }
    ));
}

#[test]
fn test_twap_weights_prices_by_time() {
    let mut market = deploy_market();
    let env = market.protocol.env.clone();

    // half the period at the seeded price, half after a large sell
    env.advance_block_time(MIN_UPDATE_PERIOD / 2);
    market.sell_amt(tokens(100_000));
    let reserves = market.protocol.pool.get_reserves();
    let after_sell = math::spot_price(reserves.reserve0, reserves.reserve1).unwrap();
    env.advance_block_time(MIN_UPDATE_PERIOD / 2);

    env.set_caller(market.protocol.owner);
    market.oracle.update();
    let average = market.oracle.get_price0_average();
    assert!(average < seeded_amt_price());
    assert!(average > after_sell);
    assert_eq!(average, (seeded_amt_price() + after_sell) / U256::from(2u8));
}

#[test]
fn test_consult_rejects_foreign_token() {
    let market = deploy_market();
    assert_eq!(
        market.oracle.try_consult(market.trader, tokens(1)),
        Err(ProtocolError::InvalidToken.into())
    );
}

#[test]
fn test_reference_price_is_normalized() {
    let market = deploy_market();
    assert_eq!(market.reference_feed.decimals(), 8);
    assert_eq!(market.reference_feed.latest_answer(), U256::from(REFERENCE_ANSWER));
    assert_eq!(market.price_feeder.get_latest_reference_price(), tokens(50_000));
}

#[test]
fn test_reference_feed_is_feeder_only() {
    let mut market = deploy_market();
    let env = market.protocol.env.clone();

    env.set_caller(market.trader);
    assert_eq!(
        market.reference_feed.try_set_answer(U256::one()),
        Err(ProtocolError::NotFeeder.into())
    );

    env.set_caller(market.protocol.owner);
    assert_eq!(
        market.reference_feed.try_set_answer(U256::zero()),
        Err(ProtocolError::ReferencePriceUnavailable.into())
    );
    market.reference_feed.set_feeder(market.trader);
    env.set_caller(market.trader);
    market.reference_feed.set_answer(U256::from(4_000_000_000_000u64));
    assert_eq!(market.reference_feed.latest_round_data().round_id, 2);
    assert_eq!(market.price_feeder.get_latest_reference_price(), tokens(40_000));
}

#[test]
fn test_get_price_rejects_zero_amount() {
    let market = deploy_market();
    assert_eq!(
        market.price_feeder.try_get_price(U256::zero()),
        Err(ProtocolError::InvalidAmountIn.into())
    );
}

#[test]
fn test_overflowing_quotes_revert_instead_of_pricing_at_zero() {
    let mut market = deploy_market();
    market.update_oracle();

    let amt = market.amt_address();
    assert_eq!(
        market.protocol.pool.try_get_amount_out(U256::MAX, amt),
        Err(ProtocolError::ArithmeticOverflow.into())
    );
    assert_eq!(
        market.oracle.try_consult(amt, U256::MAX),
        Err(ProtocolError::ArithmeticOverflow.into())
    );
    assert_eq!(
        market.price_feeder.try_get_price(U256::MAX),
        Err(ProtocolError::ArithmeticOverflow.into())
    );
}

#[test]
fn test_get_price_without_pressure_uses_spot_quote() {
    let mut market = deploy_market();
    market.update_oracle();

    let amt = market.amt_address();
    let spot_quote = market.protocol.pool.get_amount_out(tokens(1), amt);
    assert!(spot_quote < market.oracle.consult(amt, tokens(1)));
    assert_eq!(
        market.price_feeder.get_price(tokens(1)),
        math::value_at_price(spot_quote, tokens(50_000)).unwrap()
    );
}

#[test]
fn test_get_price_caps_buy_pressure_at_twap() {
    let mut market = deploy_market();
    market.update_oracle();
    market.buy_amt(tokens(5));

    let amt = market.amt_address();
    let twap_quote = market.oracle.consult(amt, tokens(1));
    assert!(market.protocol.pool.get_amount_out(tokens(1), amt) > twap_quote);
    assert_eq!(
        market.price_feeder.get_price(tokens(1)),
        math::value_at_price(twap_quote, tokens(50_000)).unwrap()
    );
}

#[test]
fn test_get_price_follows_sell_pressure() {
    let mut market = deploy_market();
    market.update_oracle();
    market.sell_amt(tokens(20_000));

    let amt = market.amt_address();
    let spot_quote = market.protocol.pool.get_amount_out(tokens(1), amt);
    assert!(spot_quote < market.oracle.consult(amt, tokens(1)));
    assert_eq!(
        market.price_feeder.get_price(tokens(1)),
        math::value_at_price(spot_quote, tokens(50_000)).unwrap()
    );
}

#[test]
fn test_get_price_scales_with_amount() {
    let mut market = deploy_market();
    market.update_oracle();

    let one = market.price_feeder.get_price(tokens(1));
    let ten = market.price_feeder.get_price(tokens(10));
    // price impact of ten units against 100 000 is far below one percent
    let linear = one * U256::from(10u8);
    assert!(ten <= linear);
    assert!(ten > linear * U256::from(99u8) / U256::from(100u8));
}
