//--------------------------------------------------------------------------------------------------
// End-to-end scenarios against the public engine surface: submission and
// matching outcomes for all four order types, the conditional layer, event
// publication, depth views and counters.
//--------------------------------------------------------------------------------------------------

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use apex_matching::{
    Event, MatchingEngine, Order, OrderStatus, OrderType, Side, SubmitResult,
};

const SYMBOL: &str = "BTC-USDT";

fn engine() -> MatchingEngine {
    let engine = MatchingEngine::new();
    engine.add_symbol(SYMBOL);
    engine
}

fn submit(engine: &MatchingEngine, order: Order) -> SubmitResult {
    match engine.submit_order(order) {
        Ok(result) => result,
        Err(e) => panic!("submit failed: {:?}", e),
    }
}

fn best_prices(engine: &MatchingEngine) -> (Decimal, Decimal) {
    let book = match engine.get_order_book(SYMBOL) {
        Some(book) => book,
        None => panic!("expected a book for {}", SYMBOL),
    };
    let book = book.lock();
    (book.best_bid(), book.best_ask())
}

#[test]
fn basic_cross_fills_both_orders() {
    let engine = engine();

    let a = submit(&engine, Order::limit(SYMBOL, Side::Bid, dec!(1.0), dec!(50000)));
    let b = submit(&engine, Order::limit(SYMBOL, Side::Ask, dec!(1.0), dec!(50000)));

    assert_eq!(b.trades.len(), 1);
    let trade = &b.trades[0];
    assert_eq!(trade.price, dec!(50000));
    assert_eq!(trade.quantity, dec!(1.0));
    assert_eq!(trade.maker_order_id, a.taker.id);
    assert_eq!(trade.taker_order_id, b.taker.id);
    assert!(trade.is_buyer_maker);

    assert_eq!(b.taker.status, OrderStatus::Filled);
    assert_eq!(b.affected[0].status, OrderStatus::Filled);

    assert_eq!(best_prices(&engine), (Decimal::ZERO, Decimal::ZERO));
}

#[test]
fn earlier_order_at_same_price_matches_first() {
    let engine = engine();

    let a = submit(&engine, Order::limit(SYMBOL, Side::Bid, dec!(1.0), dec!(50000)));
    let b = submit(&engine, Order::limit(SYMBOL, Side::Bid, dec!(1.0), dec!(50000)));
    let c = submit(&engine, Order::limit(SYMBOL, Side::Ask, dec!(1.0), dec!(50000)));

    assert_eq!(c.trades.len(), 1);
    assert_eq!(c.trades[0].maker_order_id, a.taker.id);
    assert_eq!(c.taker.status, OrderStatus::Filled);
    assert_eq!(c.affected[0].status, OrderStatus::Filled);

    let book = engine.get_order_book(SYMBOL).expect("book");
    let book = book.lock();
    let remaining = book.get_order(b.taker.id).expect("second bid still rests");
    assert_eq!(remaining.status, OrderStatus::Active);
}

#[test]
fn market_order_sweeps_best_ask_only_as_needed() {
    let engine = engine();

    let a = submit(&engine, Order::limit(SYMBOL, Side::Ask, dec!(2.0), dec!(51000)));
    let b = submit(&engine, Order::market(SYMBOL, Side::Bid, dec!(1.0)));

    assert_eq!(b.trades.len(), 1);
    assert_eq!(b.trades[0].price, dec!(51000));
    assert_eq!(b.trades[0].quantity, dec!(1.0));
    assert_eq!(b.taker.status, OrderStatus::Filled);

    let maker = &b.affected[0];
    assert_eq!(maker.id, a.taker.id);
    assert_eq!(maker.status, OrderStatus::PartiallyFilled);
    assert_eq!(maker.leaves_quantity, dec!(1.0));

    let book = engine.get_order_book(SYMBOL).expect("book");
    let book = book.lock();
    assert_eq!(book.best_ask(), dec!(51000));
    assert_eq!(book.ask_levels(1), vec![(dec!(51000), dec!(1.0))]);
}

#[test]
fn ioc_partial_fill_drops_residual() {
    let engine = engine();

    submit(&engine, Order::limit(SYMBOL, Side::Ask, dec!(0.5), dec!(50000)));
    let b = submit(
        &engine,
        Order::immediate_or_cancel(SYMBOL, Side::Bid, dec!(1.0), dec!(50000)),
    );

    assert_eq!(b.trades.len(), 1);
    assert_eq!(b.trades[0].quantity, dec!(0.5));
    assert_eq!(b.taker.status, OrderStatus::PartiallyFilled);
    assert_eq!(b.taker.filled_quantity + b.taker.leaves_quantity, b.taker.quantity);

    // Residual never rests: both sides empty now.
    assert_eq!(best_prices(&engine), (Decimal::ZERO, Decimal::ZERO));
}

#[test]
fn fok_without_liquidity_is_rejected_atomically() {
    let engine = engine();

    let a = submit(&engine, Order::limit(SYMBOL, Side::Ask, dec!(0.5), dec!(50000)));
    let before = engine.depth_snapshot(SYMBOL, 100).expect("depth");

    let b = submit(
        &engine,
        Order::fill_or_kill(SYMBOL, Side::Bid, dec!(1.0), dec!(50000)),
    );
    assert!(!b.accepted);
    assert!(b.trades.is_empty());
    assert_eq!(b.taker.status, OrderStatus::Rejected);

    // The book is exactly as it was before the submit.
    let after = engine.depth_snapshot(SYMBOL, 100).expect("depth");
    assert_eq!(before.bids, after.bids);
    assert_eq!(before.asks, after.asks);
    assert_eq!(best_prices(&engine).1, dec!(50000));

    let book = engine.get_order_book(SYMBOL).expect("book");
    let book = book.lock();
    let maker = book.get_order(a.taker.id).expect("ask untouched");
    assert_eq!(maker.leaves_quantity, dec!(0.5));
}

#[test]
fn fok_with_liquidity_fills_completely() {
    let engine = engine();

    submit(&engine, Order::limit(SYMBOL, Side::Ask, dec!(0.6), dec!(50000)));
    submit(&engine, Order::limit(SYMBOL, Side::Ask, dec!(0.4), dec!(50000)));

    let b = submit(
        &engine,
        Order::fill_or_kill(SYMBOL, Side::Bid, dec!(1.0), dec!(50000)),
    );
    assert!(b.accepted);
    assert_eq!(b.taker.status, OrderStatus::Filled);
    assert_eq!(b.trades.len(), 2);
    let total: Decimal = b.trades.iter().map(|t| t.quantity).sum();
    assert_eq!(total, dec!(1.0));
}

#[test]
fn trailing_sell_stop_ratchets_and_fires_once() {
    let engine = engine();
    let subscription = engine.subscribe();

    engine.add_trailing_stop(SYMBOL, Side::Ask, dec!(1.0), dec!(100), None);

    // 50000 -> trigger 49900; 50050 -> 49950; 50200 -> 50100; 50150 ignored
    // (candidate 50050 below current trigger); 50090 fires (<= 50100).
    for price in [dec!(50000), dec!(50050), dec!(50200), dec!(50150)] {
        engine.update_market_price(SYMBOL, price);
        assert_eq!(engine.pending_conditionals(SYMBOL), 1);
    }
    engine.update_market_price(SYMBOL, dec!(50090));
    assert_eq!(engine.pending_conditionals(SYMBOL), 0);

    // Exactly one live order reached the engine: a market sell for 1.0.
    let mut order_updates = Vec::new();
    while let Some((event, _)) = subscription.try_receive() {
        if let Event::OrderUpdate(order) = event {
            order_updates.push(order);
        }
    }
    assert_eq!(order_updates.len(), 1);
    assert_eq!(order_updates[0].side, Side::Ask);
    assert_eq!(order_updates[0].order_type, OrderType::Market);
    assert_eq!(order_updates[0].quantity, dec!(1.0));

    // Nothing fires afterwards.
    engine.update_market_price(SYMBOL, dec!(40000));
    assert!(subscription.try_receive().is_none());
}

#[test]
fn stop_limit_promotes_into_resting_limit_order() {
    let engine = engine();
    engine.add_stop_limit(SYMBOL, Side::Ask, dec!(1.0), dec!(50000), dec!(49900));

    engine.update_market_price(SYMBOL, dec!(49950));
    assert_eq!(engine.pending_conditionals(SYMBOL), 0);

    // The fired limit sell rests on the empty book at its limit price.
    let (_, best_ask) = best_prices(&engine);
    assert_eq!(best_ask, dec!(49900));
}

#[test]
fn cancel_is_idempotent_across_engine_surface() {
    let engine = engine();
    let resting = submit(&engine, Order::limit(SYMBOL, Side::Bid, dec!(1.0), dec!(50000)));

    assert_eq!(engine.cancel_order(SYMBOL, resting.taker.id), Ok(true));
    assert_eq!(engine.cancel_order(SYMBOL, resting.taker.id), Ok(false));
    assert_eq!(best_prices(&engine), (Decimal::ZERO, Decimal::ZERO));
}

#[test]
fn modify_preserves_time_priority() {
    let engine = engine();
    let first = submit(&engine, Order::limit(SYMBOL, Side::Bid, dec!(2.0), dec!(50000)));
    submit(&engine, Order::limit(SYMBOL, Side::Bid, dec!(1.0), dec!(50000)));

    // Shrinking the first order must not cost it its queue position.
    assert_eq!(engine.modify_order(SYMBOL, first.taker.id, dec!(0.5)), Ok(true));

    let c = submit(&engine, Order::limit(SYMBOL, Side::Ask, dec!(0.5), dec!(50000)));
    assert_eq!(c.trades.len(), 1);
    assert_eq!(c.trades[0].maker_order_id, first.taker.id);
}

#[test]
fn leaves_accounting_holds_for_every_resting_order() {
    let engine = engine();

    let ids: Vec<_> = [
        Order::limit(SYMBOL, Side::Bid, dec!(1.0), dec!(49900)),
        Order::limit(SYMBOL, Side::Bid, dec!(2.0), dec!(49800)),
        Order::limit(SYMBOL, Side::Ask, dec!(1.5), dec!(50100)),
        Order::limit(SYMBOL, Side::Ask, dec!(0.7), dec!(50200)),
    ]
    .into_iter()
    .map(|order| submit(&engine, order).taker.id)
    .collect();

    // Partially consume both sides.
    submit(&engine, Order::market(SYMBOL, Side::Bid, dec!(1.7)));
    submit(&engine, Order::market(SYMBOL, Side::Ask, dec!(1.4)));

    let book = engine.get_order_book(SYMBOL).expect("book");
    let book = book.lock();
    for id in ids {
        if let Some(order) = book.get_order(id) {
            assert_eq!(order.filled_quantity + order.leaves_quantity, order.quantity);
            assert!(order.leaves_quantity > Decimal::ZERO);
            assert!(matches!(
                order.status,
                OrderStatus::Active | OrderStatus::PartiallyFilled
            ));
        }
    }
    assert!(book.best_bid() < book.best_ask());
}

#[test]
fn depth_aggregates_match_resting_leaves() {
    let engine = engine();

    submit(&engine, Order::limit(SYMBOL, Side::Bid, dec!(1.0), dec!(50000)));
    submit(&engine, Order::limit(SYMBOL, Side::Bid, dec!(0.25), dec!(50000)));
    submit(&engine, Order::limit(SYMBOL, Side::Bid, dec!(3.0), dec!(49900)));

    let depth = engine.depth_snapshot(SYMBOL, 10).expect("depth");
    assert_eq!(depth.bids.len(), 2);
    assert_eq!(depth.bids[0].price, dec!(50000));
    assert_eq!(depth.bids[0].volume, dec!(1.25));
    assert_eq!(depth.bids[0].order_count, 2);
    assert_eq!(depth.bids[1].price, dec!(49900));
    assert_eq!(depth.bids[1].volume, dec!(3.0));
}

#[test]
fn one_trade_event_per_pair_fill() {
    let engine = engine();
    let subscription = engine.subscribe();

    submit(&engine, Order::limit(SYMBOL, Side::Ask, dec!(0.5), dec!(50000)));
    submit(&engine, Order::limit(SYMBOL, Side::Ask, dec!(0.5), dec!(50100)));
    let sweep = submit(&engine, Order::market(SYMBOL, Side::Bid, dec!(1.0)));
    assert_eq!(sweep.trades.len(), 2);

    let mut trade_events = 0;
    while let Some((event, _)) = subscription.try_receive() {
        if matches!(event, Event::Trade(_)) {
            trade_events += 1;
        }
    }
    assert_eq!(trade_events, 2);
}

#[test]
fn trades_for_one_symbol_are_totally_ordered() {
    let engine = engine();

    for _ in 0..3 {
        submit(&engine, Order::limit(SYMBOL, Side::Ask, dec!(0.5), dec!(50000)));
    }
    let sweep = submit(&engine, Order::market(SYMBOL, Side::Bid, dec!(1.5)));

    let sequences: Vec<u64> = sweep.trades.iter().map(|t| t.sequence).collect();
    let mut sorted = sequences.clone();
    sorted.sort_unstable();
    assert_eq!(sequences, sorted);
    assert!(sequences.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn symbols_do_not_interfere() {
    let engine = engine();
    engine.add_symbol("ETH-USDT");

    submit(&engine, Order::limit(SYMBOL, Side::Bid, dec!(1.0), dec!(50000)));
    submit(&engine, Order::limit("ETH-USDT", Side::Bid, dec!(10.0), dec!(3000)));
    submit(&engine, Order::limit("ETH-USDT", Side::Ask, dec!(10.0), dec!(3000)));

    // The ETH cross leaves the BTC book alone.
    assert_eq!(best_prices(&engine).0, dec!(50000));
    assert_eq!(engine.total_trades(), 1);
    assert_eq!(engine.total_orders(), 3);
}

#[test]
fn fee_breakdown_over_emitted_trade() {
    let engine = engine();

    submit(&engine, Order::limit(SYMBOL, Side::Bid, dec!(1.0), dec!(50000)));
    let result = submit(&engine, Order::limit(SYMBOL, Side::Ask, dec!(1.0), dec!(50000)));

    let fees = engine.fee_schedule().breakdown(&result.trades[0]);
    assert_eq!(fees.maker_fee, dec!(50));
    assert_eq!(fees.taker_fee, dec!(100));
    assert_eq!(fees.net_amount, dec!(49850));
}
