use rust_decimal_macros::dec;

use apex_matching::{Config, Event, MatchingEngine, Order, Side};

/// Small scripted session against the engine: rest liquidity, cross it,
/// sweep with a market order, arm a trailing stop and walk the price until
/// it fires, then print the resulting depth and counters.
fn main() {
    // Initialize tracing (for logging)
    tracing_subscriber::fmt::init();

    let config = Config::try_from_env().unwrap_or_default();
    let engine = MatchingEngine::from_config(&config);
    let subscription = engine.subscribe();

    let symbol = "BTC-USDT";

    println!("Symbols: {}", engine.symbols().join(", "));
    println!("\nSubmitting orders...");

    // Rest some liquidity on both sides.
    submit(&engine, Order::limit(symbol, Side::Bid, dec!(1.0), dec!(49900)));
    submit(&engine, Order::limit(symbol, Side::Ask, dec!(1.0), dec!(50100)));
    submit(&engine, Order::limit(symbol, Side::Ask, dec!(2.0), dec!(50200)));

    // Cross the spread with a limit buy, then sweep with a market buy.
    submit(&engine, Order::limit(symbol, Side::Bid, dec!(0.5), dec!(50100)));
    submit(&engine, Order::market(symbol, Side::Bid, dec!(1.0)));

    // Arm a trailing sell stop and walk the price up, then back down.
    engine.add_trailing_stop(symbol, Side::Ask, dec!(0.5), dec!(100), None);
    for price in [
        dec!(50000),
        dec!(50050),
        dec!(50200),
        dec!(50150),
        dec!(50090),
    ] {
        engine.update_market_price(symbol, price);
    }

    println!("\nEvents:");
    while let Some((event, metadata)) = subscription.try_receive() {
        match event {
            Event::Trade(trade) => {
                let fees = engine.fee_schedule().breakdown(&trade);
                println!(
                    "  [{}] trade {} @ {} (fees {})",
                    metadata.sequence, trade.quantity, trade.price, fees.total_fee
                );
            }
            Event::OrderUpdate(order) => {
                println!(
                    "  [{}] order {} -> {:?} (filled {})",
                    metadata.sequence, order.id, order.status, order.filled_quantity
                );
            }
        }
    }

    match engine.depth_snapshot(symbol, config.snapshot_depth) {
        Ok(depth) => {
            println!("\nDepth for {}:", symbol);
            println!("  best bid: {:?}", depth.best_bid());
            println!("  best ask: {:?}", depth.best_ask());
            println!("  spread:   {:?}", depth.spread());
            if let Ok(json) = serde_json::to_string_pretty(&depth) {
                println!("{}", json);
            }
        }
        Err(error) => eprintln!("depth unavailable: {}", error),
    }

    println!("\nOrders accepted: {}", engine.total_orders());
    println!("Trades executed: {}", engine.total_trades());
    println!("Throughput: {:.0} orders/s", engine.throughput_per_second());
    if let Some(latency) = engine.submit_latency_summary() {
        println!(
            "Submit latency: p50 {}ns p99 {}ns max {}ns",
            latency.p50, latency.p99, latency.max
        );
    }
}

fn submit(engine: &MatchingEngine, order: Order) {
    if let Err(error) = engine.submit_order(order) {
        eprintln!("submit failed: {}", error);
    }
}
