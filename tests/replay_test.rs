//! End-to-end tests: synthetic MBO streams through the full pipeline.
//!
//! These exercise routing, reconstruction, group gating, debouncing, and
//! diffing together, the way an integrating replay tool drives them.

use mbo_depth_replay::{
    Action, BookError, CommandKind, DepthReplay, EventFlags, MarketDataSource, MboEvent,
    ReplayConfig, Side, VecSource,
};

const INSTRUMENT: u32 = 42;
const PUB_A: u16 = 1;
const PUB_B: u16 = 2;

fn px(units: f64) -> i64 {
    (units * 1e9) as i64
}

fn ev(
    publisher_id: u16,
    order_id: u64,
    action: Action,
    side: Side,
    price_units: f64,
    size: u32,
    ts_event: i64,
) -> MboEvent {
    MboEvent::new(order_id, action, side, px(price_units), size)
        .with_source(INSTRUMENT, publisher_id)
        .with_timestamp(ts_event)
}

fn last(event: MboEvent) -> MboEvent {
    let flags = event.flags.with_last();
    event.with_flags(flags)
}

#[test]
fn test_seed_then_incremental_updates() {
    let mut replay = DepthReplay::new();

    // Group 1: build both sides, closing on the ask.
    replay
        .apply(&ev(PUB_A, 1, Action::Add, Side::Bid, 100.0, 10, 1_000_000))
        .unwrap();
    replay
        .apply(&ev(PUB_A, 2, Action::Add, Side::Bid, 99.5, 20, 1_000_100))
        .unwrap();
    let seed = replay
        .apply(&last(ev(
            PUB_A,
            3,
            Action::Add,
            Side::Ask,
            100.5,
            15,
            1_000_200,
        )))
        .unwrap();

    assert_eq!(seed.len(), 4);
    assert_eq!(seed[0].kind, CommandKind::Clear);
    let prices: Vec<f64> = seed[1..].iter().map(|c| c.price).collect();
    assert_eq!(prices, vec![99.5, 100.0, 100.5]);
    assert_eq!(seed[1].kind, CommandKind::AddBid);
    assert_eq!(seed[2].kind, CommandKind::AddBid);
    assert_eq!(seed[3].kind, CommandKind::AddAsk);

    // Group 2: partial cancel at the top bid, far past the debounce window.
    let update = replay
        .apply(&last(ev(
            PUB_A,
            1,
            Action::Cancel,
            Side::Bid,
            100.0,
            4,
            2_000_000,
        )))
        .unwrap();

    assert_eq!(update.len(), 1);
    assert_eq!(update[0].kind, CommandKind::ModifyBid);
    assert_eq!(update[0].price, 100.0);
    assert_eq!(update[0].quantity, 6);
    assert_eq!(update[0].orders, 1);

    // Group 3: cancel the rest; the level disappears.
    let update = replay
        .apply(&last(ev(
            PUB_A,
            1,
            Action::Cancel,
            Side::Bid,
            100.0,
            6,
            3_000_000,
        )))
        .unwrap();

    assert_eq!(update.len(), 1);
    assert_eq!(update[0].kind, CommandKind::DeleteBid);
    assert_eq!(update[0].price, 100.0);
    assert_eq!(update[0].quantity, 0);
    assert_eq!(update[0].orders, 0);
}

#[test]
fn test_modify_price_move_shows_up_as_delete_and_add() {
    let mut replay = DepthReplay::new();
    replay
        .apply(&last(ev(
            PUB_A,
            1,
            Action::Add,
            Side::Bid,
            100.0,
            10,
            1_000_000,
        )))
        .unwrap();

    let update = replay
        .apply(&last(ev(
            PUB_A,
            1,
            Action::Modify,
            Side::Bid,
            101.0,
            10,
            2_000_000,
        )))
        .unwrap();

    assert_eq!(update.len(), 2);
    assert_eq!(update[0].kind, CommandKind::DeleteBid);
    assert_eq!(update[0].price, 100.0);
    assert_eq!(update[1].kind, CommandKind::AddBid);
    assert_eq!(update[1].price, 101.0);
}

#[test]
fn test_publishers_keep_independent_streams_and_aggregate() {
    let mut replay = DepthReplay::new();
    replay
        .apply(&last(ev(
            PUB_A,
            1,
            Action::Add,
            Side::Bid,
            100.0,
            10,
            1_000_000,
        )))
        .unwrap();
    replay
        .apply(&last(ev(
            PUB_B,
            1,
            Action::Add,
            Side::Bid,
            100.0,
            5,
            2_000_000,
        )))
        .unwrap();

    // Same best price on both feeds: the aggregate sums size and count.
    let (bid, ask) = replay.market().aggregated_bbo(INSTRUMENT);
    assert_eq!(bid.price, px(100.0));
    assert_eq!(bid.size, 15);
    assert_eq!(bid.count, 2);
    assert!(ask.is_empty());

    // Each publisher's book still reports its own state.
    let (bid_a, _) = replay.market().bbo(INSTRUMENT, PUB_A).unwrap();
    let (bid_b, _) = replay.market().bbo(INSTRUMENT, PUB_B).unwrap();
    assert_eq!(bid_a.size, 10);
    assert_eq!(bid_b.size, 5);
}

#[test]
fn test_debounce_coalesces_then_releases() {
    let config = ReplayConfig::new().with_debounce_ns(1_000_000);
    let mut replay = DepthReplay::with_config(config);

    replay
        .apply(&last(ev(
            PUB_A,
            1,
            Action::Add,
            Side::Bid,
            100.0,
            10,
            5_000_000,
        )))
        .unwrap();

    // A burst of group boundaries 100 ns apart: all coalesced.
    for i in 0..5u64 {
        let commands = replay
            .apply(&last(ev(
                PUB_A,
                10 + i,
                Action::Add,
                Side::Bid,
                99.0 - i as f64,
                1,
                5_000_100 + i as i64 * 100,
            )))
            .unwrap();
        assert!(commands.is_empty());
    }
    assert_eq!(replay.stats().debounced, 5);

    // The next quiet boundary releases the whole accumulated change set.
    let commands = replay
        .apply(&last(ev(
            PUB_A,
            99,
            Action::Add,
            Side::Ask,
            101.0,
            7,
            10_000_000,
        )))
        .unwrap();
    assert_eq!(commands.len(), 6);
    assert!(commands[..5]
        .iter()
        .all(|c| c.kind == CommandKind::AddBid));
    assert_eq!(commands[5].kind, CommandKind::AddAsk);
}

#[test]
fn test_clear_resyncs_the_stream() {
    let mut replay = DepthReplay::new();
    replay
        .apply(&last(ev(
            PUB_A,
            1,
            Action::Add,
            Side::Bid,
            100.0,
            10,
            1_000_000,
        )))
        .unwrap();

    let update = replay
        .apply(&last(ev(
            PUB_A,
            0,
            Action::Clear,
            Side::None,
            0.0,
            0,
            2_000_000,
        )))
        .unwrap();

    // The book emptied, so the previously published level is deleted.
    assert_eq!(update.len(), 1);
    assert_eq!(update[0].kind, CommandKind::DeleteBid);
}

#[test]
fn test_protocol_violation_stops_the_stream() {
    let mut replay = DepthReplay::new();
    replay
        .apply(&last(ev(
            PUB_A,
            1,
            Action::Add,
            Side::Bid,
            100.0,
            10,
            1_000_000,
        )))
        .unwrap();

    let err = replay
        .apply(&last(ev(
            PUB_A,
            1,
            Action::Add,
            Side::Bid,
            100.0,
            10,
            2_000_000,
        )))
        .unwrap_err();
    assert_eq!(err, BookError::DuplicateOrderId(1));

    // Book state is as of the last successful action.
    let (bid, _) = replay.market().bbo(INSTRUMENT, PUB_A).unwrap();
    assert_eq!(bid.size, 10);
}

#[test]
fn test_replay_from_source() {
    let events = vec![
        ev(PUB_A, 1, Action::Add, Side::Bid, 100.0, 10, 1_000_000),
        last(ev(PUB_A, 2, Action::Add, Side::Ask, 100.5, 5, 1_000_100)),
        last(ev(PUB_A, 1, Action::Cancel, Side::Bid, 100.0, 10, 2_000_000)),
        last(ev(
            PUB_A,
            3,
            Action::Add,
            Side::Bid,
            100.25,
            20,
            3_000_000,
        )),
    ];
    let source = VecSource::new(events);

    let mut replay = DepthReplay::new();
    let mut all_commands = Vec::new();
    for event in source.events().unwrap() {
        all_commands.extend(replay.apply(&event).unwrap());
    }

    // Seed (clear + 2 adds), delete of the cancelled bid, add of the new bid.
    let kinds: Vec<CommandKind> = all_commands.iter().map(|c| c.kind).collect();
    assert_eq!(
        kinds,
        vec![
            CommandKind::Clear,
            CommandKind::AddBid,
            CommandKind::AddAsk,
            CommandKind::DeleteBid,
            CommandKind::AddBid,
        ]
    );
    assert_eq!(replay.stats().snapshots, 3);
}

#[test]
fn test_tob_feed_collapses_to_single_level_stream() {
    let mut replay = DepthReplay::new();
    replay
        .apply(&last(ev(
            PUB_A,
            1,
            Action::Add,
            Side::Bid,
            100.0,
            10,
            1_000_000,
        )))
        .unwrap();
    replay
        .apply(&last(ev(
            PUB_A,
            2,
            Action::Add,
            Side::Bid,
            99.0,
            5,
            2_000_000,
        )))
        .unwrap();

    // An aggregated top-of-book add replaces the whole side.
    let tob = ev(PUB_A, 0, Action::Add, Side::Bid, 100.5, 40, 3_000_000)
        .with_flags(EventFlags::empty().with_tob().with_last());
    let update = replay.apply(&tob).unwrap();

    let kinds: Vec<CommandKind> = update.iter().map(|c| c.kind).collect();
    assert_eq!(
        kinds,
        vec![
            CommandKind::DeleteBid,
            CommandKind::DeleteBid,
            CommandKind::AddBid,
        ]
    );
    let prices: Vec<f64> = update.iter().map(|c| c.price).collect();
    assert_eq!(prices, vec![99.0, 100.0, 100.5]);
    // The synthetic level reports no discrete orders.
    assert_eq!(update[2].orders, 0);
    assert_eq!(update[2].quantity, 40);
}
