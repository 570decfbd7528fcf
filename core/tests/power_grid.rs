use dyson_core::{
    config::SimConfig,
    event::{Event, EventTag},
    event_log::EventLog,
    manager_processor::Manager,
    power_grid_processor::PowerGrid,
    processor::{Processor, ProcessorData},
    store::MemoryStore,
    types::{ProcessorId, Quantity, Resource, Tick},
    Simulation,
};

fn grid_with_miners(charge: u64, miners: u64) -> Simulation {
    Simulation::with_processors(
        SimConfig::default(),
        Box::new(MemoryStore::new()),
        EventLog::new(),
        [
            Processor::instance(ProcessorData::PowerGrid(PowerGrid::new(Quantity::from(charge))), 0),
            Processor::instance(ProcessorData::Miner(Manager::new(miners)), 0),
        ],
    )
    .expect("build simulation")
}

fn tick(sim: &mut Simulation, tick: Tick) {
    sim.apply(Event::SimulationClockTick { tick }).expect("apply tick");
}

fn grid(sim: &Simulation) -> &PowerGrid {
    match &sim.processor(&ProcessorId::from("power-grid-0")).expect("grid").data {
        ProcessorData::PowerGrid(grid) => grid,
        other => panic!("not a grid: {other:?}"),
    }
}

fn supplies_logged(sim: &Simulation) -> usize {
    sim.event_log()
        .expect("event log")
        .events_between(0, None)
        .filter(|(_, e)| e.tag() == EventTag::Supply)
        .count()
}

#[test]
fn overdraw_trips_the_breaker_and_keeps_the_charge() {
    let mut sim = grid_with_miners(10, 10);
    tick(&mut sim, 1);
    tick(&mut sim, 2);

    assert!(grid(&sim).breaker_tripped);
    assert_eq!(grid(&sim).stored, Quantity::from(10));
    assert_eq!(supplies_logged(&sim), 0);

    let log = sim.event_log().expect("event log");
    assert!(log
        .events_at(2)
        .iter()
        .any(|e| matches!(e, Event::CircuitBreakerTripped { on_tick: 2 })));
    assert!(sim.summary().breaker_tripped);
}

#[test]
fn tripped_grid_charges_but_never_supplies() {
    let mut sim = grid_with_miners(10, 10);
    for t in 1..=3 {
        tick(&mut sim, t);
    }
    sim.apply(Event::Produce {
        resource: Resource::Electricity,
        amount: Quantity::from(100),
        received_tick: 4,
    })
    .expect("produce");
    tick(&mut sim, 4);

    assert!(grid(&sim).breaker_tripped);
    assert_eq!(grid(&sim).stored, Quantity::from(110));
    assert_eq!(supplies_logged(&sim), 0);
}

#[test]
fn reset_resumes_supply_on_the_next_tick() {
    let mut sim = grid_with_miners(10, 10);
    for t in 1..=3 {
        tick(&mut sim, t);
    }
    sim.apply(Event::Produce {
        resource: Resource::Electricity,
        amount: Quantity::from(100),
        received_tick: 4,
    })
    .expect("produce");
    tick(&mut sim, 4);

    sim.apply(Event::CommandResetCircuitBreaker { after_tick: 4 }).expect("reset");
    assert!(!grid(&sim).breaker_tripped);
    let log = sim.event_log().expect("event log");
    assert!(log
        .events_at(5)
        .iter()
        .any(|e| matches!(e, Event::CircuitBreakerReset { on_tick: 5 })));

    // Draws made while tripped were dropped; only the tick-4 draw is served.
    tick(&mut sim, 5);
    assert!(!grid(&sim).breaker_tripped);
    assert_eq!(grid(&sim).stored, Quantity::from(80));
    assert_eq!(supplies_logged(&sim), 1);
}

#[test]
fn trip_command_stops_supply() {
    let mut sim = grid_with_miners(484, 1);
    tick(&mut sim, 1);
    sim.apply(Event::CommandTripCircuitBreaker { after_tick: 1 }).expect("trip");
    assert!(grid(&sim).breaker_tripped);

    tick(&mut sim, 2);
    tick(&mut sim, 3);
    assert_eq!(grid(&sim).stored, Quantity::from(484));
    assert_eq!(supplies_logged(&sim), 0);
}

#[test]
fn zero_amount_draws_are_dropped() {
    let mut sim = grid_with_miners(484, 0);
    sim.apply(Event::Draw {
        resource: Resource::Electricity,
        amount: Quantity::zero(),
        for_id: ProcessorId::from("miner-0"),
        received_tick: 1,
    })
    .expect("draw");
    assert!(grid(&sim).received.is_empty());

    tick(&mut sim, 1);
    assert_eq!(supplies_logged(&sim), 0);
    assert!(!grid(&sim).breaker_tripped);
}

#[test]
fn empty_grid_trips_on_the_first_draw() {
    let mut sim = grid_with_miners(0, 0);
    sim.apply(Event::Draw {
        resource: Resource::Electricity,
        amount: Quantity::from(1),
        for_id: ProcessorId::from("miner-0"),
        received_tick: 7,
    })
    .expect("draw");
    tick(&mut sim, 7);

    assert!(grid(&sim).breaker_tripped);
    assert!(grid(&sim).stored.is_zero());
    assert!(sim
        .event_log()
        .expect("event log")
        .events_at(7)
        .iter()
        .any(|e| matches!(e, Event::CircuitBreakerTripped { on_tick: 7 })));
}

#[test]
fn tripped_grid_banks_same_tick_production() {
    let mut sim = grid_with_miners(0, 0);
    sim.apply(Event::CommandTripCircuitBreaker { after_tick: 0 }).expect("trip");
    sim.apply(Event::Produce {
        resource: Resource::Electricity,
        amount: Quantity::from(4),
        received_tick: 1,
    })
    .expect("produce");
    sim.apply(Event::Draw {
        resource: Resource::Electricity,
        amount: Quantity::from(1),
        for_id: ProcessorId::from("miner-0"),
        received_tick: 1,
    })
    .expect("draw");
    tick(&mut sim, 1);

    assert!(grid(&sim).breaker_tripped);
    assert_eq!(grid(&sim).stored, Quantity::from(4));
    assert_eq!(supplies_logged(&sim), 0);
}
