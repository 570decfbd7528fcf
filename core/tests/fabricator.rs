use dyson_core::{
    config::SimConfig,
    event::{BuildOrder, Event, EventTag},
    event_log::EventLog,
    fabricator_processor::Fabricator,
    manager_processor::Manager,
    power_grid_processor::PowerGrid,
    probe_processor::{ObjectiveProbe, ObjectiveTrigger},
    processor::{Processor, ProcessorData},
    storage_processor::Storage,
    store::MemoryStore,
    types::{Construct, ProcessorId, Quantity, Resource, Tick},
    Simulation,
};

fn workshop(charge: u64, metal: u64) -> Simulation {
    let processors = vec![
        ProcessorData::PowerGrid(PowerGrid::new(Quantity::from(charge))),
        ProcessorData::Storage(Storage::new(Resource::Metal, Quantity::from(metal))),
        ProcessorData::Miner(Manager::new(0)),
        ProcessorData::Factory(Manager::new(0)),
        ProcessorData::Fabricator(Fabricator::default()),
        ProcessorData::Probe(ObjectiveProbe::default()),
    ];
    Simulation::with_processors(
        SimConfig::default(),
        Box::new(MemoryStore::new()),
        EventLog::new(),
        processors.into_iter().map(|data| Processor::instance(data, 0)),
    )
    .expect("build simulation")
}

fn run_ticks(sim: &mut Simulation, ticks: std::ops::RangeInclusive<Tick>) {
    for tick in ticks {
        sim.apply(Event::SimulationClockTick { tick }).expect("apply tick");
    }
}

fn fabricator(sim: &Simulation) -> &Fabricator {
    match &sim.processor(&ProcessorId::from("fabricator-0")).expect("fabricator").data {
        ProcessorData::Fabricator(f) => f,
        other => panic!("not a fabricator: {other:?}"),
    }
}

fn unit_count(sim: &Simulation, construct: Construct) -> u64 {
    sim.summary().constructs.get(&construct).map_or(0, |c| c.count)
}

fn set_queue(sim: &mut Simulation, queue: Vec<BuildOrder>, after_tick: Tick) {
    sim.apply(Event::CommandSetFabricatorQueue { queue, after_tick }).expect("set queue");
}

fn fabricated(sim: &Simulation) -> usize {
    sim.event_log()
        .expect("event log")
        .events_between(0, None)
        .filter(|(_, e)| e.tag() == EventTag::ConstructFabricated)
        .count()
}

#[test]
fn fully_supplied_job_is_fabricated() {
    let mut sim = workshop(484, 200);
    set_queue(&mut sim, vec![BuildOrder::single(Construct::Miner)], 0);

    let log = sim.event_log().expect("event log");
    assert!(log.events_at(1).iter().any(|e| e.tag() == EventTag::FabricatorQueueSet));

    run_ticks(&mut sim, 1..=3);
    assert_eq!(fabricator(&sim).job, None);
    assert_eq!(fabricated(&sim), 1);
    assert_eq!(unit_count(&sim, Construct::Miner), 0);

    run_ticks(&mut sim, 4..=4);
    assert_eq!(unit_count(&sim, Construct::Miner), 1);
    assert_eq!(sim.summary().constructs[&Construct::Miner].working, 1);

    assert_eq!(
        sim.drain_objective_triggers(),
        vec![
            ObjectiveTrigger::EditedFabricatorQueue,
            ObjectiveTrigger::Fabricated(Construct::Miner),
        ]
    );
    assert!(sim.drain_objective_triggers().is_empty());
}

#[test]
fn partial_supply_waits_for_the_missing_resource() {
    let mut sim = workshop(20_000, 200);
    set_queue(&mut sim, vec![BuildOrder::single(Construct::Factory)], 0);

    run_ticks(&mut sim, 1..=4);
    assert_eq!(fabricator(&sim).job, Some(Construct::Factory));
    assert_eq!(fabricated(&sim), 0);
    // Metal never came, but the electricity that did is held, not lost.
    let held: Quantity = fabricator(&sim)
        .received
        .iter()
        .filter_map(|e| match e {
            Event::Supply { resource: Resource::Electricity, amount, .. } => Some(amount.clone()),
            _ => None,
        })
        .sum();
    assert!(held >= Quantity::from(10_000));

    sim.apply(Event::Produce {
        resource: Resource::Metal,
        amount: Quantity::from(2_000),
        received_tick: 5,
    })
    .expect("deliver metal");
    run_ticks(&mut sim, 5..=7);

    assert_eq!(fabricated(&sim), 1);
    assert_eq!(unit_count(&sim, Construct::Factory), 1);
}

#[test]
fn switched_off_fabricator_draws_nothing() {
    let mut sim = workshop(484, 200);
    set_queue(&mut sim, vec![BuildOrder::single(Construct::Miner)], 0);
    sim.apply(Event::CommandTurnOffFabricator { after_tick: 0 }).expect("turn off");

    run_ticks(&mut sim, 1..=3);
    assert_eq!(fabricator(&sim).job, None);
    assert_eq!(sim.summary().stocks[&Resource::Electricity], Quantity::from(484));
    assert!(!sim.summary().fabricator_on);

    sim.apply(Event::CommandTurnOnFabricator { after_tick: 3 }).expect("turn on");
    run_ticks(&mut sim, 4..=7);
    assert_eq!(unit_count(&sim, Construct::Miner), 1);
}

#[test]
fn clearing_a_stalled_job_moves_to_the_next_order() {
    let mut sim = workshop(1_000_000, 200);
    set_queue(
        &mut sim,
        vec![BuildOrder::single(Construct::Factory), BuildOrder::single(Construct::Miner)],
        0,
    );

    run_ticks(&mut sim, 1..=2);
    assert_eq!(fabricator(&sim).job, Some(Construct::Factory));

    sim.apply(Event::CommandClearFabricatorJob { after_tick: 2 }).expect("clear job");
    assert_eq!(fabricator(&sim).job, None);

    run_ticks(&mut sim, 3..=6);
    assert_eq!(unit_count(&sim, Construct::Miner), 1);
    assert_eq!(unit_count(&sim, Construct::Factory), 0);
    assert_eq!(fabricator(&sim).job, None);
}

#[test]
fn repeat_groups_keep_building() {
    let mut sim = workshop(1_000_000, 1_000);
    set_queue(
        &mut sim,
        vec![BuildOrder::Repeat {
            orders: vec![BuildOrder::single(Construct::Miner)],
            count: Some(3),
        }],
        0,
    );

    run_ticks(&mut sim, 1..=20);
    assert_eq!(unit_count(&sim, Construct::Miner), 3);
    assert!(fabricator(&sim).queue.is_empty());
}
