//! Clock behaviour through the full bus: wall-clock samples in,
//! simulation ticks out.

use dyson_core::{
    clock::{Clock, ClockState, MAX_TICKS_PER_SAMPLE},
    command::PlayerCommand,
    config::SimConfig,
    event::EventTag,
    event_log::EventLog,
    processor::{Processor, ProcessorData},
    store::MemoryStore,
    types::{Tick, TimeStamp},
    Simulation,
};

fn clock_only(state: ClockState) -> Simulation {
    Simulation::with_processors(
        SimConfig::default(),
        Box::new(MemoryStore::new()),
        EventLog::new(),
        [Processor::instance(ProcessorData::Clock(Clock::new(state)), 0)],
    )
    .expect("build simulation")
}

fn anchored(state: ClockState, time_stamp: TimeStamp) -> Simulation {
    Simulation::with_processors(
        SimConfig::default(),
        Box::new(MemoryStore::new()),
        EventLog::new(),
        [Processor::instance(
            ProcessorData::Clock(Clock::anchored_at(state, time_stamp)),
            0,
        )],
    )
    .expect("build simulation")
}

fn logged(sim: &Simulation, tag: EventTag) -> usize {
    sim.event_log()
        .expect("event log")
        .events_between(0, None)
        .filter(|(_, e)| e.tag() == tag)
        .count()
}

#[test]
fn ticks_follow_elapsed_wall_time() {
    let mut sim = clock_only(ClockState::paused(1.0, 0));
    sim.issue(PlayerCommand::Play, Some(0.0)).expect("play");

    sim.outside_tick(999.0).expect("sample");
    assert_eq!(sim.current_tick(), 0);

    sim.outside_tick(1_000.0).expect("sample");
    assert_eq!(sim.current_tick(), 1);

    // Fractional remainders are dropped with the re-anchor.
    sim.outside_tick(3_500.0).expect("sample");
    assert_eq!(sim.current_tick(), 3);
    assert_eq!(logged(&sim, EventTag::SimulationClockTick), 3);

    let log = sim.event_log().expect("event log");
    for tick in 1..=3 {
        assert!(
            log.events_at(tick).iter().any(|e| e.tag() == EventTag::SimulationClockTick),
            "no clock tick logged at {tick}"
        );
    }
}

#[test]
fn speed_scales_the_tick_rate() {
    let mut sim = clock_only(ClockState::paused(1.0, 0));
    sim.issue(PlayerCommand::SetSpeed { speed: 4.0 }, Some(0.0)).expect("speed");
    sim.issue(PlayerCommand::Play, Some(0.0)).expect("play");
    sim.outside_tick(1_000.0).expect("sample");
    assert_eq!(sim.current_tick(), 4);
}

#[test]
fn unanchored_clock_first_sample_only_anchors() {
    let mut sim = clock_only(ClockState::playing(1.0, 10));
    sim.outside_tick(50_000.0).expect("sample");
    assert_eq!(sim.current_tick(), 10);
    sim.outside_tick(52_000.0).expect("sample");
    assert_eq!(sim.current_tick(), 12);
}

#[test]
fn paused_wall_time_is_never_replayed() {
    let mut sim = clock_only(ClockState::paused(1.0, 0));
    sim.issue(PlayerCommand::Play, Some(0.0)).expect("play");
    sim.outside_tick(2_000.0).expect("sample");
    assert_eq!(sim.current_tick(), 2);

    sim.issue(PlayerCommand::Pause, Some(2_000.0)).expect("pause");
    sim.outside_tick(60_000.0).expect("sample");
    assert_eq!(sim.current_tick(), 2);

    sim.issue(PlayerCommand::Play, Some(60_000.0)).expect("play");
    sim.outside_tick(61_000.0).expect("sample");
    assert_eq!(sim.current_tick(), 3);
}

#[test]
fn repeated_commands_are_idempotent() {
    let mut sim = clock_only(ClockState::paused(1.0, 0));
    sim.issue(PlayerCommand::Play, Some(0.0)).expect("play");
    sim.issue(PlayerCommand::Play, Some(0.0)).expect("play again");
    assert_eq!(logged(&sim, EventTag::CommandSimulationClockPlay), 2);
    assert_eq!(logged(&sim, EventTag::SimulationClockPlay), 1);

    sim.issue(PlayerCommand::Pause, None).expect("pause");
    sim.issue(PlayerCommand::Pause, None).expect("pause again");
    assert_eq!(logged(&sim, EventTag::SimulationClockPause), 1);
    assert_eq!(sim.clock().expect("clock").mode(), "pause");
}

#[test]
fn indirect_pause_restores_the_underlying_mode() {
    let mut sim = clock_only(ClockState::paused(1.0, 0));
    sim.issue(PlayerCommand::IndirectPause, None).expect("indirect pause");
    assert_eq!(sim.clock().expect("clock").mode(), "indirect-pause");
    sim.issue(PlayerCommand::IndirectResume, None).expect("indirect resume");
    assert_eq!(sim.clock().expect("clock").mode(), "pause");

    sim.issue(PlayerCommand::Play, Some(0.0)).expect("play");
    sim.issue(PlayerCommand::IndirectPause, None).expect("indirect pause");
    sim.outside_tick(5_000.0).expect("sample");
    assert_eq!(sim.current_tick(), 0);

    sim.issue(PlayerCommand::IndirectResume, Some(5_000.0)).expect("indirect resume");
    assert!(sim.clock().expect("clock").is_play());
    sim.outside_tick(6_000.0).expect("sample");
    assert_eq!(sim.current_tick(), 1);
}

#[test]
fn editing_speed_suspends_ticks_until_a_speed_is_set() {
    let mut sim = clock_only(ClockState::paused(1.0, 0));
    sim.issue(PlayerCommand::Play, Some(0.0)).expect("play");
    sim.issue(PlayerCommand::StartEditingSpeed, None).expect("edit");
    sim.outside_tick(3_000.0).expect("sample");
    assert_eq!(sim.current_tick(), 0);

    // A rejected speed leaves the editing overlay in place.
    sim.issue(PlayerCommand::SetSpeed { speed: 0.0 }, None).expect("bad speed");
    assert_eq!(sim.clock().expect("clock").mode(), "editing-speed");
    assert_eq!(logged(&sim, EventTag::SimulationClockNewSpeed), 0);

    sim.issue(PlayerCommand::SetSpeed { speed: 2.0 }, None).expect("speed");
    let clock = sim.clock().expect("clock");
    assert!(clock.is_play());
    assert_eq!(clock.speed, 2.0);

    sim.outside_tick(4_000.0).expect("anchor");
    sim.outside_tick(5_000.0).expect("sample");
    assert_eq!(sim.current_tick(), 2);
}

#[test]
fn notices_are_stamped_for_the_next_tick() {
    let mut sim = clock_only(ClockState::paused(1.0, 7));
    sim.issue(PlayerCommand::Play, Some(0.0)).expect("play");
    let log = sim.event_log().expect("event log");
    assert!(log.events_at(7).iter().any(|e| e.tag() == EventTag::CommandSimulationClockPlay));
    assert!(log.events_at(8).iter().any(|e| e.tag() == EventTag::SimulationClockPlay));
}

#[test]
fn direct_commands_are_ignored_under_indirect_pause() {
    for (underlying, mode) in [
        (ClockState::paused(1.0, 0), "pause"),
        (ClockState::playing(1.0, 0), "play"),
    ] {
        let mut sim = clock_only(underlying);
        sim.issue(PlayerCommand::IndirectPause, None).expect("indirect pause");
        let plays = logged(&sim, EventTag::SimulationClockPlay);
        let pauses = logged(&sim, EventTag::SimulationClockPause);

        sim.issue(PlayerCommand::Play, Some(0.0)).expect("play");
        sim.issue(PlayerCommand::Pause, None).expect("pause");
        assert_eq!(logged(&sim, EventTag::SimulationClockPlay), plays);
        assert_eq!(logged(&sim, EventTag::SimulationClockPause), pauses);
        assert_eq!(sim.clock().expect("clock").mode(), "indirect-pause");

        sim.issue(PlayerCommand::IndirectResume, Some(0.0)).expect("indirect resume");
        assert_eq!(sim.clock().expect("clock").mode(), mode);
    }
}

#[test]
fn samples_before_the_anchor_reanchor_the_clock() {
    // A save taken 10.5 s into one frame loop, resumed under a loop that
    // starts again from zero.
    let mut sim = anchored(ClockState::playing(1.0, 21), 10_500.0);
    sim.outside_tick(16.0).expect("sample");
    assert_eq!(sim.current_tick(), 21);

    sim.outside_tick(1_016.0).expect("sample");
    assert_eq!(sim.current_tick(), 22);
}

#[test]
fn one_sample_releases_a_bounded_burst() {
    let mut sim = anchored(ClockState::playing(1.0, 0), 0.0);
    let report = sim.outside_tick(1.0e18).expect("sample");
    assert_eq!(report.ticks_released as Tick, MAX_TICKS_PER_SAMPLE);
    assert_eq!(sim.current_tick(), MAX_TICKS_PER_SAMPLE);

    // The anchor moved with the capped burst; the next second is one tick.
    sim.outside_tick(1.0e18 + 1_000.0).expect("sample");
    assert_eq!(sim.current_tick(), MAX_TICKS_PER_SAMPLE + 1);
}

#[test]
fn tick_counter_stops_at_its_ceiling() {
    let mut sim = anchored(ClockState::playing(1.0, Tick::MAX - 3), 0.0);
    sim.outside_tick(10_000.0).expect("sample");
    assert_eq!(sim.current_tick(), Tick::MAX);

    sim.outside_tick(20_000.0).expect("sample");
    assert_eq!(sim.current_tick(), Tick::MAX);
}
