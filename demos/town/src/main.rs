//! town: a small end-to-end run of the parking policy engine.
//!
//! A market square lot sits between two neighbourhoods.  The council
//! restricts it to residents within 300 m, the overnight audit clears out
//! everyone else, and a stuck car is finalized after its second day.
//!
//! Run with `RUST_LOG=debug` to see per-building audit and episode logs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use rustc_hash::FxHashMap;

use pw_core::{
    BuildingId, CitizenId, CitizenInfo, CityHost, EngineSettings, ParkedVehicleId,
    ParkedVehicleInfo, Position, TickDispatcher, VehicleId,
};
use pw_engine::{AuditObserver, AuditSummary, EngineBuilder, ParkingPolicyEngine};
use pw_rules::Rule;

// ── Constants ─────────────────────────────────────────────────────────────────

const MARKET: BuildingId = BuildingId(10);
const STATION: BuildingId = BuildingId(11);
const OLD_TOWN: BuildingId = BuildingId(1);
const HARBOUR: BuildingId = BuildingId(2);
const MILL: BuildingId = BuildingId(3);

const CITIZENS: u32 = 40;
const DAYS: u32 = 3;

const SETTINGS_TOML: &str = r#"
fix_stuck_vehicles = true
relocation_backend = "direct_nudge"
summary_min_checks = 2

[budgets]
max_evaluations_per_tick = 16
max_relocations_per_tick = 4
max_finalizations_per_tick = 2
"#;

// ── Host ──────────────────────────────────────────────────────────────────────

/// The whole town in a few hash maps.
#[derive(Default)]
struct Town {
    buildings: FxHashMap<BuildingId, Position>,
    spaces:    FxHashMap<BuildingId, Vec<Position>>,
    lots:      FxHashMap<BuildingId, Vec<ParkedVehicleId>>,
    parked:    FxHashMap<ParkedVehicleId, (BuildingId, ParkedVehicleInfo)>,
    citizens:  FxHashMap<CitizenId, CitizenInfo>,
    drivers:   FxHashMap<VehicleId, CitizenId>,
    next_id:   u16,
}

impl Town {
    fn build() -> Self {
        let mut town = Self { next_id: 1, ..Self::default() };
        town.buildings.insert(OLD_TOWN, Position::ground(150.0, 80.0));
        town.buildings.insert(HARBOUR, Position::ground(-900.0, 40.0));
        town.buildings.insert(MILL, Position::ground(700.0, 0.0));
        town.add_lot(MARKET, 0.0, 0.0, 60);
        town.add_lot(STATION, 640.0, 0.0, 60);

        for i in 0..CITIZENS {
            let home = if i % 3 == 0 { HARBOUR } else { OLD_TOWN };
            let work = if i % 4 == 0 { MILL } else { BuildingId::INVALID };
            town.citizens.insert(CitizenId(i + 1), CitizenInfo { home, work, visitor: i % 10 == 9 });
        }
        town
    }

    /// A lot of `capacity` spaces in rows of ten, 3 m apart.
    fn add_lot(&mut self, id: BuildingId, x: f32, z: f32, capacity: u16) {
        self.buildings.insert(id, Position::ground(x, z));
        let spaces = (0..capacity)
            .map(|i| Position::ground(x + f32::from(i % 10) * 3.0, z + f32::from(i / 10) * 3.0))
            .collect();
        self.spaces.insert(id, spaces);
    }

    fn park(&mut self, lot: BuildingId, owner: CitizenId) -> ParkedVehicleId {
        let id = ParkedVehicleId(self.next_id);
        self.next_id += 1;
        let list = self.lots.entry(lot).or_default();
        let position = self.spaces[&lot][list.len() % self.spaces[&lot].len()];
        list.push(id);
        self.parked.insert(id, (lot, ParkedVehicleInfo { owner, position, stuck_candidate: false }));
        id
    }

    fn unpark(&mut self, parked: ParkedVehicleId) -> Option<BuildingId> {
        let (lot, _) = self.parked.remove(&parked)?;
        if let Some(list) = self.lots.get_mut(&lot) {
            list.retain(|&p| p != parked);
        }
        Some(lot)
    }

    fn occupancy(&self, lot: BuildingId) -> usize {
        self.lots.get(&lot).map_or(0, Vec::len)
    }
}

impl CityHost for Town {
    fn building_exists(&self, b: BuildingId) -> bool {
        self.buildings.contains_key(&b)
    }

    fn building_position(&self, b: BuildingId) -> Option<Position> {
        self.buildings.get(&b).copied()
    }

    fn is_supported_lot(&self, b: BuildingId) -> bool {
        self.spaces.contains_key(&b)
    }

    fn parking_spaces(&self, b: BuildingId) -> Option<Vec<Position>> {
        self.spaces.get(&b).cloned()
    }

    fn first_parked_vehicle(&self, b: BuildingId) -> Option<ParkedVehicleId> {
        self.lots.get(&b).and_then(|l| l.first().copied())
    }

    fn next_parked_vehicle(&self, p: ParkedVehicleId) -> Option<ParkedVehicleId> {
        let (lot, _) = self.parked.get(&p)?;
        let list = self.lots.get(lot)?;
        let at = list.iter().position(|&q| q == p)?;
        list.get(at + 1).copied()
    }

    fn vehicle_driver(&self, v: VehicleId) -> Option<CitizenId> {
        self.drivers.get(&v).copied()
    }

    fn parked_vehicle(&self, p: ParkedVehicleId) -> Option<ParkedVehicleInfo> {
        self.parked.get(&p).map(|(_, info)| *info)
    }

    fn citizen(&self, c: CitizenId) -> Option<CitizenInfo> {
        self.citizens.get(&c).copied()
    }

    /// Denied cars move to the station lot.
    fn nudge_parked_vehicle(&mut self, p: ParkedVehicleId, _reference: Position) -> bool {
        let Some((lot, info)) = self.parked.get(&p).copied() else {
            return false;
        };
        if lot == STATION {
            return false;
        }
        self.unpark(p);
        self.park(STATION, info.owner);
        true
    }

    fn release_parked_vehicle(&mut self, p: ParkedVehicleId) {
        self.unpark(p);
    }

    fn finalize_stuck_vehicle(&mut self, p: ParkedVehicleId) -> bool {
        match self.parked.get_mut(&p) {
            Some((_, info)) => {
                info.stuck_candidate = false;
                true
            }
            None => false,
        }
    }
}

// ── Engine collaborators ──────────────────────────────────────────────────────

/// Raises a flag the main loop polls; stands in for the host's main-thread
/// task queue.
#[derive(Clone, Default)]
struct FlagDispatcher(Arc<AtomicBool>);

impl FlagDispatcher {
    fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

impl TickDispatcher for FlagDispatcher {
    fn request_tick(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct Report {
    buildings: u32,
    moved:     u32,
    released:  u32,
    fixed:     u32,
}

impl AuditObserver for Report {
    fn on_audit_finished(&mut self, summary: &AuditSummary) {
        self.buildings += 1;
        self.moved += summary.counters.moved;
        self.released += summary.counters.released;
        self.fixed += summary.counters.fixed;
        println!(
            "  audit {}: {} parked, {} denied, {} moved, {} fixed over {} ticks",
            summary.building,
            summary.parked,
            summary.counters.denied,
            summary.counters.moved,
            summary.counters.fixed,
            summary.ticks,
        );
    }
}

/// Serve dispatcher requests until the engine stops asking.
fn drain(
    engine: &mut ParkingPolicyEngine,
    town:   &mut Town,
    ticks:  &FlagDispatcher,
    report: &mut Report,
) -> u32 {
    let mut served = 0;
    while ticks.take() {
        engine.run_tick_observed(town, report);
        served += 1;
    }
    served
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    println!("=== town: parking policy engine demo ===");

    let settings = EngineSettings::from_toml_str(SETTINGS_TOML)?;
    let ticks = FlagDispatcher::default();
    let mut engine = EngineBuilder::new()
        .settings(settings)
        .dispatcher(ticks.clone())
        .build()?;

    let mut town = Town::build();
    for i in 0..CITIZENS {
        town.park(MARKET, CitizenId(i + 1));
    }
    let stuck = town.park(MARKET, CitizenId(2));
    if let Some((_, info)) = town.parked.get_mut(&stuck) {
        info.stuck_candidate = true;
    }
    println!("Market lot: {} cars before the rule", town.occupancy(MARKET));

    // 1. The council restricts the market to nearby residents.
    engine.set_rule(MARKET, Rule::residents_within(300))?;
    engine.set_rule(STATION, Rule::open())?;
    println!("Rule on {MARKET}: {}", Rule::residents_within(300));

    // 2. A driver from the harbour looks for a space on the market.
    let sailor = CitizenId(1);
    let car = VehicleId(500);
    town.drivers.insert(car, sailor);
    {
        let _search = engine.begin_episode(car, sailor, "find_parking");
        let probe = town.spaces[&MARKET][5];
        if let Some(lot) = engine.find_building(&town, probe) {
            let decision = engine.evaluate_vehicle(&town, car, lot);
            println!("Harbour driver at {lot}: {decision}");
        }
    }

    // 3. Audit the market now, then sweep every ruled lot once a day.
    let mut report = Report::default();
    engine.request_for_building(&town, MARKET);
    let served = drain(&mut engine, &mut town, &ticks, &mut report);
    println!("Immediate audit took {served} ticks");

    for day in 1..=DAYS {
        engine.notify_day_changed();
        println!("Day {day}");
        while engine.request_next_scheduled_building(&town, false) {}
        drain(&mut engine, &mut town, &ticks, &mut report);
    }

    println!();
    println!(
        "Market: {} cars  |  Station: {} cars",
        town.occupancy(MARKET),
        town.occupancy(STATION)
    );
    println!(
        "Audits: {}  |  moved: {}  |  released: {}  |  stuck fixed: {}",
        report.buildings, report.moved, report.released, report.fixed
    );
    if let Some(status) = engine.status() {
        println!(
            "Rules: {} (v{})  |  index cells: {}  |  backend: {}",
            status.rules, status.rules_version, status.index.cells, status.backend
        );
    }

    engine.dispose();
    Ok(())
}
