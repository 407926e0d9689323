use anyhow::Result;
use loadshare::clock::{Clock, SystemClock};
use loadshare::config::Config;
use loadshare::logging::init_logging;
use loadshare::metrics::{MemoryStore, MetricsStore, SqliteStore};
use loadshare::persistence::PersistenceManager;
use loadshare::sim::{SimChargeState, SimLoadpoint};
use loadshare::site::{GridReading, Site};
use loadshare::{Coordinator, Loadpoint, Vehicle};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

fn build_vehicles(config: &Config) -> Result<Vec<Arc<Vehicle>>> {
    let mut vehicles = Vec::with_capacity(config.vehicles.len());
    for vc in &config.vehicles {
        let vehicle = match &vc.status {
            Some(status) => Vehicle::with_charge_state(
                vc.title.as_str(),
                Arc::new(SimChargeState::new(status.parse()?)),
            ),
            None => Vehicle::new(vc.title.as_str()),
        };
        vehicles.push(Arc::new(vehicle));
    }
    Ok(vehicles)
}

fn run_cycle(site: &Site, sims: &[Arc<SimLoadpoint>], config: &Config) -> loadshare::Result<()> {
    for lp in sims {
        lp.identify_vehicle();
    }

    for (lp, (_, power)) in sims.iter().zip(site.update_loadpoints()) {
        if power > 0.0 {
            info!(
                "{}: {:.0}W prioritized over lower priority loadpoints",
                lp.title(),
                power
            );
        }
    }

    site.record_meters(
        config.site.home_power_w,
        &GridReading::power(config.site.grid_power_w),
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    config.validate()?;

    init_logging(&config.logging)?;
    info!(
        "Loadshare {} starting for site {}",
        env!("APP_VERSION"),
        config.site.title
    );

    let store: Arc<dyn MetricsStore> = if config.metrics.enabled {
        Arc::new(SqliteStore::open(&config.metrics.database)?)
    } else {
        warn!("metrics persistence disabled, slots kept in memory");
        Arc::new(MemoryStore::new())
    };
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let vehicles = build_vehicles(&config)?;
    let coordinator = Arc::new(Coordinator::new(vehicles.clone()));

    let mut sims = Vec::with_capacity(config.loadpoints.len());
    for lpc in &config.loadpoints {
        let lp = SimLoadpoint::new(&lpc.title, lpc.priority, coordinator.clone());
        lp.set_flexibility(lpc.flexibility_w);
        sims.push(lp);
    }
    let loadpoints: Vec<Arc<dyn Loadpoint>> = sims
        .iter()
        .map(|lp| lp.clone() as Arc<dyn Loadpoint>)
        .collect();

    let site = Arc::new(Site::new(
        &config.site.title,
        coordinator,
        loadpoints,
        store,
        clock,
        config.timezone()?,
        config.metrics.profile_days,
    ));

    let mut persistence = PersistenceManager::new(&config.metrics.state_file);
    if let Err(e) = persistence.load() {
        warn!("Failed to load persistent state: {}", e);
    }
    site.restore_meter_states(&persistence.state().meters);
    site.restore_assignments(persistence.state());

    // configured vehicles for loadpoints left without one
    for (lp, lpc) in sims.iter().zip(&config.loadpoints) {
        if lp.vehicle().is_some() {
            continue;
        }
        if let Some(title) = &lpc.vehicle
            && let Some(v) = vehicles.iter().find(|v| v.title() == title)
        {
            lp.select_vehicle(Some(v.clone()));
        }
    }

    let config = Arc::new(config);
    let sims = Arc::new(sims);
    let mut ticker = tokio::time::interval(Duration::from_millis(config.site.cycle_interval_ms));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let cycle = {
                    let site = site.clone();
                    let sims = sims.clone();
                    let config = config.clone();
                    tokio::task::spawn_blocking(move || run_cycle(&site, &sims, &config))
                };
                match cycle.await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => error!("cycle: {}", e),
                    Err(e) => error!("cycle task failed: {}", e),
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown requested");
                break;
            }
        }
    }

    let mut current = site.assignments().assignments;
    for lp in sims.iter() {
        let title = lp.title();
        persistence.set_assignment(&title, current.remove(&title));
    }
    persistence.set_meters(site.meter_states());
    persistence.save()?;
    info!("Site shutdown complete");

    Ok(())
}
