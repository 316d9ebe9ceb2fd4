use std::{path::Path, process::ExitCode};

use plasma_pic::{
    config::{Config, SAVE_FILE},
    Simulation,
};
use tracing::{error, info, warn};

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let path = Path::new(SAVE_FILE);
    let config = if path.exists() {
        match Config::load(path) {
            Ok(cfg) => {
                info!("Loaded config from {SAVE_FILE}");
                cfg
            }
            Err(e) => {
                warn!("Unable to load {SAVE_FILE}; using defaults: {e}");
                Config::default()
            }
        }
    } else {
        let cfg = Config::default();
        if let Err(e) = cfg.save(path) {
            warn!("Unable to save the default config: {e}");
        }
        cfg
    };

    let mut sim = match Simulation::new(&config) {
        Ok(s) => s,
        Err(e) => {
            error!("Unable to build the simulation: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!("Running {} steps, dt = {:e} s", config.num_steps, config.dt);
    let mut lost = 0;
    let mut done = 0;

    while done < config.num_steps {
        let n = config.snapshot_ratio.min(config.num_steps - done);
        lost += sim.run(n);
        done += n;

        info!("Step {done}, {lost} lost to the wall\n{}", sim.properties());

        if sim.current_count() == 0 {
            warn!("No particles remain; stopping.");
            break;
        }
    }

    info!("Run complete.");
    ExitCode::SUCCESS
}
