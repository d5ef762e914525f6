use rayon::ThreadPoolBuilder;
use anyhow::Result;
use log::error;
use crate::errors::PricingRunError;
use crate::initialization::init;
use crate::worker::run;

mod config;
mod errors;
mod initialization;
mod logging;
mod worker;

fn main() -> Result<()> {
    ThreadPoolBuilder::new().num_threads(2).build_global()?;

    // Load config, set up logging and load reference data. If initialization fails, we may not
    // even be able to log.
    let (config, mgr) = match init() {
        Ok((c, m)) => (c, m),
        Err(e) => {
            return Err(PricingRunError(format!("Initialization failed: {}", e)))?;
        }
    };

    if let Err(e) = run(&config, &mgr) {
        error!("Run failed: {}", e);
        return Err(PricingRunError(format!("Run failed: {}", e)))?;
    }

    Ok(())
}
