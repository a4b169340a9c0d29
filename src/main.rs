use clap::Parser;
use log::*;
use anyhow::{Result, Context};
use std::collections::HashMap;

use sentinel_audit::{Opts, audit::AuditSession, probe::Prober, report, resp::TcpConnector, sentinel_config, utility};

#[tokio::main]
async fn main() -> Result<()>
{
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    dotenv::dotenv().ok();
    let options = Opts::parse();

    let mut changed_options = HashMap::new();
    let config_file = utility::set_config_file(&options.config_file, &mut changed_options);
    let parallel = utility::set_parallel(&options.parallel, &mut changed_options);
    let timeout = utility::set_timeout(&options.timeout_ms, &mut changed_options);
    if let Err(e) = utility::dotenv_writer(options.write_dotenv, changed_options) {
        error!("{:#}", e);
    }

    info!("Reports to run: {:?}", options.report);
    info!("Running sentinel config audit");

    // an unreadable configuration file is the only reason to stop.
    let topology = sentinel_config::load_sentinel_config(&config_file)?;

    let prober = Prober::new(Box::new(TcpConnector), timeout);
    let mut session = AuditSession::new(topology, prober, parallel);

    // probing blocks on network I/O, so it runs outside of the async workers.
    let session = tokio::task::spawn_blocking(move || -> Result<AuditSession> {
        session.run()?;
        Ok(session)
    })
        .await
        .with_context(|| "The audit task did not complete")??;

    report::run_reports(&session, &options)?;

    Ok(())
}
