use std::fmt::Display;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use crate::api::Gateway;
use crate::state::{Delta, ProviderCommand};

/// Runs gateway requests on a background thread. The thread exits when either
/// channel end is dropped.
pub fn spawn_provider(
    gateway: Gateway,
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        while let Ok(cmd) = cmd_rx.recv() {
            if tx.send(execute(&gateway, cmd)).is_err() {
                break;
            }
        }
    })
}

pub fn execute(gateway: &Gateway, cmd: ProviderCommand) -> Delta {
    match cmd {
        ProviderCommand::FetchDrivers => Delta::SetDrivers(flatten(gateway.fetch_drivers())),
        ProviderCommand::FetchSeasons {
            generation,
            subject,
        } => {
            let result = flatten(gateway.fetch_driver_years(&subject));
            Delta::SeasonsLoaded {
                generation,
                subject,
                result,
            }
        }
        ProviderCommand::FetchStandings {
            generation,
            subject,
            season,
        } => {
            let result = flatten(gateway.fetch_driver_standings(&subject, season));
            Delta::StandingsLoaded {
                generation,
                subject,
                season,
                result,
            }
        }
        ProviderCommand::FetchDriverStats { subject } => {
            let result = flatten(gateway.fetch_driver_stats(&subject));
            Delta::DriverStatsLoaded { subject, result }
        }
        ProviderCommand::FetchDriverPoints { subject, season } => {
            let result = flatten(gateway.fetch_driver_points(&subject, season));
            Delta::PointsLoaded {
                subject,
                season,
                result,
            }
        }
        ProviderCommand::FetchStartingPositions { subject, season } => {
            let result = flatten(gateway.fetch_starting_positions(&subject, season));
            Delta::StartingPositionsLoaded {
                subject,
                season,
                result,
            }
        }
        ProviderCommand::FetchPodiums { subject } => {
            let result = flatten(gateway.fetch_podiums_by_season(&subject));
            Delta::PodiumsLoaded { subject, result }
        }
    }
}

// The alternate form keeps the whole context chain on one line for the console.
fn flatten<T, E: Display>(result: Result<T, E>) -> Result<T, String> {
    result.map_err(|err| format!("{err:#}"))
}
