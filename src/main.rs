use std::process::ExitCode;
use std::time::Duration;

use a2squery::{Endpoint, QueryClient, ServerInfo, SourceQueryError};
use argh::FromArgs;

/// Query a Source engine server for its info and player list.
#[derive(FromArgs)]
struct Args {
    /// server address, as host or host:port
    #[argh(positional)]
    address: Endpoint,

    /// how long to wait for each reply, in milliseconds
    #[argh(option, default = "5000")]
    timeout_ms: u64,

    /// also list the connected players
    #[argh(switch)]
    players: bool,
}

fn print_info(info: &ServerInfo) {
    println!("{} ({})", info.hostname, info.version);
    println!("  game:     {} [{}] app {}", info.game, info.folder, info.game_id);
    println!("  map:      {}", info.map);
    println!(
        "  players:  {}/{} ({} bots)",
        info.players, info.max_players, info.bots
    );
    println!(
        "  type:     {} on {}, password {}, vac {}",
        info.server_type, info.server_env, info.password_protected, info.vac_enabled
    );
    if let Some(ext) = &info.extended {
        println!("  port:     {}", ext.port);
        println!("  steam id: {}", ext.steam_id);
        if ext.spectator_port != 0 {
            println!("  sourcetv: {} on {}", ext.spectator_name, ext.spectator_port);
        }
        println!("  tags:     {}", ext.keywords);
    }
}

async fn run(args: Args) -> Result<(), SourceQueryError> {
    let endpoint = args
        .address
        .with_timeout(Duration::from_millis(args.timeout_ms));
    let client = QueryClient::new(endpoint);

    let info = client.get_info().await?;
    print_info(&info);

    if args.players {
        for player in client.players().await? {
            let player = player?;
            println!(
                "{:>3} {:<32} {:>6} {:>8.0}s",
                player.id, player.name, player.frags, player.time
            );
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let args: Args = argh::from_env();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
