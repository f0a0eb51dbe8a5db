use clap::{Arg, Command};
use peridot::fs::FsDirectory;
use peridot::server;
use peridot::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = Command::new("peridot")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Local-first board note-taking server")
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .value_name("DIR")
                .help("Directory holding the board files")
                .default_value("./peridot-data"),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .value_name("PORT")
                .help("Port to bind on localhost (0 picks an ephemeral port)")
                .value_parser(clap::value_parser!(u16))
                .default_value("4733"),
        )
        .get_matches();

    let data_dir = matches.get_one::<String>("data-dir").unwrap(); // Safe due to default
    let port = *matches.get_one::<u16>("port").unwrap();

    let root = FsDirectory::open(data_dir).await?;
    println!("Using data directory: {}", data_dir);

    let state = AppState::new(root);
    server::start_server(state, port).await?;

    println!("Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;
    Ok(())
}
