//! Local node parallel process launcher.
//!
//! Spawns N copies of a group binary on this node, handing each one its rank
//! and the listen addresses of the whole group through the environment.
use clap::Parser;
use std::net::TcpListener;
use std::process;

const DEFAULT_PROC_COUNT: usize = 2;

#[derive(Parser)]
struct Args {
    /// Number of processes to spawn on this node
    #[arg(short)]
    proc_count: Option<usize>,

    /// Binary to run
    binary: String,

    /// Arguments to binary
    args: Vec<String>,
}

/// Reserve one loopback address per rank by binding ephemeral ports, then
/// release them for the children to rebind.
fn group_addrs(count: usize) -> Vec<String> {
    let listeners: Vec<TcpListener> = (0..count)
        .map(|_| TcpListener::bind("127.0.0.1:0").expect("failed to bind ephemeral port"))
        .collect();
    listeners
        .iter()
        .map(|listener| {
            listener
                .local_addr()
                .expect("failed to read listener address")
                .to_string()
        })
        .collect()
}

fn main() {
    env_logger::init();

    let args = Args::parse();
    let proc_count = args.proc_count.unwrap_or(DEFAULT_PROC_COUNT);
    let conn_list = group_addrs(proc_count).join(",");
    let mut children = vec![];
    for rank in 0..proc_count {
        log::info!("starting process {}", rank);
        let child = process::Command::new(&args.binary)
            .args(&args.args)
            .env("TRI_RANK", rank.to_string())
            .env("TRI_CONN_LIST", &conn_list)
            .spawn()
            .expect("failed to spawn child program");
        children.push(child);
    }

    // Wait for all children; report the first failing exit code.
    let mut exit_code = 0;
    for (rank, child) in children.iter_mut().enumerate() {
        let status = child.wait().expect("failed to await process");
        log::info!("child process {} completed with {}", rank, status);
        if !status.success() && exit_code == 0 {
            exit_code = status.code().unwrap_or(1);
        }
    }
    process::exit(exit_code);
}
