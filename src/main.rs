use clap::{CommandFactory, Parser};
use simplelog::*;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use time::macros::format_description;

#[macro_use]
extern crate log;

mod clapargs;
mod credentials;
mod error;
mod fetcher;
mod filesink;
mod httpagent;
mod naming;
mod orchestrator;
mod report;
mod s3agent;

use error::ConfigError;
use orchestrator::RunSettings;
use s3agent::S3Options;

fn main() {
    // Parse command line args
    let args = clapargs::Args::parse();

    // Logging comes first: the local UTC offset can only be read while the
    // process is still single-threaded
    init_logging(args.debug);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("could not start the async runtime: {}", e);
            process::exit(1);
        }
    };
    runtime.block_on(run(args));
}

fn init_logging(debug: bool) {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let mut builder = ConfigBuilder::new();
    // Falls back to UTC when the offset cannot be determined
    let _ = builder.set_time_offset_to_local();
    let log_config = builder
        .set_time_format_custom(format_description!(
            "[day]/[month]/[year] [hour]:[minute]:[second]"
        ))
        .build();
    if let Err(e) = CombinedLogger::init(vec![TermLogger::new(
        level,
        log_config,
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]) {
        eprintln!("could not set up logging: {e}");
    }
}

async fn run(args: clapargs::Args) {
    let bin_name = env!("CARGO_PKG_NAME");
    info!("{} started, pid: {}", bin_name, std::process::id());

    // Fail fast on bad arguments, before prompting or touching the network
    let urls = orchestrator::collect_urls(&args.download);
    if let Err(e) = orchestrator::check_plan(&urls, args.concurrent) {
        if e == ConfigError::NoUrls {
            let _ = clapargs::Args::command().print_help();
            println!();
            println!(
                "example: {bin_name} -d http://domain.com/file1 https://domain.com/file2 \
                 s3://bucket/file1"
            );
        }
        error!("{}", e);
        process::exit(1);
    }

    // One prompt per run; every S3 download shares the same keys
    let credentials = if args.s3_credentials {
        match credentials::obtain(args.reveal_credentials) {
            Ok(keys) => Some(Arc::new(keys)),
            Err(e) => {
                error!("could not read S3 credentials: {}", e);
                process::exit(1);
            }
        }
    } else {
        None
    };

    let settings = RunSettings {
        save_dir: PathBuf::from(&args.path),
        concurrency: args.concurrent,
        timeout: Duration::from_secs(args.timeout),
        credentials,
        s3: S3Options {
            endpoint_url: args.s3_endpoint,
            region: args.s3_region,
        },
    };

    let results = match orchestrator::run(&urls, &settings).await {
        Ok(results) => results,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    println!();
    print!("{}", report::render(&results));
    println!();

    // Per-file failures are reported in the table but do not change the exit code
    let failed = results.iter().filter(|r| !r.is_success()).count();
    info!(
        "{} finished, downloaded {} files ({} failed)",
        bin_name,
        results.len() - failed,
        failed,
    );
}
