//! JFP solver server and command line.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use jfp_server::bench::{run_bench, BenchConfig};
use jfp_server::{
    handle_request, Server, ServerConfig, SolveArgs, DEFAULT_MAX_REQUEST_BYTES, DEFAULT_READ_TIMEOUT,
};

#[derive(Parser)]
#[command(name = "jfp-server", version, about = "Job flow priority solver")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve solve requests over TCP
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind
        #[arg(long)]
        port: u16,

        /// Largest request accepted in one read
        #[arg(long, default_value_t = DEFAULT_MAX_REQUEST_BYTES)]
        max_request_bytes: usize,

        /// Drop a connection that sends nothing for this many milliseconds
        #[arg(long, default_value_t = DEFAULT_READ_TIMEOUT.as_millis() as u64)]
        read_timeout_ms: u64,

        #[command(flatten)]
        solve: SolveArgs,
    },
    /// Solve a request file and print the response
    Solve {
        /// Request JSON file
        #[arg(long)]
        input: PathBuf,

        #[command(flatten)]
        solve: SolveArgs,
    },
    /// Compare the search against its warm start on random instances
    Bench {
        /// Number of instances
        #[arg(long, default_value_t = 100)]
        trials: usize,

        /// Jobs per instance
        #[arg(long, default_value_t = 3)]
        jobs: usize,

        /// Links per instance
        #[arg(long, default_value_t = 4)]
        links: usize,

        /// Instance generator seed
        #[arg(long, default_value_t = 12345)]
        instance_seed: u64,

        /// Write the summary as JSON
        #[arg(long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        solve: SolveArgs,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve {
            host,
            port,
            max_request_bytes,
            read_timeout_ms,
            solve,
        } => {
            let config = ServerConfig::new(format!("{}:{}", host, port))
                .with_max_request_bytes(max_request_bytes)
                .with_read_timeout(Duration::from_millis(read_timeout_ms))
                .with_settings(solve.to_settings());
            Server::bind(config)?.serve()
        }
        Command::Solve { input, solve } => {
            let bytes = fs::read(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let response = handle_request(&bytes, &solve.to_settings())
                .with_context(|| format!("Failed to solve {}", input.display()))?;
            let json = serde_json::to_string_pretty(&response)
                .context("Failed to encode response")?;
            println!("{}", json);
            Ok(())
        }
        Command::Bench {
            trials,
            jobs,
            links,
            instance_seed,
            output,
            solve,
        } => {
            let config = BenchConfig {
                trials,
                jobs,
                links,
                seed: instance_seed,
            };
            let summary = run_bench(&config, &solve.to_settings())?;

            println!("\n{}", "=".repeat(60));
            println!("JFP search vs warm start ({} jobs x {} links)", jobs, links);
            println!("{}", "=".repeat(60));
            println!("Trials:                 {}", summary.trials);
            println!("Mean improvement:       {:.2}%", 100.0 * summary.mean_improvement);
            println!("Best improvement:       {:.2}%", 100.0 * summary.best_improvement);
            println!("Mean worst-job gain:    {:.2}%", 100.0 * summary.mean_max_improvement);
            println!("Notable trials:         {}", summary.notable);
            println!("Total time:             {:.3} s", summary.total_time_ms as f64 / 1000.0);

            if let Some(path) = output {
                let file = fs::File::create(&path)
                    .with_context(|| format!("Failed to create file {}", path.display()))?;
                serde_json::to_writer_pretty(std::io::BufWriter::new(file), &summary)
                    .with_context(|| format!("Failed to write JSON to {}", path.display()))?;
            }
            Ok(())
        }
    }
}
