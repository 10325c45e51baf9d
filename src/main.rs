// Copyright (c) 2026 proc-disasm Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use proc_disasm::capstone::Disassembler;
use proc_disasm::listing::format_listing;
use proc_disasm::request_handler::{parse_hex_address, Session};
use proc_disasm::transport::StdioTransport;
use proc_disasm::{build_region_map, disassemble, logging, LinuxProcess, DEFAULT_COUNT};

#[derive(Parser, Debug)]
#[command(name = "proc-disasm", version, about = "Annotated disassembly of a live process")]
struct Cli {
    /// Enable debug output
    #[arg(short = 'd', long = "debug", global = true, default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Disassemble instructions at an address
    Disasm(DisasmArgs),
    /// Print the named section regions of every loaded module
    Regions(TargetArgs),
    /// Answer Content-Length framed JSON requests on stdin/stdout
    Serve(TargetArgs),
}

#[derive(Args, Debug)]
struct TargetArgs {
    /// Process to inspect (defaults to this process)
    #[arg(short = 'p', long = "pid")]
    pid: Option<u32>,
}

#[derive(Args, Debug)]
struct DisasmArgs {
    #[command(flatten)]
    target: TargetArgs,

    /// Hex address ("0x...") or symbol name
    address: String,

    /// Maximum number of instructions
    #[arg(short = 'n', long = "count", default_value_t = DEFAULT_COUNT)]
    count: usize,

    /// Print records as JSON instead of a text listing
    #[arg(long = "json", default_value_t = false)]
    json: bool,
}

fn attach(target: &TargetArgs) -> Result<LinuxProcess> {
    let pid = target.pid.unwrap_or_else(std::process::id);
    LinuxProcess::attach(pid).with_context(|| format!("attaching to pid {}", pid))
}

fn run_disasm(args: &DisasmArgs) -> Result<()> {
    let process = attach(&args.target)?;
    let address = match parse_hex_address(&args.address) {
        Some(address) => address,
        None => process
            .symbols()
            .get_by_name(&args.address)
            .map(|s| s.address)
            .with_context(|| format!("no symbol named {}", args.address))?,
    };

    let decoder = Disassembler::new(&process)?;
    let records = disassemble(&process, &decoder, &process, address, args.count)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        print!("{}", format_listing(&records));
    }
    Ok(())
}

fn run_regions(target: &TargetArgs) -> Result<()> {
    let process = attach(target)?;
    for region in build_region_map(&process) {
        println!("{}", region.to_json());
    }
    Ok(())
}

fn run_serve(target: &TargetArgs) -> Result<()> {
    let process = attach(target)?;
    let decoder = Disassembler::new(&process)?;
    let session = Session {
        process: &process,
        decoder: &decoder,
        resolver: &process,
    };
    log::info!("serving requests for pid {}", process.pid());
    session.serve(&mut StdioTransport::stdio())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _logger = logging::init(cli.debug)?;

    match &cli.command {
        Command::Disasm(args) => run_disasm(args),
        Command::Regions(target) => run_regions(target),
        Command::Serve(target) => run_serve(target),
    }
}
