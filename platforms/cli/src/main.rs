use bbtm::analyzer::analyze;
use bbtm::export::to_table_text;
use bbtm::history::History;
use bbtm::loader::ProgramLoader;
use bbtm::programs::ProgramManager;
use bbtm::render::{render_image, ImageOptions};
use bbtm::types::{DecisionStatus, Program, DEFAULT_MAX_STEPS};
use clap::Parser;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufWriter, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Simulate a 2-symbol Turing machine and inspect its trace.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
#[clap(after_help = "EXAMPLES:
  bbtm-cli --machine mAQACAQECAAAAAAAA --debug
  bbtm-cli --catalogue 'busy beaver 4' --image bb4.ppm --head-move
  cat machines/bb3.tm | bbtm-cli --export")]
struct Cli {
    /// An encoded machine (m...) or the path of a machine file. Read from stdin when piped.
    #[clap(short, long)]
    machine: Option<String>,

    /// Name of a built-in machine
    #[clap(short, long, conflicts_with_all = ["machine", "db"])]
    catalogue: Option<String>,

    /// Seed database file to read the machine from
    #[clap(long, requires = "index", conflicts_with = "machine")]
    db: Option<PathBuf>,

    /// Index of the machine in the seed database
    #[clap(long)]
    index: Option<usize>,

    /// The initial tape as a bitstring
    #[clap(short, long)]
    tape: Option<String>,

    /// Maximum number of steps to simulate
    #[clap(short, long, default_value_t = DEFAULT_MAX_STEPS)]
    steps: usize,

    /// Print each step of the execution
    #[clap(short = 'd', long)]
    debug: bool,

    /// Print the machine as a text table
    #[clap(long)]
    export: bool,

    /// Write the space-time diagram to a PPM file
    #[clap(long)]
    image: Option<PathBuf>,

    /// Image width in pixels
    #[clap(long, default_value_t = ImageOptions::default().width)]
    width: usize,

    /// Image height in pixels, which is also the number of steps drawn
    #[clap(long, default_value_t = ImageOptions::default().height)]
    height: usize,

    /// Column of tape position 0, as a fraction of the image width
    #[clap(long, default_value_t = ImageOptions::default().origin_x)]
    origin: f64,

    /// Color the head by the direction it just moved
    #[clap(long)]
    head_move: bool,

    /// Print the execution history as JSON
    #[clap(long)]
    json: bool,

    /// Print the decision status for a classifier result code
    #[clap(long)]
    status: Option<String>,

    /// Print structural warnings about the machine
    #[clap(long)]
    check: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    if let Some(code) = &cli.status {
        if let Some(status) = DecisionStatus::from_api_status(Some(code)) {
            let value = serde_json::to_value(status)?;
            println!("{}", value.as_str().unwrap_or_default());
        }

        if !has_machine_source(cli, atty::isnt(atty::Stream::Stdin)) {
            return Ok(());
        }
    }

    let program = load_program(cli)?;
    let machine = &program.machine;

    if cli.export {
        print!("{}", to_table_text(machine));
    }

    if cli.check {
        for finding in analyze(machine) {
            println!("warning: {:?}", finding);
        }
    }

    let tape = cli.tape.as_deref().unwrap_or(&program.tape);

    if let Some(path) = &cli.image {
        let options = ImageOptions {
            width: cli.width,
            height: cli.height,
            origin_x: cli.origin,
            show_head_move: cli.head_move,
        };
        let image = render_image(machine, tape, &options);
        let file = File::create(path)
            .map_err(|e| format!("Failed to create image {}: {}", path.display(), e))?;
        image.write_ppm(BufWriter::new(file))?;
    }

    let history = History::run(machine, tape, cli.steps);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }

    let (lo, hi) = history.bounds().unwrap_or((0, 0));

    if cli.debug {
        for row in 0..history.len() {
            if let Some(line) = history.format_row(row, lo, hi) {
                println!("{}", line);
            }
        }
        println!();
    }

    if let Some(last) = history.last() {
        println!("Machine: {}", machine);
        println!(
            "Steps: {}{}",
            history.len() - 1,
            if history.halted() { " (halted)" } else { "" }
        );
        println!("Ones: {}", last.tape.ones());
        println!("Tape: {}", last.tape.to_bits(lo..=hi));
    }

    Ok(())
}

/// Returns true if the arguments, or a piped stdin, name a machine to load.
fn has_machine_source(cli: &Cli, stdin_piped: bool) -> bool {
    cli.machine.is_some() || cli.catalogue.is_some() || cli.db.is_some() || stdin_piped
}

/// Loads the machine named by the CLI arguments.
///
/// Tries the catalogue, then the seed database, then `--machine`, and finally stdin.
fn load_program(cli: &Cli) -> Result<Program, Box<dyn Error>> {
    if let Some(name) = &cli.catalogue {
        return Ok(ProgramManager::get_program_by_name(name)?);
    }

    if let Some(db) = &cli.db {
        let index = cli.index.unwrap_or_default();
        return Ok(Program {
            name: format!("#{}", index),
            tape: "0".to_string(),
            machine: ProgramLoader::load_from_database(db, index)?,
        });
    }

    if let Some(machine) = &cli.machine {
        let path = Path::new(machine);
        return Ok(if path.is_file() {
            ProgramLoader::load_program(path)?
        } else {
            ProgramLoader::load_program_from_string(machine)?
        });
    }

    if atty::isnt(atty::Stream::Stdin) {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| format!("Failed to read from stdin: {}", e))?;
        return Ok(ProgramLoader::load_program_from_string(&buffer)?);
    }

    Err("No machine given: use --machine, --catalogue, --db or pipe one on stdin".into())
}
