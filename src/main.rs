use clap::{ArgMatches, Command};
use ssi_rust::{
    config::{self, Config},
    data_io::{
        convert_temperature_to_kelvin, load_dataset,
        output_trait::{create_writer, SeverityMetadata},
        utils, GridAccessor,
    },
    forecast::ForecastIterator,
    parallel::compute_and_write_parallel,
    time_utils,
};

fn main() {
    let matches = build_cli().get_matches();

    match matches.subcommand() {
        Some(("run", sub_matches)) => {
            if let Err(e) = run_severity(sub_matches) {
                eprintln!("Severity computation error: {}", e);
                std::process::exit(1);
            }
        }
        Some(("info", sub_matches)) => {
            if let Err(e) = run_info(sub_matches) {
                eprintln!("Dataset info error: {}", e);
                std::process::exit(1);
            }
        }
        _ => {
            eprintln!("Please specify a subcommand. Use --help for more information.");
            std::process::exit(1);
        }
    }
}

fn build_cli() -> Command {
    Command::new("ssi_rust")
        .version("0.1.0")
        .about("Storm severity index from gridded forecast archives")
        .subcommand(config::run_command())
        .subcommand(
            Command::new("info")
                .about("Print dataset dimensions, variables and time range")
                .arg(
                    clap::Arg::new("input")
                        .short('i')
                        .long("input")
                        .value_name("PATH")
                        .help("Input gridded forecast archive (NetCDF)")
                        .required(true),
                ),
        )
}

fn run_severity(matches: &ArgMatches) -> Result<(), String> {
    let config = Config::from_run_matches(matches)?;

    println!("Loading dataset: {}", config.input_path.display());
    let mut dataset =
        load_dataset(&config.input_path).map_err(|e| format!("Failed to load dataset: {}", e))?;

    // Unit normalization must happen before any extraction
    convert_temperature_to_kelvin(&mut dataset);

    let num_available = dataset.num_time_steps();
    let end_step = match config.num_steps {
        Some(n) => config.start_step + n,
        None => num_available,
    };
    let range = config.start_step..end_step;

    if config.verbose {
        println!(
            "Dataset has {} time steps; processing range [{}, {})",
            num_available, range.start, range.end
        );
    }

    let accessor = GridAccessor::new(&dataset, config.constants.window);
    let (nj, ni) = accessor.grid_shape();
    if nj == 0 || ni == 0 {
        return Err("Extraction window selects no grid cells".to_string());
    }

    let mut writer = create_writer(
        &config.output_path,
        config.output_format,
        accessor.longitudes(),
        accessor.latitudes(),
    )
    .map_err(|e| format!("Failed to create writer: {}", e))?;

    let metadata = SeverityMetadata {
        source: config.input_path.display().to_string(),
        window: config.constants.window,
        ..Default::default()
    };
    writer
        .set_metadata(&metadata)
        .map_err(|e| format!("Failed to set metadata: {}", e))?;
    writer
        .create(range.len())
        .map_err(|e| format!("Failed to initialize output: {}", e))?;

    if config.parallel {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.num_threads)
            .build()
            .map_err(|e| format!("Failed to create thread pool: {}", e))?;

        let written = pool.install(|| {
            compute_and_write_parallel(
                &dataset,
                config.constants.window,
                &config.constants,
                range,
                config.include_components,
                writer,
            )
        })
        .map_err(|e| format!("Parallel computation failed: {}", e))?;

        println!(
            "Severity computation completed: {} steps written to {}",
            written,
            config.output_path.display()
        );
    } else {
        let mut iterator = ForecastIterator::new(
            &dataset,
            config.constants.window,
            &config.constants,
            range,
        )
        .map_err(|e| format!("Invalid time range: {}", e))?;
        if config.include_components {
            iterator = iterator.with_components();
        }

        let mut written = 0usize;
        for step in iterator {
            let step = step.map_err(|e| format!("Step computation failed: {}", e))?;
            if config.verbose {
                println!(
                    "  {} severity range [{:.2}, {:.2}]",
                    step.timestamp(),
                    step.severity.iter().cloned().fold(f64::INFINITY, f64::min),
                    step.severity
                        .iter()
                        .cloned()
                        .fold(f64::NEG_INFINITY, f64::max),
                );
            }
            writer
                .write_step(&step)
                .map_err(|e| format!("Failed to write step: {}", e))?;
            written += 1;
        }

        writer
            .close()
            .map_err(|e| format!("Failed to finalize output: {}", e))?;

        println!(
            "Severity computation completed: {} steps written to {}",
            written,
            config.output_path.display()
        );
    }

    Ok(())
}

fn run_info(matches: &ArgMatches) -> Result<(), String> {
    let input = matches.get_one::<String>("input").unwrap();

    let dataset = load_dataset(input).map_err(|e| format!("Failed to load dataset: {}", e))?;

    println!("Dataset: {}", input);
    println!(
        "Grid: {} longitudes x {} latitudes",
        dataset.longitudes().len(),
        dataset.latitudes().len()
    );
    if !dataset.levels().is_empty() {
        println!("Isobaric levels (hPa): {:?}", dataset.levels());
    }
    println!("Time steps: {}", dataset.num_time_steps());
    if let (Some(first), Some(last)) = (dataset.times().first(), dataset.times().last()) {
        println!(
            "Time range: {} .. {}",
            time_utils::format_hour(first),
            time_utils::format_hour(last)
        );
    }

    println!("Variables:");
    for name in dataset.variable_names() {
        let var = dataset
            .variable(name)
            .map_err(|e| format!("Variable lookup failed: {}", e))?;
        let units = var
            .units
            .clone()
            .unwrap_or_else(|| utils::default_units(name));
        let kind = match var.data {
            ssi_rust::data_io::VariableData::Surface(_) => "surface",
            ssi_rust::data_io::VariableData::Isobaric(_) => "isobaric",
        };
        let marker = if utils::is_severity_input_var(name) {
            " *"
        } else {
            ""
        };
        println!("  {} [{}] ({}){}", name, units, kind, marker);
    }
    println!("(* severity pipeline input)");

    Ok(())
}
