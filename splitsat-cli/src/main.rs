use std::env;
use std::fs;
use std::io;
use std::io::Write;
use std::time::Duration;

use anyhow::{anyhow, Error};
use clap::{App, Arg};
use env_logger::{fmt, Builder, Target};
use log::{error, info, Level, LevelFilter, Record};

use splitsat::dimacs::DimacsParser;
use splitsat::{CnfFormula, Solver, SolverConfig, SolverResult, Strategy};

fn main() {
    let exit_code = match main_with_err() {
        Err(err) => {
            error!("{}", err);
            1
        }
        Ok(exit_code) => exit_code,
    };
    std::process::exit(exit_code);
}

fn main_with_err() -> Result<i32, Error> {
    let matches = App::new("splitsat")
        .version(env!("SPLITSAT_VERSION"))
        .about("A DPLL based SAT solver")
        .arg_from_usage("[INPUT] 'The DIMACS CNF file to solve (stdin if omitted)'")
        .arg_from_usage("-v, --verbose 'Enable progress logging'")
        .arg_from_usage("-a, --assignment 'Print the model in human readable form when satisfiable'")
        .arg_from_usage("-s, --stats 'Print search statistics'")
        .arg_from_usage("-t, --timeout [sec] 'Wall clock deadline in seconds (0 means none)'")
        .arg_from_usage("-d, --decisions [n] 'Decision budget (0 means none)'")
        .arg(
            Arg::from_usage("--strategy [name] 'Decision heuristic'")
                .possible_values(&["first", "frequent", "jw", "random"])
                .default_value("jw"),
        )
        .get_matches();

    init_logging(matches.is_present("verbose"));

    info!("this is splitsat {}", env!("SPLITSAT_VERSION"));
    info!(
        "  {} build - {}",
        env!("SPLITSAT_PROFILE"),
        env!("SPLITSAT_RUSTC_VERSION")
    );

    let config = SolverConfig {
        strategy: parse_strategy(&matches)?,
        timeout: parse_timeout(&matches)?,
        decision_budget: parse_decision_budget(&matches)?,
        ..SolverConfig::default()
    };

    let stdin = io::stdin();

    let mut locked_stdin;
    let mut opened_file;

    let file = match matches.value_of("INPUT") {
        Some(path) => {
            info!("reading file '{}'", path);
            opened_file = fs::File::open(path)?;
            &mut opened_file as &mut dyn io::Read
        }
        None => {
            info!("reading from stdin");
            locked_stdin = stdin.lock();
            &mut locked_stdin as &mut dyn io::Read
        }
    };

    let formula = DimacsParser::parse(file)?;

    info!(
        "parsed formula with {} variables and {} clauses",
        formula.var_count(),
        formula.len()
    );

    let mut solver = Solver::with_config(config);
    solver.add_formula(&formula);

    let result = solver.solve()?;

    match result {
        SolverResult::Satisfiable => println!("s SATISFIABLE"),
        SolverResult::Unsatisfiable => println!("s UNSATISFIABLE"),
        SolverResult::Unknown => println!("s UNKNOWN"),
    }

    if result == SolverResult::Satisfiable {
        print_model(&solver);

        if matches.is_present("assignment") {
            print_assignment(&solver);

            if model_satisfies(&solver, &formula) {
                info!("model verified against the input formula");
            } else {
                return Err(anyhow!("model does not satisfy the input formula"));
            }
        }
    }

    if matches.is_present("stats") {
        print_stats(&solver);
    }

    Ok(match result {
        SolverResult::Satisfiable => 10,
        SolverResult::Unsatisfiable => 20,
        SolverResult::Unknown => 0,
    })
}

/// Log to stdout as DIMACS `c` comment lines so diagnostics never corrupt the result output.
fn init_logging(verbose: bool) {
    let format = |buf: &mut fmt::Formatter, record: &Record| {
        if record.level() == Level::Info {
            writeln!(buf, "c {}", record.args())
        } else {
            writeln!(buf, "c {}: {}", record.level(), record.args())
        }
    };

    let mut builder = Builder::new();
    builder.target(Target::Stdout).format(format).filter(
        None,
        if verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        },
    );

    if let Ok(ref env_var) = env::var("SPLITSAT_LOG") {
        builder.parse_filters(env_var);
    }

    builder.init();
}

fn parse_strategy(matches: &clap::ArgMatches) -> Result<Strategy, Error> {
    matches
        .value_of("strategy")
        .unwrap_or("jw")
        .parse()
        .map_err(|message: String| anyhow!(message))
}

fn parse_timeout(matches: &clap::ArgMatches) -> Result<Option<Duration>, Error> {
    let seconds = match matches.value_of("timeout") {
        Some(value) => value
            .parse::<f64>()
            .ok()
            .filter(|&seconds| seconds >= 0.0)
            .ok_or_else(|| anyhow!("invalid timeout '{}'", value))?,
        None => return Ok(None),
    };

    if seconds == 0.0 {
        Ok(None)
    } else {
        Ok(Some(Duration::from_secs_f64(seconds)))
    }
}

fn parse_decision_budget(matches: &clap::ArgMatches) -> Result<Option<u64>, Error> {
    let decisions = match matches.value_of("decisions") {
        Some(value) => value
            .parse::<u64>()
            .map_err(|_| anyhow!("invalid decision budget '{}'", value))?,
        None => return Ok(None),
    };

    if decisions == 0 {
        Ok(None)
    } else {
        Ok(Some(decisions))
    }
}

/// One `<var> = <bit>` line per variable; unassigned variables are reported as 0.
fn print_model(solver: &Solver) {
    let mut bits = vec![false; solver.var_count()];
    if let Some(model) = solver.model() {
        for lit in model {
            if lit.is_positive() {
                bits[lit.index()] = true;
            }
        }
    }

    for (index, &bit) in bits.iter().enumerate() {
        println!("{} = {}", index + 1, bit as u8);
    }
}

/// Spelled out variable values, the human readable form behind `--assignment`.
fn print_assignment(solver: &Solver) {
    let mut values = vec![None; solver.var_count()];
    if let Some(model) = solver.model() {
        for lit in model {
            values[lit.index()] = Some(lit.is_positive());
        }
    }

    for (index, value) in values.iter().enumerate() {
        let value = match value {
            Some(true) => "true",
            Some(false) => "false",
            None => "unassigned",
        };
        println!("c x{} = {}", index + 1, value);
    }
}

fn model_satisfies(solver: &Solver, formula: &CnfFormula) -> bool {
    let model = match solver.model() {
        Some(model) => model,
        None => return false,
    };

    formula
        .iter()
        .all(|clause| clause.iter().any(|lit| model.contains(lit)))
}

fn print_stats(solver: &Solver) {
    let stats = solver.stats();

    println!("c decisions          {}", stats.decisions);
    println!("c propagations       {}", stats.propagations);
    println!("c pure eliminations  {}", stats.eliminations);
    println!("c conflicts          {}", stats.conflicts);
    println!("c restarts           {}", stats.restarts);
    println!("c max level          {}", stats.max_decision_level);
    println!("c solve time         {:.6} s", stats.solve_time.as_secs_f64());
}
