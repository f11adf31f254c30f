use clap::{Arg, ArgAction};
use kurswahl::optimize::{self, solution_score, SolveError};
use kurswahl::state::State;
use kurswahl::{io, overbooking, statistics, Assignment};
use log::{debug, error, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};

fn main() {
    let args = clap::command!()
        .arg(
            Arg::new("INPUT")
                .help("State file (JSON) with students, activities and assignment")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("outfile")
                .short('o')
                .long("outfile")
                .help("Write the state with the new assignment to this file")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("greedy")
                .long("greedy")
                .action(ArgAction::SetTrue)
                .help(
                    "Use the first come assignment with overbooking reduction instead of the \
                     optimizer. Ignores time conflicts.",
                ),
        )
        .arg(
            Arg::new("check")
                .long("check")
                .action(ArgAction::SetTrue)
                .conflicts_with_all(["greedy", "outfile"])
                .help("Only check the stored assignment and report all violations"),
        )
        .arg(
            Arg::new("print")
                .long("print")
                .action(ArgAction::SetTrue)
                .help("Print the assignment in a human readable format"),
        )
        .arg(
            Arg::new("statistics")
                .long("statistics")
                .action(ArgAction::SetTrue)
                .help("Print the number of choices per activity and grade"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("Increase log output (may be given twice)"),
        )
        .get_matches();

    let level = match args.get_count("verbose") {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = match args.get_one::<PathBuf>("INPUT") {
        Some(input) => run(&args, input),
        None => Err(exitcode::USAGE),
    };
    match result {
        Ok(()) => std::process::exit(exitcode::OK),
        Err(code) => std::process::exit(code),
    }
}

fn run(args: &clap::ArgMatches, input: &Path) -> Result<(), exitcode::ExitCode> {
    let file = std::fs::File::open(input).map_err(|e| {
        error!("Could not open input file {}: {}", input.display(), e);
        exitcode::NOINPUT
    })?;
    let mut state = State::read(std::io::BufReader::new(file)).map_err(|e| {
        error!("Could not read input file {}: {}", input.display(), e);
        exitcode::DATAERR
    })?;

    if args.get_flag("check") {
        return check(args, &state);
    }

    let assignment = if args.get_flag("greedy") {
        assign_greedily(&state)?
    } else {
        assign_optimally(&state)?
    };
    state.set_assignment(assignment);

    if args.get_flag("print") || !args.contains_id("outfile") {
        print!(
            "{}",
            io::format_assignment(state.assignment(), state.students(), state.activities())
        );
    }
    if args.get_flag("statistics") {
        print_statistics(&state);
    }

    if let Some(outpath) = args.get_one::<PathBuf>("outfile") {
        let file = std::fs::File::create(outpath).map_err(|e| {
            error!("Could not create output file {}: {}", outpath.display(), e);
            exitcode::CANTCREAT
        })?;
        let mut writer = std::io::BufWriter::new(file);
        state
            .write(&mut writer)
            .and_then(|()| writer.flush().map_err(|e| format!("{}", e)))
            .map_err(|e| {
                error!("Could not write output file {}: {}", outpath.display(), e);
                exitcode::IOERR
            })?;
        info!("Wrote state with new assignment to {}", outpath.display());
    }

    Ok(())
}

fn check(args: &clap::ArgMatches, state: &State) -> Result<(), exitcode::ExitCode> {
    if args.get_flag("print") {
        print!(
            "{}",
            io::format_assignment(state.assignment(), state.students(), state.activities())
        );
    }
    if args.get_flag("statistics") {
        print_statistics(state);
    }

    let violations = state
        .assignment()
        .check_validity(state.students(), state.activities());
    if violations.is_empty() {
        info!("The assignment satisfies all constraints.");
        Ok(())
    } else {
        for violation in violations.iter() {
            println!("{}", violation);
        }
        warn!("The assignment has {} violations.", violations.len());
        Err(exitcode::DATAERR)
    }
}

fn assign_greedily(state: &State) -> Result<Assignment, exitcode::ExitCode> {
    overbooking::assign_greedily(state.students(), state.activities()).map_err(|e| {
        error!("No assignment found: {}", e);
        exitcode::DATAERR
    })
}

fn assign_optimally(state: &State) -> Result<Assignment, exitcode::ExitCode> {
    match optimize::solve(state.students(), state.activities()) {
        Ok((assignment, score)) => {
            let max_score =
                solution_score::theoretical_max_score(state.students(), state.activities());
            info!(
                "Score {} of theoretical maximum {} (quality {:.3})",
                score,
                max_score,
                solution_score::solution_quality(score, max_score)
            );
            Ok(assignment)
        }
        Err(e @ SolveError::Solver(_)) | Err(e @ SolveError::Inconsistent(_)) => {
            error!("{}", e);
            Err(exitcode::SOFTWARE)
        }
        Err(e) => {
            error!("No assignment found: {}", e);
            Err(exitcode::DATAERR)
        }
    }
}

fn print_statistics(state: &State) {
    debug!("Calculating statistics ...");
    print!(
        "{}",
        statistics::Report::new(state.students(), state.activities(), state.assignment())
    );
}
