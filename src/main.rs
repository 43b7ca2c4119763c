use anyhow::{bail, Context as _, Result};
use campus_scheduler::parser::load_request;
use campus_scheduler::reporter::{
    generate_json_summary, generate_reports, print_summary, OutputFormat,
};
use campus_scheduler::scheduler::{prepare_run, run_scheduler, solve_exact, SolveStatus};
use campus_scheduler::types::ScheduleResult;
use campus_scheduler::validator::audit_allocations;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "campus-scheduler")]
#[command(about = "Quantum-inspired room and timetable allocation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run demo with generated sample data
    Demo,

    /// Generate a schedule from a request file
    Schedule {
        /// Path to the request JSON
        #[arg(short, long)]
        request: PathBuf,

        /// Output directory for schedule files
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Output format(s): json, markdown, text, or all
        #[arg(short, long, default_value = "all")]
        format: String,

        /// Suppress progress output, print JSON summary only
        #[arg(short, long)]
        quiet: bool,

        /// Random seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Validate a previously generated schedule
    Validate {
        /// Path to schedule.json produced by the schedule command
        #[arg(short, long)]
        schedule: PathBuf,

        /// Path to the request JSON the schedule was generated from
        #[arg(short, long)]
        request: PathBuf,
    },

    /// Solve a request with the exact ILP comparator (small instances)
    Exact {
        /// Path to the request JSON
        #[arg(short, long)]
        request: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Demo => run_demo(),
        Commands::Schedule {
            request,
            output,
            format,
            quiet,
            seed,
        } => run_schedule(&request, &output, &format, quiet, seed),
        Commands::Validate { schedule, request } => run_validate(&schedule, &request),
        Commands::Exact { request } => run_exact(&request),
    }
}

fn run_schedule(
    request_path: &PathBuf,
    output: &PathBuf,
    format: &str,
    quiet: bool,
    seed: Option<u64>,
) -> Result<()> {
    let mut request = load_request(request_path).context("Failed to load request")?;
    if seed.is_some() {
        request.config.seed = seed;
    }

    if !quiet {
        println!(
            "Loaded {} sections, {} rooms",
            request.sections.len(),
            request.rooms.len()
        );
    }

    let result = run_scheduler(request, quiet);

    if quiet {
        println!("{}", generate_json_summary(&result)?);
    } else {
        print_summary(&result);
    }

    let formats = parse_formats(format);
    generate_reports(&result, output, &formats)?;
    if !quiet {
        println!("Reports written to: {}", output.display().to_string().green());
    }

    if !result.success {
        for issue in &result.validation_errors {
            eprintln!("{} {}: {}", "!".red(), issue.field, issue.message);
        }
        bail!("schedule generation did not produce a conflict-free result");
    }
    Ok(())
}

fn run_validate(schedule_path: &PathBuf, request_path: &PathBuf) -> Result<()> {
    let request = load_request(request_path)?;
    let schedule_json = std::fs::read_to_string(schedule_path)?;
    let result: ScheduleResult = serde_json::from_str(&schedule_json)?;

    let report = audit_allocations(
        &result.allocations,
        &request.rooms,
        request.config.capacity_tolerance,
    );

    if report.is_valid {
        println!("{}", "✓ Schedule is valid".green().bold());
        Ok(())
    } else {
        println!("{}", "✗ Schedule has violations".red().bold());
        for v in &report.violations {
            println!("  - {}: {}", v.constraint.red(), v.message);
        }
        bail!("{} violations found", report.violations.len());
    }
}

fn run_exact(request_path: &PathBuf) -> Result<()> {
    let mut request = load_request(request_path)?;
    request.config.resolve_weights();
    let prepared = prepare_run(&request);

    let solution = solve_exact(&prepared.ctx)?;
    match solution.status {
        SolveStatus::Optimal => println!(
            "{} objective {:.1}, {} placements",
            "OPTIMAL".green().bold(),
            solution.objective,
            solution.placements.len()
        ),
        SolveStatus::Feasible => println!(
            "{} objective {:.1}, {} placements",
            "FEASIBLE".yellow().bold(),
            solution.objective,
            solution.placements.len()
        ),
        SolveStatus::Infeasible => {
            println!("{}", "INFEASIBLE".red().bold());
            bail!("no feasible assignment exists");
        }
    }

    for p in &solution.placements {
        println!(
            "  section {} -> room {} on {} slot {}",
            p.section_id, p.room_id, p.day, p.slot
        );
    }
    Ok(())
}

fn run_demo() -> Result<()> {
    println!("{}", "Campus Scheduler Demo".bold().cyan());
    println!("{}", "─".repeat(40));

    let demo_path = PathBuf::from("data/demo");
    let request_file = demo_path.join("request.json");
    if !request_file.exists() {
        println!("{}", "Demo data not found. Creating sample data...".yellow());
        create_demo_data(&demo_path)?;
    }

    let request = load_request(&request_file).context("Failed to load demo data")?;
    println!(
        "Loaded {} sections, {} rooms",
        request.sections.len(),
        request.rooms.len()
    );

    println!("\nGenerating schedule...\n");
    let result = run_scheduler(request, false);
    print_summary(&result);

    let output = PathBuf::from("output");
    generate_reports(
        &result,
        &output,
        &[OutputFormat::Json, OutputFormat::Markdown, OutputFormat::Text],
    )?;
    println!("Reports written to: {}", output.display().to_string().green());

    Ok(())
}

fn parse_formats(format: &str) -> Vec<OutputFormat> {
    if format == "all" {
        return vec![OutputFormat::Json, OutputFormat::Markdown, OutputFormat::Text];
    }

    format
        .split(',')
        .filter_map(|f| match f.trim().to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "markdown" | "md" => Some(OutputFormat::Markdown),
            "text" | "txt" => Some(OutputFormat::Text),
            _ => None,
        })
        .collect()
}

fn create_demo_data(path: &PathBuf) -> Result<()> {
    std::fs::create_dir_all(path)?;

    let request = serde_json::json!({
        "sections": [
            {"id": 1, "section_code": "BSCS-1A", "course_code": "BSCS", "subject_code": "CS101", "subject_name": "Intro to Computing", "teacher_id": 1, "teacher_name": "Prof. Reyes", "year_level": 1, "student_count": 45, "lec_hours": 3, "lab_hours": 0, "college": "CICT", "department": "Computer Science"},
            {"id": 2, "section_code": "BSCS-1A", "course_code": "BSCS", "subject_code": "CS102", "subject_name": "Programming 1", "teacher_id": 2, "teacher_name": "Prof. Santos", "year_level": 1, "student_count": 45, "lec_hours": 2, "lab_hours": 3, "college": "CICT", "department": "Computer Science"},
            {"id": 3, "section_code": "BSCS-1B", "course_code": "BSCS", "subject_code": "CS101", "subject_name": "Intro to Computing", "teacher_id": 1, "teacher_name": "Prof. Reyes", "year_level": 1, "student_count": 40, "lec_hours": 3, "lab_hours": 0, "college": "CICT", "department": "Computer Science"},
            {"id": 4, "section_code": "BSCS-2A", "course_code": "BSCS", "subject_code": "CS201", "subject_name": "Data Structures", "teacher_id": 3, "teacher_name": "Prof. Cruz", "year_level": 2, "student_count": 38, "lec_hours": 2, "lab_hours": 3, "college": "CICT", "department": "Computer Science"},
            {"id": 5, "section_code": "BSIT-1A", "course_code": "BSIT", "subject_code": "IT101", "subject_name": "IT Fundamentals", "teacher_id": 4, "teacher_name": "Prof. Garcia", "year_level": 1, "student_count": 50, "lec_hours": 3, "lab_hours": 0, "college": "CICT", "department": "Information Technology"},
            {"id": 6, "section_code": "BSIT-1A", "course_code": "BSIT", "subject_code": "GE101", "subject_name": "Purposive Communication", "teacher_id": 5, "teacher_name": "Prof. Lim", "year_level": 1, "student_count": 50, "lec_hours": 3, "lab_hours": 0, "college": "Shared", "department": "General Education"}
        ],
        "rooms": [
            {"id": 1, "code": "FH-301", "name": "Federizo Hall 301", "building": "Federizo Hall", "campus": "Main", "capacity": 50, "room_type": "Lecture Room", "floor": 3, "college": "CICT"},
            {"id": 2, "code": "FH-302", "name": "Federizo Hall 302", "building": "Federizo Hall", "campus": "Main", "capacity": 45, "room_type": "Lecture Room", "floor": 3, "college": "CICT"},
            {"id": 3, "code": "FH-303", "name": "Federizo Hall 303", "building": "Federizo Hall", "campus": "Main", "capacity": 55, "room_type": "Lecture Room", "floor": 3, "is_accessible": true, "college": "Shared"},
            {"id": 4, "code": "CL-1", "name": "Computer Lab 1", "building": "ICT Building", "campus": "Main", "capacity": 30, "room_type": "Computer Lab", "floor": 1, "college": "CICT"},
            {"id": 5, "code": "CL-2", "name": "Computer Lab 2", "building": "ICT Building", "campus": "Main", "capacity": 30, "room_type": "Computer Lab", "floor": 1, "college": "CICT"}
        ],
        "active_days": ["monday", "tuesday", "wednesday", "thursday", "friday", "saturday"],
        "online_days": ["saturday"],
        "config": {
            "max_iterations": 1000,
            "seed": 42,
            "slot_duration_minutes": 30,
            "lunch_mode": "auto",
            "end_time": "21:00"
        }
    });

    std::fs::write(
        path.join("request.json"),
        serde_json::to_string_pretty(&request)?,
    )?;

    println!("{}", "Demo data created successfully!".green());
    Ok(())
}
