//! Campus Scheduler - Quantum-inspired room and timetable allocation
//!
//! This library assigns academic sections to (room, day, start-time,
//! duration) tuples so that every hard constraint is satisfied and a
//! weighted soft cost is minimized.
//!
//! # Algorithm Overview
//!
//! A run walks through these phases:
//! 1. **Validation**: pre-flight structural checks on the request
//! 2. **Decomposition**: hybrid and oversized sections split into linked
//!    lecture anchors and lab satellites
//! 3. **Compatibility**: graduated room-compatibility passes per section
//! 4. **Greedy construction**: hardest-first initial placement
//! 5. **Annealing**: Metropolis loop with tunneling moves, adaptive
//!    cooling, and reheating
//! 6. **Post-processing**: aggressive rescheduling, then teacher
//!    double-booking demotion to TBD
//! 7. **Assembly**: flat allocation records with exact end-times
//!
//! # Example
//!
//! ```no_run
//! use campus_scheduler::parser::load_request;
//! use campus_scheduler::scheduler::run_scheduler;
//! use std::path::Path;
//!
//! let request = load_request(Path::new("./request.json")).unwrap();
//! let result = run_scheduler(request, true);
//! println!("Scheduled {}/{}", result.scheduled_sections, result.total_sections);
//! ```

pub mod error;
pub mod parser;
pub mod reporter;
pub mod scheduler;
pub mod types;
pub mod validator;

pub use error::{Result, SchedulerError};
