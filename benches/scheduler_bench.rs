use campus_scheduler::scheduler::run_scheduler;
use campus_scheduler::types::{
    EngineConfig, LunchMode, RawSection, Room, RoomId, ScheduleRequest, SectionId, TeacherId,
};
use criterion::{criterion_group, criterion_main, Criterion};

fn synthetic_request(num_sections: usize, num_rooms: usize) -> ScheduleRequest {
    let sections = (0..num_sections)
        .map(|i| RawSection {
            id: SectionId(i as i64 + 1),
            section_code: format!("BSCS-{}{}", i / 4 + 1, (b'A' + (i % 4) as u8) as char),
            course_code: "BSCS".to_string(),
            subject_code: format!("CS{:03}", 100 + i),
            subject_name: format!("Subject {}", i),
            teacher_id: Some(TeacherId((i % 7) as i64 + 1)),
            teacher_name: Some(format!("Teacher {}", i % 7 + 1)),
            year_level: (i / 4 + 1) as u8,
            student_count: 25 + (i as u32 * 7) % 30,
            required_room_type: String::new(),
            lec_hours: 3,
            lab_hours: if i % 3 == 0 { 2 } else { 0 },
            required_features: vec![],
            college: Some("CICT".to_string()),
            department: "Computer Science".to_string(),
            courses: None,
        })
        .collect();

    let rooms = (0..num_rooms)
        .map(|i| Room {
            id: RoomId(i as i64 + 1),
            code: format!("R-{}", i + 1),
            name: format!("Room {}", i + 1),
            building: format!("Building {}", i % 2 + 1),
            campus: "Main".to_string(),
            capacity: 30 + (i as u32 * 11) % 40,
            room_type: if i % 3 == 0 {
                "Computer Lab".to_string()
            } else {
                "Lecture Room".to_string()
            },
            floor: (i % 4) as i32 + 1,
            is_accessible: i % 2 == 0,
            features: vec![],
            college: None,
        })
        .collect();

    let mut config = EngineConfig::default();
    config.max_iterations = 500;
    config.seed = Some(7);
    config.slot_duration_minutes = 90;
    config.lunch_mode = LunchMode::Auto;
    config.resolve_weights();

    ScheduleRequest {
        sections,
        rooms,
        time_slots: None,
        active_days: vec![
            "monday".into(),
            "tuesday".into(),
            "wednesday".into(),
            "thursday".into(),
            "friday".into(),
            "saturday".into(),
        ],
        online_days: vec!["saturday".into()],
        faculty_profiles: vec![],
        fixed_allocations: vec![],
        config,
    }
}

fn bench_full_run(c: &mut Criterion) {
    let request = synthetic_request(16, 8);
    c.bench_function("schedule_16_sections", |b| {
        b.iter(|| run_scheduler(request.clone(), true))
    });
}

criterion_group!(benches, bench_full_run);
criterion_main!(benches);
