use super::support;
use super::IntegrationHarness;
use anyhow::Result;
use studybase::activity::EventType;
use studybase::courses::QuestionPatch;
use studybase::session::{LearningMode, SessionEngine, SessionPhase};
use studybase::store::{QuestionStore, StatsStore};

#[test]
fn repeat_collects_incorrect_and_saved_questions_once() -> Result<()> {
    let harness = IntegrationHarness::new();
    let manager = harness.manager();
    let course = harness.create_course(&manager, "Repeat set");
    let mut added = Vec::new();
    for i in 0..4 {
        added.push(manager.add_question(course.course_id, support::question(&format!("q{i}"), 0))?);
    }

    // q0 is both wrong and saved; it must appear exactly once.
    manager.update_question(course.course_id, added[0].question_id, QuestionPatch::status(false))?;
    manager.update_question(course.course_id, added[0].question_id, QuestionPatch::saved(true))?;
    manager.update_question(course.course_id, added[1].question_id, QuestionPatch::status(false))?;
    manager.update_question(course.course_id, added[2].question_id, QuestionPatch::saved(true))?;
    manager.update_question(course.course_id, added[3].question_id, QuestionPatch::status(true))?;

    let log = manager.activity_log(course.course_id);
    let engine = SessionEngine::start(
        &manager,
        &manager,
        &log,
        course.course_id,
        "carol",
        LearningMode::Repeat,
        &manager.config.session,
    )?;
    assert_eq!(engine.phase(), SessionPhase::Active);
    let ids: Vec<_> = engine.working_set().iter().map(|q| q.question_id).collect();
    assert_eq!(
        ids,
        vec![
            added[0].question_id,
            added[1].question_id,
            added[2].question_id
        ]
    );
    Ok(())
}

#[test]
fn repeat_with_nothing_due_completes_immediately() -> Result<()> {
    let harness = IntegrationHarness::new();
    let manager = harness.manager();
    let course = harness.create_course(&manager, "All caught up");
    for i in 0..2 {
        let question =
            manager.add_question(course.course_id, support::question(&format!("q{i}"), 0))?;
        manager.update_question(course.course_id, question.question_id, QuestionPatch::status(true))?;
    }

    let log = manager.activity_log(course.course_id);
    let engine = SessionEngine::start(
        &manager,
        &manager,
        &log,
        course.course_id,
        "carol",
        LearningMode::Repeat,
        &manager.config.session,
    )?;
    assert_eq!(engine.phase(), SessionPhase::Completed);
    assert_eq!(engine.session_points(), 75);
    assert_eq!(manager.course_stats("carol", course.course_id)?.points, 75);

    let events = log.read_events()?;
    assert!(events
        .iter()
        .any(|e| e.event_type == EventType::SessionCompleted));
    Ok(())
}
