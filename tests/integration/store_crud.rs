use super::support;
use super::IntegrationHarness;
use anyhow::Result;
use studybase::courses::{self, NewQuestion, QuestionPatch};
use studybase::error::Error;
use studybase::store::{QuestionStore, StatsStore};
use uuid::Uuid;

#[test]
fn course_lifecycle_and_slugs() -> Result<()> {
    let harness = IntegrationHarness::new();
    let manager = harness.manager();

    let course = manager.create_course("Anatomy & Physiology I", "First semester anatomy")?;
    assert_eq!(course.slug, "anatomy-physiology-i");

    let listed = manager.list_courses()?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].course_id, course.course_id);

    let fetched = manager.get_course(course.course_id)?;
    assert_eq!(fetched.title, course.title);

    manager.delete_course(course.course_id)?;
    let err = manager.get_course(course.course_id).unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
    let err = manager.delete_course(course.course_id).unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
    Ok(())
}

#[test]
fn course_creation_validates_inputs() {
    let harness = IntegrationHarness::new();
    let manager = harness.manager();

    let err = manager.create_course("  ", "desc").unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    let err = manager.create_course("Title", "").unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[test]
fn question_crud_and_filters() -> Result<()> {
    let harness = IntegrationHarness::new();
    let manager = harness.manager();
    let course = harness.create_course(&manager, "CRUD");

    let question = manager.add_question(course.course_id, support::question("keep", 1))?;

    let err = manager
        .add_question(
            course.course_id,
            NewQuestion {
                text: "too few".into(),
                options: vec!["only one".into()],
                answer_index: 0,
                image: None,
            },
        )
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let err = manager
        .add_question(
            course.course_id,
            NewQuestion {
                text: "bad key".into(),
                options: vec!["a".into(), "b".into()],
                answer_index: 5,
                image: None,
            },
        )
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    manager.update_question(course.course_id, question.question_id, QuestionPatch::saved(true))?;
    assert_eq!(manager.saved_questions(course.course_id)?.len(), 1);

    manager.update_question(
        course.course_id,
        question.question_id,
        QuestionPatch::status(false),
    )?;
    let incorrect = manager.incorrect_questions(course.course_id)?;
    assert_eq!(incorrect.len(), 1);
    // The saved flag survives a status-only patch.
    assert!(incorrect[0].is_saved);

    manager.delete_question(course.course_id, question.question_id)?;
    assert!(manager.questions(course.course_id)?.is_empty());
    let err = manager
        .delete_question(course.course_id, question.question_id)
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));

    let err = manager.questions(Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
    Ok(())
}

#[test]
fn stats_documents_are_per_user() -> Result<()> {
    let harness = IntegrationHarness::new();
    let manager = harness.manager();
    let course = harness.create_course(&manager, "Shared course");

    assert_eq!(manager.add_points("alice", course.course_id, 30)?, 30);
    assert_eq!(manager.add_points("alice", course.course_id, 20)?, 50);
    assert_eq!(manager.add_points("bob", course.course_id, 10)?, 10);

    assert_eq!(manager.course_stats("alice", course.course_id)?.points, 50);
    assert_eq!(manager.all_course_stats("bob")?.len(), 1);

    assert!(manager.add_badge("alice", course.course_id, "Starter")?);
    assert!(!manager.add_badge("alice", course.course_id, "Starter")?);
    assert_eq!(
        manager.course_stats("alice", course.course_id)?.badges,
        vec!["Starter".to_string()]
    );
    assert!(manager.course_stats("bob", course.course_id)?.badges.is_empty());
    Ok(())
}

#[test]
fn config_round_trips_with_defaults() -> Result<()> {
    let _harness = IntegrationHarness::new();

    let mut config = courses::load_or_default()?;
    assert_eq!(config.session.exam_question_count, 10);
    assert_eq!(config.session.exam_duration_secs, 600);
    assert!(config.import.inline_images);
    assert_eq!(config.import.max_file_size_mb, 20);

    config.session.exam_question_count = 5;
    courses::save(&config)?;
    let reloaded = courses::load_or_default()?;
    assert_eq!(reloaded.session.exam_question_count, 5);
    Ok(())
}
