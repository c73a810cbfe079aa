// tests/client_tests.rs

mod common;

use std::sync::Arc;

use common::spawn_app;
use oshi_quiz::{
    client::{
        Advance, ApiClient, ClientError, IdentityManager, MemoryIdentityStore, QuizBackend,
        QuizSession, SessionState, catalog,
    },
    config::ClientConfig,
    models::{
        question::{CreateChoiceRequest, CreateQuestionRequest, QuestionType},
        quiz::{CreateQuizRequest, Difficulty, QuizFilter},
        tag::{CreateTagRequest, TagCategory},
    },
};

fn question(k: usize) -> CreateQuestionRequest {
    CreateQuestionRequest {
        question_text: format!("Question {}", k),
        question_type: QuestionType::MultipleChoice,
        order_index: None,
        explanation: None,
        choices: vec![
            CreateChoiceRequest {
                choice_text: "Right".to_string(),
                is_correct: true,
                order_index: None,
            },
            CreateChoiceRequest {
                choice_text: "Wrong".to_string(),
                is_correct: false,
                order_index: None,
            },
        ],
    }
}

async fn client_with_quiz(question_count: usize) -> (common::TestApp, Arc<ApiClient>, i64) {
    let app = spawn_app().await;
    let client = Arc::new(ApiClient::new(&ClientConfig::new(app.address.clone())).unwrap());

    let tag = client
        .create_tag(&CreateTagRequest {
            name: "Starlight Nine".to_string(),
            category: TagCategory::Idol,
            description: None,
        })
        .await
        .unwrap();

    let quiz = client
        .create_quiz(&CreateQuizRequest {
            creator_id: None,
            title: "Debut year".to_string(),
            description: None,
            oshi_tag_id: tag.id,
            difficulty: Difficulty::Beginner,
            questions: (1..=question_count).map(question).collect(),
        })
        .await
        .unwrap();

    (app, client, quiz.id)
}

#[tokio::test]
async fn full_session_against_the_server() {
    let (_app, client, quiz_id) = client_with_quiz(3).await;

    let identity = IdentityManager::new(client.clone(), Arc::new(MemoryIdentityStore::default()));
    let player = identity.register_name("Fan1").await.unwrap();
    let user_id = player.user_id;
    assert!(user_id.is_some());

    let mut session = QuizSession::new(client.clone(), quiz_id)
        .attributed_to(user_id)
        .with_timeout(client.submit_timeout());
    session.load().await.unwrap();

    // Right, skip, wrong.
    let questions = session.questions().to_vec();
    assert!(session.select_choice(questions[0].id, questions[0].choices[0].id));
    assert_eq!(session.advance(), Advance::Moved(1));
    assert_eq!(session.advance(), Advance::Moved(2));
    assert!(session.select_choice(questions[2].id, questions[2].choices[1].id));
    assert_eq!(session.advance(), Advance::ReadyToSubmit);

    let result = session.submit().await.unwrap();
    assert_eq!(result.score, 1);
    assert_eq!(result.total_questions, 3);
    assert_eq!(result.percentage, 33.3);
    assert_eq!(result.user_id, user_id);
    assert!(result.answers[1].selected_choice_id.is_none());
    assert!(matches!(session.state(), SessionState::Completed { .. }));

    let placement = session.locate_placement().await.unwrap().unwrap();
    assert_eq!(placement.rank, 1);
    assert_eq!(placement.player_name, "Fan1");
}

#[tokio::test]
async fn rename_keeps_the_same_user() {
    let (_app, client, _) = client_with_quiz(1).await;
    let identity = IdentityManager::new(client.clone(), Arc::new(MemoryIdentityStore::default()));

    let first = identity.register_name("Fan1").await.unwrap();
    let second = identity.register_name("Fan2").await.unwrap();
    assert_eq!(first.user_id, second.user_id);

    let user = client.get_user(second.user_id.unwrap()).await.unwrap();
    assert_eq!(user.username, "Fan2");
}

#[tokio::test]
async fn missing_quiz_fails_to_load() {
    let (_app, client, quiz_id) = client_with_quiz(1).await;

    let err = client.fetch_quiz(quiz_id + 1, true).await.unwrap_err();
    assert!(err.is_not_found());

    let mut session = QuizSession::new(client, quiz_id + 1);
    assert!(session.load().await.is_err());
    assert!(matches!(session.state(), SessionState::LoadFailed { .. }));
}

#[tokio::test]
async fn server_rejection_surfaces_as_status() {
    let (_app, client, _) = client_with_quiz(1).await;

    let err = client
        .create_tag(&CreateTagRequest {
            name: "Starlight Nine".to_string(),
            category: TagCategory::Idol,
            description: None,
        })
        .await
        .unwrap_err();

    match err {
        ClientError::Status { status, message } => {
            assert_eq!(status, 409);
            assert!(message.contains("Starlight Nine"));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn catalog_filters_by_difficulty() {
    let (_app, client, _) = client_with_quiz(1).await;

    let quizzes = client.list_quizzes(&QuizFilter::default()).await.unwrap();
    let counts = catalog::difficulty_counts(&quizzes);
    assert_eq!(counts[&Difficulty::Beginner], 1);
    assert_eq!(counts.values().sum::<usize>(), quizzes.len());

    let mania = client
        .list_quizzes(&QuizFilter {
            difficulty: Some(Difficulty::Mania),
            ..QuizFilter::default()
        })
        .await
        .unwrap();
    assert!(mania.is_empty());
}
