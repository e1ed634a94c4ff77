use std::collections::HashSet;

use crate::data::{
    ChunkMethod, KnowledgeBaseOverrides, TestDataGenerator, UserOverrides,
};

#[test]
fn unique_ids_do_not_collide() {
    let gen = TestDataGenerator::new();
    let ids: HashSet<String> = (0..1000).map(|_| gen.unique_id()).collect();
    assert_eq!(ids.len(), 1000);
}

#[test]
fn unique_id_counter_is_monotonic() {
    let gen = TestDataGenerator::new();
    let first = gen.unique_id();
    let second = gen.unique_id();

    let counter = |id: &str| -> u64 {
        id.split('_')
            .nth(1)
            .and_then(|c| c.parse().ok())
            .unwrap_or(0)
    };
    assert_eq!(counter(&first) + 1, counter(&second));
}

#[test]
fn emails_carry_prefix_and_test_domain() {
    let gen = TestDataGenerator::new();
    let email = gen.email("tc001");
    assert!(email.starts_with("tc001_"));
    assert!(email.ends_with("@test.ragcheck.dev"));

    let another = gen.email("tc001");
    assert_ne!(email, another);
}

#[test]
fn password_contains_all_four_classes() {
    let gen = TestDataGenerator::new();
    for length in [4usize, 8, 12, 32] {
        let password = gen.password(length);
        assert_eq!(password.len(), length);
        assert!(password.chars().any(|c| c.is_ascii_uppercase()), "{}", password);
        assert!(password.chars().any(|c| c.is_ascii_lowercase()), "{}", password);
        assert!(password.chars().any(|c| c.is_ascii_digit()), "{}", password);
        assert!(
            password.chars().any(|c| "!@#$%^&*".contains(c)),
            "{}",
            password
        );
    }
}

#[test]
fn password_length_is_clamped_to_four() {
    let gen = TestDataGenerator::new();
    assert_eq!(gen.password(0).len(), 4);
    assert_eq!(gen.password(2).len(), 4);
}

#[test]
fn user_defaults_are_active_regular_users() {
    let gen = TestDataGenerator::new();
    let user = gen.user(UserOverrides::default());
    assert_eq!(user.status, 1);
    assert_eq!(user.role, "user");
    assert!(user.email.contains('@'));
    assert!(user.password.len() >= 8);
}

#[test]
fn user_overrides_pin_fields() {
    let gen = TestDataGenerator::new();
    let user = gen.user(UserOverrides {
        email: Some("pinned@example.com".to_string()),
        nickname: Some("pinned".to_string()),
        password: Some("Weak1!".to_string()),
    });
    assert_eq!(user.email, "pinned@example.com");
    assert_eq!(user.nickname, "pinned");
    assert_eq!(user.password, "Weak1!");
}

#[test]
fn knowledge_base_defaults_match_service_expectations() {
    let gen = TestDataGenerator::new();
    let kb = gen.knowledge_base(KnowledgeBaseOverrides::default());
    assert_eq!(kb.chunk_method, ChunkMethod::General);
    assert_eq!(kb.chunk_token_count, 256);
    assert_eq!(kb.chunk_overlap, 50);
    assert!(kb.enable_rerank);
    assert_eq!(kb.similarity_threshold, 0.6);
    assert_eq!(kb.top_n, 8);
    assert!(kb.name.starts_with("test_kb_"));
}

#[test]
fn chunk_method_serializes_lowercase() {
    for method in ChunkMethod::ALL {
        let json = serde_json::to_value(method).unwrap();
        assert_eq!(json, serde_json::json!(method.as_str()));
    }
}

#[test]
fn bulk_generators_produce_distinct_payloads() {
    let gen = TestDataGenerator::new();

    let users = gen.bulk_users(20);
    let emails: HashSet<&str> = users.iter().map(|u| u.email.as_str()).collect();
    assert_eq!(emails.len(), 20);

    let kbs = gen.bulk_knowledge_bases(20);
    let names: HashSet<&str> = kbs.iter().map(|k| k.name.as_str()).collect();
    assert_eq!(names.len(), 20);
}

#[test]
fn document_defaults_to_auto_parsing_with_full_recognition() {
    let gen = TestDataGenerator::new();
    let doc = gen.document(None, Some("kb-1".to_string()));

    assert!(doc.name.starts_with("test_doc_"));
    assert!(doc.name.ends_with(".pdf"));
    assert_eq!(doc.kb_id.as_deref(), Some("kb-1"));
    assert_eq!(doc.parser_method, "auto");
    assert_eq!(doc.parser_config.chunk_token_count, 256);
    assert!(doc.parser_config.layout_recognize);
    assert!(doc.parser_config.table_recognize);
    assert!(doc.parser_config.image_extract);

    let named = gen.document(Some("handbook.pdf".to_string()), None);
    assert_eq!(named.name, "handbook.pdf");
    assert!(named.kb_id.is_none());
}

#[test]
fn chat_assistant_defaults_bind_datasets_and_model_params() {
    let gen = TestDataGenerator::new();
    let assistant = gen.chat_assistant(None, vec!["ds-1".to_string(), "ds-2".to_string()]);

    assert!(assistant.name.starts_with("test_assistant_"));
    assert_eq!(assistant.dataset_ids, vec!["ds-1", "ds-2"]);
    assert_eq!(assistant.llm.model_name, "qwen2.5:7b");
    assert_eq!(assistant.llm.temperature, 0.7);
    assert_eq!(assistant.llm.top_p, 0.9);
    assert_eq!(assistant.llm.max_tokens, 2048);
    assert_eq!(assistant.prompt.similarity_threshold, 0.6);
    assert_eq!(assistant.prompt.top_n, 8);
    assert!(assistant.prompt.enable_rerank);
    assert!(!assistant.prompt.system.is_empty());
}

#[test]
fn questions_come_from_the_requested_topic_pool() {
    let gen = TestDataGenerator::new();
    for _ in 0..10 {
        assert!(!gen.question("rag").is_empty());
        assert!(!gen.question("parsing").is_empty());
        assert!(!gen.question("anything-else").is_empty());
    }
}
