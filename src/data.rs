//! Randomized test-data generation.
//!
//! [`TestDataGenerator`] produces valid-by-default, collision-free payloads
//! for every resource the suites create. Uniqueness comes from a
//! `{session_timestamp}_{counter}_{8 hex of a random uuid}` scheme: unique
//! within a run by the monotonic counter, and across parallel runs with
//! overwhelming probability by the uuid suffix.
//!
//! Each `generate` method takes an overrides value so a test can pin the
//! fields it cares about (including invalid ones for negative testing) and
//! default the rest from a single code path.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Symbols permitted in generated passwords.
const PASSWORD_SYMBOLS: &[u8] = b"!@#$%^&*";
const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";

/// Document-splitting strategy supported by the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkMethod {
    General,
    Qa,
    Manual,
}

impl ChunkMethod {
    pub const ALL: [ChunkMethod; 3] = [ChunkMethod::General, ChunkMethod::Qa, ChunkMethod::Manual];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkMethod::General => "general",
            ChunkMethod::Qa => "qa",
            ChunkMethod::Manual => "manual",
        }
    }
}

/// User creation payload for `POST /api/users`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub nickname: String,
    pub password: String,
    pub avatar: String,
    /// 1 = active, 0 = disabled.
    pub status: u8,
    /// "user" or "admin".
    pub role: String,
}

/// Overrides for [`TestDataGenerator::user`].
#[derive(Debug, Clone, Default)]
pub struct UserOverrides {
    pub email: Option<String>,
    pub nickname: Option<String>,
    pub password: Option<String>,
}

/// Knowledge-base creation payload for `POST /api/knowledgebases`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewKnowledgeBase {
    pub name: String,
    pub description: String,
    pub chunk_method: ChunkMethod,
    pub chunk_token_count: u32,
    pub chunk_overlap: u32,
    pub enable_rerank: bool,
    pub similarity_threshold: f64,
    pub top_n: u32,
}

/// Overrides for [`TestDataGenerator::knowledge_base`].
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBaseOverrides {
    pub name: Option<String>,
    pub description: Option<String>,
    pub chunk_method: Option<ChunkMethod>,
}

/// Parser settings attached to a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    pub chunk_token_count: u32,
    pub layout_recognize: bool,
    pub table_recognize: bool,
    pub image_extract: bool,
}

/// Document registration payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDocument {
    pub name: String,
    pub kb_id: Option<String>,
    /// "auto" or "manual".
    pub parser_method: String,
    pub parser_config: ParserConfig,
}

/// Model parameters for a chat assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantLlm {
    pub model_name: String,
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
}

/// Retrieval prompt settings for a chat assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantPrompt {
    pub system: String,
    pub similarity_threshold: f64,
    pub top_n: u32,
    pub enable_rerank: bool,
}

/// Chat assistant creation payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewChatAssistant {
    pub name: String,
    pub dataset_ids: Vec<String>,
    pub llm: AssistantLlm,
    pub prompt: AssistantPrompt,
}

/// Team creation payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTeam {
    pub name: String,
    pub description: String,
    pub members: Vec<String>,
}

/// Generator for unique, valid-by-default test payloads.
///
/// Shareable across tasks: the counter is atomic, and the methods take
/// `&self`, so one generator behind an `Arc` serves a whole run.
#[derive(Debug)]
pub struct TestDataGenerator {
    timestamp: String,
    counter: AtomicU64,
}

impl Default for TestDataGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TestDataGenerator {
    pub fn new() -> Self {
        Self {
            timestamp: chrono::Local::now().format("%Y%m%d%H%M%S").to_string(),
            counter: AtomicU64::new(0),
        }
    }

    /// `{session_timestamp}_{counter}_{8 hex}` — unique within the run,
    /// and across parallel runs with overwhelming probability.
    pub fn unique_id(&self) -> String {
        let count = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let suffix = &uuid::Uuid::new_v4().simple().to_string()[..8];
        format!("{}_{}_{}", self.timestamp, count, suffix)
    }

    fn random_string(&self, length: usize) -> String {
        (0..length)
            .map(|_| {
                let pool_index = fastrand::usize(..62);
                match pool_index {
                    0..=25 => UPPERCASE[pool_index] as char,
                    26..=51 => LOWERCASE[pool_index - 26] as char,
                    _ => DIGITS[pool_index - 52] as char,
                }
            })
            .collect()
    }

    /// Unique test email.
    pub fn email(&self, prefix: &str) -> String {
        format!("{}_{}@test.ragcheck.dev", prefix, self.unique_id())
    }

    /// Short username with random suffix.
    pub fn username(&self, prefix: &str) -> String {
        format!("{}_{}", prefix, self.random_string(6))
    }

    /// Password satisfying the 4-class policy: at least one uppercase,
    /// lowercase, digit, and symbol, for any requested length (clamped to
    /// a minimum of 4).
    pub fn password(&self, length: usize) -> String {
        let length = length.max(4);

        let mut chars: Vec<u8> = vec![
            UPPERCASE[fastrand::usize(..UPPERCASE.len())],
            LOWERCASE[fastrand::usize(..LOWERCASE.len())],
            DIGITS[fastrand::usize(..DIGITS.len())],
            PASSWORD_SYMBOLS[fastrand::usize(..PASSWORD_SYMBOLS.len())],
        ];

        let combined: Vec<u8> = [UPPERCASE, LOWERCASE, DIGITS, PASSWORD_SYMBOLS].concat();
        for _ in 4..length {
            chars.push(combined[fastrand::usize(..combined.len())]);
        }

        // Fisher-Yates so the mandatory classes don't cluster at the front.
        for i in (1..chars.len()).rev() {
            let j = fastrand::usize(..=i);
            chars.swap(i, j);
        }

        String::from_utf8(chars).unwrap_or_default()
    }

    /// User payload; happy path is `gen.user(UserOverrides::default())`.
    pub fn user(&self, overrides: UserOverrides) -> NewUser {
        NewUser {
            email: overrides.email.unwrap_or_else(|| self.email("test")),
            nickname: overrides
                .nickname
                .unwrap_or_else(|| self.username("test_user")),
            password: overrides.password.unwrap_or_else(|| self.password(12)),
            avatar: "https://api.dicebear.com/7.x/avataaars/svg".to_string(),
            status: 1,
            role: "user".to_string(),
        }
    }

    /// Knowledge-base payload with the service's sensible defaults.
    pub fn knowledge_base(&self, overrides: KnowledgeBaseOverrides) -> NewKnowledgeBase {
        NewKnowledgeBase {
            name: overrides
                .name
                .unwrap_or_else(|| format!("test_kb_{}", self.random_string(6))),
            description: overrides.description.unwrap_or_else(|| {
                format!("knowledge base created by automated test at {}", chrono::Local::now())
            }),
            chunk_method: overrides.chunk_method.unwrap_or(ChunkMethod::General),
            chunk_token_count: 256,
            chunk_overlap: 50,
            enable_rerank: true,
            similarity_threshold: 0.6,
            top_n: 8,
        }
    }

    /// Document payload with auto parsing and full recognition enabled.
    pub fn document(&self, name: Option<String>, kb_id: Option<String>) -> NewDocument {
        NewDocument {
            name: name.unwrap_or_else(|| format!("test_doc_{}.pdf", self.random_string(6))),
            kb_id,
            parser_method: "auto".to_string(),
            parser_config: ParserConfig {
                chunk_token_count: 256,
                layout_recognize: true,
                table_recognize: true,
                image_extract: true,
            },
        }
    }

    /// Chat assistant payload bound to the given datasets.
    pub fn chat_assistant(&self, name: Option<String>, dataset_ids: Vec<String>) -> NewChatAssistant {
        NewChatAssistant {
            name: name.unwrap_or_else(|| format!("test_assistant_{}", self.random_string(6))),
            dataset_ids,
            llm: AssistantLlm {
                model_name: "qwen2.5:7b".to_string(),
                temperature: 0.7,
                top_p: 0.9,
                max_tokens: 2048,
            },
            prompt: AssistantPrompt {
                system: "You are a knowledge assistant. Answer strictly from the knowledge base."
                    .to_string(),
                similarity_threshold: 0.6,
                top_n: 8,
                enable_rerank: true,
            },
        }
    }

    /// Team payload with no members.
    pub fn team(&self, name: Option<String>, description: Option<String>) -> NewTeam {
        NewTeam {
            name: name.unwrap_or_else(|| format!("test_team_{}", self.random_string(6))),
            description: description.unwrap_or_else(|| {
                format!("team created by automated test at {}", chrono::Local::now())
            }),
            members: Vec::new(),
        }
    }

    /// A canned question for the given topic ("rag", "parsing", or
    /// anything else for the general set).
    pub fn question(&self, topic: &str) -> &'static str {
        let pool: &[&'static str] = match topic {
            "rag" => &[
                "What is retrieval-augmented generation?",
                "What are the advantages of RAG?",
                "Where is RAG typically applied?",
                "How do you tune RAG retrieval quality?",
            ],
            "parsing" => &[
                "Which document formats does the parser support?",
                "How is a PDF split into chunks?",
                "What does layout recognition do?",
            ],
            _ => &[
                "What are the main features of the system?",
                "How do I create a knowledge base?",
                "Which models are supported?",
            ],
        };
        pool[fastrand::usize(..pool.len())]
    }

    /// Batch of distinct user payloads.
    pub fn bulk_users(&self, count: usize) -> Vec<NewUser> {
        (0..count).map(|_| self.user(UserOverrides::default())).collect()
    }

    /// Batch of distinct knowledge-base payloads.
    pub fn bulk_knowledge_bases(&self, count: usize) -> Vec<NewKnowledgeBase> {
        (0..count)
            .map(|_| self.knowledge_base(KnowledgeBaseOverrides::default()))
            .collect()
    }
}
