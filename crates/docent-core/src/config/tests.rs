use std::io::Write;

use serial_test::serial;

use super::*;

const ENV_KEYS: [&str; 18] = [
    "DOCENT_LLM_PROVIDER",
    "DOCENT_LLM_BASE_URL",
    "DOCENT_LLM_MODEL",
    "DOCENT_LLM_EMBEDDING_MODEL",
    "DOCENT_EMBEDDING_DIMENSIONS",
    "DOCENT_STORE_URL",
    "DOCENT_TOPICS_INDEX",
    "DOCENT_TOPICS_LIMIT",
    "DOCENT_CHUNK_SIZE",
    "DOCENT_CHUNK_OVERLAP",
    "DOCENT_INGEST_CONCURRENCY",
    "DOCENT_MAX_DOCUMENT_BYTES",
    "DOCENT_RETRIEVAL_SIZE",
    "DOCENT_TEXT_WEIGHT",
    "DOCENT_VECTOR_WEIGHT",
    "DOCENT_TEMPERATURE",
    "DOCENT_OPENAI_API_KEY",
    "DOCENT_STORE_API_KEY",
];

fn clear_env() {
    for key in ENV_KEYS {
        unsafe { std::env::remove_var(key) };
    }
}

fn write_config(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("docent.toml");
    let mut f = std::fs::File::create(&path).unwrap();
    write!(f, "{content}").unwrap();
    (dir, path)
}

#[test]
fn defaults_match_pipeline_constants() {
    let config = Config::default();
    assert_eq!(config.llm.provider, ProviderKind::Ollama);
    assert_eq!(config.llm.base_url, "http://localhost:11434");
    assert_eq!(config.llm.embedding_model, "nomic-embed-text");
    assert!(config.llm.openai.is_none());
    assert_eq!(config.embedding.dimensions, 768);
    assert_eq!(config.store.url, "http://localhost:9200");
    assert_eq!(config.store.topics_index, "topics_v1");
    assert_eq!(config.store.topics_limit, 10_000);
    assert_eq!(config.ingest.chunk_size, 2000);
    assert_eq!(config.ingest.chunk_overlap, 250);
    assert_eq!(config.ingest.concurrency, 4);
    assert_eq!(config.ingest.max_document_bytes, 50 * 1024 * 1024);
    assert_eq!(config.retrieval.size, 10);
    assert!((config.retrieval.text_weight - 1.0).abs() < f32::EPSILON);
    assert!((config.retrieval.vector_weight - 1.0).abs() < f32::EPSILON);
    assert!((config.retrieval.temperature - 0.5).abs() < f32::EPSILON);
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn missing_file_loads_defaults() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.store.topics_index, "topics_v1");
    assert!(config.secrets.openai_api_key.is_none());
}

#[test]
#[serial]
fn parses_partial_toml_and_fills_defaults() {
    clear_env();
    let (_dir, path) = write_config(
        r#"
[llm]
provider = "openai"
model = "unused-for-openai"

[llm.openai]
model = "gpt-4o-mini"
embedding_model = "text-embedding-3-small"
embedding_dimensions = 768

[store]
url = "http://es:9200"

[ingest]
chunk_size = 500
chunk_overlap = 50
"#,
    );
    let config = Config::load(&path).unwrap();
    assert_eq!(config.llm.provider, ProviderKind::OpenAi);
    let openai = config.llm.openai.as_ref().unwrap();
    assert_eq!(openai.model, "gpt-4o-mini");
    assert_eq!(openai.base_url, "https://api.openai.com/v1");
    assert_eq!(openai.embedding_dimensions, Some(768));
    assert_eq!(config.store.url, "http://es:9200");
    assert_eq!(config.store.topics_limit, 10_000);
    assert_eq!(config.ingest.chunk_size, 500);
    assert_eq!(config.ingest.chunk_overlap, 50);
    assert_eq!(config.ingest.concurrency, 4);
    assert_eq!(config.retrieval.size, 10);
}

#[test]
#[serial]
fn invalid_toml_is_an_error() {
    clear_env();
    let (_dir, path) = write_config("[store\nurl = ");
    let err = Config::load(&path).unwrap_err();
    assert!(format!("{err:#}").contains("failed to parse config file"));
}

#[test]
#[serial]
fn env_overrides_take_precedence() {
    clear_env();
    let (_dir, path) = write_config(
        r#"
[store]
topics_index = "from_file"

[retrieval]
size = 3
"#,
    );
    unsafe {
        std::env::set_var("DOCENT_LLM_PROVIDER", "openai");
        std::env::set_var("DOCENT_TOPICS_INDEX", "from_env");
        std::env::set_var("DOCENT_RETRIEVAL_SIZE", "7");
        std::env::set_var("DOCENT_TEMPERATURE", "0.2");
        std::env::set_var("DOCENT_EMBEDDING_DIMENSIONS", "1536");
        std::env::set_var("DOCENT_INGEST_CONCURRENCY", "8");
    }
    let config = Config::load(&path).unwrap();
    clear_env();

    assert_eq!(config.llm.provider, ProviderKind::OpenAi);
    assert_eq!(config.store.topics_index, "from_env");
    assert_eq!(config.retrieval.size, 7);
    assert!((config.retrieval.temperature - 0.2).abs() < f32::EPSILON);
    assert_eq!(config.embedding.dimensions, 1536);
    assert_eq!(config.ingest.concurrency, 8);
}

#[test]
#[serial]
fn unparseable_env_values_are_ignored() {
    clear_env();
    unsafe {
        std::env::set_var("DOCENT_LLM_PROVIDER", "claude");
        std::env::set_var("DOCENT_CHUNK_SIZE", "large");
    }
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(&dir.path().join("absent.toml")).unwrap();
    clear_env();

    assert_eq!(config.llm.provider, ProviderKind::Ollama);
    assert_eq!(config.ingest.chunk_size, 2000);
}

#[test]
#[serial]
fn secrets_come_from_env_and_stay_redacted() {
    clear_env();
    unsafe {
        std::env::set_var("DOCENT_OPENAI_API_KEY", "sk-test");
        std::env::set_var("DOCENT_STORE_API_KEY", "");
    }
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(&dir.path().join("absent.toml")).unwrap();
    clear_env();

    let key = config.secrets.openai_api_key.as_ref().unwrap();
    assert_eq!(key.expose(), "sk-test");
    assert!(config.secrets.store_api_key.is_none());
    let debug = format!("{:?}", config.secrets);
    assert!(!debug.contains("sk-test"));
    assert!(debug.contains("[REDACTED]"));
}

#[test]
#[serial]
fn validation_rejects_zero_sizes() {
    clear_env();
    unsafe { std::env::set_var("DOCENT_RETRIEVAL_SIZE", "0") };
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load(&dir.path().join("absent.toml")).unwrap_err();
    clear_env();
    assert!(err.to_string().contains("retrieval.size"));

    let mut config = Config::default();
    config.embedding.dimensions = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.ingest.concurrency = 0;
    assert!(config.validate().is_err());
}

#[test]
fn validation_rejects_out_of_range_temperature() {
    let mut config = Config::default();
    config.retrieval.temperature = 3.5;
    assert!(config.validate().is_err());
}

#[test]
fn overlap_larger_than_chunk_is_only_warned() {
    let mut config = Config::default();
    config.ingest.chunk_size = 100;
    config.ingest.chunk_overlap = 100;
    assert!(config.validate().is_ok());
}

#[test]
fn provider_kind_display() {
    assert_eq!(ProviderKind::Ollama.to_string(), "ollama");
    assert_eq!(ProviderKind::OpenAi.to_string(), "openai");
}

#[test]
fn serialization_skips_secrets() {
    let mut config = Config::default();
    config.secrets.openai_api_key = Some(Secret::new("sk-hidden"));
    let rendered = toml::to_string(&config).unwrap();
    assert!(!rendered.contains("sk-hidden"));
    assert!(rendered.contains("topics_index"));
}
