use super::{Config, Secret};

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_llm();
        self.apply_env_overrides_pipeline();
        self.apply_env_secrets();
    }

    fn apply_env_overrides_llm(&mut self) {
        if let Ok(v) = std::env::var("DOCENT_LLM_PROVIDER") {
            if let Ok(kind) = serde_json::from_value(serde_json::Value::String(v.clone())) {
                self.llm.provider = kind;
            } else {
                tracing::warn!("ignoring invalid DOCENT_LLM_PROVIDER value: {v}");
            }
        }
        if let Ok(v) = std::env::var("DOCENT_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("DOCENT_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("DOCENT_LLM_EMBEDDING_MODEL") {
            self.llm.embedding_model = v;
        }
        if let Ok(v) = std::env::var("DOCENT_EMBEDDING_DIMENSIONS")
            && let Ok(dims) = v.parse::<usize>()
        {
            self.embedding.dimensions = dims;
        }
    }

    fn apply_env_overrides_pipeline(&mut self) {
        if let Ok(v) = std::env::var("DOCENT_STORE_URL") {
            self.store.url = v;
        }
        if let Ok(v) = std::env::var("DOCENT_TOPICS_INDEX") {
            self.store.topics_index = v;
        }
        if let Ok(v) = std::env::var("DOCENT_TOPICS_LIMIT")
            && let Ok(limit) = v.parse::<usize>()
        {
            self.store.topics_limit = limit;
        }
        if let Ok(v) = std::env::var("DOCENT_CHUNK_SIZE")
            && let Ok(size) = v.parse::<usize>()
        {
            self.ingest.chunk_size = size;
        }
        if let Ok(v) = std::env::var("DOCENT_CHUNK_OVERLAP")
            && let Ok(overlap) = v.parse::<usize>()
        {
            self.ingest.chunk_overlap = overlap;
        }
        if let Ok(v) = std::env::var("DOCENT_INGEST_CONCURRENCY")
            && let Ok(n) = v.parse::<usize>()
        {
            self.ingest.concurrency = n;
        }
        if let Ok(v) = std::env::var("DOCENT_MAX_DOCUMENT_BYTES")
            && let Ok(bytes) = v.parse::<usize>()
        {
            self.ingest.max_document_bytes = bytes;
        }
        if let Ok(v) = std::env::var("DOCENT_RETRIEVAL_SIZE")
            && let Ok(size) = v.parse::<usize>()
        {
            self.retrieval.size = size;
        }
        if let Ok(v) = std::env::var("DOCENT_TEXT_WEIGHT")
            && let Ok(weight) = v.parse::<f32>()
        {
            self.retrieval.text_weight = weight;
        }
        if let Ok(v) = std::env::var("DOCENT_VECTOR_WEIGHT")
            && let Ok(weight) = v.parse::<f32>()
        {
            self.retrieval.vector_weight = weight;
        }
        if let Ok(v) = std::env::var("DOCENT_TEMPERATURE")
            && let Ok(t) = v.parse::<f32>()
        {
            self.retrieval.temperature = t;
        }
    }

    fn apply_env_secrets(&mut self) {
        if let Ok(v) = std::env::var("DOCENT_OPENAI_API_KEY")
            && !v.is_empty()
        {
            self.secrets.openai_api_key = Some(Secret::new(v));
        }
        if let Ok(v) = std::env::var("DOCENT_STORE_API_KEY")
            && !v.is_empty()
        {
            self.secrets.store_api_key = Some(Secret::new(v));
        }
    }
}
