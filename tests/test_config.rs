//! Shipped configuration files.

use std::path::PathBuf;

use james::config::{self, Overrides, RelayMode, VoiceBackendConfig};

fn config_file(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config").join(name)
}

#[test]
fn default_toml_loads() {
    let cfg = config::load_from(&config_file("default.toml"), &Overrides::default()).unwrap();
    assert_eq!(cfg.bot_name, "james");
    assert_eq!(cfg.relay.mode, RelayMode::Direct);
    assert_eq!(cfg.llm.provider, "openai-compatible");
    assert_eq!(cfg.llm.completions_url(), "http://localhost:11434/v1/chat/completions");
    assert_eq!(cfg.memory.default_user_id, "default");
    assert_eq!(cfg.voice.james.backend, VoiceBackendConfig::Tone { sample_rate: 22_050 });
}

#[test]
fn workflow_overlay_inherits_defaults() {
    let cfg = config::load_from(&config_file("workflow.toml"), &Overrides::default()).unwrap();
    assert_eq!(cfg.relay.mode, RelayMode::Workflow);
    assert_eq!(cfg.server.bind, "0.0.0.0:8000");
    assert_eq!(cfg.llm.scout.model, "llama3.2:3b");
}
