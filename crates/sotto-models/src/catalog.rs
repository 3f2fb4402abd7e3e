//! Voice model catalog with download information

use serde::Serialize;
use sotto_core::Language;
use std::sync::LazyLock;

/// Release page hosting the sherpa-onnx Whisper archives
const SHERPA_ONNX_RELEASES: &str = "https://github.com/k2-fsa/sherpa-onnx/releases/download/asr-models";

/// Raw ONNX export of Whisper tiny used by the ONNX runtime provider
const ONNX_WHISPER_TINY_EN_URL: &str = "https://github.com/microsoft/onnxruntime-inference-examples/raw/refs/heads/main/mobile/examples/whisper/local/android/app/src/main/res/raw/whisper_cpu_int8_model.onnx";

/// Model bundled with the application and installed without network access
pub const DEFAULT_MODEL_ID: &str = "sherpa-onnx-whisper-tiny";

/// ASR backend a model is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelProvider {
    /// sherpa-onnx encoder/decoder pair with a tokens file
    SherpaWhisper,
    /// Single-file ONNX runtime export
    OnnxWhisper,
}

impl ModelProvider {
    pub fn name(&self) -> &'static str {
        match self {
            ModelProvider::SherpaWhisper => "sherpa-onnx Whisper",
            ModelProvider::OnnxWhisper => "ONNX Whisper",
        }
    }
}

/// A single file belonging to a model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoiceModelFile {
    /// File name inside the model directory (or archive name)
    pub file_name: String,
    /// Download URL, `None` for files produced by extraction or bundled
    pub remote_url: Option<String>,
    /// Expected SHA256 (hex), `None` when not verified
    pub sha256: Option<String>,
}

impl VoiceModelFile {
    /// A file produced by archive extraction or shipped with the application
    pub fn local(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            remote_url: None,
            sha256: None,
        }
    }
}

/// Catalog entry describing a downloadable voice model
#[derive(Debug, Clone, Serialize)]
pub struct VoiceModel {
    /// Globally unique identifier
    pub id: String,
    /// Display name
    pub display_name: String,
    /// Backend the model runs on
    pub provider: ModelProvider,
    /// Supported languages, empty means multilingual
    pub languages: Vec<Language>,
    /// Approximate size on disk after install
    pub installed_size_mb: u32,
    /// Compressed archive to download, if any
    pub archive_file: Option<VoiceModelFile>,
    /// Files that make up an installed model
    pub components: Vec<VoiceModelFile>,
}

impl VoiceModel {
    /// Whether the model transcribes more than one language
    pub fn is_multilingual(&self) -> bool {
        self.languages.is_empty()
    }

    /// Whether the model can transcribe `language`
    pub fn supports(&self, language: &Language) -> bool {
        self.is_multilingual() || self.languages.contains(language)
    }

    /// Get human-readable size string
    pub fn size_string(&self) -> String {
        if self.installed_size_mb >= 1024 {
            format!("{:.1} GB", self.installed_size_mb as f64 / 1024.0)
        } else {
            format!("{} MB", self.installed_size_mb)
        }
    }
}

/// Lookup over the set of known models
pub trait ModelCatalog: Send + Sync {
    /// Get model by ID
    fn get_model(&self, id: &str) -> Option<VoiceModel>;

    /// Model installed from bundled resources
    fn default_model_id(&self) -> &str;

    /// All known models, in display order
    fn all_models(&self) -> Vec<VoiceModel>;
}

/// Models shipped with the application
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinCatalog;

impl ModelCatalog for BuiltinCatalog {
    fn get_model(&self, id: &str) -> Option<VoiceModel> {
        VOICE_MODELS.iter().find(|m| m.id == id).cloned()
    }

    fn default_model_id(&self) -> &str {
        DEFAULT_MODEL_ID
    }

    fn all_models(&self) -> Vec<VoiceModel> {
        VOICE_MODELS.clone()
    }
}

/// Catalog built from an explicit list, used for custom model sets
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    models: Vec<VoiceModel>,
    default_model_id: String,
}

impl StaticCatalog {
    pub fn new(models: Vec<VoiceModel>, default_model_id: impl Into<String>) -> Self {
        Self {
            models,
            default_model_id: default_model_id.into(),
        }
    }
}

impl ModelCatalog for StaticCatalog {
    fn get_model(&self, id: &str) -> Option<VoiceModel> {
        self.models.iter().find(|m| m.id == id).cloned()
    }

    fn default_model_id(&self) -> &str {
        &self.default_model_id
    }

    fn all_models(&self) -> Vec<VoiceModel> {
        self.models.clone()
    }
}

fn sherpa_whisper(
    prefix: &str,
    display_name: &str,
    installed_size_mb: u32,
    sha256: &str,
    english_only: bool,
) -> VoiceModel {
    let id = format!("sherpa-onnx-whisper-{prefix}");
    VoiceModel {
        archive_file: Some(VoiceModelFile {
            file_name: format!("{id}.tar.bz2"),
            remote_url: Some(format!("{SHERPA_ONNX_RELEASES}/{id}.tar.bz2")),
            sha256: Some(sha256.to_string()),
        }),
        components: vec![
            VoiceModelFile::local(format!("{prefix}-encoder.int8.onnx")),
            VoiceModelFile::local(format!("{prefix}-decoder.int8.onnx")),
            VoiceModelFile::local(format!("{prefix}-tokens.txt")),
        ],
        id,
        display_name: display_name.to_string(),
        provider: ModelProvider::SherpaWhisper,
        languages: if english_only { vec![Language::ENGLISH] } else { Vec::new() },
        installed_size_mb,
    }
}

/// Available voice models
pub static VOICE_MODELS: LazyLock<Vec<VoiceModel>> = LazyLock::new(|| {
    vec![
        sherpa_whisper("tiny", "Whisper Tiny", 99, "c46116994e539aa165266d96b325252728429c12535eb9d8b6a2b10f129e66b1", false),
        sherpa_whisper("tiny.en", "Whisper Tiny (English)", 99, "2bd6cf965c8bb3e068ef9fa2191387ee63a9dfa2a4e37582a8109641c20005dd", true),
        sherpa_whisper("base", "Whisper Base", 154, "911b2083efd7c0dca2ac3b358b75222660dc09fb716d64fbfc417ba6c99ff3de", false),
        sherpa_whisper("base.en", "Whisper Base (English)", 154, "475bc7052ce299c007f6d5d5407ba8601f819a2867f6eecee510ed17df581542", true),
        sherpa_whisper("small", "Whisper Small", 359, "486a46afbb7ba798507190ffe02fea2dd726049af212e774537efac6afb210a6", false),
        sherpa_whisper("small.en", "Whisper Small (English)", 359, "0cdba2b8aaab69e04847f3427cc9709574112e67913a1a84b7fec3a8729faa9a", true),
        sherpa_whisper("medium", "Whisper Medium", 903, "614b1172557049069d846c29d9399640bce83a4dd6c580decebd9ce2a4f32c33", false),
        sherpa_whisper("medium.en", "Whisper Medium (English)", 903, "73d95c169a410b5f23a79f8901374b26e0a16a09ea7f02b5e1db983f4cdfdd67", true),
        sherpa_whisper("large-v3", "Whisper Large V3", 1694, "2d0e134b3b5fc4a0533baf24a0c9d473b629aa47f030af0a165a05f461df7a03", false),
        sherpa_whisper("turbo", "Whisper Turbo", 989, "b11acbbcd660b44a8e0df33724feb5aaa709cf65668f2823d59f656312544f22", false),
        sherpa_whisper("distil-small.en", "Distil-Whisper Small (English)", 286, "1483a4ddd62ea2e892a366262740f4dd5e24fc6effecbdf277c5b2d34600f7f1", true),
        sherpa_whisper("distil-medium.en", "Distil-Whisper Medium (English)", 547, "e35029f7196c3ea22b1c38f6ddadbf64699ce3dbff49ec20c7394c1bd03a4d02", true),
        sherpa_whisper("distil-large-v3.5", "Distil-Whisper Large V3.5 (English)", 939, "ec874c7346d24ef8063e05430ede616d66d80a410360283099d0bdf659187b1d", true),
        VoiceModel {
            id: "onnx-whisper-tiny.en".to_string(),
            display_name: "Whisper Tiny (English, ONNX)".to_string(),
            provider: ModelProvider::OnnxWhisper,
            languages: vec![Language::ENGLISH],
            installed_size_mb: 72,
            archive_file: None,
            components: vec![VoiceModelFile {
                file_name: "whisper_cpu_int8_model.onnx".to_string(),
                remote_url: Some(ONNX_WHISPER_TINY_EN_URL.to_string()),
                sha256: None,
            }],
        },
    ]
});

/// Get model info by ID from the built-in catalog
pub fn get_model(id: &str) -> Option<VoiceModel> {
    BuiltinCatalog.get_model(id)
}

/// Get all models for a provider
pub fn get_models_by_provider(provider: ModelProvider) -> Vec<VoiceModel> {
    VOICE_MODELS
        .iter()
        .filter(|m| m.provider == provider)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_unique() {
        let ids: HashSet<_> = VOICE_MODELS.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids.len(), VOICE_MODELS.len());
    }

    #[test]
    fn test_default_model_present() {
        let model = get_model(DEFAULT_MODEL_ID).unwrap();
        assert!(model.is_multilingual());
        assert_eq!(model.components.len(), 3);
        assert_eq!(model.components[0].file_name, "tiny-encoder.int8.onnx");
    }

    #[test]
    fn test_sherpa_archive_layout() {
        let model = get_model("sherpa-onnx-whisper-base.en").unwrap();
        let archive = model.archive_file.as_ref().unwrap();
        assert_eq!(archive.file_name, "sherpa-onnx-whisper-base.en.tar.bz2");
        assert_eq!(
            archive.remote_url.as_deref(),
            Some("https://github.com/k2-fsa/sherpa-onnx/releases/download/asr-models/sherpa-onnx-whisper-base.en.tar.bz2")
        );
        assert_eq!(archive.sha256.as_ref().map(|s| s.len()), Some(64));
        assert!(model.supports(&Language::ENGLISH));
        assert!(!model.is_multilingual());
    }

    #[test]
    fn test_onnx_model_has_no_archive() {
        let models = get_models_by_provider(ModelProvider::OnnxWhisper);
        assert_eq!(models.len(), 1);
        assert!(models[0].archive_file.is_none());
    }

    #[test]
    fn test_size_string() {
        assert_eq!(get_model("sherpa-onnx-whisper-tiny").unwrap().size_string(), "99 MB");
        assert_eq!(get_model("sherpa-onnx-whisper-large-v3").unwrap().size_string(), "1.7 GB");
    }

    #[test]
    fn test_unknown_model() {
        assert!(get_model("nope").is_none());
    }
}
