use ndarray::Array2;
use ort::session::{Session, SessionInputValue, SessionOutputs};
use std::borrow::Cow;
use std::path::Path;
use std::sync::Mutex;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::info;

use super::{ClassifierError, SequenceModel};

/// BERT-style sequence classifier exported to ONNX.
///
/// Expects `input_ids`, `attention_mask` and `token_type_ids` (i64, `[1, seq]`)
/// and produces `logits` (`[1, num_labels]`).
pub struct OnnxSequenceModel {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
}

impl OnnxSequenceModel {
    /// Load the model and its HuggingFace `tokenizer.json`.
    pub fn load(
        model_path: impl AsRef<Path>,
        tokenizer_path: impl AsRef<Path>,
        max_sequence_length: usize,
    ) -> Result<Self, ClassifierError> {
        let model_path = model_path.as_ref();
        let tokenizer_path = tokenizer_path.as_ref();

        if !model_path.exists() {
            return Err(ClassifierError::ModelNotFound(model_path.to_path_buf()));
        }
        if !tokenizer_path.exists() {
            return Err(ClassifierError::ModelNotFound(tokenizer_path.to_path_buf()));
        }

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| ClassifierError::Init(format!("tokenizer load failed: {}", e)))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: max_sequence_length,
                ..Default::default()
            }))
            .map_err(|e| ClassifierError::Init(format!("tokenizer truncation: {}", e)))?;

        let session = Session::builder()
            .map_err(|e| ClassifierError::Init(e.to_string()))?
            .commit_from_file(model_path)
            .map_err(|e| ClassifierError::Init(e.to_string()))?;

        info!(
            model = %model_path.display(),
            tokenizer = %tokenizer_path.display(),
            max_sequence_length,
            "Classifier model loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
        })
    }

    fn encode(&self, text: &str) -> Result<[Array2<i64>; 3], ClassifierError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| ClassifierError::Tokenization(e.to_string()))?;

        let widen = |values: &[u32]| values.iter().map(|&v| v as i64).collect::<Vec<i64>>();
        let seq_len = encoding.get_ids().len();
        let to_tensor = |values: Vec<i64>| {
            Array2::from_shape_vec((1, seq_len), values)
                .map_err(|e| ClassifierError::Tokenization(e.to_string()))
        };

        Ok([
            to_tensor(widen(encoding.get_ids()))?,
            to_tensor(widen(encoding.get_attention_mask()))?,
            to_tensor(widen(encoding.get_type_ids()))?,
        ])
    }
}

impl SequenceModel for OnnxSequenceModel {
    fn logits(&self, text: &str) -> Result<Vec<f32>, ClassifierError> {
        let [input_ids, attention_mask, token_type_ids] = self.encode(text)?;

        let mut inputs: Vec<(Cow<'_, str>, SessionInputValue<'_>)> = Vec::with_capacity(3);
        for (name, array) in [
            ("input_ids", input_ids),
            ("attention_mask", attention_mask),
            ("token_type_ids", token_type_ids),
        ] {
            let value = ort::value::Value::from_array(array)
                .map_err(|e| ClassifierError::Inference(e.to_string()))?;
            inputs.push((Cow::Borrowed(name), SessionInputValue::from(value)));
        }

        // Running a session needs exclusive access
        let mut session = self
            .session
            .lock()
            .map_err(|_| ClassifierError::Inference("session lock poisoned".to_string()))?;

        let outputs: SessionOutputs = session
            .run(inputs)
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        let logits = outputs
            .get("logits")
            .ok_or_else(|| ClassifierError::Inference("no `logits` output".to_string()))?;

        let (_, scores) = logits
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        Ok(scores.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_file() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("model.onnx");
        let tokenizer = dir.path().join("tokenizer.json");

        match OnnxSequenceModel::load(&model, &tokenizer, 512) {
            Err(ClassifierError::ModelNotFound(path)) => assert_eq!(path, model),
            other => panic!("expected ModelNotFound, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_missing_tokenizer_file() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("model.onnx");
        std::fs::write(&model, b"not really a model").unwrap();
        let tokenizer = dir.path().join("tokenizer.json");

        match OnnxSequenceModel::load(&model, &tokenizer, 512) {
            Err(ClassifierError::ModelNotFound(path)) => assert_eq!(path, tokenizer),
            other => panic!("expected ModelNotFound, got {:?}", other.err()),
        }
    }
}
