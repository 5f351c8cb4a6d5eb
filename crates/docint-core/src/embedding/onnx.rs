//! Sentence encoder running a BERT-style ONNX model.

use std::path::Path;

use ndarray::{ArrayView2, Axis, Ix2, Ix3};
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};
use tracing::{debug, trace};

use docint_inference::{InferenceBackend, InputTensor, OutputTensor};

use super::TextVectorizer;
use crate::error::{DocintError, ExtractionError, Result};

/// Texts per model run.
const BATCH_SIZE: usize = 32;

const SENTENCE_EMBEDDING: &str = "sentence_embedding";
const LAST_HIDDEN_STATE: &str = "last_hidden_state";

/// Load a Hugging Face `tokenizer.json`.
pub fn load_tokenizer(path: &Path) -> Result<Tokenizer> {
    let tokenizer = Tokenizer::from_file(path).map_err(|e| {
        DocintError::ModelUnavailable(format!(
            "failed to load tokenizer {}: {}",
            path.display(),
            e
        ))
    })?;
    debug!(
        "Loaded tokenizer with {} tokens",
        tokenizer.get_vocab_size(true)
    );
    Ok(tokenizer)
}

/// Sentence-transformer encoder over an [`InferenceBackend`].
///
/// Every sequence is padded to the same length, so a text's vector does not
/// depend on the batch it was encoded in.
pub struct OnnxVectorizer<B: InferenceBackend> {
    backend: B,
    tokenizer: Tokenizer,
    max_sequence_length: usize,
    dimension: usize,
}

impl<B: InferenceBackend> OnnxVectorizer<B> {
    /// Wrap a loaded model, probing it once to learn the embedding dimension.
    ///
    /// The tokenizer's own padding and truncation settings are replaced by a
    /// fixed `max_sequence_length`.
    pub fn new(backend: B, mut tokenizer: Tokenizer, max_sequence_length: usize) -> Result<Self> {
        let max_sequence_length = max_sequence_length.max(2);
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: max_sequence_length,
                ..Default::default()
            }))
            .map_err(|e| DocintError::ModelUnavailable(format!("tokenizer truncation: {}", e)))?;
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::Fixed(max_sequence_length),
            ..Default::default()
        }));

        let mut vectorizer = Self {
            backend,
            tokenizer,
            max_sequence_length,
            dimension: 0,
        };

        let probe = vectorizer
            .encode_batch(&["probe"])
            .map_err(|e| DocintError::ModelUnavailable(format!("encoder probe failed: {}", e)))?;
        vectorizer.dimension = probe.first().map(Vec::len).unwrap_or(0);
        if vectorizer.dimension == 0 {
            return Err(DocintError::ModelUnavailable(
                "encoder produced an empty embedding".to_string(),
            ));
        }

        debug!(
            "Encoder inputs {:?}, outputs {:?}, dimension {}",
            vectorizer.backend.input_names(),
            vectorizer.backend.output_names(),
            vectorizer.dimension
        );
        Ok(vectorizer)
    }

    /// Token ids and attention mask of `texts`, row-major `[batch, seq]`.
    fn tokenize(&self, texts: &[&str]) -> Result<(Vec<i64>, Vec<i64>)> {
        let seq = self.max_sequence_length;
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| vectorization(format!("tokenization failed: {}", e)))?;

        let mut input_ids = Vec::with_capacity(texts.len() * seq);
        let mut attention_mask = Vec::with_capacity(texts.len() * seq);
        for encoding in &encodings {
            if encoding.len() != seq {
                return Err(vectorization(format!(
                    "tokenizer produced {} tokens, expected {}",
                    encoding.len(),
                    seq
                )));
            }
            input_ids.extend(encoding.get_ids().iter().map(|&id| id as i64));
            attention_mask.extend(encoding.get_attention_mask().iter().map(|&m| m as i64));
        }
        Ok((input_ids, attention_mask))
    }

    fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let batch = texts.len();
        let seq = self.max_sequence_length;

        let (input_ids, attention_mask) = self.tokenize(texts)?;
        let token_type_ids = vec![0i64; batch * seq];

        let shape = [batch, seq];
        let inputs = [
            ("input_ids", InputTensor::from_i64(input_ids, &shape)?),
            ("attention_mask", InputTensor::from_i64(attention_mask.clone(), &shape)?),
            ("token_type_ids", InputTensor::from_i64(token_type_ids, &shape)?),
        ];

        trace!("Running encoder on batch of {}", batch);
        let outputs = self.backend.run(&inputs)?;

        let mut embeddings = match find_output(&outputs, SENTENCE_EMBEDDING) {
            Some(pooled) => rows(pooled)?,
            None => {
                let hidden = find_output(&outputs, LAST_HIDDEN_STATE)
                    .or_else(|| outputs.first().map(|(_, t)| t))
                    .ok_or_else(|| vectorization("encoder returned no outputs"))?;
                mean_pool(hidden, &attention_mask, batch, seq)?
            }
        };

        if embeddings.len() != batch {
            return Err(vectorization(format!(
                "expected {} embeddings, got {}",
                batch,
                embeddings.len()
            )));
        }
        embeddings.iter_mut().for_each(|v| l2_normalize(v));
        Ok(embeddings)
    }
}

impl<B: InferenceBackend> TextVectorizer for OnnxVectorizer<B> {
    fn vectorize(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(BATCH_SIZE) {
            vectors.extend(self.encode_batch(batch)?);
        }
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "onnx"
    }
}

fn vectorization(message: impl Into<String>) -> DocintError {
    ExtractionError::Vectorization(message.into()).into()
}

fn find_output<'a>(outputs: &'a [(String, OutputTensor)], name: &str) -> Option<&'a OutputTensor> {
    outputs.iter().find(|(n, _)| n == name).map(|(_, t)| t)
}

/// Rows of a `[batch, dim]` output.
fn rows(tensor: &OutputTensor) -> Result<Vec<Vec<f32>>> {
    let array = tensor
        .as_f32()
        .ok_or_else(|| vectorization("pooled output is not f32"))?;
    let matrix: ArrayView2<f32> = array
        .view()
        .into_dimensionality::<Ix2>()
        .map_err(|e| vectorization(format!("pooled output: {}", e)))?;
    Ok(matrix.outer_iter().map(|row| row.to_vec()).collect())
}

/// Attention-masked mean over the token axis of a `[batch, seq, hidden]` output.
fn mean_pool(
    tensor: &OutputTensor,
    attention_mask: &[i64],
    batch: usize,
    seq: usize,
) -> Result<Vec<Vec<f32>>> {
    let array = tensor
        .as_f32()
        .ok_or_else(|| vectorization("hidden state output is not f32"))?;
    let hidden = array
        .view()
        .into_dimensionality::<Ix3>()
        .map_err(|e| vectorization(format!("hidden state output: {}", e)))?;

    let (out_batch, out_seq, width) = hidden.dim();
    if out_batch != batch || out_seq != seq {
        return Err(vectorization(format!(
            "hidden state shape [{}, {}, {}] does not match batch [{}, {}]",
            out_batch, out_seq, width, batch, seq
        )));
    }

    let mut pooled = Vec::with_capacity(batch);
    for (b, sequence) in hidden.axis_iter(Axis(0)).enumerate() {
        let mask = &attention_mask[b * seq..(b + 1) * seq];
        let mut sum = vec![0.0f32; width];
        let mut count = 0.0f32;

        for (token, &m) in sequence.outer_iter().zip(mask) {
            if m == 0 {
                continue;
            }
            for (s, &x) in sum.iter_mut().zip(token.iter()) {
                *s += x;
            }
            count += 1.0;
        }

        let count = count.max(1e-9);
        pooled.push(sum.into_iter().map(|s| s / count).collect());
    }
    Ok(pooled)
}

fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
}
