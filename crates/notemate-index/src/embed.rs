//! Text embedding backends

use anyhow::Result;

/// Maps texts to dense vectors
pub trait Embedder {
    fn embed(&mut self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;
}

/// fastembed-backed embedder.
///
/// The ONNX model is loaded (and downloaded on first use) on the first
/// `embed` call.
#[derive(Default)]
pub struct FastEmbedder {
    model: Option<fastembed::TextEmbedding>,
}

impl FastEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    fn model(&mut self) -> Result<&mut fastembed::TextEmbedding> {
        if self.model.is_none() {
            tracing::info!("loading embedding model");
            let model = fastembed::TextEmbedding::try_new(Default::default())
                .map_err(|e| anyhow::anyhow!("failed to load embedding model: {}", e))?;
            self.model = Some(model);
        }
        self.model
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("embedding model unavailable"))
    }
}

impl Embedder for FastEmbedder {
    fn embed(&mut self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let model = self.model()?;
        model
            .embed(texts, None)
            .map_err(|e| anyhow::anyhow!("embedding failed: {}", e))
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a < 1e-8 || norm_b < 1e-8 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&a, &[0.0, 1.0, 0.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&a, &[0.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_fast_embedder_empty_input_skips_model() {
        let mut embedder = FastEmbedder::new();
        assert!(embedder.embed(Vec::new()).unwrap().is_empty());
        assert!(embedder.model.is_none());
    }
}
