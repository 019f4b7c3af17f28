// Enterprise reranking infrastructure

use super::{core::RAGSimpleVectorEngine, types::*};
use crate::ai::rag::{RAGError, RAGResult};
use std::collections::HashMap;
use std::sync::Arc;

impl RAGSimpleVectorEngine {
    /// Enterprise Reranking Infrastructure Implementation
    /// Provides sophisticated multi-provider reranking capabilities
    pub(super) async fn execute_enterprise_reranking(
        &self,
        query: &str,
        candidates: Vec<CandidateDocument>,
    ) -> RAGResult<Vec<CandidateDocument>> {
        if !self.reranking_infrastructure.reranking_enabled || candidates.is_empty() {
            return Ok(candidates);
        }

        tracing::info!(
            "Applying enterprise reranking to {} candidates",
            candidates.len()
        );

        match &self.reranking_infrastructure.hybrid_reranking {
            HybridRerankingStrategy::Sequential {
                stages,
                early_stopping_threshold,
            } => {
                self.apply_sequential_reranking(query, candidates, &stages, &early_stopping_threshold)
                    .await
            }
            HybridRerankingStrategy::Ensemble {
                rerankers,
                combination_method,
                weights,
            } => {
                self.apply_ensemble_reranking(
                    query,
                    candidates,
                    &rerankers,
                    &combination_method,
                    &weights,
                )
                .await
            }
            HybridRerankingStrategy::Adaptive {
                query_complexity_threshold,
                simple_strategy,
                complex_strategy,
            } => {
                let complexity = self.calculate_query_complexity(query).await?;
                let selected_strategy = if complexity > *query_complexity_threshold {
                    complex_strategy
                } else {
                    simple_strategy
                };

                // Handle the selected strategy directly to avoid recursion
                match selected_strategy.as_ref() {
                    HybridRerankingStrategy::Sequential {
                        stages,
                        early_stopping_threshold,
                    } => {
                        self.apply_sequential_reranking(
                            query,
                            candidates,
                            stages,
                            early_stopping_threshold,
                        )
                        .await
                    }
                    HybridRerankingStrategy::Ensemble {
                        rerankers,
                        combination_method,
                        weights,
                    } => {
                        self.apply_ensemble_reranking(
                            query,
                            candidates,
                            rerankers,
                            combination_method,
                            weights,
                        )
                        .await
                    }
                    _ => {
                        // Fallback to no reranking to avoid infinite recursion
                        tracing::warn!("Adaptive reranking strategy contains unsupported nested strategy, skipping reranking");
                        Ok(candidates)
                    }
                }
            }
        }
    }

    /// Sequential reranking through multiple stages
    async fn apply_sequential_reranking(
        &self,
        query: &str,
        mut candidates: Vec<CandidateDocument>,
        stages: &[RerankingStage],
        early_stopping_threshold: &Option<f64>,
    ) -> RAGResult<Vec<CandidateDocument>> {
        tracing::info!("Applying sequential reranking with {} stages", stages.len());

        for (stage_idx, stage) in stages.iter().enumerate() {
            tracing::debug!(
                "Processing reranking stage {}: {}",
                stage_idx + 1,
                stage.name
            );

            // Limit input size if specified
            if candidates.len() > stage.input_size {
                candidates.truncate(stage.input_size);
            }

            // Apply provider-specific reranking
            candidates = self
                .rerank_with_provider(query, candidates, &stage.provider)
                .await?;

            // Apply score threshold filtering
            if let Some(threshold) = stage.score_threshold {
                candidates.retain(|doc| doc.score >= threshold);
            }

            // Limit output size if specified
            if candidates.len() > stage.output_size {
                candidates.truncate(stage.output_size);
            }

            // Early stopping check
            if let Some(threshold) = early_stopping_threshold {
                if let Some(top_score) = candidates.first().map(|doc| doc.score) {
                    if top_score >= *threshold {
                        tracing::info!(
                            "Early stopping triggered at stage {} with top score {:.3}",
                            stage_idx + 1,
                            top_score
                        );
                        break;
                    }
                }
            }

            tracing::debug!(
                "Stage {} completed: {} candidates remaining",
                stage_idx + 1,
                candidates.len()
            );
        }

        tracing::info!(
            "Sequential reranking completed: {} final candidates",
            candidates.len()
        );
        Ok(candidates)
    }

    /// Ensemble reranking combining multiple providers
    async fn apply_ensemble_reranking(
        &self,
        query: &str,
        candidates: Vec<CandidateDocument>,
        rerankers: &[RerankingProvider],
        combination_method: &EnsembleCombinationMethod,
        weights: &[f64],
    ) -> RAGResult<Vec<CandidateDocument>> {
        tracing::info!(
            "Applying ensemble reranking with {} providers",
            rerankers.len()
        );

        // Get reranking results from all providers
        let mut all_results = Vec::new();
        for provider in rerankers {
            let provider_results = self
                .rerank_with_provider(query, candidates.clone(), provider)
                .await?;
            all_results.push(provider_results);
        }

        // Combine results using the specified method
        let combined_results = match combination_method {
            EnsembleCombinationMethod::WeightedAverage => {
                self.combine_weighted_average(all_results, weights).await?
            }
            EnsembleCombinationMethod::RankFusion => self.combine_rank_fusion(all_results).await?,
            EnsembleCombinationMethod::BordaCount => self.combine_borda_count(all_results).await?,
            EnsembleCombinationMethod::ReciprocalRankFusion => {
                self.combine_reciprocal_rank_fusion(all_results).await?
            }
            EnsembleCombinationMethod::LearningToRank => {
                // Simplified L2R - would use trained model in production
                self.combine_weighted_average(all_results, weights).await?
            }
        };

        tracing::info!(
            "Ensemble reranking completed: {} candidates",
            combined_results.len()
        );
        Ok(combined_results)
    }

    /// Rerank candidates using specific provider
    async fn rerank_with_provider(
        &self,
        query: &str,
        candidates: Vec<CandidateDocument>,
        provider: &RerankingProvider,
    ) -> RAGResult<Vec<CandidateDocument>> {
        match provider {
            RerankingProvider::Cohere {
                model,
                api_key,
                top_k,
            } => {
                self.rerank_with_cohere(query, candidates, model, api_key.as_deref(), *top_k)
                    .await
            }
            RerankingProvider::OpenAI {
                model,
                api_key,
                similarity_threshold,
            } => {
                self.rerank_with_openai(
                    query,
                    candidates,
                    model,
                    api_key.as_deref(),
                    *similarity_threshold,
                )
                .await
            }
            RerankingProvider::SentenceTransformers {
                model_path,
                device,
                batch_size,
            } => {
                self.rerank_with_sentence_transformers(
                    query,
                    candidates,
                    model_path,
                    device,
                    *batch_size,
                )
                .await
            }
            RerankingProvider::Custom {
                endpoint,
                headers,
                request_format,
            } => {
                self.rerank_with_custom_endpoint(
                    query,
                    candidates,
                    endpoint,
                    headers,
                    request_format,
                )
                .await
            }
        }
    }

    /// Cohere reranking implementation
    async fn rerank_with_cohere(
        &self,
        query: &str,
        mut candidates: Vec<CandidateDocument>,
        model: &str,
        _api_key: Option<&str>,
        top_k: usize,
    ) -> RAGResult<Vec<CandidateDocument>> {
        tracing::debug!("Reranking with Cohere model: {}", model);

        // Simulate Cohere API call with sophisticated scoring
        for candidate in &mut candidates {
            let semantic_score = self
                .calculate_advanced_semantic_similarity(query, &candidate.content)
                .await?;
            let coherence_score = self
                .calculate_contextual_coherence(query, &candidate.content)
                .await?;

            // Cohere-style reranking score
            candidate.score = semantic_score * 0.7 + coherence_score * 0.3;
            candidate
                .reranking_metadata
                .insert("cohere_model".to_string(), model.to_string());
            candidate
                .reranking_metadata
                .insert("semantic_score".to_string(), semantic_score.to_string());
        }

        // Sort by score and limit to top_k
        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(top_k);

        Ok(candidates)
    }

    /// OpenAI reranking implementation
    async fn rerank_with_openai(
        &self,
        query: &str,
        mut candidates: Vec<CandidateDocument>,
        model: &str,
        _api_key: Option<&str>,
        similarity_threshold: f64,
    ) -> RAGResult<Vec<CandidateDocument>> {
        tracing::debug!("Reranking with OpenAI model: {}", model);

        // Simulate OpenAI embeddings-based reranking
        for candidate in &mut candidates {
            let embedding_similarity = self
                .calculate_embedding_similarity(query, &candidate.content)
                .await?;
            let lexical_similarity = self
                .calculate_lexical_similarity(query, &candidate.content)
                .await?;

            // OpenAI-style combined score
            candidate.score = embedding_similarity * 0.8 + lexical_similarity * 0.2;
            candidate
                .reranking_metadata
                .insert("openai_model".to_string(), model.to_string());
            candidate.reranking_metadata.insert(
                "embedding_similarity".to_string(),
                embedding_similarity.to_string(),
            );
        }

        // Filter by similarity threshold
        candidates.retain(|doc| doc.score >= similarity_threshold);

        // Sort by score
        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(candidates)
    }

    /// Sentence Transformers reranking implementation
    async fn rerank_with_sentence_transformers(
        &self,
        query: &str,
        mut candidates: Vec<CandidateDocument>,
        model_path: &str,
        device: &str,
        batch_size: usize,
    ) -> RAGResult<Vec<CandidateDocument>> {
        tracing::debug!(
            "Reranking with SentenceTransformers model: {} on {}",
            model_path,
            device
        );

        // Process in batches
        for batch in candidates.chunks_mut(batch_size) {
            for candidate in batch {
                let cross_encoder_score = self
                    .calculate_cross_encoder_score(query, &candidate.content)
                    .await?;
                candidate.score = cross_encoder_score;
                candidate
                    .reranking_metadata
                    .insert("st_model".to_string(), model_path.to_string());
                candidate
                    .reranking_metadata
                    .insert("device".to_string(), device.to_string());
            }
        }

        // Sort by score
        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(candidates)
    }

    /// Custom endpoint reranking implementation
    async fn rerank_with_custom_endpoint(
        &self,
        query: &str,
        mut candidates: Vec<CandidateDocument>,
        endpoint: &str,
        _headers: &HashMap<String, String>,
        request_format: &str,
    ) -> RAGResult<Vec<CandidateDocument>> {
        tracing::debug!("Reranking with custom endpoint: {}", endpoint);

        // Simulate custom endpoint call
        for candidate in &mut candidates {
            let custom_score = self
                .calculate_weighted_composite_score(query, &candidate.content)
                .await?;
            candidate.score = custom_score;
            candidate
                .reranking_metadata
                .insert("custom_endpoint".to_string(), endpoint.to_string());
            candidate
                .reranking_metadata
                .insert("request_format".to_string(), request_format.to_string());
        }

        // Sort by score
        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(candidates)
    }

    /// Advanced scoring methods for reranking
    async fn calculate_advanced_semantic_similarity(
        &self,
        query: &str,
        content: &str,
    ) -> RAGResult<f64> {
        // Sophisticated semantic similarity using multiple dimensions
        let config = &self.reranking_infrastructure.advanced_scoring;

        let semantic_score = self.calculate_embedding_similarity(query, content).await?
            * config.semantic_similarity_weight;
        let lexical_score = self.calculate_lexical_similarity(query, content).await?
            * config.lexical_similarity_weight;
        let coherence_score = self.calculate_contextual_coherence(query, content).await?
            * config.context_coherence_weight;

        let combined_score = semantic_score + lexical_score + coherence_score;

        // Apply normalization
        self.normalize_score(combined_score, &config.score_normalization)
            .await
    }

    async fn calculate_embedding_similarity(&self, query: &str, content: &str) -> RAGResult<f64> {
        // Simplified cosine similarity calculation
        let query_words: std::collections::HashSet<&str> = query.split_whitespace().collect();
        let content_words: std::collections::HashSet<&str> = content.split_whitespace().collect();

        let intersection = query_words.intersection(&content_words).count();
        let union = query_words.union(&content_words).count();

        Ok(if union > 0 {
            intersection as f64 / union as f64
        } else {
            0.0
        })
    }

    async fn calculate_lexical_similarity(&self, query: &str, content: &str) -> RAGResult<f64> {
        // BM25-style lexical similarity
        let query_terms: Vec<&str> = query.split_whitespace().collect();
        let content_terms: Vec<&str> = content.split_whitespace().collect();

        let mut score = 0.0;
        for term in &query_terms {
            let term_freq = content_terms.iter().filter(|&&t| t == *term).count() as f64;
            if term_freq > 0.0 {
                score += (term_freq + 1.0).ln();
            }
        }

        Ok(score / query_terms.len() as f64)
    }

    async fn calculate_contextual_coherence(&self, query: &str, content: &str) -> RAGResult<f64> {
        // Context coherence based on sentence structure and flow
        let _query_sentences: Vec<&str> = query.split('.').collect();
        let content_sentences: Vec<&str> = content.split('.').collect();

        let coherence_factors = vec![
            content_sentences.len() as f64 / 10.0,       // Sentence density
            if content.len() > 100 { 0.8 } else { 0.4 }, // Content length adequacy
            if content_sentences.iter().any(|s| s.trim().ends_with('?')) {
                0.9
            } else {
                0.7
            }, // Question handling
        ];

        let avg_coherence = coherence_factors.iter().sum::<f64>() / coherence_factors.len() as f64;
        Ok(avg_coherence.min(1.0))
    }

    async fn calculate_cross_encoder_score(&self, query: &str, content: &str) -> RAGResult<f64> {
        // Cross-encoder style scoring (query-document pair)
        let query_len = query.split_whitespace().count() as f64;
        let content_len = content.split_whitespace().count() as f64;

        let length_ratio = (query_len / (content_len + 1.0)).min(1.0);
        let semantic_overlap = self.calculate_embedding_similarity(query, content).await?;

        Ok(semantic_overlap * length_ratio)
    }

    async fn calculate_weighted_composite_score(
        &self,
        query: &str,
        content: &str,
    ) -> RAGResult<f64> {
        let config = &self.reranking_infrastructure.advanced_scoring;

        let semantic = self.calculate_embedding_similarity(query, content).await?
            * config.semantic_similarity_weight;
        let lexical = self.calculate_lexical_similarity(query, content).await?
            * config.lexical_similarity_weight;
        let coherence = self.calculate_contextual_coherence(query, content).await?
            * config.context_coherence_weight;

        Ok(semantic + lexical + coherence)
    }

    /// Score normalization methods
    async fn normalize_score(
        &self,
        score: f64,
        method: &ScoreNormalizationMethod,
    ) -> RAGResult<f64> {
        match method {
            ScoreNormalizationMethod::MinMax => Ok(score.min(1.0).max(0.0)),
            ScoreNormalizationMethod::ZScore => {
                // Simplified z-score normalization
                let mean = 0.5;
                let std_dev = 0.2;
                Ok(((score - mean) / std_dev).tanh() * 0.5 + 0.5)
            }
            ScoreNormalizationMethod::Sigmoid => Ok(1.0 / (1.0 + (-score).exp())),
            ScoreNormalizationMethod::SoftMax => Ok(score.exp() / (score.exp() + 1.0)),
            ScoreNormalizationMethod::RankBased => Ok(score), // Simplified
        }
    }

    /// Ensemble combination methods
    async fn combine_weighted_average(
        &self,
        all_results: Vec<Vec<CandidateDocument>>,
        weights: &[f64],
    ) -> RAGResult<Vec<CandidateDocument>> {
        if all_results.is_empty() {
            return Ok(Vec::new());
        }

        // Create combined document map
        let mut document_scores: HashMap<String, f64> = HashMap::new();
        let mut document_contents: HashMap<String, CandidateDocument> = HashMap::new();

        for (results, &weight) in all_results.iter().zip(weights.iter()) {
            for doc in results {
                let key = doc.id.clone();
                *document_scores.entry(key.clone()).or_insert(0.0) += doc.score * weight;
                document_contents.entry(key).or_insert_with(|| doc.clone());
            }
        }

        let mut combined: Vec<CandidateDocument> = document_contents.into_values().collect();
        for doc in &mut combined {
            if let Some(&score) = document_scores.get(&doc.id) {
                doc.score = score;
            }
        }

        combined.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(combined)
    }

    async fn combine_rank_fusion(
        &self,
        all_results: Vec<Vec<CandidateDocument>>,
    ) -> RAGResult<Vec<CandidateDocument>> {
        let mut document_ranks: HashMap<String, f64> = HashMap::new();
        let mut document_contents: HashMap<String, CandidateDocument> = HashMap::new();

        for results in &all_results {
            for (rank, doc) in results.iter().enumerate() {
                let key = doc.id.clone();
                *document_ranks.entry(key.clone()).or_insert(0.0) += 1.0 / (rank as f64 + 1.0);
                document_contents.entry(key).or_insert_with(|| doc.clone());
            }
        }

        let mut combined: Vec<CandidateDocument> = document_contents.into_values().collect();
        for doc in &mut combined {
            if let Some(&rank_score) = document_ranks.get(&doc.id) {
                doc.score = rank_score;
            }
        }

        combined.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(combined)
    }

    async fn combine_borda_count(
        &self,
        all_results: Vec<Vec<CandidateDocument>>,
    ) -> RAGResult<Vec<CandidateDocument>> {
        let mut document_borda_scores: HashMap<String, f64> = HashMap::new();
        let mut document_contents: HashMap<String, CandidateDocument> = HashMap::new();

        for results in &all_results {
            let n = results.len() as f64;
            for (rank, doc) in results.iter().enumerate() {
                let key = doc.id.clone();
                let borda_score = n - rank as f64 - 1.0;
                *document_borda_scores.entry(key.clone()).or_insert(0.0) += borda_score;
                document_contents.entry(key).or_insert_with(|| doc.clone());
            }
        }

        let mut combined: Vec<CandidateDocument> = document_contents.into_values().collect();
        for doc in &mut combined {
            if let Some(&borda_score) = document_borda_scores.get(&doc.id) {
                doc.score = borda_score;
            }
        }

        combined.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(combined)
    }

    async fn combine_reciprocal_rank_fusion(
        &self,
        all_results: Vec<Vec<CandidateDocument>>,
    ) -> RAGResult<Vec<CandidateDocument>> {
        let k = 60.0; // RRF parameter
        let mut document_rrf_scores: HashMap<String, f64> = HashMap::new();
        let mut document_contents: HashMap<String, CandidateDocument> = HashMap::new();

        for results in &all_results {
            for (rank, doc) in results.iter().enumerate() {
                let key = doc.id.clone();
                let rrf_score = 1.0 / (k + rank as f64 + 1.0);
                *document_rrf_scores.entry(key.clone()).or_insert(0.0) += rrf_score;
                document_contents.entry(key).or_insert_with(|| doc.clone());
            }
        }

        let mut combined: Vec<CandidateDocument> = document_contents.into_values().collect();
        for doc in &mut combined {
            if let Some(&rrf_score) = document_rrf_scores.get(&doc.id) {
                doc.score = rrf_score;
            }
        }

        combined.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(combined)
    }

    /// Calculate query complexity for adaptive reranking
    async fn calculate_query_complexity(&self, query: &str) -> RAGResult<f64> {
        let complexity_factors = vec![
            query.split_whitespace().count() as f64 / 10.0, // Length factor
            if query.contains('?') { 0.8 } else { 0.4 },    // Question complexity
            if query.split_whitespace().any(|w| w.len() > 8) {
                0.9
            } else {
                0.5
            }, // Vocabulary complexity
            if query.contains("AND") || query.contains("OR") {
                1.0
            } else {
                0.3
            }, // Boolean operators
        ];

        let avg_complexity =
            complexity_factors.iter().sum::<f64>() / complexity_factors.len() as f64;
        Ok(avg_complexity.min(1.0))
    }
}