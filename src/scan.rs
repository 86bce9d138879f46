//! One scan end to end: fragments in, structured result out, then advice.
//!
//! The database is shared read-only; each call gets its own result and
//! pipeline run.

use std::sync::Arc;

use uuid::Uuid;

use crate::models::TextFragment;
use crate::pipeline::advice::{AdviceOutcome, AdvicePipeline};
use crate::pipeline::linking::{analyze_metadata, build_advice_context, AnalysisResult, DrugDatabase};

pub struct ScanService {
    database: Arc<DrugDatabase>,
    pipeline: AdvicePipeline,
}

impl ScanService {
    pub fn new(database: Arc<DrugDatabase>, pipeline: AdvicePipeline) -> Self {
        Self { database, pipeline }
    }

    pub fn database(&self) -> &DrugDatabase {
        &self.database
    }

    /// Link and extract attributes for one scan's fragments.
    pub fn analyze(&self, fragments: &[TextFragment]) -> AnalysisResult {
        let scan_id = Uuid::new_v4();
        let _span = tracing::info_span!("scan", %scan_id).entered();

        let result = analyze_metadata(fragments, &self.database);
        tracing::info!(
            suggestion = %result.final_suggestion,
            score = result.score,
            identified = result.is_identified(),
            "Scan analyzed"
        );
        result
    }

    /// Produce vetted advice for an analyzed scan.
    ///
    /// `confirmed_name` overrides the suggested name in the context sent to
    /// the generator; grounding always comes from the linked record.
    pub fn advise(&self, result: &AnalysisResult, confirmed_name: Option<&str>) -> AdviceOutcome {
        let context = build_advice_context(result, confirmed_name);
        self.pipeline.run(&context, result.fda_record.as_deref())
    }
}
